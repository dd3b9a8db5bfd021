//! Incremental JSON document serializer
//!
//! Writes the envelope object once, then appends array elements one at a
//! time. Bytes already written are never revisited, so the document is a
//! valid JSON prefix at every record boundary and complete only after
//! [`DocumentSink::close`].
//!
//! ```text
//! {"timestamp":1717171717,"modVersion":"0.1.0","logVersion":"1","log":[
//! {"type":"RUN_START",...},
//! {"type":"STAGE_START",...}
//! ]}
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::types::DocumentHeader;

/// Closing bytes of the `log` array and the envelope object
pub const DOCUMENT_TAIL: &str = "\n]}";

/// Append-only writer for one log document
#[derive(Debug)]
pub struct DocumentSink<W: Write> {
    writer: W,
    records_written: u64,
    bytes_written: u64,
    /// Set after a write error; the byte stream can no longer be trusted
    broken: bool,
}

impl DocumentSink<BufWriter<File>> {
    /// Create the parent directory, open `path` for append and write the header.
    pub fn create(path: &Path, header: &DocumentHeader, timestamp: i64) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Self::new(BufWriter::new(file), header, timestamp)
    }
}

impl<W: Write> DocumentSink<W> {
    /// Write the envelope opening and header fields to `writer`.
    ///
    /// The stream is flushed before returning so the header is on disk even
    /// if no record ever follows.
    pub fn new(writer: W, header: &DocumentHeader, timestamp: i64) -> io::Result<Self> {
        let mut sink = Self {
            writer,
            records_written: 0,
            bytes_written: 0,
            broken: false,
        };

        let mut opening = format!("{{\"timestamp\":{}", timestamp);
        for (key, value) in header.fields() {
            let key = serde_json::to_string(key)?;
            opening.push_str(&format!(",{}:{}", key, value));
        }
        opening.push_str(",\"log\":[");

        sink.write_raw(&opening)?;
        sink.writer.flush()?;
        Ok(sink)
    }

    /// Append one array element.
    ///
    /// `json` must be a complete JSON value. A separating comma precedes every
    /// element but the first; each element starts on its own line.
    pub fn append(&mut self, json: &str, flush: bool) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "document stream broken by an earlier write failure",
            ));
        }

        let separator = if self.records_written == 0 { "\n" } else { ",\n" };
        let mut written = self.write_raw(separator)?;
        written += self.write_raw(json)?;
        if flush {
            self.flush()?;
        }

        self.records_written += 1;
        Ok(written)
    }

    /// Push buffered bytes to the underlying stream
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().map_err(|e| {
            self.broken = true;
            e
        })
    }

    /// Write the closing `]` and `}`, flush and release the stream.
    ///
    /// Returns the number of records in the finished document.
    pub fn close(mut self) -> io::Result<u64> {
        self.write_raw(DOCUMENT_TAIL)?;
        self.flush()?;
        Ok(self.records_written)
    }

    /// Number of records appended so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Bytes written so far, header included
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Whether a write error has made further appends impossible
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn write_raw(&mut self, text: &str) -> io::Result<usize> {
        if let Err(e) = self.writer.write_all(text.as_bytes()) {
            self.broken = true;
            return Err(e);
        }
        self.bytes_written += text.len() as u64;
        Ok(text.len())
    }
}
