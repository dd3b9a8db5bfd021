//! Run log writer
//!
//! [`RunLog`] owns one document. Producers call [`RunLog::submit`] from any
//! thread; the record is serialized on the caller's thread, given a ticket on
//! the document's [`TicketLock`] and queued for a dedicated writer thread.
//! Because ticket issue and enqueue happen together under the queue mutex,
//! queue order is ticket order, and the file order is the order in which
//! `submit` was called.
//!
//! The first write failure is fatal to the log. It is reported once; later
//! submissions return [`LogError::Broken`] without taking a ticket, and
//! records still in the queue are counted as failed without touching the
//! stream.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Local;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::LogConfig;
use super::document::DocumentSink;
use super::error::{LogError, LogResult};
use super::stats::{StatsCounters, WriterStats};
use crate::lock::{Ticket, TicketLock};
use crate::types::{DocumentHeader, EventRecord};

/// `None` once the document has been closed
type SharedDocument<W> = Arc<TicketLock<Option<DocumentSink<W>>>>;

/// One queued append
struct Job {
    ticket: Ticket,
    json: String,
    flush: bool,
}

/// Handle to an open run log document.
///
/// Lifecycle: [`create`](Self::create) writes the header and starts the
/// writer thread; [`finalize`](Self::finalize) (or [`abort`](Self::abort),
/// or dropping the handle) closes the document. After that every call
/// returns [`LogError::Closed`] and writes nothing.
pub struct RunLog<W: Write + Send + 'static = BufWriter<File>> {
    path: PathBuf,
    document: SharedDocument<W>,
    /// `None` once closed; held while a ticket is issued and queued
    queue: Mutex<Option<SyncSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<StatsCounters>,
}

impl RunLog {
    /// Create a document under `config.data_dir`, named from the current time.
    pub fn create(config: &LogConfig) -> LogResult<Self> {
        let path = config.document_path(&Local::now());
        Self::create_at(path, &config.header, config.queue_capacity)
    }

    /// Create a document at an explicit path.
    ///
    /// The header is written and flushed before this returns. Directory
    /// creation and open failures are returned as [`LogError::Io`].
    pub fn create_at<P: AsRef<Path>>(
        path: P,
        header: &DocumentHeader,
        queue_capacity: usize,
    ) -> LogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let sink = DocumentSink::create(&path, header, crate::utils::current_timestamp())?;
        Self::start(path, sink, queue_capacity)
    }
}

impl<W: Write + Send + 'static> RunLog<W> {
    /// Write a document to an arbitrary stream.
    ///
    /// `name` is reported by [`path`](Self::path) and in diagnostics only.
    pub fn from_writer(
        name: impl Into<PathBuf>,
        writer: W,
        header: &DocumentHeader,
        queue_capacity: usize,
    ) -> LogResult<Self> {
        let sink = DocumentSink::new(writer, header, crate::utils::current_timestamp())?;
        Self::start(name.into(), sink, queue_capacity)
    }

    fn start(path: PathBuf, sink: DocumentSink<W>, queue_capacity: usize) -> LogResult<Self> {
        let document: SharedDocument<W> = Arc::new(TicketLock::new(Some(sink)));
        let stats = Arc::new(StatsCounters::default());
        let (sender, receiver) = mpsc::sync_channel(queue_capacity.max(1));

        let worker = {
            let document = Arc::clone(&document);
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name("run-log-writer".to_string())
                .spawn(move || run_writer(document, receiver, stats))?
        };

        info!(path = %path.display(), "started run log");

        Ok(Self {
            path,
            document,
            queue: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            stats,
        })
    }

    /// Path of the document on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the log still accepts submissions
    pub fn is_open(&self) -> bool {
        self.queue.lock().is_some() && !self.stats.is_broken()
    }

    /// Current writer counters
    pub fn stats(&self) -> WriterStats {
        self.stats.snapshot()
    }

    /// Queue `record` for appending and return its ticket.
    ///
    /// Returns as soon as the record is queued; it is written later by the
    /// writer thread. If the queue is full this waits for a free slot.
    /// Once a write has failed this returns [`LogError::Broken`].
    pub fn submit(&self, record: &EventRecord) -> LogResult<Ticket> {
        self.enqueue(record, false)
    }

    /// Like [`submit`](Self::submit), but flush the stream after the write
    pub fn submit_durable(&self, record: &EventRecord) -> LogResult<Ticket> {
        self.enqueue(record, true)
    }

    fn enqueue(&self, record: &EventRecord, flush: bool) -> LogResult<Ticket> {
        let json = record.to_json()?;

        let mut queue = self.queue.lock();
        let Some(sender) = queue.as_ref() else {
            drop(queue);
            if self.stats.record_rejected() {
                warn!(
                    path = %self.path.display(),
                    kind = %record.kind,
                    "record submitted after run log was closed; dropping"
                );
            } else {
                debug!(kind = %record.kind, "dropping record for closed run log");
            }
            return Err(LogError::Closed);
        };

        if self.stats.is_broken() {
            drop(queue);
            self.stats.record_rejected();
            debug!(kind = %record.kind, "dropping record for broken run log");
            return Err(LogError::Broken);
        }

        let ticket = self.document.ticket();
        if sender.send(Job { ticket, json, flush }).is_err() {
            // The writer only stops after the sender is gone, so it died with
            // tickets unserved. Close the log so nothing waits on them.
            queue.take();
            warn!(%ticket, path = %self.path.display(), "run log writer is gone; log closed");
            return Err(LogError::WriterPanicked);
        }
        self.stats.record_submitted();

        Ok(ticket)
    }

    /// Wait until every earlier submission has been written, then flush.
    ///
    /// The file is a valid prefix of the final document afterwards.
    pub fn checkpoint(&self) -> LogResult<()> {
        let ticket = {
            let queue = self.queue.lock();
            if queue.is_none() {
                return Err(LogError::Closed);
            }
            self.document.ticket()
        };

        let mut document = self.document.enter(ticket);
        if self.stats.is_broken() {
            return Err(LogError::Broken);
        }
        let sink = document.as_mut().ok_or(LogError::Closed)?;
        if let Err(e) = sink.flush() {
            let e = LogError::from(e);
            report_failure(&self.stats, ticket, &e);
            return Err(e);
        }
        debug!(%ticket, records = sink.records_written(), "run log checkpoint");
        Ok(())
    }

    /// Close the document: write `]}` after every earlier submission, flush,
    /// release the file and stop the writer thread.
    ///
    /// A second call returns [`LogError::Closed`]. If a write failed earlier
    /// the stream is released without the tail and this returns
    /// [`LogError::Broken`].
    pub fn finalize(&self) -> LogResult<WriterStats> {
        let ticket = {
            let mut queue = self.queue.lock();
            let sender = queue.take().ok_or(LogError::Closed)?;
            let ticket = self.document.ticket();
            // Disconnects the writer once it has drained the queue.
            drop(sender);
            ticket
        };

        let closed = {
            // Admitted only after every earlier ticket was served.
            let mut document = self.document.enter(ticket);
            match document.take() {
                Some(_) if self.stats.is_broken() => Err(LogError::Broken),
                Some(sink) => sink.close().map_err(LogError::from),
                None => Ok(0),
            }
        };

        let joined = match self.worker.lock().take() {
            Some(handle) => handle.join().map_err(|_| LogError::WriterPanicked),
            None => Ok(()),
        };

        let stats = self.stats();
        match closed {
            Ok(records) => info!(
                path = %self.path.display(),
                records,
                failed = stats.failed,
                size = %WriterStats::format_size(stats.bytes_written),
                "finished run log"
            ),
            Err(LogError::Broken) => debug!(
                path = %self.path.display(),
                written = stats.written,
                failed = stats.failed,
                "released broken run log; document is incomplete"
            ),
            Err(ref e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to close run log; document is incomplete"
            ),
        }

        closed?;
        joined?;
        Ok(stats)
    }

    /// Close the document because the session was torn down abnormally.
    ///
    /// Goes through the same path as [`finalize`](Self::finalize) so the file
    /// still ends up well-formed when possible.
    pub fn abort(&self, reason: &str) -> LogResult<WriterStats> {
        warn!(path = %self.path.display(), reason, "run log aborted");
        self.finalize()
    }
}

impl<W: Write + Send + 'static> Drop for RunLog<W> {
    fn drop(&mut self) {
        if self.queue.lock().is_some() {
            match self.abort("handle dropped without finalize") {
                Ok(_) => {}
                Err(e) if e.is_shut_down() => debug!(error = %e, "dropped run log was shut down"),
                Err(e) => warn!(error = %e, "failed to close dropped run log"),
            }
        }
    }
}

/// Writer thread body: append queued records in ticket order until the
/// queue disconnects. Every job's ticket is served, even after a failure.
fn run_writer<W: Write>(
    document: SharedDocument<W>,
    jobs: Receiver<Job>,
    stats: Arc<StatsCounters>,
) {
    for job in jobs {
        let mut guard = document.enter(job.ticket);
        let result = if stats.is_broken() {
            Err(LogError::Broken)
        } else {
            match guard.as_mut() {
                Some(sink) => append_job(sink, &job),
                None => Err(LogError::Closed),
            }
        };
        drop(guard);

        match result {
            Ok(bytes) => stats.record_written(bytes),
            Err(e) => {
                stats.record_failed();
                report_failure(&stats, job.ticket, &e);
            }
        }
    }
    debug!("run log writer stopped");
}

/// Append one job. A panicking stream is turned into an error so the writer
/// thread keeps serving tickets.
fn append_job<W: Write>(sink: &mut DocumentSink<W>, job: &Job) -> LogResult<usize> {
    panic::catch_unwind(AssertUnwindSafe(|| sink.append(&job.json, job.flush)))
        .map_err(|_| LogError::WriterPanicked)?
        .map_err(LogError::from)
}

/// Mark the log broken; only the first failure is logged as a warning.
fn report_failure(stats: &StatsCounters, ticket: Ticket, error: &LogError) {
    if stats.mark_broken() {
        warn!(%ticket, error = %error, "run log write failed; no further records will be written");
    } else {
        debug!(%ticket, error = %error, "skipped record for broken run log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn open(temp_dir: &TempDir) -> RunLog {
        let header = DocumentHeader::new().with("version", "1.2.3");
        RunLog::create_at(temp_dir.path().join("run.json"), &header, 8).unwrap()
    }

    #[test]
    fn test_create_writes_header_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let log = open(&temp_dir);

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.starts_with("{\"timestamp\":"));
        assert!(content.ends_with(",\"version\":\"1.2.3\",\"log\":["));
        assert!(log.is_open());
    }

    #[test]
    fn test_tickets_follow_submission_order() {
        let temp_dir = TempDir::new().unwrap();
        let log = open(&temp_dir);

        let first = log.submit(&EventRecord::new("A")).unwrap();
        let second = log.submit(&EventRecord::new("B")).unwrap();
        assert!(first < second);
        log.finalize().unwrap();
    }

    #[test]
    fn test_finalize_twice_is_closed() {
        let temp_dir = TempDir::new().unwrap();
        let log = open(&temp_dir);

        log.finalize().unwrap();
        assert!(!log.is_open());
        assert!(log.finalize().unwrap_err().is_closed());
        assert!(log.checkpoint().unwrap_err().is_closed());
    }

    #[test]
    fn test_submit_after_finalize_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let log = open(&temp_dir);
        log.submit(&EventRecord::new("A")).unwrap();
        log.finalize().unwrap();
        let before = fs::read_to_string(log.path()).unwrap();

        assert!(log.submit(&EventRecord::new("B")).unwrap_err().is_closed());
        assert!(log.submit_durable(&EventRecord::new("C")).unwrap_err().is_closed());

        assert_eq!(fs::read_to_string(log.path()).unwrap(), before);
        assert_eq!(log.stats().rejected, 2);
    }

    #[test]
    fn test_drop_closes_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let log = open(&temp_dir);
            log.submit(&EventRecord::new("A")).unwrap();
            log.path().to_path_buf()
        };

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["log"][0]["type"], "A");
    }

    #[test]
    fn test_stats_after_finalize() {
        let temp_dir = TempDir::new().unwrap();
        let log = open(&temp_dir);
        for _ in 0..5 {
            log.submit(&EventRecord::new("A")).unwrap();
        }

        let stats = log.finalize().unwrap();
        assert_eq!(stats.submitted, 5);
        assert_eq!(stats.written, 5);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.pending(), 0);
        // "\n" + 4 x ",\n" + 5 x {"type":"A"}
        assert_eq!(stats.bytes_written, 1 + 4 * 2 + 5 * 12);
    }

    /// Accepts `remaining` bytes, then fails every write like a full disk
    struct FullDisk {
        remaining: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.remaining);
            self.remaining -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Panics on the first write after the header has been flushed
    #[derive(Default)]
    struct PanickingStream {
        header_flushed: bool,
    }

    impl Write for PanickingStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.header_flushed {
                panic!("stream exploded");
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.header_flushed = true;
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_shuts_log_down() {
        let header = DocumentHeader::new().with("version", "1.2.3");
        let log = RunLog::from_writer("full.json", FullDisk { remaining: 200 }, &header, 4).unwrap();

        let mut accepted = 0u64;
        let refused = loop {
            match log.submit_durable(&EventRecord::new("STATS_UPDATE").with("i", accepted)) {
                Ok(_) => accepted += 1,
                Err(e) => break e,
            }
            assert!(accepted < 1000, "log kept accepting records after the disk filled up");
        };

        assert!(matches!(refused, LogError::Broken));
        assert!(!log.is_open());
        assert!(matches!(log.submit(&EventRecord::new("LATE")), Err(LogError::Broken)));
        assert!(matches!(log.checkpoint(), Err(LogError::Broken)));
        assert!(matches!(log.finalize(), Err(LogError::Broken)));

        let stats = log.stats();
        assert!(stats.broken);
        assert!(stats.failed >= 1);
        assert_eq!(stats.submitted, accepted);
        assert_eq!(stats.written + stats.failed, accepted);
        assert_eq!(stats.rejected, 2);
        assert!(log.finalize().unwrap_err().is_closed());
    }

    #[test]
    fn test_panicking_stream_does_not_strand_tickets() {
        let log =
            RunLog::from_writer("panics.json", PanickingStream::default(), &DocumentHeader::new(), 2)
                .unwrap();
        log.submit(&EventRecord::new("A")).unwrap();
        let _ = log.submit(&EventRecord::new("B"));

        // Both return instead of waiting on a ticket that is never served.
        assert!(matches!(log.checkpoint(), Err(LogError::Broken)));
        assert!(matches!(log.finalize(), Err(LogError::Broken)));

        let stats = log.stats();
        assert!(stats.broken);
        assert_eq!(stats.written, 0);
        assert!(log.submit(&EventRecord::new("C")).unwrap_err().is_closed());
    }

    #[test]
    fn test_create_fails_when_directory_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = RunLog::create_at(blocker.join("run.json"), &DocumentHeader::new(), 4);
        assert!(matches!(result, Err(LogError::Io(_))));
    }
}
