//! Run log configuration

use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::types::DocumentHeader;
use crate::utils::session_file_name;

/// Name of the subdirectory logs are written to by default
pub const DEFAULT_DIR_NAME: &str = "run-logger";

/// Default number of records that may wait for the writer thread
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Environment variable overriding the data directory
pub const ENV_DATA_DIR: &str = "RUN_LOGGER_DIR";

/// Environment variable overriding the queue capacity
pub const ENV_QUEUE_CAPACITY: &str = "RUN_LOGGER_QUEUE_CAPACITY";

/// Configuration for a [`RunLog`](super::RunLog)
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory the session document is created in (created on demand)
    pub data_dir: PathBuf,
    /// Fixed file name; derived from the creation time when `None`
    pub file_name: Option<String>,
    /// Records that may be queued before `submit` waits for a free slot
    pub queue_capacity: usize,
    /// Header fields written after `timestamp`
    pub header: DocumentHeader,
}

impl Default for LogConfig {
    fn default() -> Self {
        let base = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            data_dir: base.join(DEFAULT_DIR_NAME),
            file_name: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            header: DocumentHeader::default(),
        }
    }
}

impl LogConfig {
    /// Create config with custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Create config with custom data directory (alias for new)
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir)
    }

    /// Build config from defaults overridden by environment variables.
    ///
    /// Unparseable or zero capacities fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env::var_os(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = env::var(ENV_QUEUE_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => config.queue_capacity = capacity,
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_QUEUE_CAPACITY,
                    "ignoring invalid {}",
                    ENV_QUEUE_CAPACITY
                ),
            }
        }

        config
    }

    /// Use a fixed file name instead of the timestamp-derived one
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set the queue capacity (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Replace the header fields
    pub fn header(mut self, header: DocumentHeader) -> Self {
        self.header = header;
        self
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the document for a session created at `created`
    pub fn document_path<Tz: TimeZone>(&self, created: &DateTime<Tz>) -> PathBuf {
        match &self.file_name {
            Some(name) => self.data_dir.join(name),
            None => self.data_dir.join(session_file_name(created)),
        }
    }
}
