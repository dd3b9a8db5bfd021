//! Run Logger
//!
//! Persists a session's events as one continuously growing JSON document,
//! without blocking the threads that produce them and without corrupting the
//! document when many threads write at once.
//!
//! # Features
//!
//! - **Fair ordering**: a ticket lock admits writers first-come-first-served
//! - **Non-blocking submit**: records are serialized on the caller's thread
//!   and appended by a dedicated writer thread
//! - **Append-only**: bytes are never rewritten; the file is a valid JSON
//!   prefix at every record boundary
//! - **Safe shutdown**: finalize and abort both close the document after
//!   every earlier record
//!
//! # Modules
//!
//! - `lock`: Fair Serialization Lock (`TicketLock`)
//! - `types`: Event records, document header, run event kinds
//! - `log_writer`: Append-only JSON log writer (`RunLog`)
//! - `session`: Typed event facade for one run (`RunLogger`)
//! - `utils`: Timestamps and file naming
//! - `logging`: `tracing` subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use run_logger::{DocumentHeader, EventRecord, LogConfig, RunLog};
//!
//! fn main() -> run_logger::LogResult<()> {
//!     let config = LogConfig::new("runs").header(DocumentHeader::new().with("version", "1.2.3"));
//!     let log = RunLog::create(&config)?;
//!     log.submit(&EventRecord::new("A").with_decimal("time", 0.0))?;
//!     log.submit(&EventRecord::new("B").with_decimal("time", 1.5))?;
//!     log.finalize()?;
//!     Ok(())
//! }
//! ```

pub mod lock;
pub mod log_writer;
pub mod logging;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use lock::{Ticket, TicketGuard, TicketLock};
pub use log_writer::{LogConfig, LogError, LogResult, RunLog, WriterStats};
pub use session::{RunLogger, SessionClock, StatsSchedule};
pub use types::{decimal, DocumentHeader, EventRecord, PlayerRef, PlayerStats, RunEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
