//! Append-only JSON log writer
//!
//! This module turns a stream of event records into one JSON document on
//! disk without rewriting earlier bytes:
//! - `RunLog`: the writer handle (create / submit / checkpoint / finalize)
//! - `DocumentSink`: incremental serializer for the envelope and `log` array
//! - `LogConfig`: where and how the document is created
//! - `WriterStats`: submission and write counters
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌──────────┐   ┌──────────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ producer │──►│ submit(): ticket │──►│ bounded queue│──►│ writer      │
//! │ threads  │   │ + serialize      │   │ (FIFO)       │   │ thread      │
//! └──────────┘   └──────────────────┘   └──────────────┘   └──────┬──────┘
//!                                                                 │ enter(ticket)
//!                                                          ┌──────▼──────┐
//! finalize(): last ticket ───────── enter(ticket) ────────►│ DocumentSink│
//!             writes "]}" after every earlier ticket       └─────────────┘
//! ```

mod config;
mod document;
mod error;
mod stats;
mod writer;

pub use config::{
    LogConfig, DEFAULT_DIR_NAME, DEFAULT_QUEUE_CAPACITY, ENV_DATA_DIR, ENV_QUEUE_CAPACITY,
};
pub use document::{DocumentSink, DOCUMENT_TAIL};
pub use error::{LogError, LogResult};
pub use stats::WriterStats;
pub use writer::RunLog;
