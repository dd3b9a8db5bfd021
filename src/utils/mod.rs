//! Utility functions and helpers
//!
//! Timestamps and session file naming.

pub mod time;

pub use time::{current_timestamp, session_file_name};
