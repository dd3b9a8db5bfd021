//! Data types for the run log
//!
//! This module contains the record, header and event-kind types written
//! into the log document.

mod event;
mod header;
mod record;

pub use event::{LoadoutSlot, PlayerRef, PlayerStats, RunEvent};
pub use header::DocumentHeader;
pub use record::{decimal, EventRecord, DECIMAL_PLACES};
