//! Session logging facade
//!
//! [`RunLogger`] is what an event source holds for the lifetime of one run.
//! It stamps events with the session clock at call time, applies the
//! skip-degenerate policy and never lets a logging failure reach the caller.

mod clock;
mod schedule;

pub use clock::{ManualClock, SessionClock, WallClock};
pub use schedule::{StatsSchedule, STATS_INTERVAL};

use std::fs::File;
use std::io::{BufWriter, Write};

use tracing::{debug, warn};

use crate::lock::Ticket;
use crate::log_writer::{LogConfig, LogResult, RunLog, WriterStats};
use crate::types::{decimal, EventRecord, PlayerRef, PlayerStats, RunEvent};

/// Typed event logging for one run
pub struct RunLogger<C: SessionClock, W: Write + Send + 'static = BufWriter<File>> {
    log: RunLog<W>,
    clock: C,
}

impl<C: SessionClock> RunLogger<C> {
    /// Create the session document and wrap it
    pub fn start(config: &LogConfig, clock: C) -> LogResult<Self> {
        Ok(Self::new(RunLog::create(config)?, clock))
    }
}

impl<C: SessionClock, W: Write + Send + 'static> RunLogger<C, W> {
    /// Wrap an already created log
    pub fn new(log: RunLog<W>, clock: C) -> Self {
        Self { log, clock }
    }

    /// Underlying writer
    pub fn log(&self) -> &RunLog<W> {
        &self.log
    }

    /// Session clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Log a run event. Returns the ticket if a record was queued.
    ///
    /// Degenerate events (zero-count item transfers) are skipped. Failures
    /// are reported through `tracing` and otherwise ignored.
    pub fn emit(&self, event: &RunEvent) -> Option<Ticket> {
        if event.is_degenerate() {
            debug!(kind = event.kind(), "skipping degenerate event");
            return None;
        }

        if let RunEvent::ItemPickup { player, item_id, .. } = event {
            if player.id.is_none() {
                warn!(item_id, "ITEM_PICKUP without playerId");
            }
        }

        let record = event.to_record(self.clock.time(), self.clock.stopwatch());
        let result = if event.wants_flush() {
            self.log.submit_durable(&record)
        } else {
            self.log.submit(&record)
        };
        self.accept(result)
    }

    /// Log a free-form record, stamping `time` and `stopwatch` if missing
    pub fn emit_record(&self, record: EventRecord) -> Option<Ticket> {
        let record = stamp(record, self.clock.time(), self.clock.stopwatch());
        let result = self.log.submit(&record);
        self.accept(result)
    }

    /// Log one `STATS_UPDATE` per player
    pub fn emit_stats(&self, players: &[(PlayerRef, PlayerStats)]) {
        for (player, stats) in players {
            self.emit(&RunEvent::StatsUpdate {
                player: player.clone(),
                stats: stats.clone(),
            });
        }
    }

    /// End the run: `RUN_END`, a final stats round, then close the document
    pub fn end_run(self, is_win: bool, players: &[(PlayerRef, PlayerStats)]) -> LogResult<WriterStats> {
        self.emit(&RunEvent::RunEnd { is_win });
        self.emit_stats(players);
        self.log.finalize()
    }

    /// The run was torn down before it ended; close the document anyway
    pub fn cancel(self) -> LogResult<WriterStats> {
        self.log.abort("run cancelled")
    }

    fn accept(&self, result: LogResult<Ticket>) -> Option<Ticket> {
        match result {
            Ok(ticket) => Some(ticket),
            // Already reported by the writer.
            Err(e) if e.is_shut_down() => None,
            Err(e) => {
                warn!(error = %e, "failed to submit run event");
                None
            }
        }
    }
}

/// Put `time` and `stopwatch` right after `type` unless the record has them.
fn stamp(record: EventRecord, time: f64, stopwatch: f64) -> EventRecord {
    if record.get("time").is_some() && record.get("stopwatch").is_some() {
        return record;
    }

    let (kind, mut fields) = record.into_parts();
    let mut stamped = EventRecord::new(kind);
    stamped.insert("time", fields.shift_remove("time").unwrap_or_else(|| decimal(time)));
    stamped.insert(
        "stopwatch",
        fields.shift_remove("stopwatch").unwrap_or_else(|| decimal(stopwatch)),
    );
    for (key, value) in fields {
        stamped.insert(key, value);
    }
    stamped
}
