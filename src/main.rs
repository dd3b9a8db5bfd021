//! Run Logger - Binary Entry Point
//!
//! Reads one JSON object per line from stdin and appends each as a record
//! to a new session document. End of input finalizes the document; Ctrl+C
//! takes the abort path, which still closes it cleanly.
//!
//! Records without `time`/`stopwatch` are stamped with seconds since start.
//! Submitting and checkpointing can wait on the queue or the disk, so they
//! run through [`blocking`] to keep the runtime free for Ctrl+C.

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task;
use tokio::time::interval;
use tracing::{info, warn};

use run_logger::logging::init_tracing;
use run_logger::session::WallClock;
use run_logger::{EventRecord, LogConfig, LogResult, RunLogger, SessionClock};

/// How often buffered records are pushed to the file
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> LogResult<()> {
    init_tracing("info");

    let config = LogConfig::from_env();
    let logger = RunLogger::start(&config, WallClock::new())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut checkpoint = interval(CHECKPOINT_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => blocking(|| submit_line(&logger, &line)),
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }

            _ = checkpoint.tick() => blocking(|| checkpoint_log(&logger)),

            _ = &mut ctrl_c => {
                let stats = blocking(|| logger.cancel())?;
                info!(written = stats.written, "interrupted; run log closed");
                return Ok(());
            }
        }
    }

    let path = logger.log().path().to_path_buf();
    let stats = blocking(|| logger.log().finalize())?;
    info!(path = %path.display(), written = stats.written, "input finished");
    Ok(())
}

/// Run a call that may wait on the writer without stalling other tasks
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    task::block_in_place(f)
}

fn checkpoint_log<C: SessionClock, W: Write + Send + 'static>(logger: &RunLogger<C, W>) {
    if let Err(e) = logger.log().checkpoint() {
        warn!(error = %e, "checkpoint failed");
    }
}

fn submit_line<C: SessionClock, W: Write + Send + 'static>(logger: &RunLogger<C, W>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "skipping line that is not JSON");
            return;
        }
    };

    match EventRecord::from_value(value) {
        Some(record) => {
            logger.emit_record(record);
        }
        None => warn!("skipping line without a string \"type\" field"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;
    use run_logger::session::ManualClock;
    use run_logger::{DocumentHeader, RunLog};

    /// Stream that takes `delay` per record write and keeps what it got
    struct SlowDisk {
        delay: Duration,
        data: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for SlowDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut data = self.data.lock();
            if !data.is_empty() {
                std::thread::sleep(self.delay);
            }
            data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn slow_logger(data: &Arc<Mutex<Vec<u8>>>) -> RunLogger<ManualClock, SlowDisk> {
        let disk = SlowDisk {
            delay: Duration::from_millis(10),
            data: Arc::clone(data),
        };
        let log = RunLog::from_writer("slow.json", disk, &DocumentHeader::new(), 1).unwrap();
        RunLogger::new(log, ManualClock::new())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_slow_disk_does_not_stall_other_tasks() {
        let data = Arc::new(Mutex::new(Vec::new()));
        let logger = Arc::new(slow_logger(&data));
        let ticks = Arc::new(AtomicUsize::new(0));

        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        // Runs on the only worker thread; without handing it off the ticker
        // could not run until the feeder finished.
        let feeder = {
            let logger = Arc::clone(&logger);
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                let before = ticks.load(Ordering::SeqCst);
                for i in 0..10 {
                    blocking(|| submit_line(&logger, &format!(r#"{{"type":"TICK","i":{}}}"#, i)));
                }
                blocking(|| checkpoint_log(&logger));
                ticks.load(Ordering::SeqCst) - before
            })
        };

        let ticked_while_feeding = feeder.await.unwrap();
        ticker.abort();
        assert!(ticked_while_feeding > 0);

        let stats = logger.log().finalize().unwrap();
        assert_eq!(stats.written, 10);
        let text = String::from_utf8(data.lock().clone()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["log"][9]["i"], 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_non_record_lines_are_skipped() {
        let data = Arc::new(Mutex::new(Vec::new()));
        let logger = slow_logger(&data);

        for line in ["", "   ", "not json", "[1,2]", r#"{"type":7}"#, r#"{"type":"OK"}"#] {
            blocking(|| submit_line(&logger, line));
        }

        let stats = blocking(|| logger.log().finalize()).unwrap();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.written, 1);
    }
}
