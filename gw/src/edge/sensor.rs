//! Serial sensor feed and the shared snapshot
//!
//! The board prints report lines like `PIR=1;SOIL_PCT=42`. One blocking
//! worker owns the port and the write side of the hub; everyone else takes
//! snapshots.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SensorConfig;

/// Latest successfully parsed readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub motion: bool,
    pub soil_percent: i64,
}

/// Shared sensor state: the serial worker writes, everyone else reads
#[derive(Debug, Default)]
pub struct SensorHub {
    motion: AtomicBool,
    soil_percent: AtomicI64,
}

impl SensorHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            motion: self.motion.load(Ordering::Relaxed),
            soil_percent: self.soil_percent.load(Ordering::Relaxed),
        }
    }

    /// Apply one report line from the board
    ///
    /// Unknown or malformed tokens are skipped; each field keeps its last
    /// good value. A field is stored only after its token parses whole.
    pub fn apply_line(&self, line: &str) {
        for token in line.trim().split(';') {
            if let Some(raw) = token.strip_prefix("PIR=") {
                match raw.trim().parse::<i64>() {
                    Ok(v) => self.motion.store(v != 0, Ordering::Relaxed),
                    Err(_) => debug!(token, "sensor: bad PIR token"),
                }
            } else if let Some(raw) = token.strip_prefix("SOIL_PCT=") {
                match raw.trim().parse::<i64>() {
                    Ok(v) => self.soil_percent.store(v, Ordering::Relaxed),
                    Err(_) => debug!(token, "sensor: bad SOIL_PCT token"),
                }
            }
        }
    }
}

/// Read timeout on the port; expiry is not an event, just a re-poll
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Run the serial reader until the process exits
///
/// Opens the port, feeds lines to the hub, and reopens after a delay when
/// the port is missing or breaks. Blocking; run it on `spawn_blocking`.
pub fn run_reader(hub: Arc<SensorHub>, config: SensorConfig) {
    info!(port = %config.port, baud = config.baud_rate, "sensor reader starting");
    loop {
        let port = match serialport::new(&config.port, config.baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
        {
            Ok(port) => port,
            Err(e) => {
                debug!(port = %config.port, error = %e, "sensor port unavailable");
                std::thread::sleep(config.reopen_delay());
                continue;
            }
        };
        info!(port = %config.port, "sensor port open");

        let mut reader = std::io::BufReader::new(port);
        let mut line = String::new();
        loop {
            match reader.read_line(&mut line) {
                Ok(0) => {
                    warn!("sensor port closed");
                    break;
                }
                Ok(_) => {
                    hub.apply_line(&line);
                    line.clear();
                }
                // A timeout mid-line keeps the partial read buffered
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "sensor read failed, reopening port");
                    break;
                }
            }
        }
        std::thread::sleep(config.reopen_delay());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_line_updates_both_fields() {
        let hub = SensorHub::new();
        hub.apply_line("PIR=1;SOIL_PCT=42\r\n");

        let snapshot = hub.snapshot();
        assert!(snapshot.motion);
        assert_eq!(snapshot.soil_percent, 42);
    }

    #[test]
    fn test_partial_line_updates_one_field() {
        let hub = SensorHub::new();
        hub.apply_line("PIR=1;SOIL_PCT=42");
        hub.apply_line("PIR=0");

        let snapshot = hub.snapshot();
        assert!(!snapshot.motion);
        assert_eq!(snapshot.soil_percent, 42);
    }

    #[test]
    fn test_malformed_tokens_keep_last_good_value() {
        let hub = SensorHub::new();
        hub.apply_line("PIR=1;SOIL_PCT=42");
        hub.apply_line("PIR=;SOIL_PCT=forty");
        hub.apply_line("garbage noise");

        let snapshot = hub.snapshot();
        assert!(snapshot.motion);
        assert_eq!(snapshot.soil_percent, 42);
    }

    #[test]
    fn test_fresh_hub_reads_dry_and_still() {
        let hub = SensorHub::new();
        let snapshot = hub.snapshot();
        assert!(!snapshot.motion);
        assert_eq!(snapshot.soil_percent, 0);
    }

    #[test]
    fn test_nonzero_pir_means_motion() {
        let hub = SensorHub::new();
        hub.apply_line("PIR=2");
        assert!(hub.snapshot().motion);
    }
}
