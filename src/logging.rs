//! Minimal stderr logger for the `log` facade.
//!
//! The library itself only emits records; binaries opt in with [`init`].

use std::io::Write;
use std::str::FromStr;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::LOG_ENV;

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:>5}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the stderr logger, with the level taken from `COOP_LOG`.
pub fn init() -> Result<(), SetLoggerError> {
    let level = parse_level(std::env::var(LOG_ENV).ok().as_deref());
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Level from an environment value; unset or unparsable means `warn`.
fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .map(str::trim)
        .and_then(|v| LevelFilter::from_str(v).ok())
        .unwrap_or(LevelFilter::Warn)
}
