//! Diagnostics on stderr, kept apart from the page written to stdout.
//!
//! Controlled by the VCS_ANN_LOG environment variable:
//! - unset: warnings and errors
//! - `off`, `error`, `warn`, `info`, `debug`, `trace` (or 0-5)

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;

pub const ENV_VAR: &str = "VCS_ANN_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "vcs-ann [{:<5}] [{}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the stderr logger at the level named by `VCS_ANN_LOG`.
pub fn init() {
    let level = parse_level(std::env::var(ENV_VAR).ok().as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

pub fn parse_level(value: Option<&str>) -> LevelFilter {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return LevelFilter::Warn;
    };
    match value.parse::<u8>() {
        Ok(0) => LevelFilter::Off,
        Ok(1) => LevelFilter::Error,
        Ok(2) => LevelFilter::Warn,
        Ok(3) => LevelFilter::Info,
        Ok(4) => LevelFilter::Debug,
        Ok(_) => LevelFilter::Trace,
        Err(_) => value.parse().unwrap_or(LevelFilter::Warn),
    }
}
