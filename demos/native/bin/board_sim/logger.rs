//! Stderr logger so diagnostics do not mix with the terminal on stdout.

use log::{LevelFilter, Metadata, Record};

static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the logger.
pub fn init(max_level: LevelFilter) {
    log::set_logger(&LOGGER).expect("logger already set");
    log::set_max_level(max_level);
}
