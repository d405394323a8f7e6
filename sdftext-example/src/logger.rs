//! Minimal stderr logger for the `log` facade.
use log::{Level, LevelFilter, Log, Metadata, Record};

struct Stderr {
    level: Level,
}

impl Log for Stderr {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Info and up by default, everything with `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose { Level::Trace } else { Level::Info };
    let logger = Box::new(Stderr { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_once() {
        init(true);
        assert_eq!(log::max_level(), LevelFilter::Trace);
        // A second logger is refused and leaves the level alone.
        init(false);
        assert_eq!(log::max_level(), LevelFilter::Trace);
    }
}
