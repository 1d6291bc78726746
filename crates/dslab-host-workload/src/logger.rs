//! Logging facilities to record events during simulation.

use std::path::Path;

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use log::Level;
use serde::Serialize;

/// Sink for log messages of simulation components.
pub trait Logger {
    fn log_error(&mut self, time: f64, component: &str, log: String);

    fn log_warn(&mut self, time: f64, component: &str, log: String);

    fn log_info(&mut self, time: f64, component: &str, log: String);

    fn log_debug(&mut self, time: f64, component: &str, log: String);

    fn log_trace(&mut self, time: f64, component: &str, log: String);

    /// Checks whether messages of the given level are recorded, which allows to skip building them.
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn save_log(&self, path: &Path) -> Result<(), csv::Error>;
}

/// Applies the color to the string if stderr (log) goes to console.
fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

/// Passes messages to the `log` crate, so the output is controlled by the installed logger implementation.
#[derive(Default)]
pub struct StdoutLogger {}

impl StdoutLogger {
    pub fn new() -> Self {
        Self {}
    }

    fn log(&self, level: Level, color: Color, time: f64, component: &str, log: String) {
        log::log!(
            target: component,
            level,
            "[{:.3} {}  {}] {}",
            time,
            get_colored(level.as_str(), color),
            component,
            log
        );
    }
}

impl Logger for StdoutLogger {
    fn log_error(&mut self, time: f64, component: &str, log: String) {
        self.log(Level::Error, Color::Red, time, component, log);
    }

    fn log_warn(&mut self, time: f64, component: &str, log: String) {
        self.log(Level::Warn, Color::Yellow, time, component, log);
    }

    fn log_info(&mut self, time: f64, component: &str, log: String) {
        self.log(Level::Info, Color::Green, time, component, log);
    }

    fn log_debug(&mut self, time: f64, component: &str, log: String) {
        self.log(Level::Debug, Color::Blue, time, component, log);
    }

    fn log_trace(&mut self, time: f64, component: &str, log: String) {
        self.log(Level::Trace, Color::Cyan, time, component, log);
    }

    fn enabled(&self, level: Level) -> bool {
        level <= log::max_level()
    }

    fn save_log(&self, _path: &Path) -> Result<(), csv::Error> {
        Ok(())
    }
}

#[derive(Serialize)]
struct LogEntry {
    timestamp: f64,
    level: &'static str,
    component: String,
    message: String,
}

/// Keeps messages up to the configured level in memory and saves them to CSV file on demand.
///
/// Each row of the saved file has `timestamp,level,component,message` columns.
pub struct FileLogger {
    log: Vec<LogEntry>,
    level: Level,
}

impl Default for FileLogger {
    fn default() -> Self {
        Self::with_level(Level::Info)
    }
}

impl FileLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(level: Level) -> Self {
        Self { log: Vec::new(), level }
    }

    /// Returns the number of recorded messages.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    fn record(&mut self, level: Level, time: f64, component: &str, message: String) {
        if !self.enabled(level) {
            return;
        }
        self.log.push(LogEntry {
            timestamp: time,
            level: level.as_str(),
            component: component.to_string(),
            message,
        });
    }
}

impl Logger for FileLogger {
    fn log_error(&mut self, time: f64, component: &str, log: String) {
        self.record(Level::Error, time, component, log)
    }

    fn log_warn(&mut self, time: f64, component: &str, log: String) {
        self.record(Level::Warn, time, component, log)
    }

    fn log_info(&mut self, time: f64, component: &str, log: String) {
        self.record(Level::Info, time, component, log)
    }

    fn log_debug(&mut self, time: f64, component: &str, log: String) {
        self.record(Level::Debug, time, component, log)
    }

    fn log_trace(&mut self, time: f64, component: &str, log: String) {
        self.record(Level::Trace, time, component, log)
    }

    fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    fn save_log(&self, path: &Path) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_path(path)?;
        for entry in &self.log {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logger_respects_level() {
        let mut logger = FileLogger::with_level(Level::Info);
        logger.log_debug(1., "host#0", "hidden".to_string());
        logger.log_info(2., "host#0", "shown".to_string());
        logger.log_error(3., "host#0", "also shown".to_string());

        assert!(logger.enabled(Level::Info));
        assert!(!logger.enabled(Level::Debug));
        assert_eq!(logger.len(), 2);
        assert_eq!(logger.log[0].timestamp, 2.);
        assert_eq!(logger.log[0].level, "INFO");
        assert_eq!(logger.log[0].message, "shown");
        assert_eq!(logger.log[1].level, "ERROR");
        assert_eq!(logger.log[1].component, "host#0");
    }
}
