//! Watcher logger with verbosity levels and in-memory capture
//!
//! Messages go to stdout, to an in-memory buffer, or both. The buffer lets
//! tests and embedding hosts inspect what the watcher decided without
//! scraping stdout.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Verbosity level for watcher output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    /// Silent - no output
    Silent = 0,
    /// Minimal - session lifecycle and problems only
    Minimal = 1,
    /// Normal - attributions and game boundaries (default)
    #[default]
    Normal = 2,
    /// Verbose - every dispatched signal and skipped attribution
    Verbose = 3,
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
}

/// A captured log entry
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category (e.g. "attribution", "session")
    pub category: Option<String>,
}

/// Guard type that provides read-only access to captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Logger owned by the watcher
///
/// Logging methods take `&self` so the dispatcher can log while it holds
/// mutable borrows of the game state.
pub struct WatchLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl WatchLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        WatchLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    /// Capture to memory only (suppresses stdout)
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn disable_capture(&mut self) {
        self.output_mode = OutputMode::Stdout;
    }

    pub fn is_capturing(&self) -> bool {
        self.output_mode == OutputMode::Memory
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    /// Get access to captured log entries
    ///
    /// # Example
    /// ```ignore
    /// let played = logger.logs().iter()
    ///     .filter(|log| log.category.as_deref() == Some("attribution"))
    ///     .count();
    /// ```
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, None, message);
    }

    /// Log a problem the watcher recovered from
    ///
    /// Always mirrored to stderr unless verbosity is Silent, since these are
    /// what an operator needs to see when notifications stop arriving.
    pub fn warn(&self, category: &str, message: &str) {
        if self.verbosity > VerbosityLevel::Silent {
            eprintln!("warning: {}", message);
        }
        self.capture(VerbosityLevel::Minimal, Some(category), message);
    }

    /// Log at `level` under a category
    pub fn log(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        let should_output = self.output_mode == OutputMode::Stdout;

        if level > self.verbosity && !self.is_capturing() {
            return;
        }

        self.capture(level, category, message);

        if should_output && level <= self.verbosity {
            self.write_stdout(&LogEntry {
                level,
                message: message.to_string(),
                category: category.map(str::to_string),
            });
        }
    }

    fn capture(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        if !self.is_capturing() {
            return;
        }
        self.log_buffer.borrow_mut().push(LogEntry {
            level,
            message: message.to_string(),
            category: category.map(str::to_string),
        });
    }

    #[inline]
    fn write_stdout(&self, entry: &LogEntry) {
        match self.output_format {
            OutputFormat::Text => {
                if entry.level == VerbosityLevel::Minimal {
                    println!("{}", entry.message);
                } else {
                    println!("  {}", entry.message);
                }
            }
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(line) => println!("{}", line),
                Err(_) => println!("{}", entry.message),
            },
        }
    }
}

impl Default for WatchLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WatchLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = WatchLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert!(!logger.is_capturing());
    }

    #[test]
    fn test_log_capture() {
        let mut logger = WatchLogger::new();
        logger.enable_capture();

        logger.log(VerbosityLevel::Normal, None, "test message");
        logger.log(VerbosityLevel::Minimal, Some("session"), "minimal message");
        logger.log(VerbosityLevel::Normal, Some("attribution"), "played CARD_042");

        let logs = logger.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "test message");
        assert_eq!(logs[1].level, VerbosityLevel::Minimal);
        assert_eq!(logs[2].category.as_deref(), Some("attribution"));
    }

    #[test]
    fn test_capture_ignores_verbosity() {
        let mut logger = WatchLogger::with_verbosity(VerbosityLevel::Silent);
        logger.enable_capture();

        logger.verbose("details");
        assert_eq!(logger.logs().len(), 1);
        assert_eq!(logger.logs()[0].level, VerbosityLevel::Verbose);
    }

    #[test]
    fn test_warn_is_captured_with_category() {
        let mut logger = WatchLogger::with_verbosity(VerbosityLevel::Silent);
        logger.enable_capture();

        logger.warn("resolution", "no first player");
        let logs = logger.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].category.as_deref(), Some("resolution"));
    }

    #[test]
    fn test_json_format_keeps_capture_structured() {
        let mut logger = WatchLogger::with_verbosity(VerbosityLevel::Silent);
        logger.set_output_format(OutputFormat::Json);
        logger.enable_capture();
        assert_eq!(logger.output_format(), OutputFormat::Json);

        logger.log(VerbosityLevel::Normal, Some("turn"), "turn 3 ended");
        let line = serde_json::to_string(&logger.logs()[0]).unwrap();
        assert_eq!(line, r#"{"level":"normal","message":"turn 3 ended","category":"turn"}"#);
    }

    #[test]
    fn test_disable_capture() {
        let mut logger = WatchLogger::new();
        logger.enable_capture();
        assert!(logger.is_capturing());

        logger.disable_capture();
        assert!(!logger.is_capturing());
    }
}
