use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::thread;

use chrono::Local;
use parking_lot::Mutex;

#[derive(PartialOrd, PartialEq, Clone, Copy, Debug)]
pub enum LogLevel {
    DEBUG,
    INFO,
    WARNING,
    ERROR,
    CRITICAL,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::DEBUG => "DEBUG",
            LogLevel::INFO => "INFO",
            LogLevel::WARNING => "WARNING",
            LogLevel::ERROR => "ERROR",
            LogLevel::CRITICAL => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::DEBUG),
            "INFO" => Ok(LogLevel::INFO),
            "WARN" | "WARNING" => Ok(LogLevel::WARNING),
            "ERROR" => Ok(LogLevel::ERROR),
            "CRITICAL" => Ok(LogLevel::CRITICAL),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Process-wide line logger. Lines carry a local timestamp, the thread id and
/// the level; WARNING and above go to stderr, the rest to stdout. An optional
/// file receives every line that passes the level filter.
pub struct Logger {
    current_level: Mutex<LogLevel>,
    log_file: Mutex<Option<std::fs::File>>,
}

impl Logger {
    pub fn instance() -> Arc<Logger> {
        static INSTANCE: OnceLock<Arc<Logger>> = OnceLock::new();
        INSTANCE.get_or_init(|| Arc::new(Logger::new())).clone()
    }

    fn new() -> Self {
        Logger {
            current_level: Mutex::new(LogLevel::INFO),
            log_file: Mutex::new(None),
        }
    }

    /// Applies the level and, when given, the log file in one call.
    pub fn init(level: LogLevel, file: Option<&str>) -> std::io::Result<Arc<Logger>> {
        let logger = Logger::instance();
        logger.set_log_level(level);
        if let Some(filename) = file {
            logger.set_log_file(filename)?;
        }
        Ok(logger)
    }

    pub fn set_log_level(&self, level: LogLevel) {
        *self.current_level.lock() = level;
    }

    pub fn log_level(&self) -> LogLevel {
        *self.current_level.lock()
    }

    pub fn set_log_file(&self, filename: &str) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(filename)?;
        *self.log_file.lock() = Some(file);
        Ok(())
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::DEBUG, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::INFO, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::WARNING, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::ERROR, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(LogLevel::CRITICAL, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level < self.log_level() {
            return;
        }

        let now = Local::now();
        let line = format!(
            "{}.{:03} [{:?}] {}: {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            now.timestamp_subsec_millis(),
            thread::current().id(),
            level,
            message
        );

        if level >= LogLevel::WARNING {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }

        if let Some(file) = self.log_file.lock().as_mut() {
            if let Err(e) = writeln!(file, "{}", line) {
                eprintln!("Failed to write to log file: {}", e);
            }
        }
    }
}
