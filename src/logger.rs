//! Console + file logger behind the `log` facade.
//!
//! Every record is printed as `[HH:MM:SS.mmm] LEVEL message` and appended to
//! the log file, so a session can be inspected after the console is gone.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Filtering follows `log::max_level()`, so the level can be changed after
/// installation.
pub struct FileLogger {
    file: Mutex<Option<File>>,
}

impl FileLogger {
    /// Creates a logger. If the file cannot be opened, logs go to the console only.
    pub fn new(log_path: &Path) -> Self {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();
        Self {
            file: Mutex::new(file),
        }
    }

    fn format(record: &Record) -> String {
        let timestamp = Local::now().format("%H:%M:%S%.3f");
        format!("[{}] {:<5} {}\n", timestamp, record.level(), record.args())
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format(record);
        print!("{}", line);
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Installs the logger globally. Call once at startup.
pub fn init(level: LevelFilter, log_path: &Path) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(FileLogger::new(log_path)))?;
    log::set_max_level(level);
    Ok(())
}

/// Changes the level after the config has been loaded.
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}
