//! Decoupled log sink for validity runs.
//!
//! # Architecture
//!
//! ```text
//! log::info!() / log_str()
//!     |
//! [LogCollector] (non-blocking send)
//!     | (crossbeam channel)
//!     v
//! [writer thread] --> logs/<ts>_validity.log
//!                 --> stderr (optional)
//! ```
//!
//! Callers never block on disk I/O. `wait_for_empty` pushes a flush marker through
//! the channel and returns once everything sent before it has been written.

use crate::error::{Result, ValidityError};
use chrono::Local;
use crossbeam_channel::{bounded, unbounded, Sender};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Internal log line or flush marker
enum LogMessage {
    Line(String),
    Flush(Sender<()>),
}

/// `log` backend that forwards formatted lines to a writer thread.
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    log_path: Option<PathBuf>,
    level: LevelFilter,
}

impl LogCollector {
    /// Start the writer thread. With `log_dir`, lines are appended to a new
    /// timestamped file inside it; with `echo_stderr`, they are also printed.
    pub fn new(log_dir: Option<&Path>, level: LevelFilter, echo_stderr: bool) -> Result<Self> {
        let (log_path, mut file) = match log_dir {
            Some(dir) => {
                let (path, file) = open_session_log(dir)?;
                (Some(path), Some(file))
            }
            None => (None, None),
        };

        let (tx, rx) = unbounded::<LogMessage>();

        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        if echo_stderr {
                            eprintln!("{}", line);
                        }
                        if let Some(file) = file.as_mut() {
                            let _ = writeln!(file, "{}", line);
                        }
                    }
                    LogMessage::Flush(done) => {
                        if let Some(file) = file.as_mut() {
                            let _ = file.flush();
                        }
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(LogCollector {
            tx,
            log_path,
            level,
        })
    }

    /// File this collector writes to, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Queue a raw message, prefixed with the local time.
    pub fn log_str(&self, message: impl Into<String>) {
        let line = format!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), message.into());
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Block until every message queued before this call has been written.
    pub fn wait_for_empty(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded::<()>(1);
        self.tx
            .send(LogMessage::Flush(done_tx))
            .map_err(|e| ValidityError::Logging(format!("Failed to send flush marker: {}", e)))?;
        done_rx
            .recv()
            .map_err(|e| ValidityError::Logging(format!("Flush signal interrupted: {}", e)))
    }

    /// Register as the global `log` backend.
    pub fn install(&self) -> Result<()> {
        log::set_boxed_logger(Box::new(self.clone()))
            .map(|()| log::set_max_level(self.level))
            .map_err(|e| ValidityError::Logging(e.to_string()))
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.log_str(format!("[{}] {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

fn open_session_log(dir: &Path) -> Result<(PathBuf, File)> {
    let io_err = |e: std::io::Error| {
        ValidityError::Logging(format!("Cannot open log file in {}: {}", dir.display(), e))
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_validity.log", timestamp));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err)?;
    Ok((path, file))
}
