//! Queue-backed asynchronous logger with daily file rotation
//!
//! Log lines are formatted eagerly and pushed onto a lock-free queue;
//! they hit the disk when [`Logger::flush`] runs — explicitly, at
//! [`Logger::stop`], or from a detached background thread once the queue
//! outgrows its configured capacity. Each line carries its timestamp, and
//! the flusher rotates to a `<base>_<YYYY-MM-DD>` file whenever the date
//! embedded in a line differs from the open file's date.

use crossbeam::queue::SegQueue;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

// A line looks like `[I] | 2023-09-22:16:31 |message`; the rotation date
// is the first ten timestamp characters.
const DAY_OFFSET: usize = 6;
const DAY_LEN: usize = 10;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d:%H:%M";

/// Severity levels, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Diagnostic chatter, filtered out by default.
    Debug = 0,
    /// Normal operational messages.
    Info = 1,
    /// Something unexpected but recoverable.
    Warn = 2,
    /// A failed operation.
    Error = 3,
}

impl LogLevel {
    fn tag(self) -> char {
        match self {
            LogLevel::Debug => 'D',
            LogLevel::Info => 'I',
            LogLevel::Warn => 'W',
            LogLevel::Error => 'E',
        }
    }
}

/// File state owned by whichever thread is currently flushing.
struct Sink {
    /// Directory plus file-name stem; the day suffix is appended.
    base: PathBuf,
    /// Date suffix of the open file.
    day: String,
    file: Option<File>,
}

struct Inner {
    queue: SegQueue<String>,
    sink: Mutex<Sink>,
    initialized: AtomicBool,
    min_level: AtomicU8,
    queue_cap: AtomicUsize,
}

/// Asynchronous rotating logger.
///
/// One process-wide instance is reachable through [`logger`] and the
/// `log_*!` macros; standalone instances are mainly useful in tests.
pub struct Logger {
    inner: Arc<Inner>,
}

static LOGGER: Lazy<Logger> = Lazy::new(Logger::new);

/// The process-wide logger instance.
pub fn logger() -> &'static Logger {
    &LOGGER
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a standalone, uninitialized logger. Records are dropped
    /// until [`init`](Self::init) succeeds.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: SegQueue::new(),
                sink: Mutex::new(Sink {
                    base: PathBuf::new(),
                    day: String::new(),
                    file: None,
                }),
                initialized: AtomicBool::new(false),
                min_level: AtomicU8::new(LogLevel::Info as u8),
                queue_cap: AtomicUsize::new(1024),
            }),
        }
    }

    /// Configure the sink: `base` is the log path stem (parent
    /// directories are created), `queue_cap` the queue length that
    /// triggers a background flush, `min_level` the least severe level
    /// recorded.
    pub fn init(&self, base: &Path, queue_cap: usize, min_level: LogLevel) -> std::io::Result<()> {
        if let Some(parent) = base.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        {
            let mut sink = self.inner.sink.lock();
            sink.base = base.to_path_buf();
            sink.day.clear();
            sink.file = None;
        }
        self.inner.queue_cap.store(queue_cap, Ordering::Relaxed);
        self.inner.min_level.store(min_level as u8, Ordering::Relaxed);
        self.inner.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Whether a record at `level` would be kept.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
            && level as u8 >= self.inner.min_level.load(Ordering::Relaxed)
    }

    /// Format and enqueue a record. Called through the `log_*!` macros.
    pub fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        self.inner
            .queue
            .push(format!("[{}] | {} |{}\n", level.tag(), timestamp, args));
        self.auto_flush();
    }

    /// Spawn a detached flush once the queue outgrows its capacity.
    fn auto_flush(&self) {
        if self.inner.queue.len() > self.inner.queue_cap.load(Ordering::Relaxed) {
            let inner = Arc::clone(&self.inner);
            std::thread::spawn(move || {
                let _ = inner.flush();
            });
        }
    }

    /// Drain the queue to disk, rotating by day. A second concurrent
    /// flusher returns immediately; the running one will pick up whatever
    /// it enqueued.
    pub fn flush(&self) -> std::io::Result<()> {
        self.inner.flush()
    }

    /// Flush pending records and close the sink file.
    pub fn stop(&self) -> std::io::Result<()> {
        self.inner.flush()?;
        self.inner.sink.lock().file = None;
        Ok(())
    }
}

impl Inner {
    fn flush(&self) -> std::io::Result<()> {
        let Some(mut sink) = self.sink.try_lock() else {
            return Ok(());
        };
        while let Some(line) = self.queue.pop() {
            let day = line
                .get(DAY_OFFSET..DAY_OFFSET + DAY_LEN)
                .unwrap_or_default()
                .to_string();
            if sink.file.is_none() || sink.day != day {
                sink.rotate(&day)?;
            }
            if let Some(file) = sink.file.as_mut() {
                file.write_all(line.as_bytes())?;
            }
        }
        if let Some(file) = sink.file.as_mut() {
            file.sync_all()?;
        }
        Ok(())
    }
}

impl Sink {
    fn rotate(&mut self, day: &str) -> std::io::Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        let mut path = self.base.clone().into_os_string();
        path.push("_");
        path.push(day);
        self.file = Some(OpenOptions::new().append(true).create(true).open(path)?);
        self.day = day.to_string();
        Ok(())
    }
}

/// Log at debug level via the process-wide logger.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::log::logger().log($crate::log::LogLevel::Debug, format_args!($($arg)*))
    };
}

/// Log at info level via the process-wide logger.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::log::logger().log($crate::log::LogLevel::Info, format_args!($($arg)*))
    };
}

/// Log at warn level via the process-wide logger.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::log::logger().log($crate::log::LogLevel::Warn, format_args!($($arg)*))
    };
}

/// Log at error level via the process-wide logger.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::log::logger().log($crate::log::LogLevel::Error, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> String {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    }

    #[test]
    fn test_uninitialized_logger_drops_records() {
        let log = Logger::new();
        log.log(LogLevel::Error, format_args!("lost"));
        assert_eq!(log.inner.queue.len(), 0);
    }

    #[test]
    fn test_level_filter() {
        let dir = tempfile::tempdir().unwrap();
        let log = Logger::new();
        log.init(&dir.path().join("app"), 16, LogLevel::Info).unwrap();
        assert!(!log.enabled(LogLevel::Debug));
        assert!(log.enabled(LogLevel::Info));
        assert!(log.enabled(LogLevel::Error));
    }

    #[test]
    fn test_lines_reach_the_daily_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app");
        let log = Logger::new();
        log.init(&base, 16, LogLevel::Info).unwrap();

        log.log(LogLevel::Debug, format_args!("this log will not be recorded"));
        log.log(LogLevel::Info, format_args!("Start record from here"));
        log.log(LogLevel::Warn, format_args!("Today is {}", "Fri"));
        log.log(LogLevel::Error, format_args!("Flush {} times", 1));
        log.stop().unwrap();

        let path = format!("{}_{}", base.display(), today());
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[I] | "));
        assert!(contents.contains("|Start record from here"));
        assert!(contents.contains("|Today is Fri"));
        assert!(contents.contains("[E] | "));
        assert!(contents.contains("|Flush 1 times"));
        assert!(!contents.contains("this log will not be recorded"));
    }

    #[test]
    fn test_rotation_splits_by_embedded_day() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app");
        let log = Logger::new();
        log.init(&base, 16, LogLevel::Info).unwrap();

        log.inner
            .queue
            .push("[I] | 2023-09-22:16:31 |yesterday\n".to_string());
        log.inner
            .queue
            .push("[I] | 2023-09-23:08:00 |today\n".to_string());
        log.stop().unwrap();

        let first = fs::read_to_string(format!("{}_2023-09-22", base.display())).unwrap();
        let second = fs::read_to_string(format!("{}_2023-09-23", base.display())).unwrap();
        assert_eq!(first, "[I] | 2023-09-22:16:31 |yesterday\n");
        assert_eq!(second, "[I] | 2023-09-23:08:00 |today\n");
    }

    #[test]
    fn test_init_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested/deeper/app");
        let log = Logger::new();
        log.init(&base, 16, LogLevel::Info).unwrap();
        log.log(LogLevel::Info, format_args!("created"));
        log.stop().unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
    }
}
