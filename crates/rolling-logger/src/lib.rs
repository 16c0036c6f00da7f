//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to `<log_dir>/<app_name>.log`
//! and keeps the most recent lines in a circular buffer. The file is
//! compacted back down to the buffer contents whenever it has grown by a
//! full buffer's worth of lines, so it never exceeds twice the capacity.
//!
//! `log` records from library crates are forwarded through `tracing-log`.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::Level;

/// Lines kept when no capacity is given
pub const DEFAULT_CAPACITY: usize = 1000;

static LOGGER: OnceLock<RollingLog> = OnceLock::new();

struct Inner {
    path: PathBuf,
    file: File,
    lines: VecDeque<String>,
    capacity: usize,
    since_compact: usize,
    partial: String,
}

impl Inner {
    fn push_line(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.since_compact += 1;
    }

    fn compact(&mut self) -> io::Result<()> {
        let mut file = File::create(&self.path)?;
        for line in &self.lines {
            writeln!(file, "{}", line)?;
        }
        file.write_all(self.partial.as_bytes())?;
        file.flush()?;
        self.file = OpenOptions::new().append(true).open(&self.path)?;
        self.since_compact = 0;
        Ok(())
    }
}

/// Log sink shared by every writer the subscriber creates
#[derive(Clone)]
pub struct RollingLog {
    inner: Arc<Mutex<Inner>>,
}

impl RollingLog {
    /// Open (or create) `<log_dir>/<app_name>.log`
    pub fn open(log_dir: impl AsRef<Path>, app_name: &str, capacity: usize) -> io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{}.log", app_name));

        let existing = fs::read_to_string(&path).unwrap_or_default();
        let capacity = capacity.max(1);
        let mut inner = Inner {
            file: OpenOptions::new().create(true).append(true).open(&path)?,
            path,
            lines: VecDeque::with_capacity(capacity),
            capacity,
            since_compact: 0,
            partial: String::new(),
        };
        for line in existing.lines() {
            inner.push_line(line.to_string());
        }
        inner.compact()?;

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Most recent lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.lock().lines.iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for RollingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.file.write_all(buf)?;

        inner.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = inner.partial.find('\n') {
            let line: String = inner.partial.drain(..=end).collect();
            inner.push_line(line.trim_end_matches(['\r', '\n']).to_string());
        }

        if inner.since_compact >= inner.capacity {
            inner.compact()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

/// Initialize logging with the default capacity at INFO level
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    init_logger_with(log_dir, app_name, DEFAULT_CAPACITY, Level::INFO)
}

/// Initialize logging; fails if a global subscriber is already installed
pub fn init_logger_with(
    log_dir: PathBuf,
    app_name: &str,
    capacity: usize,
    level: Level,
) -> Result<(), String> {
    let sink = RollingLog::open(&log_dir, app_name, capacity)
        .map_err(|e| format!("Failed to open log in {}: {}", log_dir.display(), e))?;

    let writer = sink.clone();
    tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| format!("Failed to install subscriber: {}", e))?;

    let _ = LOGGER.set(sink);
    tracing::info!(
        "{} logging started at {}",
        app_name,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

/// Log an info line through the installed subscriber
pub fn info(msg: &str) -> Result<(), String> {
    if LOGGER.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    log::info!("{}", msg);
    Ok(())
}

/// Log an error line through the installed subscriber
pub fn error(msg: &str) -> Result<(), String> {
    if LOGGER.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    log::error!("{}", msg);
    Ok(())
}

/// Recent lines of the installed logger (empty before init)
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(RollingLog::recent_lines).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_keeps_last_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RollingLog::open(dir.path(), "test", 3).unwrap();

        for i in 0..5 {
            writeln!(log, "line {}", i).unwrap();
        }

        assert_eq!(log.recent_lines(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_file_is_compacted() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RollingLog::open(dir.path(), "test", 2).unwrap();

        for i in 0..7 {
            writeln!(log, "line {}", i).unwrap();
        }
        log.flush().unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines.len() <= 4, "file kept {} lines", lines.len());
        assert_eq!(lines.last(), Some(&"line 6"));
    }

    #[test]
    fn test_partial_writes_join_into_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RollingLog::open(dir.path(), "test", 10).unwrap();

        log.write_all(b"hel").unwrap();
        log.write_all(b"lo\nwor").unwrap();
        assert_eq!(log.recent_lines(), vec!["hello"]);
        log.write_all(b"ld\n").unwrap();
        assert_eq!(log.recent_lines(), vec!["hello", "world"]);
    }

    #[test]
    fn test_reopen_restores_buffer() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut log = RollingLog::open(dir.path(), "app", 5).unwrap();
            writeln!(log, "before restart").unwrap();
        }
        let log = RollingLog::open(dir.path(), "app", 5).unwrap();
        assert_eq!(log.recent_lines(), vec!["before restart"]);
    }

    #[test]
    fn test_log_records_reach_buffer() {
        let dir = tempfile::tempdir().unwrap();
        init_logger_with(dir.path().to_path_buf(), "bridge", 50, Level::INFO).unwrap();

        info("bridged through log").unwrap();
        log::debug!("below the level");

        let lines = recent_lines();
        assert!(lines.iter().any(|l| l.contains("bridged through log")));
        assert!(!lines.iter().any(|l| l.contains("below the level")));
        assert!(init_logger(dir.path().to_path_buf(), "again").is_err());
    }
}
