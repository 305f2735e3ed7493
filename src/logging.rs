//! Diagnostics and the activity log
//!
//! `init_tracing` installs the process-wide subscriber. The activity [`Logger`]
//! keeps a durable per-session record of request outcomes under
//! XDG_DATA_HOME/legal-chat-client/logs/ with the structure:
//! logs/session/YYYY-MM-DD.log

use chrono::{DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing_subscriber::EnvFilter;

use crate::validation::sanitize_filename;

/// Directory used for requests that have no session id yet
const UNSAVED_SESSION: &str = "unsaved";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise only this crate logs at info.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("legal_chat_client=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Sent,
    Succeeded,
    Failed,
    Cancelled,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityKind::Sent => "SENT",
            ActivityKind::Succeeded => "OK",
            ActivityKind::Failed => "FAILED",
            ActivityKind::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// One lifecycle record to be written to disk
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub session: Option<String>,
    pub timestamp: DateTime<Local>,
    pub kind: ActivityKind,
    pub detail: String,
}

impl ActivityEntry {
    pub fn now(session: Option<&str>, kind: ActivityKind, detail: impl Into<String>) -> Self {
        Self {
            session: session.map(str::to_string),
            timestamp: Local::now(),
            kind,
            detail: detail.into(),
        }
    }
}

/// Logger manages the activity log without blocking the controller thread
pub struct Logger {
    /// Channel to send entries to the background thread
    tx: Option<Sender<ActivityEntry>>,
    handle: Option<JoinHandle<()>>,
}

impl Logger {
    /// Create a logger under the platform data directory
    pub fn new() -> Result<Self, String> {
        Self::with_dir(get_log_directory()?)
    }

    /// Create a logger writing below `log_dir` and spawn its writer thread
    pub fn with_dir(log_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let log_dir = log_dir.into();
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;

        let (tx, rx) = unbounded::<ActivityEntry>();
        let handle = thread::Builder::new()
            .name("activity-log".into())
            .spawn(move || run_logger_thread(rx, log_dir))
            .map_err(|e| format!("Failed to spawn logger thread: {}", e))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue an entry (non-blocking)
    pub fn log(&self, entry: ActivityEntry) {
        if let Some(tx) = &self.tx {
            // If send fails, the logger thread has stopped - silently ignore
            let _ = tx.send(entry);
        }
    }

    /// Flush everything queued so far and stop the writer thread
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Background thread that handles all file I/O
fn run_logger_thread(rx: Receiver<ActivityEntry>, log_dir: PathBuf) {
    // Cache of open file handles to avoid reopening files constantly
    let mut file_cache: HashMap<PathBuf, BufWriter<File>> = HashMap::new();

    while let Ok(entry) = rx.recv() {
        if let Err(e) = write_entry(&mut file_cache, &log_dir, &entry) {
            tracing::warn!("Activity log error: {}", e);
        }
    }

    for (_, mut writer) in file_cache.drain() {
        let _ = writer.flush();
    }
}

/// Path of the file an entry belongs in
pub fn entry_path(log_dir: &Path, entry: &ActivityEntry) -> PathBuf {
    let session = entry
        .session
        .as_deref()
        .map(sanitize_filename)
        .unwrap_or_else(|| UNSAVED_SESSION.to_string());
    log_dir
        .join(session)
        .join(format!("{}.log", entry.timestamp.format("%Y-%m-%d")))
}

fn write_entry(
    file_cache: &mut HashMap<PathBuf, BufWriter<File>>,
    log_dir: &Path,
    entry: &ActivityEntry,
) -> Result<(), String> {
    let path = entry_path(log_dir, entry);

    if !file_cache.contains_key(&path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create session directory: {}", e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("Failed to open log file: {}", e))?;
        file_cache.insert(path.clone(), BufWriter::new(file));
    }
    let writer = file_cache
        .get_mut(&path)
        .ok_or_else(|| "Log file handle missing".to_string())?;

    // Format: [HH:MM:SS] <KIND> detail
    writeln!(
        writer,
        "[{}] <{}> {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.kind,
        entry.detail
    )
    .map_err(|e| format!("Failed to write log entry: {}", e))?;

    writer
        .flush()
        .map_err(|e| format!("Failed to flush log: {}", e))
}

/// Get the platform-specific log directory using XDG conventions
fn get_log_directory() -> Result<PathBuf, String> {
    let base = directories::BaseDirs::new().ok_or("Failed to determine home directory")?;
    Ok(base.data_dir().join("legal-chat-client").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(session: Option<&str>, kind: ActivityKind, detail: &str) -> ActivityEntry {
        ActivityEntry {
            session: session.map(str::to_string),
            timestamp: Local.with_ymd_and_hms(2024, 3, 15, 9, 5, 7).unwrap(),
            kind,
            detail: detail.into(),
        }
    }

    #[test]
    fn test_entry_path() {
        let dir = Path::new("/logs");
        assert_eq!(
            entry_path(dir, &entry(Some("session_1"), ActivityKind::Sent, "")),
            PathBuf::from("/logs/session_1/2024-03-15.log")
        );
        assert_eq!(
            entry_path(dir, &entry(None, ActivityKind::Sent, "")),
            PathBuf::from("/logs/unsaved/2024-03-15.log")
        );
        assert_eq!(
            entry_path(dir, &entry(Some("../x"), ActivityKind::Sent, "")),
            PathBuf::from("/logs/_x/2024-03-15.log")
        );
    }

    #[test]
    fn test_entries_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::with_dir(dir.path()).unwrap();
        logger.log(entry(Some("s1"), ActivityKind::Sent, "request 1"));
        logger.log(entry(Some("s1"), ActivityKind::Failed, "request 1: timeout"));
        logger.close();

        let text = fs::read_to_string(dir.path().join("s1").join("2024-03-15.log")).unwrap();
        assert_eq!(
            text,
            "[09:05:07] <SENT> request 1\n[09:05:07] <FAILED> request 1: timeout\n"
        );
    }

    #[test]
    fn test_log_directory_location() {
        let path = get_log_directory().unwrap();
        assert!(path.to_string_lossy().contains("legal-chat-client"));
    }
}
