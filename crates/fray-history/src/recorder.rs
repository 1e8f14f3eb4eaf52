use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use fray_core::operation::{Action, Operation};
use serde::Serialize;
use tracing::debug;

/// Appends call/return pairs to a history file, one JSON object per line.
/// Every worker task shares one `Recorder` for the whole run, so writes go
/// through a mutex rather than a per-worker file handle.
pub struct Recorder {
    path: PathBuf,
    file: Mutex<File>,
}

impl Recorder {
    /// Creates (truncating) the history file at `path`, creating parent
    /// directories as needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating history directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("creating history file {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_request<T: Serialize>(&self, proc: i64, request: &T) -> Result<()> {
        self.record(proc, Action::Call, request)
    }

    pub fn record_response<T: Serialize>(&self, proc: i64, response: &T) -> Result<()> {
        self.record(proc, Action::Return, response)
    }

    fn record<T: Serialize>(&self, proc: i64, action: Action, value: &T) -> Result<()> {
        let data = serde_json::to_value(value).context("encoding operation payload")?;
        let op = Operation { action, proc, data };
        let mut line = serde_json::to_vec(&op).context("encoding history line")?;
        line.push(b'\n');

        let mut file = self.file.lock().expect("history recorder mutex poisoned");
        file.write_all(&line)
            .with_context(|| format!("appending to history file {}", self.path.display()))?;
        debug!(proc, ?action, "recorded history event");
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        let mut file = self.file.lock().expect("history recorder mutex poisoned");
        file.flush().context("flushing history file")
    }
}
