//! JSONL file store for routing records.
//!
//! Each [`RoutingRecord`] is serialized as a single JSON line and appended
//! through a buffered writer. Queries re-read the file on the blocking pool,
//! keeping only matching lines; malformed lines are skipped with a warning.

use async_trait::async_trait;
use conductor_application::ports::telemetry::{TelemetryError, TelemetryStore};
use conductor_domain::{RoutingRecord, TelemetryQuery};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

/// Append-only JSONL telemetry store.
///
/// Writes are serialized through an async mutex. Flushes after every
/// record and on `Drop`.
pub struct JsonlTelemetryStore {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTelemetryStore {
    /// Open (or create) the store at the given path.
    ///
    /// Creates parent directories if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the telemetry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_matching(path: &Path, query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RoutingRecord>(&line) {
                Ok(record) if query.matches(&record) => records.push(record),
                Ok(_) => {}
                Err(e) => warn!(
                    "Skipping malformed telemetry line {} in {}: {}",
                    number + 1,
                    path.display(),
                    e
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl TelemetryStore for JsonlTelemetryStore {
    async fn append(&self, record: RoutingRecord) -> Result<(), TelemetryError> {
        let line = serde_json::to_string(&record)?;
        let mut writer = self.writer.lock().await;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    async fn query(&self, query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
        // Hold the writer lock so a half-written line is never read
        let _writer = self.writer.lock().await;
        let path = self.path.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || {
            let records = Self::read_matching(&path, &query)?;
            Ok::<_, TelemetryError>(query.apply(&records))
        })
        .await
        .map_err(|e| TelemetryError::Unavailable(format!("telemetry read task failed: {}", e)))?
    }
}

impl Drop for JsonlTelemetryStore {
    fn drop(&mut self) {
        let _ = self.writer.get_mut().flush();
    }
}
