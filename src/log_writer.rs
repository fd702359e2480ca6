use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::LatencyError;
use crate::types::LatencyRecord;

/// Append-only latency log at `<root>/<env>/latency_<timestamp>.log`.
///
/// The path is fixed at construction. The directory is created on the first
/// append and the file is reopened in append mode for every record.
#[derive(Debug)]
pub struct LatencyLog {
    dir: PathBuf,
    path: PathBuf,
    dir_ready: bool,
}

impl LatencyLog {
    pub fn new(root: impl AsRef<Path>, env: &str) -> Self {
        Self::with_timestamp(root, env, Utc::now())
    }

    pub fn with_timestamp(root: impl AsRef<Path>, env: &str, created_at: DateTime<Utc>) -> Self {
        let dir = root.as_ref().join(env);
        let path = dir.join(format!("latency_{}.log", sanitize_timestamp(&created_at)));
        Self {
            dir,
            path,
            dir_ready: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True once the log directory has been created by this writer.
    pub fn is_dir_ready(&self) -> bool {
        self.dir_ready
    }

    pub fn append(&mut self, record: &LatencyRecord) -> Result<(), LatencyError> {
        if !self.dir_ready {
            fs::create_dir_all(&self.dir).map_err(|source| LatencyError::Log {
                path: self.dir.clone(),
                source,
            })?;
            debug!("Log directory ready: {}", self.dir.display());
            self.dir_ready = true;
        }

        let log_err = |source| LatencyError::Log {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(log_err)?;
        file.write_all(record.to_line().as_bytes()).map_err(log_err)?;
        Ok(())
    }
}

/// ISO-8601 timestamp with `:` and `.` replaced so it is safe in a file name.
fn sanitize_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}
