//! Local files written by the prompt pipeline.
//!
//! Two files: the latest model output (overwritten each time) and the user
//! record log, which only ever grows. Records are appended as pretty JSON
//! objects back to back, so the log is a concatenation of documents rather
//! than one JSON array. Nothing here reads the files back.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::ClientError;
use crate::extract::UserRecord;

#[derive(Debug, Clone)]
pub struct RecordStore {
    latest_output: PathBuf,
    user_records: PathBuf,
}

impl RecordStore {
    pub fn new(latest_output: impl Into<PathBuf>, user_records: impl Into<PathBuf>) -> Self {
        Self {
            latest_output: latest_output.into(),
            user_records: user_records.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.latest_output, &config.user_records)
    }

    pub fn latest_output_path(&self) -> &Path {
        &self.latest_output
    }

    pub fn user_records_path(&self) -> &Path {
        &self.user_records
    }

    /// Replace the latest-output file with `text`.
    pub async fn write_latest_output(&self, text: &str) -> Result<(), ClientError> {
        let path = &self.latest_output;
        ensure_parent(path).await?;
        tokio::fs::write(path, text)
            .await
            .map_err(|source| storage(path, source))?;
        debug!(path = %path.display(), bytes = text.len(), "Wrote latest output");
        Ok(())
    }

    /// Append `record` to the user-record log as pretty-printed JSON.
    pub async fn append_user(&self, record: &UserRecord) -> Result<(), ClientError> {
        let path = &self.user_records;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| storage(path, std::io::Error::other(e)))?;

        ensure_parent(path).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| storage(path, source))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|source| storage(path, source))?;
        file.flush().await.map_err(|source| storage(path, source))?;

        debug!(path = %path.display(), user = %record.name(), "Appended user record");
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> Result<(), ClientError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| storage(dir, source)),
        _ => Ok(()),
    }
}

fn storage(path: &Path, source: std::io::Error) -> ClientError {
    ClientError::Storage {
        path: path.to_path_buf(),
        source,
    }
}
