use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Writes inbound request bodies to uniquely named files in a scratch
/// directory. Unique names, not locking, keep concurrent requests apart.
#[derive(Clone)]
pub struct TempUploadStore {
    dir: PathBuf,
}

impl TempUploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Streams `reader` to a fresh `<uuid>.jpg` under the scratch directory.
    /// A partially written file is removed before the error is returned.
    pub async fn store<R>(&self, mut reader: R) -> Result<TempUpload>
    where
        R: AsyncRead + Unpin + Send,
    {
        let path = self.dir.join(format!("{}.jpg", Uuid::new_v4()));
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("create {}", path.display()))?;

        if let Err(e) = tokio::io::copy(&mut reader, &mut file).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(anyhow::Error::new(e).context("write upload"));
        }

        Ok(TempUpload { path: Some(path) })
    }
}

/// A persisted upload, strictly request-scoped. The handler removes it
/// explicitly on both outcome paths; `Drop` covers early unwinds.
#[derive(Debug)]
pub struct TempUpload {
    path: Option<PathBuf>,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        // Some until remove() consumes the guard
        self.path.as_deref().expect("temp upload already removed")
    }

    pub async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!("Failed to remove temp upload {}: {}", path.display(), e);
            }
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
