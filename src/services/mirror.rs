use crate::services::object_store::ObjectStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// One-way bucket-to-directory synchronization.
///
/// Presence-only: an object is downloaded iff no local file with its base
/// filename exists. Local files are never overwritten or deleted, so a
/// remotely updated photo is not refreshed once a copy landed here.
pub struct PhotoMirror {
    store: Arc<dyn ObjectStore>,
    photo_dir: PathBuf,
}

impl PhotoMirror {
    pub fn new(store: Arc<dyn ObjectStore>, photo_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            photo_dir: photo_dir.into(),
        }
    }

    pub async fn sync(&self) -> Result<()> {
        let keys = self
            .store
            .list_objects("")
            .await
            .context("list photo bucket")?;

        let mut downloaded = 0usize;
        for key in keys {
            let Some(name) = base_filename(&key) else {
                debug!("Skipping directory placeholder {}", key);
                continue;
            };

            let dest = self.photo_dir.join(name);
            if tokio::fs::try_exists(&dest)
                .await
                .with_context(|| format!("stat {}", dest.display()))?
            {
                continue;
            }

            let bytes = self
                .store
                .get_file(&key)
                .await
                .with_context(|| format!("download {}", key))?;
            tokio::fs::write(&dest, &bytes)
                .await
                .with_context(|| format!("write {}", dest.display()))?;
            downloaded += 1;
        }

        if downloaded > 0 {
            info!(
                "Mirrored {} new photo(s) into {}",
                downloaded,
                self.photo_dir.display()
            );
        }
        Ok(())
    }
}

/// Final path segment of an object key; None for directory placeholders.
fn base_filename(key: &str) -> Option<&str> {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => Some(name),
        _ => None,
    }
}
