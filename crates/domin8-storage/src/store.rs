use crate::names::{random_token, upload_name, validate_name};
use crate::{StorageError, StorageResult};
use domin8_core::{Config, FieldKind};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Subdirectory of the output directory holding partially written outputs
pub const STAGING_DIR: &str = ".staging";

/// Filesystem locations for uploaded inputs and produced outputs
#[derive(Clone, Debug)]
pub struct AssetStore {
    logo_dir: PathBuf,
    media_dir: PathBuf,
    output_dir: PathBuf,
}

impl AssetStore {
    pub fn new(
        logo_dir: impl Into<PathBuf>,
        media_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        AssetStore {
            logo_dir: logo_dir.into(),
            media_dir: media_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.logo_upload_dir(),
            config.media_upload_dir(),
            config.output_dir(),
        )
    }

    /// Ephemeral directory for uploads arriving in the given field
    pub fn upload_dir(&self, kind: FieldKind) -> &Path {
        match kind {
            FieldKind::Media => &self.media_dir,
            FieldKind::Logo => &self.logo_dir,
        }
    }

    /// Durable directory for produced outputs
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.output_dir.join(STAGING_DIR)
    }

    /// Create every directory the pipeline writes into.
    ///
    /// Existing directories are fine. A creation failure is logged and startup
    /// continues; the first request touching that directory will fail instead.
    pub async fn bootstrap(&self) {
        let staging = self.staging_dir();
        let dirs = [
            self.logo_dir.as_path(),
            self.media_dir.as_path(),
            self.output_dir.as_path(),
            staging.as_path(),
        ];

        for dir in dirs {
            match fs::create_dir_all(dir).await {
                Ok(()) => tracing::debug!(path = %dir.display(), "Directory ready"),
                Err(e) => tracing::error!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to create directory"
                ),
            }
        }
    }

    /// Persist an uploaded input under a fresh collision-resistant name
    pub async fn save(
        &self,
        kind: FieldKind,
        original_filename: &str,
        data: &[u8],
    ) -> StorageResult<PathBuf> {
        let dir = self.upload_dir(kind);
        fs::create_dir_all(dir).await?;

        let path = dir.join(upload_name(original_filename));
        write_synced(&path, data).await?;

        tracing::debug!(
            path = %path.display(),
            field = kind.field_name(),
            size_bytes = data.len(),
            "Upload saved"
        );

        Ok(path)
    }

    /// Location an output with this name occupies once promoted
    pub fn output_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self.output_dir.join(name))
    }

    /// Write an output into staging, then promote it into the output directory by rename.
    ///
    /// Readers of the output directory never observe a partially written file.
    pub async fn write_output(&self, name: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let final_path = self.output_path(name)?;
        let staging = self.staging_dir();
        fs::create_dir_all(&staging).await?;

        let staged = staging.join(format!("{}.{}.part", name, random_token(6)));
        let start = std::time::Instant::now();

        if let Err(e) = write_synced(&staged, data).await {
            let _ = fs::remove_file(&staged).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&staged, &final_path).await {
            let _ = fs::remove_file(&staged).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to promote {} into {}: {}",
                staged.display(),
                final_path.display(),
                e
            )));
        }

        tracing::info!(
            path = %final_path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Output persisted"
        );

        Ok(final_path)
    }

    /// Best-effort removal. Missing files are ignored, other failures are logged.
    /// Returns how many files were actually removed.
    pub async fn cleanup(&self, locations: &[PathBuf]) -> usize {
        let mut removed = 0;
        for path in locations {
            match fs::remove_file(path).await {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(path = %path.display(), "Removed file");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Cleanup failed"
                ),
            }
        }
        removed
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut file = fs::File::create(path).await.map_err(|e| {
        StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
    })?;

    file.write_all(data).await.map_err(|e| {
        StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
    })?;

    file.sync_all().await.map_err(|e| {
        StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> AssetStore {
        AssetStore::new(
            dir.path().join("uploads/logos"),
            dir.path().join("uploads/media"),
            dir.path().join("outputs"),
        )
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.bootstrap().await;
        store.bootstrap().await;

        assert!(store.upload_dir(FieldKind::Logo).is_dir());
        assert!(store.upload_dir(FieldKind::Media).is_dir());
        assert!(store.staging_dir().is_dir());
    }

    #[tokio::test]
    async fn test_save_uses_field_directory_and_unique_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.bootstrap().await;

        let first = store.save(FieldKind::Media, "clip.mp4", b"one").await.unwrap();
        let second = store.save(FieldKind::Media, "clip.mp4", b"two").await.unwrap();
        let logo = store.save(FieldKind::Logo, "logo.png", b"logo").await.unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with(store.upload_dir(FieldKind::Media)));
        assert!(logo.starts_with(store.upload_dir(FieldKind::Logo)));
        assert_eq!(first.extension().unwrap(), "mp4");
        assert_eq!(tokio::fs::read(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_write_output_promotes_and_leaves_staging_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.bootstrap().await;

        let path = store
            .write_output("domin8_1-abc.png", b"png bytes")
            .await
            .unwrap();

        assert_eq!(path, store.output_dir().join("domin8_1-abc.png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png bytes");
        let mut staging = tokio::fs::read_dir(store.staging_dir()).await.unwrap();
        assert!(staging.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_output_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.bootstrap().await;

        let result = store.write_output("../escape.png", b"x").await;
        assert!(matches!(result, Err(StorageError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.bootstrap().await;

        let saved = store.save(FieldKind::Logo, "logo.png", b"x").await.unwrap();
        let missing = store.upload_dir(FieldKind::Logo).join("never-existed.png");

        let removed = store.cleanup(&[saved.clone(), missing]).await;
        assert_eq!(removed, 1);
        assert!(!saved.exists());
    }
}
