//! Read side of the durable output namespace

use crate::names::validate_name;
use crate::{StorageError, StorageResult};
use domin8_core::{content_type_for_extension, StoredOutputEntry};
use std::path::{Path, PathBuf};
use tokio::fs;

/// URL prefix under which persisted outputs are served
pub const OUTPUTS_URL_PREFIX: &str = "/outputs";

/// An output opened for streaming back to a caller
#[derive(Debug)]
pub struct OpenedOutput {
    pub name: String,
    pub file: fs::File,
    pub size: u64,
    pub content_type: &'static str,
}

/// Enumerates and opens persisted outputs. Holds no state besides the directory,
/// so every listing reflects the directory as it is now.
#[derive(Clone, Debug)]
pub struct OutputCatalog {
    output_dir: PathBuf,
}

impl OutputCatalog {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        OutputCatalog {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Regular, non-hidden files in the output directory, sorted by name
    pub async fn list(&self) -> StorageResult<Vec<StoredOutputEntry>> {
        let mut entries = fs::read_dir(&self.output_dir).await.map_err(|e| {
            StorageError::ReadFailed(format!(
                "Failed to read output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let mut outputs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            outputs.push(StoredOutputEntry {
                url: format!("{}/{}", OUTPUTS_URL_PREFIX, name),
                name,
            });
        }

        outputs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(outputs)
    }

    /// Open a persisted output by name
    pub async fn open(&self, name: &str) -> StorageResult<OpenedOutput> {
        validate_name(name)?;
        let path = self.output_dir.join(name);

        let metadata = match fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(StorageError::NotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        Ok(OpenedOutput {
            name: name.to_string(),
            file,
            size: metadata.len(),
            content_type: content_type_for_extension(extension),
        })
    }
}
