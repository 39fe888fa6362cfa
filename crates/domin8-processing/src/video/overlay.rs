//! VideoOverlay - logo overlay through an external ffmpeg process.

use crate::traits::{ComposedAsset, Compositor};
use crate::ProcessingError;
use async_trait::async_trait;
use bytes::Bytes;
use domin8_core::{Residency, UploadedFile};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;

/// Longest stderr excerpt carried into an error
const STDERR_TAIL_BYTES: usize = 4096;

pub struct VideoOverlay {
    ffmpeg_path: String,
    overlay_x: u32,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl VideoOverlay {
    pub fn new(
        ffmpeg_path: String,
        overlay_x: u32,
        max_concurrent: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            ffmpeg_path,
            overlay_x,
            timeout,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    /// Argument vector for one overlay run. The logo is pinned `overlay_x` pixels from
    /// the left edge and centred vertically; audio is kept when present.
    pub fn build_args(&self, asset: &Path, logo: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            asset.to_string_lossy().to_string(),
            "-i".to_string(),
            logo.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            format!("[0:v][1:v]overlay=x={}:y=(H-h)/2[out]", self.overlay_x),
            "-map".to_string(),
            "[out]".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "fast".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    #[tracing::instrument(skip(self, asset, logo, output))]
    async fn run(&self, asset: &Path, logo: &Path, output: &Path) -> Result<(), ProcessingError> {
        let args = self.build_args(asset, logo, output);

        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ProcessingError::Task(e.to_string()))?;

        let start = std::time::Instant::now();
        let child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ProcessingError::Transcode(format!(
                    "Failed to execute ffmpeg at '{}': {}",
                    self.ffmpeg_path, e
                ))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let result = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "FFmpeg timed out");
                return Err(ProcessingError::Timeout(self.timeout));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ProcessingError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr_tail(&stderr)
            )));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video overlay complete"
        );
        Ok(())
    }
}

/// Path ffmpeg can read the upload from, writing in-memory uploads into `scratch`
async fn materialize(
    file: &UploadedFile,
    scratch: &Path,
    stem: &str,
) -> Result<PathBuf, ProcessingError> {
    match &file.residency {
        Residency::Disk(path) => Ok(path.clone()),
        Residency::Memory(data) => {
            let ext = file.extension().unwrap_or_else(|| "bin".to_string());
            let path = scratch.join(format!("{}.{}", stem, ext));
            tokio::fs::write(&path, data).await?;
            Ok(path)
        }
    }
}

fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed;
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    &trimmed[start..]
}

#[async_trait]
impl Compositor for VideoOverlay {
    fn name(&self) -> &'static str {
        "video-overlay"
    }

    async fn compose(
        &self,
        asset: &UploadedFile,
        logo: &UploadedFile,
    ) -> Result<ComposedAsset, ProcessingError> {
        let scratch = tempfile::tempdir()?;

        let asset_path = materialize(asset, scratch.path(), "asset").await?;
        let logo_path = materialize(logo, scratch.path(), "logo").await?;
        let output_path = scratch.path().join("output.mp4");

        self.run(&asset_path, &logo_path, &output_path).await?;

        let data = tokio::fs::read(&output_path).await?;
        Ok(ComposedAsset {
            data: Bytes::from(data),
            extension: "mp4".to_string(),
        })
    }
}
