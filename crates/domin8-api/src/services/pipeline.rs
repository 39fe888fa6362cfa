//! Per-request watermarking pipeline
//!
//! `Received -> Validated -> Composed -> [Encrypted] -> Delivered`, with any state able to
//! fall into `Failed`. On failure every input and any persisted output of the request is
//! removed before the error is returned. On success the inputs are removed once the
//! response body has been sent or dropped (see [`CleanupGuard`]).

use crate::services::delivery::{remove_files, CleanupGuard, DeliveryStream};
use crate::utils::upload::RawUpload;
use bytes::Bytes;
use domin8_core::{
    AppError, AssetType, CompositionRequest, CompositionResult, Config, DeliveryKey, FieldKind,
    Residency, Rgb, SecureDeliveryWrapper, StorageMode, UploadedFile,
};
use domin8_processing::{CompositionEngine, LogoPreprocessor};
use domin8_storage::{names, AssetStore};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Validated,
    Composed,
    Encrypted,
    Delivered,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Received => "received",
            PipelineState::Validated => "validated",
            PipelineState::Composed => "composed",
            PipelineState::Encrypted => "encrypted",
            PipelineState::Delivered => "delivered",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Raw inputs of one `/process` request
#[derive(Debug)]
pub struct Submission {
    pub request_id: String,
    pub asset: RawUpload,
    pub logo: RawUpload,
    pub asset_type: String,
}

/// Everything needed to write the success response
#[derive(Debug)]
pub struct Delivery {
    pub filename: String,
    pub content_type: String,
    pub encryption_key: Option<DeliveryKey>,
    pub content_length: usize,
    pub body: DeliveryStream,
}

/// Pipeline behaviour switches taken from configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub storage_mode: StorageMode,
    pub cleanup_files: bool,
    pub delivery_encryption: bool,
    pub logo_background: Option<Rgb>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            storage_mode: config.storage_mode(),
            cleanup_files: config.cleanup_files(),
            delivery_encryption: config.delivery_encryption(),
            logo_background: config.logo_background(),
        }
    }
}

/// Files written on behalf of one request. Anything still tracked when this is dropped
/// is removed, so a request cancelled mid-pipeline leaves nothing behind.
#[derive(Debug, Default)]
struct RequestFiles {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
}

impl RequestFiles {
    fn tracked(&self) -> Vec<PathBuf> {
        self.inputs.iter().chain(self.output.iter()).cloned().collect()
    }

    /// Stop tracking everything, handing back the inputs
    fn release(&mut self) -> Vec<PathBuf> {
        self.output = None;
        std::mem::take(&mut self.inputs)
    }
}

impl Drop for RequestFiles {
    fn drop(&mut self) {
        let abandoned = self.tracked();
        if !abandoned.is_empty() {
            tracing::warn!(files = abandoned.len(), "Request abandoned, removing its files");
            remove_files(&abandoned);
        }
    }
}

pub struct PipelineOrchestrator {
    settings: PipelineSettings,
    store: AssetStore,
    engine: Arc<CompositionEngine>,
    encryption: SecureDeliveryWrapper,
}

impl PipelineOrchestrator {
    pub fn new(
        settings: PipelineSettings,
        store: AssetStore,
        engine: Arc<CompositionEngine>,
    ) -> Self {
        Self {
            settings,
            store,
            engine,
            encryption: SecureDeliveryWrapper::new(),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[tracing::instrument(skip(self, submission), fields(request_id = %submission.request_id))]
    pub async fn run(&self, submission: Submission) -> Result<Delivery, AppError> {
        let request_id = submission.request_id.clone();
        let mut files = RequestFiles::default();
        let mut state = PipelineState::Received;

        match self.advance(submission, &mut files, &mut state).await {
            Ok(delivery) => Ok(delivery),
            Err(err) => {
                tracing::warn!(
                    request_id = %request_id,
                    failed_in = %state,
                    error = %err,
                    "Pipeline failed"
                );
                self.transition(&mut state, PipelineState::Failed, &request_id);
                self.store.cleanup(&files.tracked()).await;
                files.release();
                Err(err)
            }
        }
    }

    async fn advance(
        &self,
        submission: Submission,
        files: &mut RequestFiles,
        state: &mut PipelineState,
    ) -> Result<Delivery, AppError> {
        // Unknown tags are rejected before anything touches the disk
        let asset_type: AssetType = submission.asset_type.parse()?;

        let asset = self
            .ingest(FieldKind::Media, submission.asset, files)
            .await?;
        let logo = self.ingest(FieldKind::Logo, submission.logo, files).await?;

        let request = CompositionRequest {
            asset,
            logo,
            asset_type,
        };
        self.engine.validate(&request)?;
        self.transition(state, PipelineState::Validated, &submission.request_id);

        let request = self.preprocess_logo(request).await?;

        let unique_id = names::unique_id();
        let result = self.engine.compose(&request, &unique_id).await?;
        self.transition(state, PipelineState::Composed, &submission.request_id);

        let filename = result.output_filename();
        let (payload, content_type, encryption_key) = self.seal(result)?;
        if encryption_key.is_some() {
            self.transition(state, PipelineState::Encrypted, &submission.request_id);
        }

        if self.settings.storage_mode == StorageMode::Persistent {
            let stored_name = if encryption_key.is_some() {
                format!("{}.enc", filename)
            } else {
                filename.clone()
            };
            let path = self.store.write_output(&stored_name, &payload).await?;
            files.output = Some(path);
        }

        // Past this point the delivery guard owns input cleanup and the output is kept
        let inputs = files.release();
        let cleanup = if self.settings.cleanup_files {
            inputs
        } else {
            Vec::new()
        };
        let content_length = payload.len();
        let guard = CleanupGuard::new(submission.request_id.clone(), filename.clone(), cleanup);

        self.transition(state, PipelineState::Delivered, &submission.request_id);
        Ok(Delivery {
            filename,
            content_type,
            encryption_key,
            content_length,
            body: DeliveryStream::new(payload, guard),
        })
    }

    fn transition(&self, state: &mut PipelineState, next: PipelineState, request_id: &str) {
        tracing::debug!(request_id = %request_id, from = %state, to = %next, "Pipeline transition");
        *state = next;
    }

    /// Place an upload on disk (persistent mode) or keep it in memory (transient mode)
    async fn ingest(
        &self,
        field: FieldKind,
        raw: RawUpload,
        files: &mut RequestFiles,
    ) -> Result<UploadedFile, AppError> {
        let size = raw.data.len() as u64;
        let residency = match self.settings.storage_mode {
            StorageMode::Persistent => {
                let path = self.store.save(field, &raw.filename, &raw.data).await?;
                files.inputs.push(path.clone());
                Residency::Disk(path)
            }
            StorageMode::Transient => Residency::Memory(raw.data),
        };

        Ok(UploadedFile {
            field,
            original_filename: raw.filename,
            content_type: raw.content_type,
            size,
            residency,
        })
    }

    async fn preprocess_logo(
        &self,
        mut request: CompositionRequest,
    ) -> Result<CompositionRequest, AppError> {
        let Some(background) = self.settings.logo_background else {
            return Ok(request);
        };

        let original = request.logo.read_bytes().await?;
        let transparent = LogoPreprocessor::new().process(original, background).await?;

        request.logo.size = transparent.len() as u64;
        request.logo.content_type = "image/png".to_string();
        request.logo.residency = Residency::Memory(transparent);
        Ok(request)
    }

    /// Encrypt the composed bytes when delivery encryption is on
    fn seal(
        &self,
        result: CompositionResult,
    ) -> Result<(Bytes, String, Option<DeliveryKey>), AppError> {
        if !self.settings.delivery_encryption {
            return Ok((result.data, result.content_type, None));
        }

        let (payload, key) = self.encryption.encrypt(&result.data)?;
        tracing::debug!(
            plaintext_bytes = result.data.len(),
            payload_bytes = payload.len(),
            "Output encrypted"
        );
        Ok((
            Bytes::from(payload.into_bytes()),
            "application/octet-stream".to_string(),
            Some(key),
        ))
    }
}
