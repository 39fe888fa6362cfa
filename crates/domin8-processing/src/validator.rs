use domin8_core::{AppError, AssetType, CompositionRequest, UploadedFile};

/// Reasons a composition request is rejected before any work is done
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty file in field '{0}'")]
    EmptyFile(&'static str),

    #[error("Logo must be an image, got '{0}'")]
    LogoNotImage(String),

    #[error("File type mismatch: expected {expected}/*, got '{actual}'")]
    MimeMismatch {
        expected: &'static str,
        actual: String,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Cross-checks the declared asset type against the declared MIME types.
///
/// Only the declared types are checked. Content is never sniffed; a file that lies
/// about its type fails later, during composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionValidator;

impl CompositionValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, request: &CompositionRequest) -> Result<(), ValidationError> {
        self.validate_non_empty(&request.asset)?;
        self.validate_non_empty(&request.logo)?;
        self.validate_logo(&request.logo)?;
        self.validate_asset(&request.asset, request.asset_type)
    }

    fn validate_non_empty(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        if file.size == 0 {
            return Err(ValidationError::EmptyFile(file.field.field_name()));
        }
        Ok(())
    }

    pub fn validate_logo(&self, logo: &UploadedFile) -> Result<(), ValidationError> {
        if logo.mime_class() != "image" {
            return Err(ValidationError::LogoNotImage(logo.mime_type()));
        }
        Ok(())
    }

    fn validate_asset(
        &self,
        asset: &UploadedFile,
        asset_type: AssetType,
    ) -> Result<(), ValidationError> {
        // 3D assets are opaque blobs with no reliable MIME type
        let Some(expected) = asset_type.expected_asset_class() else {
            return Ok(());
        };

        if asset.mime_class() != expected {
            return Err(ValidationError::MimeMismatch {
                expected,
                actual: asset.mime_type(),
            });
        }
        Ok(())
    }
}
