//! Composition strategy interface

use crate::ProcessingError;
use async_trait::async_trait;
use bytes::Bytes;
use domin8_core::UploadedFile;

/// Bytes produced by a strategy, with the extension they should be delivered under
#[derive(Debug, Clone)]
pub struct ComposedAsset {
    pub data: Bytes,
    pub extension: String,
}

/// One way of putting a logo onto an asset
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    async fn compose(
        &self,
        asset: &UploadedFile,
        logo: &UploadedFile,
    ) -> Result<ComposedAsset, ProcessingError>;
}
