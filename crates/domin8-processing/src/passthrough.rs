use crate::traits::{ComposedAsset, Compositor};
use crate::ProcessingError;
use async_trait::async_trait;
use domin8_core::UploadedFile;

/// Extensions kept verbatim on passthrough output
const MODEL_EXTENSIONS: &[&str] = &["glb", "gltf", "obj", "stl", "fbx", "usdz", "ply"];
const DEFAULT_MODEL_EXTENSION: &str = "glb";

/// Returns the asset byte-for-byte. Used for 3D models, which have no watermark
/// compositor; the logo is accepted and ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Passthrough {
    pub fn new() -> Self {
        Self
    }

    pub fn output_extension(asset: &UploadedFile) -> String {
        asset
            .extension()
            .filter(|ext| MODEL_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or_else(|| DEFAULT_MODEL_EXTENSION.to_string())
    }
}

#[async_trait]
impl Compositor for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    async fn compose(
        &self,
        asset: &UploadedFile,
        _logo: &UploadedFile,
    ) -> Result<ComposedAsset, ProcessingError> {
        Ok(ComposedAsset {
            data: asset.read_bytes().await?,
            extension: Self::output_extension(asset),
        })
    }
}
