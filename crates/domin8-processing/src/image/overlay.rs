use super::{decode, encode_png};
use crate::traits::{ComposedAsset, Compositor};
use crate::ProcessingError;
use async_trait::async_trait;
use bytes::Bytes;
use domin8_core::{Placement, UploadedFile};
use image::{imageops, DynamicImage, GenericImageView};

/// Alpha-composites the logo over a raster asset. Output is always PNG and keeps the
/// asset's dimensions.
#[derive(Debug, Clone, Copy)]
pub struct ImageOverlay {
    placement: Placement,
}

impl ImageOverlay {
    pub fn new(placement: Placement) -> Self {
        Self { placement }
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Apply the logo to an encoded asset and return PNG bytes
    pub fn apply(
        asset_data: &[u8],
        logo_data: &[u8],
        placement: Placement,
    ) -> Result<Vec<u8>, ProcessingError> {
        let asset = decode(asset_data)?;
        let logo = decode(logo_data)?;

        let (asset_width, asset_height) = asset.dimensions();
        let (logo_width, logo_height) = logo.dimensions();

        // Never grow the canvas: shrink an oversized logo to fit, keeping its aspect ratio
        let logo = if logo_width > asset_width || logo_height > asset_height {
            tracing::debug!(
                logo_width,
                logo_height,
                asset_width,
                asset_height,
                "Scaling logo down to fit asset"
            );
            logo.resize(asset_width, asset_height, imageops::FilterType::Lanczos3)
        } else {
            logo
        };
        let logo = logo.to_rgba8();

        let (x, y) = placement.origin((asset_width, asset_height), logo.dimensions());

        let mut canvas = asset.to_rgba8();
        imageops::overlay(&mut canvas, &logo, x, y);

        encode_png(&DynamicImage::ImageRgba8(canvas))
    }
}

#[async_trait]
impl Compositor for ImageOverlay {
    fn name(&self) -> &'static str {
        "image-overlay"
    }

    async fn compose(
        &self,
        asset: &UploadedFile,
        logo: &UploadedFile,
    ) -> Result<ComposedAsset, ProcessingError> {
        let asset_data = asset.read_bytes().await?;
        let logo_data = logo.read_bytes().await?;
        let placement = self.placement;

        let output = tokio::task::spawn_blocking(move || {
            Self::apply(&asset_data, &logo_data, placement)
        })
        .await??;

        Ok(ComposedAsset {
            data: Bytes::from(output),
            extension: "png".to_string(),
        })
    }
}
