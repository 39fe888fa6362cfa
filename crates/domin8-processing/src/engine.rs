use crate::image::ImageOverlay;
use crate::passthrough::Passthrough;
use crate::traits::Compositor;
use crate::validator::CompositionValidator;
use crate::video::VideoOverlay;
use domin8_core::{
    content_type_for_extension, AppError, AssetType, CompositionRequest, CompositionResult, Config,
};

/// Dispatches a composition request to the strategy for its asset type
pub struct CompositionEngine {
    validator: CompositionValidator,
    image: ImageOverlay,
    video: VideoOverlay,
    passthrough: Passthrough,
}

impl CompositionEngine {
    pub fn new(image: ImageOverlay, video: VideoOverlay) -> Self {
        Self {
            validator: CompositionValidator::new(),
            image,
            video,
            passthrough: Passthrough::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ImageOverlay::new(config.image_placement()),
            VideoOverlay::new(
                config.ffmpeg_path().to_string(),
                config.video_overlay_x(),
                config.max_concurrent_transcodes(),
                config.transcode_timeout(),
            ),
        )
    }

    pub fn validate(&self, request: &CompositionRequest) -> Result<(), AppError> {
        self.validator.validate(request).map_err(AppError::from)
    }

    fn strategy(&self, asset_type: AssetType) -> &dyn Compositor {
        match asset_type {
            AssetType::Image => &self.image,
            AssetType::Video => &self.video,
            AssetType::ThreeD => &self.passthrough,
        }
    }

    /// Produce the watermarked asset for `request`, named after `unique_id`
    #[tracing::instrument(skip(self, request), fields(asset_type = %request.asset_type))]
    pub async fn compose(
        &self,
        request: &CompositionRequest,
        unique_id: &str,
    ) -> Result<CompositionResult, AppError> {
        self.validate(request)?;

        let strategy = self.strategy(request.asset_type);
        let start = std::time::Instant::now();
        let composed = strategy
            .compose(&request.asset, &request.logo)
            .await
            .map_err(|e| {
                tracing::error!(strategy = strategy.name(), error = %e, "Composition failed");
                AppError::from(e)
            })?;

        tracing::info!(
            strategy = strategy.name(),
            output_bytes = composed.data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Composition complete"
        );

        Ok(CompositionResult {
            asset_type: request.asset_type,
            unique_id: unique_id.to_string(),
            content_type: content_type_for_extension(&composed.extension).to_string(),
            extension: composed.extension,
            data: composed.data,
        })
    }
}
