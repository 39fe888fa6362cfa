//! Configuration module
//!
//! Settings are read from the environment once at startup into an explicit `Config`
//! that is passed into every component constructor. Nothing below the setup layer
//! reads the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{Placement, Rgb, StorageMode};

// Common constants
const DEFAULT_PORT: u16 = 3000;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const VIDEO_OVERLAY_X: u32 = 10;
const MAX_CONCURRENT_TRANSCODES: usize = 2;
const TRANSCODE_TIMEOUT_SECS: u64 = 600;

/// Multipart framing allowed on top of the two uploaded files
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub max_upload_size_bytes: usize,
    /// "compact" or "json"
    pub log_format: String,
}

/// Watermarking service configuration
#[derive(Clone, Debug)]
pub struct WatermarkServiceConfig {
    pub base: BaseConfig,
    // Storage layout
    pub logo_upload_dir: PathBuf,
    pub media_upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub public_dir: PathBuf,
    pub storage_mode: StorageMode,
    pub cleanup_files: bool,
    // Composition
    pub image_placement: Placement,
    pub video_overlay_x: u32,
    pub ffmpeg_path: String,
    pub max_concurrent_transcodes: usize,
    pub transcode_timeout_secs: u64,
    pub logo_background: Option<Rgb>,
    // Delivery
    pub delivery_encryption: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<WatermarkServiceConfig>);

impl Config {
    fn inner(&self) -> &WatermarkServiceConfig {
        &self.0
    }

    pub fn new(config: WatermarkServiceConfig) -> Self {
        Config(Box::new(config))
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = WatermarkServiceConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config::new(config))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().base.max_upload_size_bytes
    }

    /// Largest accepted request body; `validate` guarantees it does not overflow
    pub fn request_body_limit_bytes(&self) -> usize {
        request_body_limit(self.max_upload_size_bytes()).unwrap_or(usize::MAX)
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn logo_upload_dir(&self) -> &PathBuf {
        &self.inner().logo_upload_dir
    }

    pub fn media_upload_dir(&self) -> &PathBuf {
        &self.inner().media_upload_dir
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.inner().output_dir
    }

    pub fn public_dir(&self) -> &PathBuf {
        &self.inner().public_dir
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.inner().storage_mode
    }

    pub fn cleanup_files(&self) -> bool {
        self.inner().cleanup_files
    }

    pub fn image_placement(&self) -> Placement {
        self.inner().image_placement
    }

    pub fn video_overlay_x(&self) -> u32 {
        self.inner().video_overlay_x
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    pub fn max_concurrent_transcodes(&self) -> usize {
        self.inner().max_concurrent_transcodes
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().transcode_timeout_secs)
    }

    pub fn logo_background(&self) -> Option<Rgb> {
        self.inner().logo_background
    }

    pub fn delivery_encryption(&self) -> bool {
        self.inner().delivery_encryption
    }
}

/// Whole-request body ceiling: two uploads at the per-file cap plus multipart framing
fn request_body_limit(max_upload_size_bytes: usize) -> Option<usize> {
    max_upload_size_bytes
        .checked_mul(2)?
        .checked_add(MULTIPART_OVERHEAD_BYTES)
}

fn parse_number<T: FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, anyhow::Error> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v.trim().to_lowercase())
        .and_then(|v| match v.as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

impl WatermarkServiceConfig {
    /// Build the configuration from a key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = parse_number(get("PORT"), "PORT", DEFAULT_PORT)?;

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_mb: usize =
            parse_number(get("MAX_UPLOAD_SIZE_MB"), "MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB)?;
        let max_upload_size_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?;

        let base = BaseConfig {
            server_port,
            environment,
            cors_origins,
            max_upload_size_bytes,
            log_format: get("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .to_lowercase(),
        };

        let storage_mode = match get("STORAGE_MODE") {
            Some(mode) => mode.parse().map_err(|e| anyhow::anyhow!("STORAGE_MODE: {}", e))?,
            None => StorageMode::Persistent,
        };

        let image_placement = match get("IMAGE_WATERMARK_PLACEMENT") {
            Some(p) => p
                .parse()
                .map_err(|e| anyhow::anyhow!("IMAGE_WATERMARK_PLACEMENT: {}", e))?,
            None => Placement::West,
        };

        let logo_background = match get("LOGO_TRANSPARENT_BACKGROUND") {
            Some(colour) => Some(
                colour
                    .parse()
                    .map_err(|e| anyhow::anyhow!("LOGO_TRANSPARENT_BACKGROUND: {}", e))?,
            ),
            None => None,
        };

        let config = WatermarkServiceConfig {
            base,
            logo_upload_dir: get("LOGO_UPLOAD_DIR")
                .unwrap_or_else(|| "uploads/logos".to_string())
                .into(),
            media_upload_dir: get("MEDIA_UPLOAD_DIR")
                .unwrap_or_else(|| "uploads/media".to_string())
                .into(),
            output_dir: get("MEDIA_OUTPUT_DIR")
                .unwrap_or_else(|| "outputs".to_string())
                .into(),
            public_dir: get("PUBLIC_DIR")
                .unwrap_or_else(|| "public".to_string())
                .into(),
            storage_mode,
            // Only the literal "false" turns cleanup off
            cleanup_files: get("CLEANUP_FILES").map_or(true, |v| v != "false"),
            image_placement,
            video_overlay_x: parse_number(
                get("VIDEO_OVERLAY_X"),
                "VIDEO_OVERLAY_X",
                VIDEO_OVERLAY_X,
            )?,
            ffmpeg_path: get("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            max_concurrent_transcodes: parse_number(
                get("MAX_CONCURRENT_TRANSCODES"),
                "MAX_CONCURRENT_TRANSCODES",
                MAX_CONCURRENT_TRANSCODES,
            )?,
            transcode_timeout_secs: parse_number(
                get("TRANSCODE_TIMEOUT_SECS"),
                "TRANSCODE_TIMEOUT_SECS",
                TRANSCODE_TIMEOUT_SECS,
            )?,
            logo_background,
            delivery_encryption: parse_bool(get("DELIVERY_ENCRYPTION"), false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if request_body_limit(self.base.max_upload_size_bytes).is_none() {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"));
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be greater than 0"
            ));
        }

        if self.transcode_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "TRANSCODE_TIMEOUT_SECS must be greater than 0"
            ));
        }

        if self.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH must not be empty"));
        }

        let dirs = [
            ("LOGO_UPLOAD_DIR", &self.logo_upload_dir),
            ("MEDIA_UPLOAD_DIR", &self.media_upload_dir),
            ("MEDIA_OUTPUT_DIR", &self.output_dir),
        ];
        for (i, (name, dir)) in dirs.iter().enumerate() {
            for (other_name, other) in dirs.iter().skip(i + 1) {
                if dir == other {
                    return Err(anyhow::anyhow!(
                        "{} and {} must be different directories",
                        name,
                        other_name
                    ));
                }
            }
        }

        Ok(())
    }
}
