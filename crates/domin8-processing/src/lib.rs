//! Domin8 Processing Library
//!
//! Watermark composition for every supported asset type, plus logo pre-processing.
//! Raster work is done in-process with the `image` crate; video work is delegated to
//! an external `ffmpeg` binary; 3D assets pass through untouched.

pub mod engine;
pub mod error;
pub mod image;
pub mod passthrough;
pub mod traits;
pub mod validator;
pub mod video;

// Re-export commonly used types
pub use engine::CompositionEngine;
pub use error::ProcessingError;
pub use crate::image::{ImageOverlay, LogoPreprocessor};
pub use passthrough::Passthrough;
pub use traits::{ComposedAsset, Compositor};
pub use validator::{CompositionValidator, ValidationError};
pub use video::VideoOverlay;
