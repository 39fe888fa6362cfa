pub mod overlay;
pub mod transparency;

pub use overlay::ImageOverlay;
pub use transparency::LogoPreprocessor;

use crate::ProcessingError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Decode any raster format the `image` crate recognises from its magic bytes
pub(crate) fn decode(data: &[u8]) -> Result<DynamicImage, ProcessingError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;
    reader
        .decode()
        .map_err(|e| ProcessingError::Decode(e.to_string()))
}

pub(crate) fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ProcessingError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    Ok(buffer)
}
