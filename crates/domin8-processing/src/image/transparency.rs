use super::{decode, encode_png};
use crate::ProcessingError;
use bytes::Bytes;
use domin8_core::Rgb;
use image::{DynamicImage, Rgba};

/// Makes one background colour of a logo fully transparent
#[derive(Debug, Clone, Copy, Default)]
pub struct LogoPreprocessor;

impl LogoPreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Flatten the logo onto `background`, then mark every pixel equal to the
    /// background transparent and every other pixel opaque. Returns PNG bytes.
    pub fn make_transparent(data: &[u8], background: Rgb) -> Result<Vec<u8>, ProcessingError> {
        let mut img = decode(data)?.to_rgba8();
        let bg = [background.r, background.g, background.b];

        for pixel in img.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let flat = [
                flatten(r, bg[0], a),
                flatten(g, bg[1], a),
                flatten(b, bg[2], a),
            ];
            let alpha = if flat == bg { 0 } else { 255 };
            *pixel = Rgba([flat[0], flat[1], flat[2], alpha]);
        }

        encode_png(&DynamicImage::ImageRgba8(img))
    }

    /// Off-thread variant for use from request handlers
    pub async fn process(&self, data: Bytes, background: Rgb) -> Result<Bytes, ProcessingError> {
        let output =
            tokio::task::spawn_blocking(move || Self::make_transparent(&data, background))
                .await??;
        Ok(Bytes::from(output))
    }
}

/// Composite one channel over an opaque background
fn flatten(channel: u8, background: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((channel as u32 * a + background as u32 * (255 - a) + 127) / 255) as u8
}
