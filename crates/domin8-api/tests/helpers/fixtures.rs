//! Test fixtures: generated raster blobs.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Solid-colour image encoded in `format`
pub fn solid_image(width: u32, height: u32, colour: [u8; 4], format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(colour)));
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .expect("Failed to encode fixture");
    buffer
}

pub fn png(width: u32, height: u32, colour: [u8; 4]) -> Vec<u8> {
    solid_image(width, height, colour, ImageFormat::Png)
}

/// Decode PNG bytes, panicking with context on failure
pub fn decode_png(data: &[u8]) -> RgbaImage {
    assert_eq!(
        image::guess_format(data).expect("Unrecognised image format"),
        ImageFormat::Png
    );
    image::load_from_memory(data)
        .expect("Failed to decode PNG")
        .to_rgba8()
}

/// Opaque bytes standing in for a binary glTF model
pub fn glb_blob() -> Vec<u8> {
    let mut data = b"glTF".to_vec();
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend((0u8..=255).cycle().take(1024));
    data
}
