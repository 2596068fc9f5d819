use crate::error::StoreError;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat};
use std::io::{Cursor, Write};

/// JPEG quality used for every stored photo
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Encodes `image` as JPEG into `writer`. JPEG has no alpha channel, so the
/// image is flattened to RGB first.
pub fn encode_jpeg<W: Write>(
    image: &DynamicImage,
    writer: W,
    quality: u8,
) -> Result<(), StoreError> {
    let rgb = image.to_rgb8();
    let mut encoder = JpegEncoder::new_with_quality(writer, quality);
    encoder.encode_image(&rgb)?;
    Ok(())
}

/// Encodes `image` as JPEG into a new buffer
pub fn encode_jpeg_bytes(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, StoreError> {
    let mut buffer = Cursor::new(Vec::new());
    encode_jpeg(image, &mut buffer, quality)?;
    Ok(buffer.into_inner())
}

/// Creates a WebP thumbnail fitting into `size`x`size` for gallery grids
pub fn create_thumbnail(image: &DynamicImage, size: u32) -> Result<Vec<u8>, StoreError> {
    let small = if image.width() > size || image.height() > size {
        image.resize(size, size, FilterType::Lanczos3)
    } else {
        image.clone()
    };

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(small.to_rgba8()).write_to(&mut buffer, ImageFormat::WebP)?;

    log::debug!(
        "Thumbnail {}x{} -> {}x{}",
        image.width(),
        image.height(),
        small.width(),
        small.height()
    );
    Ok(buffer.into_inner())
}
