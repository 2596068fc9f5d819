use crate::error::AppError;
use base64::Engine;
use image::DynamicImage;

/// Renders `image` as a WebP thumbnail data URL for an `img` element
pub fn image_to_data_url(image: &DynamicImage, size: u32) -> Result<String, AppError> {
    let bytes = photo_store::create_thumbnail(image, size)
        .map_err(|e| AppError::ImageProcessing(format!("Thumbnail failed: {}", e)))?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:image/webp;base64,{}", b64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_data_url_prefix() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(3, 3));
        let url = image_to_data_url(&image, 64).unwrap();
        assert!(url.starts_with("data:image/webp;base64,"));
        assert!(url.len() > "data:image/webp;base64,".len());
    }
}
