//! Decoded, resized preview images.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};

use super::key::AssetKey;
use crate::error::AssetError;

/// Edge length of cached previews when none is configured.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 200;

/// A preview image, already scaled to the preview resolution.
///
/// Resizing happens once at decode time; the cached value is what every
/// reader gets. Clones share the pixel buffer.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    name: AssetKey,
    image: Arc<RgbaImage>,
}

impl Thumbnail {
    /// Decode image bytes (JPEG or PNG) and scale to `width` × `height`.
    pub fn decode(
        name: &AssetKey,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self, AssetError> {
        if data.is_empty() {
            return Err(AssetError::decode(name.as_str(), "image data is empty"));
        }
        let decoded = image::load_from_memory(data)
            .map_err(|e| AssetError::decode(name.as_str(), format!("image decode error: {}", e)))?;

        let resized = if decoded.width() == width && decoded.height() == height {
            decoded.to_rgba8()
        } else {
            decoded
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgba8()
        };

        Ok(Self {
            name: name.clone(),
            image: Arc::new(resized),
        })
    }

    /// The asset name this thumbnail was loaded for.
    pub fn name(&self) -> &AssetKey {
        &self.name
    }

    /// Pixel data.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode the preview as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, AssetError> {
        let mut cursor = Cursor::new(Vec::new());
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| AssetError::decode(self.name.as_str(), format!("png encode error: {}", e)))?;
        Ok(cursor.into_inner())
    }
}
