//! Stretch resize and color-mode normalization

use image::DynamicImage;
use tracing::debug;

use crate::config::{FilterType, TargetSize};
use crate::error::Result;

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Gaussian => image::imageops::FilterType::Gaussian,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Resizes images to an exact target size
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer {
    filter: FilterType,
}

impl ImageResizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resizer with a custom filter
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Resize to exactly `size`, ignoring the source aspect ratio.
    ///
    /// Always returns a new buffer, even when the dimensions already match.
    /// Sizes outside [`TargetSize::validate`] are rejected before anything is
    /// allocated.
    pub fn stretch(&self, image: &DynamicImage, size: TargetSize) -> Result<DynamicImage> {
        size.validate()?;

        debug!(
            "Resizing {}x{} -> {} using {:?}",
            image.width(),
            image.height(),
            size,
            self.filter
        );

        if image.width() == size.width && image.height() == size.height {
            return Ok(image.clone());
        }

        Ok(image.resize_exact(size.width, size.height, self.filter.into()))
    }
}

/// Convert to 8-bit RGB. Any alpha channel is dropped, not composited.
pub fn normalize_rgb(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}
