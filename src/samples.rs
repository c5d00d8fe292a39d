//! Placeholder images for exercising the converter without real input

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::{ErrorContext, Result};

/// Flat fill color of a sample canvas; the variant decides the channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidColor {
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

impl SolidColor {
    pub const SKY_BLUE: Self = Self::Rgb([135, 206, 235]);
    pub const OPAQUE_RED: Self = Self::Rgba([255, 0, 0, 255]);
    pub const GREEN: Self = Self::Rgb([0, 128, 0]);
    pub const ORANGE: Self = Self::Rgb([255, 165, 0]);

    /// Build a `width` x `height` canvas filled with this color
    pub fn canvas(self, width: u32, height: u32) -> DynamicImage {
        match self {
            Self::Rgb(rgb) => DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb))),
            Self::Rgba(rgba) => {
                DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
            }
        }
    }
}

/// One sample file
#[derive(Debug, Clone, Copy)]
pub struct SampleSpec {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub color: SolidColor,
}

/// The fixed sample set. Formats follow the extensions.
pub const SAMPLES: [SampleSpec; 4] = [
    SampleSpec {
        name: "sample1.jpg",
        width: 500,
        height: 300,
        color: SolidColor::SKY_BLUE,
    },
    SampleSpec {
        name: "sample2.png",
        width: 400,
        height: 400,
        color: SolidColor::OPAQUE_RED,
    },
    SampleSpec {
        name: "sample3.webp",
        width: 300,
        height: 300,
        color: SolidColor::GREEN,
    },
    SampleSpec {
        name: "large_image.jpg",
        width: 4000,
        height: 3000,
        color: SolidColor::ORANGE,
    },
];

/// Create `dir` if needed and write the four sample images into it,
/// replacing files of the same name. Returns the written paths.
pub fn generate_samples(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(SAMPLES.len());
    for sample in SAMPLES {
        let path = dir.join(sample.name);
        sample
            .color
            .canvas(sample.width, sample.height)
            .save(&path)
            .with_file_context(path.clone())?;

        debug!("Wrote sample {:?} ({}x{})", path, sample.width, sample.height);
        written.push(path);
    }

    info!("Sample images created in {:?}", dir);
    Ok(written)
}
