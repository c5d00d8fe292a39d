//! Output format mapping and in-memory encoding

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

use crate::config::TargetFormat;
use crate::error::Result;

impl From<TargetFormat> for image::ImageFormat {
    fn from(format: TargetFormat) -> Self {
        match format {
            TargetFormat::Jpeg => image::ImageFormat::Jpeg,
            TargetFormat::Png => image::ImageFormat::Png,
            TargetFormat::WebP => image::ImageFormat::WebP,
            TargetFormat::Gif => image::ImageFormat::Gif,
            TargetFormat::Tiff => image::ImageFormat::Tiff,
            TargetFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Clamp a requested quality into the encoder's 1-100 range
pub fn effective_quality(format: TargetFormat, quality: u8) -> Option<u8> {
    format.is_lossy().then(|| quality.clamp(1, 100))
}

/// Encode `image` into a new buffer.
///
/// Quality only reaches the JPEG encoder. WEBP goes through the lossless
/// encoder, and PNG, GIF, TIFF and BMP have no quality knob.
pub fn encode(image: &DynamicImage, format: TargetFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    match effective_quality(format, quality) {
        Some(quality) => {
            debug!("Encoding {} at quality {}", format, quality);
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            image.write_with_encoder(encoder)?;
        }
        None => {
            debug!("Encoding {}", format);
            image.write_to(&mut buffer, format.into())?;
        }
    }

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 30])))
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(image::ImageFormat::from(TargetFormat::WebP), image::ImageFormat::WebP);
        assert_eq!(image::ImageFormat::from(TargetFormat::Jpeg), image::ImageFormat::Jpeg);
    }

    #[test]
    fn test_quality_only_for_lossy() {
        assert_eq!(effective_quality(TargetFormat::Jpeg, 85), Some(85));
        assert_eq!(effective_quality(TargetFormat::Jpeg, 0), Some(1));
        assert_eq!(effective_quality(TargetFormat::Png, 85), None);
        assert_eq!(effective_quality(TargetFormat::WebP, 85), None);
    }

    #[test]
    fn test_encoded_bytes_carry_format() {
        let image = solid(16, 8);

        for format in TargetFormat::ALL {
            let bytes = encode(&image, format, 90).unwrap();
            assert_eq!(
                image::guess_format(&bytes).unwrap(),
                image::ImageFormat::from(format),
                "{format}"
            );
        }
    }

    #[test]
    fn test_jpeg_quality_changes_size() {
        let mut noisy = RgbImage::new(64, 64);
        for (x, y, pixel) in noisy.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8]);
        }
        let noisy = DynamicImage::ImageRgb8(noisy);

        let low = encode(&noisy, TargetFormat::Jpeg, 10).unwrap();
        let high = encode(&noisy, TargetFormat::Jpeg, 100).unwrap();
        assert!(low.len() < high.len());
    }
}
