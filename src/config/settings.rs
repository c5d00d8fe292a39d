//! Shared job parameters for a batch conversion

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{FilterType, TargetFormat};
use crate::error::{Result, ResizerError};

/// Largest accepted width or height
pub const MAX_DIMENSION: u32 = 32768;

/// Largest accepted output area, in pixels
pub const MAX_PIXELS: u64 = 100_000_000;

/// Exact output dimensions. Sources are stretched to fit, aspect ratio is not kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Check that both sides are non-zero and the buffer stays allocatable
    pub fn validate(&self) -> Result<()> {
        let Self { width, height } = *self;
        if width == 0 || width > MAX_DIMENSION || height == 0 || height > MAX_DIMENSION {
            return Err(ResizerError::invalid_parameters(format!(
                "Dimensions must be between 1-{}, got {}x{}",
                MAX_DIMENSION, width, height
            )));
        }
        if self.pixels() > MAX_PIXELS {
            return Err(ResizerError::invalid_parameters(format!(
                "Output size {} exceeds the limit of {} pixels",
                self, MAX_PIXELS
            )));
        }
        Ok(())
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What to do when two sources in one batch map to the same output name
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Replace the earlier output silently
    Overwrite,
    /// Log a warning, then replace the earlier output
    #[default]
    Warn,
    /// Keep the earlier output and record a failure for the later source
    Fail,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = ResizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            other => Err(ResizerError::config(format!(
                "Unknown collision policy: {} (expected overwrite, warn or fail)",
                other
            ))),
        }
    }
}

/// Parameters shared by every job in a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvertSettings {
    pub size: TargetSize,
    pub format: TargetFormat,
    pub quality: u8,
    pub filter: FilterType,
    pub collision: CollisionPolicy,
}

impl ConvertSettings {
    /// 800x600 JPEG at quality 90
    pub fn new() -> Self {
        Self {
            size: TargetSize::default(),
            format: TargetFormat::Jpeg,
            quality: 90,
            filter: FilterType::default(),
            collision: CollisionPolicy::default(),
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = TargetSize::new(width, height);
        self
    }

    pub fn format(mut self, format: TargetFormat) -> Self {
        self.format = format;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn collision(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    /// Validate the settings.
    ///
    /// The batch converter does not call this: a bad size surfaces as a
    /// per-file resize failure there. Config files and CLI flags are checked up front.
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ResizerError::invalid_parameters(format!(
                "Quality must be between 1-100, got {}",
                self.quality
            )));
        }

        self.size.validate()
    }
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_builder() {
        let settings = ConvertSettings::new()
            .size(320, 240)
            .format(TargetFormat::Png)
            .quality(75)
            .filter(FilterType::Nearest)
            .collision(CollisionPolicy::Fail);

        assert_eq!(settings.size, TargetSize::new(320, 240));
        assert_eq!(settings.format, TargetFormat::Png);
        assert_eq!(settings.quality, 75);
        assert_eq!(settings.filter, FilterType::Nearest);
        assert_eq!(settings.collision, CollisionPolicy::Fail);
    }

    #[test]
    fn test_default_settings() {
        let settings = ConvertSettings::default();
        assert_eq!(settings.size.to_string(), "800x600");
        assert_eq!(settings.format, TargetFormat::Jpeg);
        assert_eq!(settings.quality, 90);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        assert!(ConvertSettings::new().quality(0).validate().is_err());
        assert!(ConvertSettings::new().quality(101).validate().is_err());
        assert!(ConvertSettings::new().size(0, 600).validate().is_err());
        assert!(ConvertSettings::new().size(800, MAX_DIMENSION + 1).validate().is_err());
        assert!(ConvertSettings::new().quality(1).size(1, 1).validate().is_ok());
    }

    #[test]
    fn test_size_pixel_limit() {
        assert!(TargetSize::new(10_000, 10_000).validate().is_ok());
        assert!(TargetSize::new(MAX_DIMENSION, MAX_DIMENSION).validate().is_err());
        assert!(TargetSize::new(u32::MAX, u32::MAX).validate().is_err());
        assert_eq!(TargetSize::new(u32::MAX, 2).pixels(), u64::from(u32::MAX) * 2);
    }

    #[test]
    fn test_collision_policy_parsing() {
        assert_eq!("WARN".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Warn);
        assert_eq!("overwrite".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Overwrite);
        assert!("skip".parse::<CollisionPolicy>().is_err());
    }
}
