//! Configuration management for resizer

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ResizerError};

pub mod settings;
pub use settings::*;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batch conversion defaults
    pub convert: ConvertConfig,

    /// Sample image generation
    pub samples: SamplesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Defaults for a batch conversion run.
///
/// These are also the defaults offered by the interactive prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,

    /// Target format name (JPEG, PNG, WEBP, GIF, TIFF, BMP)
    pub format: String,

    /// Encoder quality (1-100), ignored by lossless formats
    pub quality: u8,

    pub filter: FilterType,
    pub collision: CollisionPolicy,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("sample_images"),
            output_dir: PathBuf::from("output_images"),
            width: 800,
            height: 600,
            format: "JPEG".to_string(),
            quality: 90,
            filter: FilterType::default(),
            collision: CollisionPolicy::default(),
        }
    }
}

/// Sample image generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplesConfig {
    /// Directory the sample images are written to
    pub dir: PathBuf,

    /// Generate samples before the interactive prompts
    pub generate_on_start: bool,
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("sample_images"),
            generate_on_start: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetFormat {
    Jpeg,
    Png,
    #[serde(rename = "WEBP")]
    WebP,
    Gif,
    Tiff,
    Bmp,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 6] = [
        Self::Jpeg,
        Self::Png,
        Self::WebP,
        Self::Gif,
        Self::Tiff,
        Self::Bmp,
    ];

    /// Canonical upper-case name
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WEBP",
            Self::Gif => "GIF",
            Self::Tiff => "TIFF",
            Self::Bmp => "BMP",
        }
    }

    /// File extension for outputs: always the lowercased format name
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }

    /// Whether the quality parameter affects the encoder
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetFormat {
    type Err = ResizerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == wanted)
            .ok_or_else(|| ResizerError::unsupported_format(wanted, None))
    }
}

/// Resampling filter used for the stretch resize
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    /// Nearest neighbor (fastest, lowest quality)
    Nearest,
    /// Triangle (linear interpolation)
    Triangle,
    /// Catmull-Rom cubic spline
    #[default]
    CatmullRom,
    /// Gaussian blur
    Gaussian,
    /// Lanczos with radius 3
    Lanczos3,
}

impl FromStr for FilterType {
    type Err = ResizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" => Ok(Self::Triangle),
            "catmull-rom" | "catmullrom" | "cubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            other => Err(ResizerError::config(format!("Unknown resize filter: {}", other))),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ResizerError::config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(ResizerError::config(
                "Unsupported config file format. Use .toml or .yaml",
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let content = match extension.to_lowercase().as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| ResizerError::config(format!("TOML serialization failed: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| ResizerError::config(format!("YAML serialization failed: {}", e)))?,
            _ => {
                return Err(ResizerError::config(
                    "Unsupported config file format. Use .toml or .yaml",
                ))
            }
        };

        std::fs::write(&path, content).map_err(|e| {
            ResizerError::config(format!(
                "Failed to write config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.settings()?.validate().map_err(|e| {
            ResizerError::config(format!("Invalid [convert] section: {}", e.user_message()))
        })?;

        if self.logging.level.trim().is_empty() {
            return Err(ResizerError::config("Log level must not be empty"));
        }

        Ok(())
    }

    /// Build the shared job parameters from the `[convert]` section
    pub fn settings(&self) -> Result<ConvertSettings> {
        let format = self.convert.format.parse::<TargetFormat>()?;

        Ok(ConvertSettings::new()
            .size(self.convert.width, self.convert.height)
            .format(format)
            .quality(self.convert.quality)
            .filter(self.convert.filter)
            .collision(self.convert.collision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.convert.input_dir, PathBuf::from("sample_images"));
        assert_eq!(config.convert.output_dir, PathBuf::from("output_images"));
        assert_eq!((config.convert.width, config.convert.height), (800, 600));
        assert_eq!(config.convert.format, "JPEG");
        assert_eq!(config.convert.quality, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.convert.collision, CollisionPolicy::Warn);
        assert_eq!(parsed.convert.filter, FilterType::CatmullRom);

        let yaml_str = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml_str).unwrap();
        assert_eq!(parsed.samples.dir, PathBuf::from("sample_images"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [convert]
            format = "png"
            collision = "fail"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.convert.width, 800);
        assert_eq!(parsed.convert.collision, CollisionPolicy::Fail);
        assert_eq!(parsed.settings().unwrap().format, TargetFormat::Png);
        assert!(parsed.samples.generate_on_start);
    }

    #[test]
    fn test_config_file_io() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();

        let toml_path = dir.path().join("resizer.toml");
        config.to_file(&toml_path).unwrap();
        assert!(Config::from_file(&toml_path).unwrap().validate().is_ok());

        let yaml_path = dir.path().join("resizer.yaml");
        config.to_file(&yaml_path).unwrap();
        assert!(Config::from_file(&yaml_path).unwrap().validate().is_ok());

        assert!(config.to_file(dir.path().join("resizer.ini")).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.convert.format = "XYZ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.convert.quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.convert.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_target_format_names() {
        assert_eq!("jpeg".parse::<TargetFormat>().unwrap(), TargetFormat::Jpeg);
        assert_eq!(" WebP ".parse::<TargetFormat>().unwrap(), TargetFormat::WebP);
        assert!("jpg".parse::<TargetFormat>().is_err());

        for format in TargetFormat::ALL {
            assert_eq!(format.extension(), format.name().to_lowercase());
        }
    }

    #[test]
    fn test_filter_names() {
        assert_eq!("Lanczos3".parse::<FilterType>().unwrap(), FilterType::Lanczos3);
        assert_eq!("cubic".parse::<FilterType>().unwrap(), FilterType::CatmullRom);
        assert!("bogus".parse::<FilterType>().is_err());
    }
}
