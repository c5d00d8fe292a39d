//! Error types and handling for resizer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for resizer operations
pub type Result<T> = std::result::Result<T, ResizerError>;

/// Main error type for resizer operations
#[derive(Debug, Error)]
pub enum ResizerError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Target or source format not supported
    #[error("Unsupported image format: {format} (file: {file:?})")]
    UnsupportedFormat {
        format: String,
        file: Option<PathBuf>,
    },

    /// Invalid resize or encode parameters
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// The output directory could not be created
    #[error("Cannot create output directory {path:?}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input directory could not be listed
    #[error("Cannot read input directory {path:?}: {source}")]
    InputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two sources in one batch derived the same output name
    #[error("Output name {name} already produced from {previous:?} in this batch")]
    OutputCollision { name: String, previous: PathBuf },

    /// Failure while writing an encoded image to disk
    #[error("Write failed: {message} (file: {file:?})")]
    WriteError {
        message: String,
        file: Option<PathBuf>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// System resource errors
    #[error("System resource error: {message}")]
    SystemError { message: String },
}

impl ResizerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S, file: Option<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            file,
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    pub fn output_directory(path: PathBuf, source: std::io::Error) -> Self {
        Self::OutputDirectory { path, source }
    }

    pub fn input_directory(path: PathBuf, source: std::io::Error) -> Self {
        Self::InputDirectory { path, source }
    }

    pub fn collision<S: Into<String>>(name: S, previous: PathBuf) -> Self {
        Self::OutputCollision {
            name: name.into(),
            previous,
        }
    }

    /// Create a new write error
    pub fn write<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::WriteError {
            message: message.into(),
            file,
        }
    }

    /// Create a new system error
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::SystemError {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (the batch can continue with the next file)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // These errors stop the whole run
            Self::OutputDirectory { .. }
            | Self::InputDirectory { .. }
            | Self::ConfigError { .. }
            | Self::SerdeError(_)
            | Self::SystemError { .. } => false,

            // These errors affect a single file
            Self::IoError(_)
            | Self::ImageError(_)
            | Self::UnsupportedFormat { .. }
            | Self::InvalidParameters { .. }
            | Self::OutputCollision { .. }
            | Self::WriteError { .. } => true,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::UnsupportedFormat { file, .. } | Self::WriteError { file, .. } => file.as_ref(),

            Self::OutputDirectory { path, .. } | Self::InputDirectory { path, .. } => Some(path),

            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system error: {}", e),
            Self::ImageError(e) => format!("{}", e),
            Self::UnsupportedFormat { format, .. } => {
                format!(
                    "Unsupported image format: {}. Supported formats: JPEG, PNG, WEBP, GIF, TIFF, BMP",
                    format
                )
            }
            Self::WriteError { message, .. } => format!("Could not write output: {}", message),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResizerError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for ResizerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

impl From<tempfile::PersistError> for ResizerError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::write(err.error.to_string(), Some(err.file.path().to_path_buf()))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ResizerError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();

            match &mut error {
                ResizerError::UnsupportedFormat { file: ref mut f, .. }
                | ResizerError::WriteError { file: ref mut f, .. } => {
                    if f.is_none() {
                        *f = Some(file);
                    }
                }
                _ => {}
            }

            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = ResizerError::config("test message");
        assert!(matches!(err, ResizerError::ConfigError { .. }));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(ResizerError::invalid_parameters("zero width").is_recoverable());
        assert!(ResizerError::collision("a.jpeg", PathBuf::from("a.png")).is_recoverable());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!ResizerError::output_directory(PathBuf::from("out"), io).is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        let err = ResizerError::unsupported_format("XYZ", None);
        let msg = err.user_message();
        assert!(msg.contains("Unsupported image format: XYZ"));
        assert!(msg.contains("JPEG, PNG, WEBP"));
    }

    #[test]
    fn test_file_context() {
        let result: Result<()> = Err(ResizerError::write("disk full", None));
        let err = result
            .with_file_context(Path::new("out/a.jpeg").to_path_buf())
            .unwrap_err();

        assert_eq!(err.file_path(), Some(&PathBuf::from("out/a.jpeg")));
    }

    #[test]
    fn test_file_context_keeps_existing_path() {
        let result: Result<()> = Err(ResizerError::unsupported_format(
            "XYZ",
            Some(PathBuf::from("first.png")),
        ));
        let err = result
            .with_file_context(PathBuf::from("second.png"))
            .unwrap_err();

        assert_eq!(err.file_path(), Some(&PathBuf::from("first.png")));
    }
}
