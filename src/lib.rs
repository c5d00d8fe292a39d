//! resizer - Batch Image Resizer and Converter
//!
//! Resizes every image in a directory to one fixed size, converts it to one
//! target format and writes the results into an output directory. A bad file
//! is recorded and skipped; it never stops the batch.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use resizer::{BatchConverter, ConvertSettings, NoProgress, TargetFormat};
//! use std::path::Path;
//!
//! # async fn run() -> resizer::Result<()> {
//! let settings = ConvertSettings::new()
//!     .size(800, 600)
//!     .format(TargetFormat::Png);
//!
//! let report = BatchConverter::new(settings)
//!     .convert(Path::new("sample_images"), Path::new("output_images"), &NoProgress)
//!     .await?;
//!
//! println!("{} converted, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod processing;
pub mod prompt;
pub mod samples;

// Re-export commonly used types
pub use batch::{
    BatchConverter, BatchReport, CancelFlag, ConsoleProgressReporter, LineMode, NoProgress,
    ProgressSink,
};
pub use config::{CollisionPolicy, Config, ConvertSettings, FilterType, TargetFormat, TargetSize};
pub use error::{Result, ResizerError};
pub use processing::{JobOutcome, JobStage, ProcessingEngine};
pub use samples::generate_samples;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging.
///
/// `RUST_LOG` overrides `level`. Logs go to stderr so stdout stays free for
/// per-file lines and JSON reports. Calling this more than once is harmless.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if installed.is_ok() {
        info!("resizer v{} initialized", VERSION);
    }
}

/// Initialize logging from the `[logging]` section of a config
pub fn init_with_config(config: &Config) {
    init(&config.logging.level, config.logging.json_format);
}
