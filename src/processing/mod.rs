//! Per-file conversion pipeline
//!
//! A job moves through `Decode → Resize → Normalize → Encode → Write`. The
//! first failing stage ends the job with a [`FailureRecord`]; reaching the end
//! yields a [`SuccessRecord`]. Normalization to RGB cannot fail, so it has no
//! [`JobStage`] of its own. Nothing is written to the output directory
//! until the encoded bytes are complete.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use serde::Serialize;
use tracing::debug;

use crate::config::{ConvertSettings, TargetSize};
use crate::error::{ErrorContext, Result, ResizerError};

pub mod formats;
pub mod naming;
pub mod resize;

pub use formats::*;
pub use naming::*;
pub use resize::*;

/// Pipeline stage at which a job failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Decode,
    Resize,
    Encode,
    Write,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::Resize => "resize",
            Self::Encode => "encode",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// An error tagged with the stage that raised it
#[derive(Debug)]
pub struct StageError {
    pub stage: JobStage,
    pub error: ResizerError,
}

pub type StageResult<T> = std::result::Result<T, StageError>;

/// Attach a [`JobStage`] to a fallible step
pub trait AtStage<T> {
    fn at(self, stage: JobStage) -> StageResult<T>;
}

impl<T, E: Into<ResizerError>> AtStage<T> for std::result::Result<T, E> {
    fn at(self, stage: JobStage) -> StageResult<T> {
        self.map_err(|e| StageError {
            stage,
            error: e.into(),
        })
    }
}

/// One source file plus the batch-wide parameters
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub settings: ConvertSettings,
}

impl ConversionJob {
    pub fn new(source: PathBuf, settings: ConvertSettings) -> Self {
        Self { source, settings }
    }

    /// File name of the source as shown in reports
    pub fn original_name(&self) -> String {
        display_name(&self.source)
    }

    /// Derived output file name
    pub fn output_name(&self) -> Result<String> {
        output_file_name(&self.source, self.settings.format)
    }
}

/// A fully encoded image waiting to be written
#[derive(Debug)]
pub struct EncodedImage {
    pub output_name: String,
    pub size: TargetSize,
    pub bytes: Vec<u8>,
}

/// A job that reached `Written`
#[derive(Debug, Clone, Serialize)]
pub struct SuccessRecord {
    pub original_name: String,
    pub new_name: String,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

/// A job that ended in `Failed`
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub original_name: String,
    pub source: PathBuf,
    pub stage: JobStage,
    pub message: String,
}

/// Terminal state of a job
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Written(SuccessRecord),
    Failed(FailureRecord),
}

impl JobOutcome {
    pub fn failed(job: &ConversionJob, failure: StageError) -> Self {
        Self::Failed(FailureRecord {
            original_name: job.original_name(),
            source: job.source.clone(),
            stage: failure.stage,
            message: failure.error.user_message(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written(_))
    }

    pub fn original_name(&self) -> &str {
        match self {
            Self::Written(record) => &record.original_name,
            Self::Failed(record) => &record.original_name,
        }
    }
}

/// Runs the conversion stages for single files
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingEngine {
    resizer: ImageResizer,
}

impl ProcessingEngine {
    pub fn new(settings: &ConvertSettings) -> Self {
        Self {
            resizer: ImageResizer::with_filter(settings.filter),
        }
    }

    /// Decode, resize, normalize and encode the job's source in memory.
    ///
    /// The source file handle is dropped before this returns, whatever the outcome.
    pub fn prepare(&self, job: &ConversionJob) -> StageResult<EncodedImage> {
        let settings = &job.settings;
        debug!("Preparing {:?} -> {} {}", job.source, settings.size, settings.format);

        let image = decode(&job.source).at(JobStage::Decode)?;
        let resized = self.resizer.stretch(&image, settings.size).at(JobStage::Resize)?;
        drop(image);

        let normalized = normalize_rgb(resized);

        let output_name = job.output_name().at(JobStage::Encode)?;
        let bytes = encode(&normalized, settings.format, settings.quality).at(JobStage::Encode)?;

        Ok(EncodedImage {
            output_name,
            size: TargetSize::new(normalized.width(), normalized.height()),
            bytes,
        })
    }

    /// Write an encoded image into `output_dir`.
    ///
    /// Bytes go to a temporary file in the same directory, which is then renamed
    /// over the final path. A failed write leaves no partial output behind.
    pub fn persist(&self, encoded: &EncodedImage, output_dir: &Path) -> Result<PathBuf> {
        let output_path = output_dir.join(&encoded.output_name);

        let mut builder = tempfile::Builder::new();
        builder.prefix(".resizer-").suffix(".part");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Temp files default to 0600; ask for 0666 so the umask decides, as for a plain create
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        let mut temp = builder
            .tempfile_in(output_dir)
            .map_err(|e| ResizerError::write(e.to_string(), None))
            .with_file_context(output_path.clone())?;

        temp.write_all(&encoded.bytes)
            .map_err(|e| ResizerError::write(e.to_string(), None))
            .with_file_context(output_path.clone())?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ResizerError::write(e.to_string(), None))
            .with_file_context(output_path.clone())?;
        temp.persist(&output_path)?;

        debug!("Wrote {:?} ({} bytes)", output_path, encoded.bytes.len());
        Ok(output_path)
    }
}

/// Decode an image, sniffing the format from its content
pub fn decode(path: &Path) -> Result<DynamicImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    debug!("Decoded {:?}: {}x{} {:?}", path, image.width(), image.height(), image.color());
    Ok(image)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetFormat;
    use image::{ColorType, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_rgba_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_prepare_and_persist() {
        let dir = TempDir::new().unwrap();
        let source = write_rgba_png(dir.path(), "red.png", 40, 40);
        let settings = ConvertSettings::new().size(80, 60);
        let engine = ProcessingEngine::new(&settings);
        let job = ConversionJob::new(source, settings);

        let encoded = engine.prepare(&job).unwrap();
        assert_eq!(encoded.output_name, "red.jpeg");
        assert_eq!(encoded.size, TargetSize::new(80, 60));

        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let path = engine.persist(&encoded, &out_dir).unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (80, 60));
        assert_eq!(written.color(), ColorType::Rgb8);

        // Only the final file remains, no temporary leftovers
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_decode_failure_is_tagged() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "not an image").unwrap();

        let settings = ConvertSettings::new();
        let job = ConversionJob::new(source, settings);
        let failure = ProcessingEngine::new(&settings).prepare(&job).unwrap_err();
        assert_eq!(failure.stage, JobStage::Decode);

        let outcome = JobOutcome::failed(&job, failure);
        assert!(!outcome.is_success());
        assert_eq!(outcome.original_name(), "notes.txt");
    }

    #[test]
    fn test_zero_size_fails_at_resize() {
        let dir = TempDir::new().unwrap();
        let source = write_rgba_png(dir.path(), "red.png", 8, 8);
        let settings = ConvertSettings::new().size(0, 600);
        let job = ConversionJob::new(source, settings);

        let failure = ProcessingEngine::new(&settings).prepare(&job).unwrap_err();
        assert_eq!(failure.stage, JobStage::Resize);
    }

    #[test]
    fn test_extension_does_not_drive_decoding() {
        let dir = TempDir::new().unwrap();
        let png = write_rgba_png(dir.path(), "real.png", 10, 10);
        let misnamed = dir.path().join("misnamed.jpg");
        std::fs::rename(&png, &misnamed).unwrap();

        let settings = ConvertSettings::new().size(5, 5).format(TargetFormat::Png);
        let job = ConversionJob::new(misnamed, settings);
        let encoded = ProcessingEngine::new(&settings).prepare(&job).unwrap();
        assert_eq!(encoded.output_name, "misnamed.png");
    }

    #[test]
    fn test_persist_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let encoded = EncodedImage {
            output_name: "a.jpeg".to_string(),
            size: TargetSize::new(1, 1),
            bytes: vec![1, 2, 3],
        };

        let err = ProcessingEngine::default()
            .persist(&encoded, &dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, ResizerError::WriteError { file: Some(_), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_persisted_output_follows_umask() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let encoded = EncodedImage {
            output_name: "a.jpeg".to_string(),
            size: TargetSize::new(1, 1),
            bytes: vec![1, 2, 3],
        };
        let path = ProcessingEngine::default().persist(&encoded, dir.path()).unwrap();

        let plain = dir.path().join("plain");
        std::fs::write(&plain, b"x").unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&plain));
    }

    #[test]
    fn test_failed_rename_leaves_no_partial_output() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("a.jpeg");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep.txt"), "occupied").unwrap();

        let encoded = EncodedImage {
            output_name: "a.jpeg".to_string(),
            size: TargetSize::new(1, 1),
            bytes: vec![0xFF; 4096],
        };
        let err = ProcessingEngine::default().persist(&encoded, dir.path()).unwrap_err();
        assert!(matches!(err, ResizerError::WriteError { .. }));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["a.jpeg"]);
        assert!(blocker.is_dir());
        assert_eq!(std::fs::read_to_string(blocker.join("keep.txt")).unwrap(), "occupied");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(JobStage::Decode.to_string(), "decode");
        assert_eq!(JobStage::Write.to_string(), "write");
    }
}
