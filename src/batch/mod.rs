//! Sequential batch conversion of a directory

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use console::style;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::ConvertSettings;
use crate::error::{Result, ResizerError};
use crate::processing::{
    display_name, AtStage, ConversionJob, JobOutcome, JobStage, OutputNames, ProcessingEngine,
    StageError, StageResult, SuccessRecord,
};

pub mod progress;

pub use progress::*;

/// Cooperative cancellation, checked between files
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Converts every regular file of a directory, one at a time
pub struct BatchConverter {
    settings: ConvertSettings,
    engine: ProcessingEngine,
    cancel: CancelFlag,
}

impl BatchConverter {
    pub fn new(settings: ConvertSettings) -> Self {
        Self {
            engine: ProcessingEngine::new(&settings),
            settings,
            cancel: CancelFlag::new(),
        }
    }

    /// Share a cancellation flag with the caller
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &ConvertSettings {
        &self.settings
    }

    /// Convert every regular file in `input_dir` into `output_dir`.
    ///
    /// Only directory-level failures are returned as errors. Each file ends up
    /// as exactly one [`JobOutcome`] in the report.
    pub async fn convert(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<BatchReport> {
        let start_time = Instant::now();

        fs::create_dir_all(output_dir)
            .await
            .map_err(|e| ResizerError::output_directory(output_dir.to_path_buf(), e))?;

        let sources = list_sources(input_dir).await?;
        info!(
            "Converting {} file(s) from {:?} to {:?} ({} {}, quality {})",
            sources.len(),
            input_dir,
            output_dir,
            self.settings.size,
            self.settings.format,
            self.settings.quality
        );

        progress.update(&ProgressUpdate::Started {
            total_files: sources.len(),
        });

        let mut names = OutputNames::new(self.settings.collision);
        let mut report = BatchReport::new(input_dir, output_dir, self.settings);

        for (index, source) in sources.iter().enumerate() {
            if self.cancel.is_cancelled() {
                let remaining = sources.len() - index;
                warn!("Batch cancelled with {} file(s) left", remaining);
                progress.update(&ProgressUpdate::Cancelled { remaining });
                report.cancelled = true;
                break;
            }

            progress.update(&ProgressUpdate::FileStarted {
                filename: display_name(source),
            });

            let job = ConversionJob::new(source.clone(), self.settings);
            let outcome = self.run_job(job, output_dir, &mut names).await?;

            progress.update(&ProgressUpdate::FileCompleted {
                outcome: outcome.clone(),
            });
            report.outcomes.push(outcome);
        }

        report.elapsed = start_time.elapsed();
        debug!("{} distinct output name(s) written", names.len());

        if !report.cancelled {
            progress.update(&ProgressUpdate::BatchCompleted {
                succeeded: report.succeeded(),
                failed: report.failed(),
            });
        }

        info!(
            "Batch finished in {:.2}s: {} succeeded, {} failed",
            report.elapsed.as_secs_f64(),
            report.succeeded(),
            report.failed()
        );

        Ok(report)
    }

    /// Run one job to a terminal state.
    ///
    /// The collision check and the write form one step, so a name is only
    /// recorded once its file is on disk.
    async fn run_job(
        &self,
        job: ConversionJob,
        output_dir: &Path,
        names: &mut OutputNames,
    ) -> Result<JobOutcome> {
        let engine = self.engine;
        let prepared = {
            let job = job.clone();
            run_blocking(JobStage::Decode, move || engine.prepare(&job)).await?
        };

        let encoded = match prepared {
            Ok(encoded) => encoded,
            Err(failure) => {
                debug!("{:?} failed at {}: {}", job.source, failure.stage, failure.error);
                return Ok(JobOutcome::failed(&job, failure));
            }
        };

        if let Err(failure) = names.check(&encoded.output_name, &job.source).at(JobStage::Write) {
            return Ok(JobOutcome::failed(&job, failure));
        }

        let written = {
            let output_dir = output_dir.to_path_buf();
            run_blocking(JobStage::Write, move || {
                engine
                    .persist(&encoded, &output_dir)
                    .map(|path| (path, encoded))
                    .at(JobStage::Write)
            })
            .await?
        };

        match written {
            Ok((output_path, encoded)) => {
                names.record(encoded.output_name.clone(), job.source.clone());
                Ok(JobOutcome::Written(SuccessRecord {
                    original_name: job.original_name(),
                    new_name: encoded.output_name,
                    output_path,
                    width: encoded.size.width,
                    height: encoded.size.height,
                    bytes: encoded.bytes.len() as u64,
                }))
            }
            Err(failure) => Ok(JobOutcome::failed(&job, failure)),
        }
    }
}

/// Run one blocking stage on the blocking pool.
///
/// A panic inside `work` becomes a failure at `stage` for this file only. Only a
/// cancelled task is an error.
async fn run_blocking<T, F>(stage: JobStage, work: F) -> Result<StageResult<T>>
where
    F: FnOnce() -> StageResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => Ok(result),
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("Worker panicked during {}: {}", stage, message);
            Ok(Err(StageError {
                stage,
                error: ResizerError::system(format!("Worker panicked: {}", message)),
            }))
        }
        Err(e) => Err(ResizerError::system(format!("Task join error: {}", e))),
    }
}

/// List the regular files of `dir`, sorted by name.
///
/// Symlinks count when they point at a regular file. Directories, broken links
/// and special files are skipped.
pub async fn list_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ResizerError::input_directory(dir.to_path_buf(), e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ResizerError::input_directory(dir.to_path_buf(), e))?
    {
        let path = entry.path();
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => debug!("Skipping non-file entry {:?}", path),
            Err(e) => debug!("Skipping unreadable entry {:?}: {}", path, e),
        }
    }

    files.sort();
    Ok(files)
}

/// Everything a batch produced, in processing order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub settings: ConvertSettings,
    pub outcomes: Vec<JobOutcome>,
    pub cancelled: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn new(input_dir: &Path, output_dir: &Path, settings: ConvertSettings) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            settings,
            outcomes: Vec::new(),
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn successes(&self) -> impl Iterator<Item = &SuccessRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            JobOutcome::Written(record) => Some(record),
            JobOutcome::Failed(_) => None,
        })
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(JobOutcome::original_name)
            .collect()
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!();
        println!("{}", style("Summary:").bold());
        println!("  {}: {}", style("Converted").green(), self.succeeded());
        if self.has_failures() {
            println!("  {}: {}", style("Failed").red(), self.failed());
            for name in self.failed_names() {
                println!("    - {}", name);
            }
        }
        if self.cancelled {
            println!("  {}", style("Cancelled before completion").yellow());
        }
        println!("  {}: {:.2}s", style("Duration").blue(), self.elapsed.as_secs_f64());
        println!();
        println!("Resized images saved in '{}'", self.output_dir.display());
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
