//! Progress events for batch conversion

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::processing::JobOutcome;

/// Progress update event
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    Started {
        total_files: usize,
    },
    FileStarted {
        filename: String,
    },
    FileCompleted {
        outcome: JobOutcome,
    },
    Cancelled {
        remaining: usize,
    },
    BatchCompleted {
        succeeded: usize,
        failed: usize,
    },
}

/// Receives progress events from a running batch
pub trait ProgressSink: Send + Sync {
    fn update(&self, update: &ProgressUpdate);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _update: &ProgressUpdate) {}
}

/// Which per-file lines the console reporter prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    All,
    FailuresOnly,
    None,
}

/// Console reporter: a progress bar on stderr and one line per file on stdout
pub struct ConsoleProgressReporter {
    bar: ProgressBar,
    lines: LineMode,
}

impl ConsoleProgressReporter {
    /// Create a reporter. `LineMode::None` keeps stdout free for JSON output.
    pub fn new(show_bar: bool, lines: LineMode) -> Self {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            if let Ok(bar_style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(bar_style.progress_chars("#>-"));
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar, lines }
    }

    fn shows(&self, failure: bool) -> bool {
        match self.lines {
            LineMode::All => true,
            LineMode::FailuresOnly => failure,
            LineMode::None => false,
        }
    }

    fn line(&self, text: String, failure: bool) {
        if self.shows(failure) {
            self.bar.suspend(|| println!("{}", text));
        }
    }
}

impl ProgressSink for ConsoleProgressReporter {
    fn update(&self, update: &ProgressUpdate) {
        match update {
            ProgressUpdate::Started { total_files } => {
                self.bar.set_length(*total_files as u64);
            }
            ProgressUpdate::FileStarted { filename } => {
                self.bar.set_message(filename.clone());
            }
            ProgressUpdate::FileCompleted { outcome } => {
                match outcome {
                    JobOutcome::Written(record) => self.line(
                        format!(
                            "{} {} → {} ({}x{})",
                            style("✓").green(),
                            record.original_name,
                            record.new_name,
                            record.width,
                            record.height
                        ),
                        false,
                    ),
                    JobOutcome::Failed(record) => self.line(
                        format!(
                            "{} Error processing {}: {}",
                            style("✗").red(),
                            record.original_name,
                            record.message
                        ),
                        true,
                    ),
                }
                self.bar.inc(1);
            }
            ProgressUpdate::Cancelled { remaining } => {
                self.bar.abandon_with_message(format!("cancelled, {} file(s) left", remaining));
            }
            ProgressUpdate::BatchCompleted { succeeded, failed } => {
                debug!("Batch completed: {} succeeded, {} failed", succeeded, failed);
                self.bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{FailureRecord, JobStage};
    use std::path::PathBuf;

    #[test]
    fn test_line_modes() {
        let all = ConsoleProgressReporter::new(false, LineMode::All);
        assert!(all.shows(false) && all.shows(true));

        let quiet = ConsoleProgressReporter::new(false, LineMode::FailuresOnly);
        assert!(!quiet.shows(false));
        assert!(quiet.shows(true));

        let json = ConsoleProgressReporter::new(false, LineMode::None);
        assert!(!json.shows(false) && !json.shows(true));
    }

    #[test]
    fn test_hidden_reporter_accepts_a_batch() {
        let reporter = ConsoleProgressReporter::new(false, LineMode::None);
        reporter.update(&ProgressUpdate::Started { total_files: 1 });
        reporter.update(&ProgressUpdate::FileCompleted {
            outcome: JobOutcome::Failed(FailureRecord {
                original_name: "notes.txt".to_string(),
                source: PathBuf::from("in/notes.txt"),
                stage: JobStage::Decode,
                message: "The image format could not be determined".to_string(),
            }),
        });
        reporter.update(&ProgressUpdate::BatchCompleted {
            succeeded: 0,
            failed: 1,
        });

        assert!(reporter.bar.is_finished());
    }

    #[test]
    fn test_no_progress_accepts_events() {
        NoProgress.update(&ProgressUpdate::Cancelled { remaining: 3 });
    }
}
