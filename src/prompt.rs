//! Interactive parameter collection
//!
//! Six prompts are asked in order: input folder, output folder, width, height,
//! format and quality. An empty answer takes that prompt's default. A width
//! that does not parse skips the height prompt and both fall back to the
//! default pair; a bad height does the same. Sides above `MAX_DIMENSION` or an
//! area above `MAX_PIXELS` count as unparseable. A bad quality falls back to
//! the default quality.

use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use tracing::debug;

use crate::config::{ConvertConfig, TargetSize, MAX_DIMENSION, MAX_PIXELS};
use crate::error::{Result, ResizerError};

/// Parameters gathered from the prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub size: TargetSize,

    /// Trimmed and uppercased; not checked against the supported set here
    pub format: String,
    pub quality: u8,
}

/// A default substituted for an unusable answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Size(TargetSize),
    Quality(u8),
}

impl Fallback {
    pub fn message(&self) -> String {
        match self {
            Self::Size(size) => format!("Invalid size, using default {}.", size),
            Self::Quality(quality) => format!("Invalid quality, using default {}.", quality),
        }
    }
}

/// Parse one dimension answer; empty means `default`
fn parse_dimension(answer: &str, default: u32) -> Option<u32> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(default);
    }
    answer.parse::<u32>().ok().filter(|side| *side <= MAX_DIMENSION)
}

/// Parse the quality answer; empty means `default`, anything outside 1-100 is rejected
pub fn parse_quality(answer: &str, default: u8) -> Option<u8> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(default);
    }
    match answer.parse::<i64>() {
        Ok(quality @ 1..=100) => u8::try_from(quality).ok(),
        _ => None,
    }
}

fn text_or(answer: &str, default: &str) -> String {
    match answer.trim() {
        "" => default.to_string(),
        text => text.to_string(),
    }
}

/// Run the prompt sequence against `ask`.
///
/// `ask` receives the prompt text and returns the raw answer, or `None` when
/// the user interrupted. Returns `None` in that case too.
pub fn ask_parameters<F>(
    defaults: &ConvertConfig,
    mut ask: F,
) -> Result<Option<(Parameters, Vec<Fallback>)>>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    let mut fallbacks = Vec::new();
    let default_size = TargetSize::new(defaults.width, defaults.height);

    let Some(input) = ask(&format!(
        "Enter input folder path (default: {})",
        defaults.input_dir.display()
    ))?
    else {
        return Ok(None);
    };
    let Some(output) = ask(&format!(
        "Enter output folder path (default: {})",
        defaults.output_dir.display()
    ))?
    else {
        return Ok(None);
    };

    let Some(width) = ask(&format!("Enter width (default: {})", defaults.width))? else {
        return Ok(None);
    };
    let size = match parse_dimension(&width, defaults.width) {
        Some(width) => {
            let Some(height) = ask(&format!("Enter height (default: {})", defaults.height))? else {
                return Ok(None);
            };
            parse_dimension(&height, defaults.height)
                .map(|height| TargetSize::new(width, height))
                .filter(|size| size.pixels() <= MAX_PIXELS)
        }
        None => None,
    };
    let size = size.unwrap_or_else(|| {
        fallbacks.push(Fallback::Size(default_size));
        default_size
    });

    let Some(format) = ask(&format!(
        "Enter output format (JPEG/PNG/WEBP) [default: {}]",
        defaults.format
    ))?
    else {
        return Ok(None);
    };

    let Some(quality) = ask(&format!(
        "Enter image quality (1-100) [default: {}]",
        defaults.quality
    ))?
    else {
        return Ok(None);
    };
    let quality = parse_quality(&quality, defaults.quality).unwrap_or_else(|| {
        fallbacks.push(Fallback::Quality(defaults.quality));
        defaults.quality
    });

    let parameters = Parameters {
        input_dir: PathBuf::from(text_or(&input, &defaults.input_dir.to_string_lossy())),
        output_dir: PathBuf::from(text_or(&output, &defaults.output_dir.to_string_lossy())),
        size,
        format: text_or(&format, &defaults.format).to_uppercase(),
        quality,
    };

    debug!("Collected parameters: {:?}", parameters);
    Ok(Some((parameters, fallbacks)))
}

/// Map a dialoguer result: interrupts become `None`, other failures errors
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(dialoguer::Error::IO(e)) => Err(ResizerError::IoError(e)),
    }
}

/// Ask the prompts on the terminal, or read answers line by line from stdin
/// when it is not a terminal. Fallback warnings go to stderr.
pub fn collect_parameters(defaults: &ConvertConfig) -> Result<Option<Parameters>> {
    let collected = if std::io::stdin().is_terminal() {
        let theme = ColorfulTheme::default();
        ask_parameters(defaults, |prompt| {
            handle_interrupt(
                Input::<String>::with_theme(&theme)
                    .with_prompt(prompt)
                    .allow_empty(true)
                    .interact_text(),
            )
        })?
    } else {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        ask_parameters(defaults, |prompt| {
            eprintln!("{}: ", prompt);
            // End of input answers every remaining prompt with its default
            Ok(Some(lines.next().transpose()?.unwrap_or_default()))
        })?
    };

    let Some((parameters, fallbacks)) = collected else {
        return Ok(None);
    };

    for fallback in &fallbacks {
        eprintln!("{} {}", style("⚠").yellow(), fallback.message());
    }

    Ok(Some(parameters))
}
