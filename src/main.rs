//! resizer CLI - Batch Image Resizer and Converter
//!
//! Run without a command for the guided flow: sample images are generated,
//! six prompts collect the parameters, and the batch runs. `convert` does the
//! same without prompts.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing::{info, warn};

use resizer::prompt;
use resizer::{
    generate_samples, init, BatchConverter, BatchReport, CancelFlag, CollisionPolicy, Config,
    ConsoleProgressReporter, ConvertSettings, FilterType, LineMode, TargetFormat,
};

/// Exit status when every file converted
const EXIT_OK: i32 = 0;
/// Exit status for fatal errors
const EXIT_FATAL: i32 = 1;
/// Exit status when the batch finished with failed files
const EXIT_PARTIAL: i32 = 2;
/// Exit status when the batch was interrupted
const EXIT_CANCELLED: i32 = 130;

/// resizer - Batch Image Resizer and Converter
#[derive(Parser)]
#[command(
    name = "resizer",
    version,
    about = "Batch-resize and convert every image in a folder",
    long_about = "Resizes every image in an input folder to one exact size, converts it to one \
                  format and writes the results into an output folder. Files that cannot be \
                  processed are reported and skipped."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (.toml or .yaml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Generate samples, prompt for parameters, then convert (default)
    Interactive {
        /// Do not generate sample images first
        #[arg(long)]
        no_samples: bool,
    },
    /// Convert a folder without prompting
    Convert(ConvertArgs),
    /// Write the placeholder sample images
    Samples {
        /// Target directory
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path (.toml or .yaml)
        #[arg(short, long, default_value = "resizer.toml")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input directory
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Exact output size; images are stretched to fit
    #[arg(short, long, value_name = "WxH", value_parser = parse_dimensions)]
    size: Option<(u32, u32)>,

    /// Output format: JPEG, PNG, WEBP, GIF, TIFF or BMP
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Output quality (1-100), used by JPEG
    #[arg(short, long, value_name = "QUALITY", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Resize filter
    #[arg(long, value_name = "FILTER", value_parser = parse_filter)]
    filter: Option<FilterType>,

    /// What to do when two inputs map to the same output name
    #[arg(long, value_name = "POLICY", value_parser = parse_collision)]
    collision: Option<CollisionPolicy>,

    /// Print the batch report as JSON instead of per-file lines
    #[arg(long)]
    json: bool,
}

/// Parse dimension string (e.g., "800x600")
fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split(['x', 'X']).collect();
    if parts.len() != 2 {
        return Err("Dimensions must be in format 'WIDTHxHEIGHT' (e.g., '800x600')".to_string());
    }

    let width = parts[0]
        .trim()
        .parse::<u32>()
        .map_err(|_| "Invalid width value".to_string())?;
    let height = parts[1]
        .trim()
        .parse::<u32>()
        .map_err(|_| "Invalid height value".to_string())?;

    if width == 0 || height == 0 {
        return Err("Width and height must be greater than 0".to_string());
    }

    Ok((width, height))
}

fn parse_filter(s: &str) -> Result<FilterType, String> {
    s.parse().map_err(|e: resizer::ResizerError| e.to_string())
}

fn parse_collision(s: &str) -> Result<CollisionPolicy, String> {
    s.parse().map_err(|e: resizer::ResizerError| e.to_string())
}

/// How the batch output is presented
#[derive(Clone, Copy)]
struct Presentation {
    quiet: bool,
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            EXIT_FATAL
        }
    };

    process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            config.validate()?;
            config
        }
        None => Config::default(),
    };

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    init(level, cli.log_json || config.logging.json_format);

    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {:?}", path);
    }

    match cli.command {
        None => run_interactive(&config, false, cli.quiet).await,
        Some(Commands::Interactive { no_samples }) => {
            run_interactive(&config, no_samples, cli.quiet).await
        }
        Some(Commands::Convert(args)) => run_convert_command(&config, args, cli.quiet).await,
        Some(Commands::Samples { dir }) => {
            let dir = dir.unwrap_or_else(|| config.samples.dir.clone());
            for path in generate_samples(&dir)? {
                println!("{} {}", style("✓").green(), path.display());
            }
            Ok(EXIT_OK)
        }
        Some(Commands::ExampleConfig { output }) => {
            Config::default().to_file(&output)?;
            println!(
                "{}: Generated example configuration: {}",
                style("Success").green().bold(),
                output.display()
            );
            Ok(EXIT_OK)
        }
    }
}

/// The guided flow: samples, prompts, conversion
async fn run_interactive(config: &Config, no_samples: bool, quiet: bool) -> anyhow::Result<i32> {
    println!();
    println!("{}", style("=== Image Resizer Tool ===").cyan().bold());
    println!();

    if !no_samples && config.samples.generate_on_start {
        generate_samples(&config.samples.dir).with_context(|| {
            format!("Failed to create sample images in {}", config.samples.dir.display())
        })?;
        println!(
            "{} Sample images created in: {}",
            style("✓").green(),
            config.samples.dir.display()
        );
    }

    let Some(parameters) = prompt::collect_parameters(&config.convert)? else {
        return Ok(EXIT_OK);
    };

    let format: TargetFormat = parameters.format.parse()?;
    let settings = ConvertSettings::new()
        .size(parameters.size.width, parameters.size.height)
        .format(format)
        .quality(parameters.quality)
        .filter(config.convert.filter)
        .collision(config.convert.collision);

    convert(
        settings,
        &parameters.input_dir,
        &parameters.output_dir,
        Presentation { quiet, json: false },
    )
    .await
}

/// `resizer convert`: flags first, then the config file, then built-in defaults
async fn run_convert_command(config: &Config, args: ConvertArgs, quiet: bool) -> anyhow::Result<i32> {
    let mut settings = config.settings()?;
    if let Some((width, height)) = args.size {
        settings = settings.size(width, height);
    }
    if let Some(format) = &args.format {
        settings = settings.format(format.parse()?);
    }
    if let Some(quality) = args.quality {
        settings = settings.quality(quality);
    }
    if let Some(filter) = args.filter {
        settings = settings.filter(filter);
    }
    if let Some(collision) = args.collision {
        settings = settings.collision(collision);
    }
    settings.validate()?;

    let input = args.input.unwrap_or_else(|| config.convert.input_dir.clone());
    let output = args.output.unwrap_or_else(|| config.convert.output_dir.clone());

    convert(
        settings,
        &input,
        &output,
        Presentation {
            quiet,
            json: args.json,
        },
    )
    .await
}

/// Run one batch with console reporting and Ctrl+C cancellation
async fn convert(
    settings: ConvertSettings,
    input: &Path,
    output: &Path,
    presentation: Presentation,
) -> anyhow::Result<i32> {
    // Installed only now so Ctrl+C still ends the prompts normally
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current file");
                cancel.cancel();
            }
        });
    }

    let lines = if presentation.json {
        LineMode::None
    } else if presentation.quiet {
        LineMode::FailuresOnly
    } else {
        LineMode::All
    };
    let reporter = ConsoleProgressReporter::new(!presentation.quiet && !presentation.json, lines);

    let report = BatchConverter::new(settings)
        .with_cancel_flag(cancel)
        .convert(input, output, &reporter)
        .await?;

    if presentation.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !presentation.quiet {
        report.print_summary();
    }

    Ok(exit_code(&report))
}

fn exit_code(report: &BatchReport) -> i32 {
    if report.cancelled {
        EXIT_CANCELLED
    } else if report.has_failures() {
        EXIT_PARTIAL
    } else {
        EXIT_OK
    }
}
