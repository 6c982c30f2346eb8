//! Command-line interface for `geolegacy`.
//!
//! The binary parses arguments, configures logging and hands off to
//! [`geolegacy_core::operations`]. Library crates log through the `log`
//! facade; those records are bridged into the `tracing` subscriber installed
//! here.
//!
//! # Available Commands
//!
//! - `convert` - Convert a `GeoJSON` FeatureCollection to a Shapefile or GeoPackage
//! - `inspect` - Preview the schema a conversion would produce
//! - `drivers` - List the supported formats and their capabilities

mod display;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geolegacy_core::drivers::{self, OutputFormat};
use geolegacy_core::error::ConversionError;
use geolegacy_core::operations::{self, ConvertOptions};

#[derive(Parser)]
#[command(
    name = "geolegacy",
    version,
    about = "Convert GeoJSON to Shapefile or GeoPackage",
    long_about = "geolegacy streams a GeoJSON FeatureCollection into a legacy single-layer \
                  container.\nMemory stays bounded regardless of the input size."
)]
/// Command-line arguments and options for the `geolegacy` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts a `GeoJSON` FeatureCollection into a single-layer output.
    Convert {
        /// Path to the input `GeoJSON` file.
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Directory the output is written to. Created if missing.
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Base name of the output files, without extension.
        #[arg(short, long, value_name = "NAME")]
        name: String,

        /// Output format.
        #[arg(short, long, value_name = "FORMAT", default_value = "shp")]
        format: String,

        /// Table name inside a GeoPackage. Defaults to the output name.
        #[arg(long, value_name = "LAYER")]
        layer: Option<String>,
    },

    /// Infers the output schema of a `GeoJSON` file without writing anything.
    Inspect {
        /// Path to the input `GeoJSON` file.
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Lists the supported drivers and their capabilities.
    Drivers,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        },
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Convert {
            input,
            output,
            name,
            format,
            layer,
        } => {
            let options = build_options(&output, &name, &format, layer)?;
            handle_convert(input, options).await?;
        },
        Commands::Inspect { input } => {
            handle_inspect(input).await?;
        },
        Commands::Drivers => {
            display::display_drivers(&drivers::get_drivers());
        },
    }
    Ok(())
}

fn build_options(
    output: &std::path::Path,
    name: &str,
    format: &str,
    layer: Option<String>,
) -> Result<ConvertOptions, ConversionError> {
    let format: OutputFormat = format.parse()?;
    let mut options = ConvertOptions::new(format, output, name);
    if let Some(layer) = layer {
        options = options.with_layer_name(layer);
    }
    options.validate()?;
    Ok(options)
}

async fn handle_convert(input: PathBuf, options: ConvertOptions) -> Result<()> {
    info!("Starting conversion:");
    info!("Input: {}", input.display());
    info!("Output: {}", options.output_dir().display());
    info!("Format: {}", options.format());

    let report = operations::convert(input, options).await?;
    display::display_conversion(&report);
    info!("Conversion complete.");
    Ok(())
}

async fn handle_inspect(input: PathBuf) -> Result<()> {
    info!("Inspecting {}", input.display());
    let report = tokio::task::spawn_blocking(move || operations::inspect_path(&input)).await??;
    display::display_inspect(&report);
    Ok(())
}

fn report_error(error: &anyhow::Error) {
    if let Some(conversion) = error.downcast_ref::<ConversionError>() {
        eprintln!("Error: {}", conversion.user_message());
        if let Some(suggestion) = conversion.recovery_suggestion() {
            eprintln!("\n{suggestion}");
        }
    } else {
        eprintln!("Error: {error:#}");
    }
}
