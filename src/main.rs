use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use parsets::data::Dataset;
use parsets::{csv_reader, parser, runtime, LayoutOptions, OutputFormat};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum InputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "parsets")]
#[command(about = "Lay out a parallel-sets view of tabular data read from stdin", long_about = None)]
struct Args {
    /// View description (e.g., 'axes(furnishingstatus, parking) | select(parking: 0)')
    #[arg(default_value = "")]
    view: String,

    /// Dataset format on stdin
    #[arg(long, value_enum, default_value_t = InputFormat::Csv)]
    input_format: InputFormat,

    /// Output written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Plot width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Plot height in pixels
    #[arg(long, default_value_t = 400.0)]
    height: f64,

    /// Categories below this share of records are merged into "Others"
    #[arg(long, default_value_t = 0.01)]
    min_category_ratio: f64,

    /// Attributes never used as default axes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,
}

fn read_input(format: InputFormat) -> Result<Dataset> {
    match format {
        InputFormat::Csv => {
            csv_reader::read_dataset_from_stdin().context("Failed to read CSV from stdin")
        }
        InputFormat::Json => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read JSON from stdin")?;
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("Failed to parse JSON input")?;
            Dataset::from_json(&value).context("Failed to load JSON dataset")
        }
    }
}

fn main() -> Result<()> {
    // stdout carries the output document, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    // Parse the view first so a typo fails before stdin is drained
    let spec = parser::parse_view(&args.view).context("Invalid view description")?;

    let dataset = read_input(args.input_format)?;

    let options = LayoutOptions {
        width: args.width,
        height: args.height,
        min_category_ratio: args.min_category_ratio,
        ..LayoutOptions::default()
    };

    let outcome = runtime::run_view(&spec, &dataset, &options, &args.exclude);
    let bytes = runtime::render_output(&outcome.frame, &options, args.format)
        .context("Failed to render output")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&bytes)
        .context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
