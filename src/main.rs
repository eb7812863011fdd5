use anyhow::Context;
use clap::Parser;
use codeflow::{config::DEFAULT_CONFIG_FILE, Config, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "codeflow")]
#[command(about = "Summarize every source file in a project into one Markdown report")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Root directory to scan
    #[arg(required_unless_present = "init_config")]
    path: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Report destination (overrides output_path from the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum characters per model request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Files analyzed concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Also write a JSON copy of the report
    #[arg(long)]
    json: bool,

    /// Write a documented config file to --config and exit
    #[arg(long)]
    init_config: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    if cli.init_config {
        Config::write_template(&cli.config)?;
        println!("Configuration written to {}", cli.config.display());
        println!("Set llm.api_key before running an analysis.");
        return Ok(());
    }

    let root = cli.path.context("missing directory argument")?;

    let mut config = Config::load(&cli.config)?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    config.write_json |= cli.json;

    let output = config.output_path.clone();
    let pipeline = Pipeline::from_config(config).context("Failed to initialize analysis")?;

    let summary = pipeline.run_and_persist(&root, &output).await?;

    summary.print_summary();
    println!("Analysis complete. Report generated at {}", output.display());
    for extra in summary.written.iter().skip(1) {
        println!("  also written: {}", extra.display());
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "codeflow=info",
        1 => "codeflow=debug",
        _ => "codeflow=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
