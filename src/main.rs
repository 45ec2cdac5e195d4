use std::path::PathBuf;

use amat_rank::analysis::{self, Analysis};
use amat_rank::config::read_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amat-rank",
    version,
    about = "Rank cache/TLB/memory configurations by average memory access time"
)]
struct Cli {
    /// Study configuration (TOML)
    study: PathBuf,

    #[command(subcommand)]
    command: Command,

    /// Number of configurations to keep, overrides the study file
    #[arg(long, global = true)]
    top: Option<usize>,

    /// Output directory, overrides the study file
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Check that run i is the same configuration for every trace
    #[arg(long, global = true)]
    validate_alignment: bool,

    /// Also write the plot series as gnuplot data files
    #[arg(long, global = true)]
    plot_data: bool,

    /// Enable trace level logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Mean access time per value of each configured sweep parameter
    Sweep,
    /// Rank configurations by their mean access time over all traces
    Rank,
    /// Rank configurations separately for every trace
    PerTrace,
    /// Rank the entire configuration space and scatter every parameter
    EntireSpace,
    /// Only load the dataset and check that traces are aligned
    Check,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut study = read_config(&cli.study)
        .with_context(|| format!("Failed to load study {}", cli.study.display()))?;
    if let Some(top) = cli.top {
        study.output.top = top;
    }
    if let Some(out) = cli.out {
        study.output.directory = out;
    }
    study.dataset.validate_alignment |= cli.validate_alignment;

    let mode = match cli.command {
        Command::Sweep => Analysis::Sweep,
        Command::Rank => Analysis::Mean,
        Command::PerTrace => Analysis::PerTrace,
        Command::EntireSpace => Analysis::EntireSpace,
        Command::Check => {
            study.dataset.validate_alignment = true;
            let dataset = analysis::load_study(&study).context("Dataset check failed")?;
            println!(
                "{} traces with {} aligned runs of {} parameters",
                dataset.num_traces(),
                dataset.num_runs(),
                dataset.num_params()
            );
            return Ok(());
        }
    };

    let dataset = analysis::load_study(&study).context("Failed to load dataset")?;
    let output = analysis::run(&study, &dataset, mode)
        .with_context(|| format!("Failed to run {} analysis", mode.name()))?;

    for summary in &output.summaries {
        println!("{summary}");
    }
    for path in &output.written {
        println!("Wrote {}", path.display());
    }

    if cli.plot_data {
        let written = output
            .write_plot_data(mode, &study.output.directory)
            .context("Failed to write plot data")?;
        for path in written {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
