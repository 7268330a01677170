//! montecarlo CLI
//!
//! Command-line front end over the simulation engine, backed by the
//! file-based stores under `--data-dir`.
//!
//! # Usage
//!
//! ```bash
//! # Configure from a CSV dataset in <data-dir>/sources
//! montecarlo setup s1 --iterations 10000 --columns price,volume --dataset "prices_*"
//!
//! # Run and inspect
//! montecarlo run s1
//! montecarlo show s1
//! montecarlo list --status completed
//!
//! # Analyze real data before modeling it
//! montecarlo correlate "prices_*" price volume --method spearman
//! montecarlo correlations prices_2024
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use montecarlo::storage::persistent::open_stores;
use montecarlo::{
    CorrelationMethod, CorrelationSummary, CsvDirectorySource, EngineConfig, MonteCarloEngine,
    ScenarioKind, SetupBuilder, SimulationStatus,
};

#[derive(Parser)]
#[command(name = "montecarlo")]
#[command(about = "Monte Carlo simulation engine", long_about = None)]
struct Cli {
    /// Root directory holding `sources/` and `simulations/`
    #[arg(long, global = true, default_value = montecarlo::config::DEFAULT_DATA_DIR)]
    data_dir: std::path::PathBuf,

    /// Seed for the sampling RNG
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure (or reconfigure) a simulation
    Setup {
        /// Simulation name
        name: String,
        /// Samples per column
        #[arg(short, long)]
        iterations: String,
        /// Comma-separated column names
        #[arg(short, long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
        /// Source dataset name or wildcard pattern
        #[arg(short, long)]
        dataset: Option<String>,
    },
    /// Run a configured simulation
    Run {
        /// Simulation name
        name: String,
    },
    /// List simulations, newest first, with a status breakdown
    List {
        /// Only show simulations in this state (configured or completed)
        #[arg(long)]
        status: Option<SimulationStatus>,
    },
    /// Show a configuration and its latest results
    Show {
        /// Simulation name
        name: String,
    },
    /// Correlation between two columns of a dataset
    Correlate {
        /// Dataset name or wildcard pattern
        dataset: String,
        /// First column
        column1: String,
        /// Second column
        column2: String,
        /// pearson, spearman or kendall
        #[arg(short, long, default_value = "pearson")]
        method: String,
    },
    /// Stored correlation reports of a dataset
    Correlations {
        /// Dataset name
        dataset: String,
    },
    /// List available source datasets
    Sources,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Print the stored pairs of a dataset when there are at least `min_pairs`.
fn print_correlations(summary: &CorrelationSummary, min_pairs: usize) {
    if summary.pairs.len() < min_pairs {
        return;
    }
    println!(
        "Correlations for {} (columns: {})",
        summary.dataset,
        summary.columns.join(", ")
    );
    for pair in &summary.pairs {
        println!(
            "  {} <-> {}: {:.3} ({}, {})",
            pair.column1,
            pair.column2,
            pair.coefficient,
            pair.method,
            if pair.significant { "significant" } else { "not significant" }
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = EngineConfig::with_data_dir(&cli.data_dir);
    config.seed = cli.seed;
    let config = config.validate().context("invalid configuration")?;

    let stores = open_stores(config.simulations_dir()).context("failed to open simulation store")?;
    let engine = MonteCarloEngine::from_config(
        &config,
        Arc::new(stores.configs),
        Arc::new(stores.results),
        Arc::new(CsvDirectorySource::new(config.sources_dir())),
    )?
    .with_correlation_store(Arc::new(stores.correlations));

    match cli.command {
        Commands::Setup {
            name,
            iterations,
            columns,
            dataset,
        } => {
            let mut builder = SetupBuilder::new()
                .name(&name)
                .iterations_raw(iterations)
                .columns(columns);
            if let Some(d) = dataset {
                builder = builder.dataset(d);
            }
            let cfg = engine.try_setup(builder.build()?)?;
            println!(
                "Configured '{}': {} iterations, columns [{}]{}",
                cfg.name,
                cfg.iterations,
                cfg.columns.join(", "),
                cfg.dataset
                    .as_deref()
                    .map(|d| format!(", dataset '{d}'"))
                    .unwrap_or_default()
            );
            for (column, stats) in &cfg.column_stats {
                println!(
                    "  {column}: {} (randomness {:.2})",
                    stats.distribution, stats.randomness_score
                );
            }
        }
        Commands::Run { name } => {
            let results = engine.try_run(&name)?;
            println!(
                "Completed '{}' ({} iterations, {} ms, run {})",
                results.name, results.iterations, results.elapsed_ms, results.run_id
            );
            for (column, s) in &results.statistics {
                println!(
                    "  {column}: mean {:.4} ± {:.4}, range [{:.4}, {:.4}], median {:.4}, {}",
                    s.mean,
                    s.std,
                    s.min,
                    s.max,
                    s.median,
                    s.variability()
                );
            }
        }
        Commands::List { status } => {
            let configs = engine.try_list()?;
            if configs.is_empty() {
                println!("No simulations configured.");
                return Ok(());
            }
            let shown = match status {
                Some(s) => engine.try_list_with_status(s)?,
                None => configs.clone(),
            };
            let mut rows: Vec<_> = shown.values().collect();
            rows.sort_by(|a, b| b.created.cmp(&a.created));
            if rows.is_empty() {
                println!("No {} simulations.", status.map(|s| s.to_string()).unwrap_or_default());
            }
            for c in &rows {
                println!(
                    "{:<24} {:<10} {:>10} iterations  created {}",
                    c.name,
                    c.status.to_string(),
                    c.iterations,
                    c.created.format("%Y-%m-%d %H:%M:%S")
                );
            }

            let completed = configs
                .values()
                .filter(|c| c.status == SimulationStatus::Completed)
                .count();
            let total_iterations: u64 = rows.iter().map(|c| c.iterations).sum();
            println!();
            println!("configured: {}", configs.len() - completed);
            println!("completed:  {completed}");
            println!("total iterations (shown): {total_iterations}");
        }
        Commands::Show { name } => {
            let cfg = engine.config(&name)?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            match engine.results(&name) {
                Ok(results) => {
                    for kind in ScenarioKind::ALL {
                        if let Some(s) = results.scenario(kind) {
                            println!("{kind} (p{}): {:?}", s.percentile, s.values);
                        }
                    }
                    for pair in results.correlations.iter() {
                        println!("corr({}, {}) = {:.4}", pair.left, pair.right, pair.coefficient);
                    }
                }
                Err(e) if e.is_not_found() => println!("(not run yet)"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Correlate {
            dataset,
            column1,
            column2,
            method,
        } => {
            let method: CorrelationMethod = method.parse()?;
            let report = engine.analyze_correlation(&dataset, &column1, &column2, method)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("Assessment: {}", report.assessment.verdict);
            println!("Saved as: {}", report.key());
            print_correlations(&engine.correlation_summary(&report.dataset)?, 2);
        }
        Commands::Correlations { dataset } => {
            let summary = engine.correlation_summary(&dataset)?;
            if summary.pairs.is_empty() {
                bail!("no stored correlations for dataset '{dataset}'");
            }
            print_correlations(&summary, 1);
        }
        Commands::Sources => {
            let names = engine.available_datasets()?;
            if names.is_empty() {
                bail!("no datasets found in {}", config.sources_dir().display());
            }
            for n in names {
                println!("{n}");
            }
        }
    }

    Ok(())
}
