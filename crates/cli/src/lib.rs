//! CLI for MQ Throughput.
//!
//! This crate provides the `mq-throughput` command-line interface: the
//! `run` subcommand searches for the worker count with the highest
//! producer throughput and writes the canonical reports.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use mq_throughput_adapters::prometheus;
use mq_throughput_adapters::{BenchConfig, Connector, InMemoryConnector, MetricsPusher, QueueSampler};
use mq_throughput_benchmarks::{write_search_report, BenchmarkResult, OutputFormat};
use mq_throughput_core::{find_maximum_within, Results, RunIdentity, Sampler};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// MQ Throughput CLI.
#[derive(Parser, Debug)]
#[command(name = "mq-throughput")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true, env = "MQ_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for the worker count with the highest throughput.
    ///
    /// Reports are written to:
    /// - <output>/raw/ - One JSON file per search
    /// - <output>/all_results.json - Combined JSON file
    /// - <output>/summary.md - Markdown summary
    Run(RunArgs),

    /// Show configuration and runtime information.
    Status {
        /// Show detailed status information.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Push a single test gauge to the push gateway.
    TestPrometheus,
}

/// Arguments of the `run` subcommand. Each one overrides the loaded
/// configuration when given.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Seconds each sample runs for.
    #[arg(short, long)]
    pub duration_secs: Option<u64>,

    /// First probe uses 2^P workers.
    #[arg(short = 'p', long)]
    pub starting_power: Option<u32>,

    /// Never sample more workers than this.
    #[arg(short, long)]
    pub max_workers: Option<usize>,

    /// Output directory override.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: json, markdown, or both (default: both).
    #[arg(short, long, default_value = "both")]
    pub format: String,

    /// Push metrics to the Prometheus push gateway after the search.
    #[arg(long)]
    pub push: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut BenchConfig) {
        if let Some(duration_secs) = self.duration_secs {
            config.duration_secs = duration_secs;
        }
        if let Some(starting_power) = self.starting_power {
            config.starting_power = starting_power;
        }
        if self.max_workers.is_some() {
            config.max_workers = self.max_workers;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
    }
}

/// Run the CLI with the process arguments.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = BenchConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            config.validate()?;
            init_tracing(&config.log_level);
            run_search(&config, &args).map(|_| ())
        }
        Commands::Status { detailed } => {
            init_tracing(&config.log_level);
            status(&config, detailed)
        }
        Commands::TestPrometheus => {
            init_tracing(&config.log_level);
            test_prometheus(&config)
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run one search with a validated `config` and write its reports.
fn run_search(config: &BenchConfig, args: &RunArgs) -> Result<BenchmarkResult> {
    let format: OutputFormat = args.format.parse().map_err(anyhow::Error::msg)?;
    let bounds = config.search_bounds()?;
    let identity = RunIdentity::collect();
    let handle = if args.push {
        Some(prometheus::install_recorder()?)
    } else {
        None
    };

    info!(
        run_id = %identity.run_id,
        starting_power = bounds.starting_power(),
        max_workers = ?bounds.max_workers(),
        duration_secs = config.duration_secs,
        "Starting throughput search"
    );

    let connector = InMemoryConnector::new(config.queue_capacity)?;
    let connector_name = connector.name().to_string();
    let mut sampler = QueueSampler::new(connector, config.sample_duration());

    let outcome = find_maximum_within(
        |workers: usize| -> Option<Results> {
            let results = sampler.sample(workers)?;
            prometheus::record_sample(workers, &results);
            if args.verbose {
                println!("{} {}", "Workers:".cyan(), workers);
                results.print();
            }
            Some(results)
        },
        bounds,
    );

    let consumed = sampler.into_connector().shutdown()?;
    info!(consumed, "Queue drained");

    match (&outcome.best, outcome.best_workers) {
        (Some(best), Some(workers)) => {
            println!("{}", "Best result".green().bold());
            println!("Workers: {}", workers);
            best.print();
            prometheus::record_best(workers, best);
        }
        _ => println!("{}", "No samples were taken".yellow()),
    }

    let record = write_search_report(&config.output_dir, &identity, &connector_name, &outcome, format)
        .with_context(|| format!("writing reports to {}", config.output_dir.display()))?;
    println!(
        "Results for {} written to {}/",
        record.target_id,
        config.output_dir.display()
    );

    if let Some(handle) = handle {
        let pusher = MetricsPusher::new(&config.pushgateway_url, &config.job_name)?.for_run(&identity);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        if let Err(e) = runtime.block_on(pusher.push_handle(&handle)) {
            warn!(error = %e, "Metrics push failed");
        }
    }

    Ok(record)
}

fn status(config: &BenchConfig, detailed: bool) -> Result<()> {
    println!("{}", "MQ Throughput Benchmark System".bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));

    if detailed {
        let identity = RunIdentity::collect();
        println!("\nRuntime:");
        for (key, value) in identity.labels() {
            println!("  {}: {}", key, value);
        }

        println!("\nConfiguration:");
        let rendered = toml::to_string_pretty(config).context("rendering configuration")?;
        for line in rendered.lines() {
            println!("  {}", line);
        }

        println!("\nOutput files:");
        println!("  - {}/raw/", config.output_dir.display());
        println!("  - {}/all_results.json", config.output_dir.display());
        println!("  - {}/summary.md", config.output_dir.display());
    }

    Ok(())
}

fn test_prometheus(config: &BenchConfig) -> Result<()> {
    let identity = RunIdentity::collect();
    println!("{:#?}", identity);

    let handle = prometheus::install_recorder()?;
    metrics::gauge!("test").set(2.0);

    let pusher = MetricsPusher::new(&config.pushgateway_url, &config.job_name)?.for_run(&identity);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(pusher.push_handle(&handle))?;

    println!("{} {}", "Pushed test metric to".green(), pusher.push_url());
    Ok(())
}
