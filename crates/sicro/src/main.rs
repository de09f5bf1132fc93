//! SICRO - self-healing replica controller
//!
//! Runs a day of resource samples through anomaly classification, windowed
//! voting and the replica decision engine, then writes the audit log and the
//! replica timeline for downstream charting.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sicro_lib::{
    audit,
    source::{write_samples, MetricSource, SampleFile, TrafficProfile, TrafficSimulator},
    ControllerConfig, Pipeline, StructuredLogger,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod output;

const SICRO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Self-healing replica controller
#[derive(Parser)]
#[command(name = "sicro")]
#[command(author, version, about = "Self-healing replica controller driven by anomaly detection", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON); defaults to ~/.config/sicro/config.toml
    #[arg(long, short, env = "SICRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, default_value = "json")]
    pub log_format: LogFormat,

    /// Output format for the run summary
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the controller over a batch of samples
    Run(RunArgs),

    /// Write simulated samples to a JSON file
    Generate {
        /// Output file path
        #[arg(long, short)]
        output: PathBuf,

        #[command(flatten)]
        traffic: TrafficArgs,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct RunArgs {
    /// Replay samples from a JSON file instead of simulating a day
    #[arg(long)]
    pub samples: Option<PathBuf>,

    /// Audit log destination
    #[arg(long, default_value = "infra_actions.log")]
    pub audit_log: PathBuf,

    /// Replica timeline destination (JSON)
    #[arg(long, default_value = "timeline.json")]
    pub timeline: PathBuf,

    /// Write Prometheus metrics in text format to this path
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: config::Overrides,

    #[command(flatten)]
    pub traffic: TrafficArgs,
}

/// Shape of the simulated day
#[derive(Args, Clone)]
pub struct TrafficArgs {
    /// Number of one-minute samples to simulate
    #[arg(long, default_value_t = 1440)]
    pub minutes: usize,

    /// Simulator seed
    #[arg(long, default_value_t = 42)]
    pub traffic_seed: u64,

    /// Request multiplier during evening peak hours (1.0 for flat traffic)
    #[arg(long, default_value_t = 2.5)]
    pub peak_multiplier: f64,

    /// Disable the injected traffic burst
    #[arg(long)]
    pub no_burst: bool,

    /// Disable the injected memory leak
    #[arg(long)]
    pub no_leak: bool,
}

impl TrafficArgs {
    fn profile(&self) -> TrafficProfile {
        let defaults = TrafficProfile::default();
        TrafficProfile {
            minutes: self.minutes,
            seed: self.traffic_seed,
            peak_multiplier: self.peak_multiplier,
            burst: if self.no_burst { None } else { defaults.burst },
            memory_leak: if self.no_leak { None } else { defaults.memory_leak },
            ..defaults
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Run(args) => {
            let mut controller_config = config::load(cli.config.as_deref())?;
            args.overrides.apply(&mut controller_config);
            run(controller_config, &args, cli.format)
        }
        Commands::Generate { output, traffic } => {
            let samples = TrafficSimulator::new(traffic.profile()).samples()?;
            write_samples(&output, &samples)?;
            info!(path = %output.display(), samples = samples.len(), "Samples written");
            output::print_success(&format!(
                "Wrote {} samples to {}",
                samples.len(),
                output.display()
            ));
            Ok(())
        }
        Commands::Config => {
            let controller_config = config::load(cli.config.as_deref())?;
            controller_config.validate()?;
            println!("{}", serde_json::to_string_pretty(&controller_config)?);
            Ok(())
        }
    }
}

fn run(controller_config: ControllerConfig, args: &RunArgs, format: output::OutputFormat) -> Result<()> {
    // Fails fast on invalid configuration before touching any sample
    controller_config.validate()?;

    let logger = StructuredLogger::new("sicro");
    logger.log_startup(
        SICRO_VERSION,
        controller_config.max_replicas,
        controller_config.min_replicas,
        controller_config.decision_interval,
    );

    let mut source: Box<dyn MetricSource> = match &args.samples {
        Some(path) => Box::new(SampleFile::new(path)),
        None => Box::new(TrafficSimulator::new(args.traffic.profile())),
    };
    let samples = source.samples()?;
    logger.log_source(source.name(), samples.len());

    let mut pipeline = Pipeline::new(controller_config)?.with_logger(logger.clone());
    let report = pipeline.run(&samples)?;

    report
        .audit_log()
        .write_to(&args.audit_log)
        .context("Failed to write audit log")?;
    logger.log_artifact("audit_log", &args.audit_log.display().to_string());

    audit::write_timeline(&args.timeline, &report.timeline)
        .context("Failed to write replica timeline")?;
    logger.log_artifact("timeline", &args.timeline.display().to_string());

    if let Some(path) = &args.metrics_out {
        output::write_metrics(path)?;
        logger.log_artifact("metrics", &path.display().to_string());
    }

    output::print_report(&report, format);
    Ok(())
}
