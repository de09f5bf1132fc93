//! Layered configuration loading
//!
//! Precedence, lowest first: built-in defaults, configuration file,
//! `SICRO_*` environment variables, command-line flags.

use anyhow::{Context, Result};
use clap::Args;
use sicro_lib::{ClassifierKind, ControllerConfig};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `SICRO_MAX_REPLICAS=8`
const ENV_PREFIX: &str = "SICRO";

/// Load configuration from file and environment
///
/// Without an explicit path the default file is used only when it exists.
pub fn load(path: Option<&Path>) -> Result<ControllerConfig> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path));
        }
        None => {
            if let Some(default_path) = default_config_path().filter(|p| p.exists()) {
                builder = builder.add_source(config::File::from(default_path));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?;

    settings
        .try_deserialize()
        .context("Failed to parse configuration")
}

/// `~/.config/sicro/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("sicro").join("config.toml"))
}

/// Command-line overrides applied on top of the loaded configuration
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Upper bound on replicas
    #[arg(long)]
    pub max_replicas: Option<u32>,

    /// Lower bound on replicas
    #[arg(long)]
    pub min_replicas: Option<u32>,

    /// Replica count before the first decision
    #[arg(long)]
    pub initial_replicas: Option<u32>,

    /// Evaluate a decision every N samples
    #[arg(long)]
    pub decision_interval: Option<usize>,

    /// Alert window size
    #[arg(long)]
    pub alert_window: Option<usize>,

    /// Anomalies within the alert window needed to scale up
    #[arg(long)]
    pub alert_threshold: Option<usize>,

    /// Stability window size
    #[arg(long)]
    pub stability_window: Option<usize>,

    /// Normal samples within the stability window needed to scale down
    #[arg(long)]
    pub stability_threshold: Option<usize>,

    /// Outlier model
    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierArg>,

    /// Expected fraction of anomalous samples
    #[arg(long)]
    pub contamination: Option<f64>,

    /// Classifier random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ClassifierArg {
    IsolationForest,
    Distance,
}

impl From<ClassifierArg> for ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::IsolationForest => ClassifierKind::IsolationForest,
            ClassifierArg::Distance => ClassifierKind::Distance,
        }
    }
}

impl Overrides {
    pub fn apply(&self, config: &mut ControllerConfig) {
        if let Some(v) = self.max_replicas {
            config.max_replicas = v;
        }
        if let Some(v) = self.min_replicas {
            config.min_replicas = v;
        }
        if let Some(v) = self.initial_replicas {
            config.initial_replicas = Some(v);
        }
        if let Some(v) = self.decision_interval {
            config.decision_interval = v;
        }
        if let Some(v) = self.alert_window {
            config.alert_window.size = v;
        }
        if let Some(v) = self.alert_threshold {
            config.alert_window.threshold = v;
        }
        if let Some(v) = self.stability_window {
            config.stability_window.size = v;
        }
        if let Some(v) = self.stability_threshold {
            config.stability_window.threshold = v;
        }
        if let Some(v) = self.classifier {
            config.classifier.kind = v.into();
        }
        if let Some(v) = self.contamination {
            config.classifier.contamination = v;
        }
        if let Some(v) = self.seed {
            config.classifier.seed = v;
        }
    }
}
