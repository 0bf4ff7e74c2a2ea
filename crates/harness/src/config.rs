//! Load Test Configuration
//!
//! Test cases come from a YAML file with a top-level `loadtests` list;
//! process-level settings come from the command line.

use clap::Parser;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default wait after a case's deadline before collecting notifications
pub const DEFAULT_DRAIN_PERIOD: Duration = Duration::from_secs(10);

/// Command-line options
#[derive(Debug, Clone, Parser)]
#[command(name = "alert-load-harness", version, about = "Fire alerts at an Alertmanager cluster and verify the notifications that come back")]
pub struct Cli {
    /// Load test configuration file
    #[arg(long, default_value = "loadtests.yaml")]
    pub config: PathBuf,

    /// Comma-separated Alertmanager URLs to fire alerts against
    #[arg(long, default_value = "")]
    pub alertmanagers: String,

    /// Only serve the receiver and metrics; do not produce load
    #[arg(long)]
    pub noload: bool,

    /// Address for the notification and metrics endpoints
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory receiving one report per test case
    #[arg(long, default_value = "test_results")]
    pub results_dir: PathBuf,

    /// Wait after each case's deadline for in-flight notifications
    #[arg(long, default_value = "10s", value_parser = humantime_serde::re::humantime::parse_duration)]
    pub drain: Duration,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read load test configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse load test configuration: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Invalid load test {case:?}: {reason}")]
    Invalid { case: String, reason: String },
}

/// All configured test cases, in run order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadTestConfigs {
    #[serde(rename = "loadtests", default)]
    pub load_tests: Vec<TestCaseConfig>,
}

/// One independent test run
#[derive(Debug, Clone, Deserialize)]
pub struct TestCaseConfig {
    /// Unique name, also the report directory
    pub name: String,
    /// How long producers fire
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Number of concurrent producers
    #[serde(alias = "goroutines")]
    pub concurrency: usize,
    /// Alerts per batch
    pub batch_size: usize,
    /// Firing cycles per window before it rotates
    pub rotation_interval: usize,
    /// Time between firing cycles
    #[serde(with = "humantime_serde")]
    pub fire_interval: Duration,
    /// Exposition-format file providing the label sets
    pub dataset_file: PathBuf,
}

impl TestCaseConfig {
    /// Check the case can actually run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            case: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(invalid("name must be usable as a directory name"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be at least 1"));
        }
        if self.rotation_interval == 0 {
            return Err(invalid("rotation_interval must be at least 1"));
        }
        if self.fire_interval.is_zero() {
            return Err(invalid("fire_interval must be positive"));
        }
        if self.duration.is_zero() {
            return Err(invalid("duration must be positive"));
        }
        Ok(())
    }
}

impl LoadTestConfigs {
    /// Load and validate a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate YAML configuration text
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let configs: Self = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        configs.validate()?;
        Ok(configs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for case in &self.load_tests {
            case.validate()?;
            if !names.insert(case.name.as_str()) {
                return Err(ConfigError::Invalid {
                    case: case.name.clone(),
                    reason: "duplicate test case name".to_string(),
                });
            }
        }
        Ok(())
    }
}
