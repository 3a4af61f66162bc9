//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application config
//! with [`FileConfig::to_orchestrator_config`].

use conductor_application::{LearningConfig, OrchestratorConfig, RouterConfig};
use conductor_domain::QualityGates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("{field} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { field: String, value: f64 },

    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),

    #[error("executor command cannot be empty")]
    EmptyExecutorCommand,
}

/// Raw orchestrator configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// Per-call timeout when a template sets none
    pub agent_timeout_seconds: u64,
    /// Deadline for a whole plan
    pub plan_timeout_seconds: u64,
    /// How long `--interactive` waits for a plan decision
    pub approval_timeout_seconds: u64,
    /// Gates applied to every agent (gate name -> threshold)
    pub quality_gates: BTreeMap<String, f64>,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            agent_timeout_seconds: 120,
            plan_timeout_seconds: 600,
            approval_timeout_seconds: 300,
            quality_gates: BTreeMap::new(),
        }
    }
}

/// Raw router configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRouterConfig {
    pub min_sample_size: usize,
    pub failure_rate_threshold: f64,
    pub upgrade_window: usize,
    pub upgrade_min_samples: usize,
    pub lookback_days: u32,
    pub min_success_rate: f64,
    /// Provider whose models are the cold-start defaults
    pub default_provider: Option<String>,
}

impl Default for FileRouterConfig {
    fn default() -> Self {
        let defaults = RouterConfig::default();
        Self {
            min_sample_size: defaults.min_sample_size,
            failure_rate_threshold: defaults.failure_rate_threshold,
            upgrade_window: defaults.upgrade_window,
            upgrade_min_samples: defaults.upgrade_min_samples,
            lookback_days: defaults.lookback_days,
            min_success_rate: defaults.min_success_rate,
            default_provider: None,
        }
    }
}

/// Raw learning configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLearningConfig {
    pub min_reuse_count: u64,
    pub reuse_quality_threshold: f64,
}

impl Default for FileLearningConfig {
    fn default() -> Self {
        let defaults = LearningConfig::default();
        Self {
            min_reuse_count: defaults.min_reuse_count,
            reuse_quality_threshold: defaults.reuse_quality_threshold,
        }
    }
}

/// Raw storage configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Directory for telemetry and compositions; platform data dir if unset
    pub data_dir: Option<String>,
}

/// Raw cache configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 1000,
        }
    }
}

/// Raw executor configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutorConfig {
    /// Command run once per agent call; the echo executor is used if unset
    pub command: Option<String>,
    /// Arguments; `{model}` and `{tier}` are substituted per call
    pub args: Vec<String>,
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily log files; console only if unset
    pub directory: Option<String>,
}

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutputFormat {
    #[default]
    Text,
    Json,
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: Option<FileOutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub orchestrator: FileOrchestratorConfig,
    pub router: FileRouterConfig,
    pub learning: FileLearningConfig,
    pub storage: FileStorageConfig,
    pub cache: FileCacheConfig,
    pub executor: FileExecutorConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let timeouts = [
            ("orchestrator.agent_timeout_seconds", self.orchestrator.agent_timeout_seconds),
            ("orchestrator.plan_timeout_seconds", self.orchestrator.plan_timeout_seconds),
            ("orchestrator.approval_timeout_seconds", self.orchestrator.approval_timeout_seconds),
        ];
        if let Some((field, _)) = timeouts.into_iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigValidationError::InvalidTimeout(field));
        }

        let mut thresholds = vec![
            ("router.failure_rate_threshold".to_string(), self.router.failure_rate_threshold),
            ("router.min_success_rate".to_string(), self.router.min_success_rate),
            ("learning.reuse_quality_threshold".to_string(), self.learning.reuse_quality_threshold),
        ];
        // Length gates are character counts; every other gate is a ratio
        thresholds.extend(
            self.orchestrator
                .quality_gates
                .iter()
                .filter(|(name, _)| name.as_str() != "min_length")
                .map(|(name, value)| (format!("orchestrator.quality_gates.{}", name), *value)),
        );
        if let Some((field, value)) = thresholds
            .into_iter()
            .find(|(_, v)| !(0.0..=1.0).contains(v))
        {
            return Err(ConfigValidationError::ThresholdOutOfRange { field, value });
        }

        if self.router.upgrade_window == 0 {
            return Err(ConfigValidationError::ZeroCount("router.upgrade_window"));
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(ConfigValidationError::ZeroCount("cache.max_entries"));
        }

        if let Some(command) = &self.executor.command
            && command.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyExecutorCommand);
        }

        Ok(())
    }

    /// Application-level configuration for the orchestrator
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        let gates = self
            .orchestrator
            .quality_gates
            .iter()
            .fold(QualityGates::new(), |gates, (name, threshold)| {
                gates.with_gate(name.clone(), *threshold)
            });

        let router = RouterConfig::default()
            .with_min_sample_size(self.router.min_sample_size)
            .with_failure_rate_threshold(self.router.failure_rate_threshold)
            .with_upgrade_window(self.router.upgrade_window, self.router.upgrade_min_samples)
            .with_lookback_days(self.router.lookback_days)
            .with_min_success_rate(self.router.min_success_rate);

        let learning = LearningConfig::default()
            .with_min_reuse_count(self.learning.min_reuse_count)
            .with_reuse_quality_threshold(self.learning.reuse_quality_threshold);

        let cache_ttl = if self.cache.enabled {
            Duration::from_secs(self.cache.ttl_seconds)
        } else {
            Duration::ZERO
        };

        OrchestratorConfig::default()
            .with_agent_timeout(Duration::from_secs(self.orchestrator.agent_timeout_seconds))
            .with_plan_timeout(Duration::from_secs(self.orchestrator.plan_timeout_seconds))
            .with_approval_timeout(Duration::from_secs(self.orchestrator.approval_timeout_seconds))
            .with_cache_ttl(cache_ttl)
            .with_quality_gates(gates)
            .with_router(router)
            .with_learning(learning)
    }

    /// Data directory: configured, else the platform data dir, else `./.conductor`
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .as_ref()
            .map(|d| expand_home(d))
            .or_else(|| dirs::data_dir().map(|d| d.join("agent-conductor")))
            .unwrap_or_else(|| PathBuf::from(".conductor"))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging.directory.as_ref().map(|d| expand_home(d))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
