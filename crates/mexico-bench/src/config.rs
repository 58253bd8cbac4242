use mexico_bot::EngineParams;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_ROUND_COUNT: usize = 500;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    #[serde(default)]
    pub rounds: RoundsConfig,
    pub opponents: Vec<OpponentConfig>,
    #[serde(default)]
    pub engine: EngineParams,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.rounds.validate()?;
        validate_engine(&self.engine)?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_opponents(&self.opponents)?;
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            state_json: resolve_template(&self.run_id, &self.outputs.state_json),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RoundsConfig {
    pub seed: Option<u64>,
    #[serde(default = "default_round_count")]
    pub count: usize,
}

impl Default for RoundsConfig {
    fn default() -> Self {
        Self {
            seed: None,
            count: DEFAULT_ROUND_COUNT,
        }
    }
}

impl RoundsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::invalid(
                "rounds.count",
                "number of rounds must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_round_count() -> usize {
    DEFAULT_ROUND_COUNT
}

/// Tendencies of a scripted opponent, each a probability in `[0, 1]`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OpponentConfig {
    pub name: String,
    pub bluff_rate: f64,
    pub call_rate: f64,
    #[serde(default = "default_small_raise_rate")]
    pub small_raise_rate: f64,
}

fn default_small_raise_rate() -> f64 {
    0.5
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub state_json: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.state_json", &self.state_json),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::invalid(label, "path must not be empty"));
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::invalid(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    /// Log every belief and bandit update at debug level.
    #[serde(default)]
    pub observe_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            observe_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::invalid("run_id", "run_id must not be empty"));
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::invalid(
            "run_id",
            "run_id may only contain alphanumeric characters, '.', '_' or '-'",
        ));
    }

    Ok(())
}

fn validate_engine(engine: &EngineParams) -> Result<(), ValidationError> {
    for (label, value) in [
        ("engine.exploration", engine.exploration),
        ("engine.call_risk_bias", engine.call_risk_bias),
        ("engine.raise_bluff_cap", engine.raise_bluff_cap),
        ("engine.truth_bias", engine.truth_bias),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::invalid(label, "value must be finite"));
        }
    }

    if engine.exploration < 0.0 {
        return Err(ValidationError::invalid(
            "engine.exploration",
            "exploration must not be negative",
        ));
    }

    if !(0.0..=1.0).contains(&engine.raise_bluff_cap) {
        return Err(ValidationError::invalid(
            "engine.raise_bluff_cap",
            "cap must lie within [0, 1]",
        ));
    }

    Ok(())
}

fn validate_opponents(opponents: &[OpponentConfig]) -> Result<(), ValidationError> {
    if opponents.is_empty() {
        return Err(ValidationError::invalid(
            "opponents",
            "at least one opponent must be specified",
        ));
    }

    let mut seen = HashSet::new();
    for opponent in opponents {
        if opponent.name.trim().is_empty() {
            return Err(ValidationError::invalid(
                "opponents.name",
                "opponent name must not be empty",
            ));
        }

        if !opponent.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::invalid(
                format!("opponents[{}].name", opponent.name),
                "opponent name contains invalid characters",
            ));
        }

        if !seen.insert(opponent.name.as_str()) {
            return Err(ValidationError::invalid(
                "opponents",
                format!("opponent name '{}' defined more than once", opponent.name),
            ));
        }

        for (label, value) in [
            ("bluff_rate", opponent.bluff_rate),
            ("call_rate", opponent.call_rate),
            ("small_raise_rate", opponent.small_raise_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::invalid(
                    format!("opponents[{}].{label}", opponent.name),
                    "rate must lie within [0, 1]",
                ));
            }
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub state_json: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}
