//! Engine configuration
//!
//! Process-wide, read-only configuration for the decision pipeline: the
//! allow/challenge thresholds, the artifact directory, and the optional
//! out-of-process scoring endpoint. All values can be taken from the
//! environment with the same variable names the deployment scripts use.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default allow threshold (risk below this passes)
pub const DEFAULT_ALLOW_THRESHOLD: f64 = 0.80;

/// Default challenge threshold (risk at or above this requires secondary
/// verification; with an anomaly flag it denies outright)
pub const DEFAULT_CHALLENGE_THRESHOLD: f64 = 0.95;

/// Default timeout for the out-of-process inference call
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Decision thresholds on the normalized 0..1 risk scale.
///
/// Invariant: `allow_threshold <= challenge_threshold`, enforced at
/// construction. Read-only during request processing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub allow_threshold: f64,
    pub challenge_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            allow_threshold: DEFAULT_ALLOW_THRESHOLD,
            challenge_threshold: DEFAULT_CHALLENGE_THRESHOLD,
        }
    }
}

impl Thresholds {
    /// Build validated thresholds.
    pub fn new(allow_threshold: f64, challenge_threshold: f64) -> Result<Self, EngineError> {
        let thresholds = Self {
            allow_threshold,
            challenge_threshold,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in [
            ("allow_threshold", self.allow_threshold),
            ("challenge_threshold", self.challenge_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.allow_threshold > self.challenge_threshold {
            return Err(EngineError::InvalidConfig(format!(
                "allow_threshold ({}) must not exceed challenge_threshold ({})",
                self.allow_threshold, self.challenge_threshold
            )));
        }
        Ok(())
    }
}

/// Out-of-process inference endpoint configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the model service (e.g. "http://127.0.0.1:8001")
    pub base_url: String,
    /// Shared key sent as `x-internal-api-key` when set
    pub api_key: Option<String>,
    /// Bounded timeout for the scoring call
    pub timeout: Duration,
}

/// Full engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    /// Root directory of trained artifacts
    pub model_dir: PathBuf,
    /// When set, scoring goes through the remote model service instead of the
    /// in-process registry
    pub remote: Option<RemoteConfig>,
}

impl EngineConfig {
    /// Configuration with defaults and a given artifact directory.
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            thresholds: Thresholds::default(),
            model_dir: model_dir.into(),
            remote: None,
        }
    }

    /// Read configuration from the environment.
    ///
    /// Variables: `ALLOW_THRESHOLD`, `CHALLENGE_THRESHOLD`, `MODEL_DIR`
    /// (default "saved_models"), `MODEL_URL` (enables remote scoring),
    /// `MODEL_API_KEY`, `MODEL_TIMEOUT_SECS` (default 5).
    pub fn from_env() -> Result<Self, EngineError> {
        let allow = parse_env_f64("ALLOW_THRESHOLD", DEFAULT_ALLOW_THRESHOLD)?;
        let challenge = parse_env_f64("CHALLENGE_THRESHOLD", DEFAULT_CHALLENGE_THRESHOLD)?;
        let thresholds = Thresholds::new(allow, challenge)?;

        let model_dir =
            PathBuf::from(std::env::var("MODEL_DIR").unwrap_or_else(|_| "saved_models".into()));

        let remote = match std::env::var("MODEL_URL") {
            Ok(base_url) if !base_url.is_empty() => {
                let timeout_secs = parse_env_f64("MODEL_TIMEOUT_SECS", 5.0)?;
                Some(RemoteConfig {
                    base_url,
                    api_key: std::env::var("MODEL_API_KEY").ok().filter(|k| !k.is_empty()),
                    timeout: Duration::from_secs_f64(timeout_secs.max(0.0)),
                })
            }
            _ => None,
        };

        Ok(Self {
            thresholds,
            model_dir,
            remote,
        })
    }
}

fn parse_env_f64(name: &str, default: f64) -> Result<f64, EngineError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<f64>().map_err(|_| {
            EngineError::InvalidConfig(format!("{} is not a number: '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
