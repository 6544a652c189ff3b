//! Core types for the risk decision pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: feature vectors, raw model outputs, normalized risk descriptors,
//! and the final decision record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encoder::FEATURE_COUNT;
use crate::error::EngineError;

/// Fixed-length feature vector encoding one login attempt's telemetry.
///
/// Always exactly [`FEATURE_COUNT`] finite values in the global schema order
/// defined by [`crate::encoder::FEATURE_ORDER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap a raw array, scrubbing any non-finite values to 0.0.
    pub fn new(mut values: [f64; FEATURE_COUNT]) -> Self {
        for v in values.iter_mut() {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        Self(values)
    }

    /// Build from a slice, rejecting any length other than [`FEATURE_COUNT`].
    pub fn from_slice(values: &[f64]) -> Result<Self, EngineError> {
        if values.len() != FEATURE_COUNT {
            return Err(EngineError::MalformedRequest(format!(
                "expected {} features, got {}",
                FEATURE_COUNT,
                values.len()
            )));
        }
        let mut arr = [0.0; FEATURE_COUNT];
        arr.copy_from_slice(values);
        Ok(Self::new(arr))
    }

    /// All-zero vector (the encoding of an empty telemetry record).
    pub fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value at a schema position; out-of-range returns 0.0.
    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }
}

/// Identifies which trained artifact a request routes to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelKey {
    /// Population-level anomaly detector (unregistered logins)
    Population,
    /// Per-user one-class model (enrolled logins)
    PerUser(String),
}

/// Model family tag, used by the normalizer to pick the score mapping.
///
/// The two families report on incompatible scales (bounded reconstruction
/// error vs. unbounded signed distance), so the family travels with every raw
/// output rather than being re-derived from the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Reconstruction,
    Boundary,
}

/// Raw, model-native output of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawModelOutput {
    /// Model name for auditing (e.g. "autoencoder", "autoencoder_fallback",
    /// "one_class_svm")
    pub model_name: String,
    /// Family tag driving score normalization
    pub family: ModelFamily,
    /// Score on the model's native scale
    pub raw_score: f64,
    /// Model-native decision threshold, where one exists
    pub threshold: Option<f64>,
    /// Model-native anomaly verdict
    pub is_anomaly: bool,
}

/// Normalized risk descriptor surfaced to the decision policy and to callers.
///
/// Serializes to the wire response shape consumed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRisk {
    /// Which model produced the score
    pub model_used: String,
    /// Risk on the common 0..1 scale (higher = riskier)
    pub risk_score: f64,
    /// Reported threshold (scale-dependent, observability only)
    pub threshold: f64,
    /// Anomaly verdict, passed through from the model
    pub is_anomaly: bool,
    /// Model-native score, passed through for auditing
    pub raw_score: f64,
}

impl NormalizedRisk {
    /// Neutral fail-open descriptor substituted when scoring is unavailable.
    /// Always decides Allow downstream; occurrences must be audit-logged.
    pub fn neutral() -> Self {
        Self {
            model_used: "fallback".to_string(),
            risk_score: 0.0,
            threshold: 1.0,
            is_anomaly: false,
            raw_score: 0.0,
        }
    }
}

/// Final decision for a login attempt, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Challenge,
    Deny,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Challenge => "challenge",
            Decision::Deny => "deny",
        }
    }
}

/// Scoring request from the transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Pre-encoded feature vector in schema order
    pub features: Vec<f64>,
    /// Whether the attempt claims an enrolled user
    pub registered_user: bool,
    /// Enrolled user identifier; required when `registered_user` is true
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Engine output handed to external collaborators (session recorder, token
/// issuer). The id and timestamp anchor the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub assessment_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub decision: Decision,
    #[serde(flatten)]
    pub risk: NormalizedRisk,
}
