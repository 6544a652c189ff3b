//! Inference adapters
//!
//! Two model variants share one prediction capability:
//! - [`ReconstructionModel`]: the population autoencoder. Scores by
//!   mean-squared reconstruction error; when no trained artifact exists it
//!   runs a documented heuristic fallback instead of failing.
//! - [`BoundaryModel`]: a per-user one-class SVM. Scores by signed distance
//!   from the learned decision boundary.
//!
//! Both are deterministic for a fixed artifact and input, and never mutate
//! the loaded artifact.

use crate::artifact::{AutoencoderArtifact, BoundaryArtifact, DenseLayer};
use crate::encoder::{
    IDX_CLICK_COUNT, IDX_PASTE_DETECTED, IDX_SESSION_DURATION_MS, IDX_TIME_TO_FIRST_ACTION_MS,
    IDX_TOTAL_KEYSTROKES,
};
use crate::types::{FeatureVector, ModelFamily, RawModelOutput};

/// Model name reported by the trained population autoencoder
pub const MODEL_AUTOENCODER: &str = "autoencoder";

/// Model name reported by the heuristic fallback path. Same family as the
/// autoencoder (so normalization stays stable) but a distinct tag for audit.
pub const MODEL_AUTOENCODER_FALLBACK: &str = "autoencoder_fallback";

/// Model name reported by the per-user boundary model
pub const MODEL_ONE_CLASS_SVM: &str = "one_class_svm";

/// Heuristic anomaly floor: the fallback flags an anomaly only at the ceiling
const HEURISTIC_ANOMALY_FLOOR: f64 = 0.95;

/// Shared prediction capability of the two model variants
pub trait InferenceAdapter: Send + Sync {
    /// Model name for auditing
    fn model_name(&self) -> &'static str;

    /// Family tag driving score normalization
    fn family(&self) -> ModelFamily;

    /// Turn a feature vector into a raw, model-native anomaly signal.
    /// Pure and deterministic for a fixed artifact.
    fn predict(&self, features: &FeatureVector) -> RawModelOutput;
}

/// Population reconstruction-error model
pub struct ReconstructionModel {
    mode: ReconstructionMode,
}

enum ReconstructionMode {
    Trained(AutoencoderArtifact),
    Heuristic,
}

impl ReconstructionModel {
    /// Model backed by a trained autoencoder bundle.
    pub fn trained(artifact: AutoencoderArtifact) -> Self {
        Self {
            mode: ReconstructionMode::Trained(artifact),
        }
    }

    /// Heuristic fallback mode, used while no population artifact exists.
    /// Keeps the pipeline functional before training has run.
    pub fn heuristic() -> Self {
        Self {
            mode: ReconstructionMode::Heuristic,
        }
    }

    /// Whether this instance is running the heuristic fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self.mode, ReconstructionMode::Heuristic)
    }

    fn predict_trained(&self, artifact: &AutoencoderArtifact, features: &FeatureVector) -> RawModelOutput {
        let scaled = artifact.scaler.transform(features.as_slice());
        let reconstruction = forward(&artifact.layers, &scaled);
        let error = mean_squared_error(&scaled, &reconstruction);

        RawModelOutput {
            model_name: MODEL_AUTOENCODER.to_string(),
            family: ModelFamily::Reconstruction,
            raw_score: error,
            threshold: Some(artifact.threshold),
            is_anomaly: error > artifact.threshold,
        }
    }

    /// Heuristic rules over a fixed subset of feature positions. Targets
    /// "too fast / too empty" sessions: sub-600ms duration, near-zero
    /// time-to-first-action, zero interaction, and detected paste each add a
    /// fixed increment, capped at 1.0.
    fn predict_heuristic(&self, features: &FeatureVector) -> RawModelOutput {
        let total_keystrokes = features.get(IDX_TOTAL_KEYSTROKES);
        let click_count = features.get(IDX_CLICK_COUNT);
        let session_duration_ms = features.get(IDX_SESSION_DURATION_MS);
        let time_to_first_action_ms = features.get(IDX_TIME_TO_FIRST_ACTION_MS);
        let paste_detected = features.get(IDX_PASTE_DETECTED);

        let mut risk = 0.0;
        if session_duration_ms < 600.0 {
            risk += 0.5;
        }
        if time_to_first_action_ms < 80.0 {
            risk += 0.25;
        }
        if total_keystrokes == 0.0 && click_count == 0.0 {
            risk += 0.25;
        }
        if paste_detected > 0.0 {
            risk += 0.25;
        }
        let risk = f64::min(risk, 1.0);

        RawModelOutput {
            model_name: MODEL_AUTOENCODER_FALLBACK.to_string(),
            family: ModelFamily::Reconstruction,
            raw_score: risk,
            threshold: Some(1.0),
            is_anomaly: risk >= HEURISTIC_ANOMALY_FLOOR,
        }
    }
}

impl InferenceAdapter for ReconstructionModel {
    fn model_name(&self) -> &'static str {
        match self.mode {
            ReconstructionMode::Trained(_) => MODEL_AUTOENCODER,
            ReconstructionMode::Heuristic => MODEL_AUTOENCODER_FALLBACK,
        }
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::Reconstruction
    }

    fn predict(&self, features: &FeatureVector) -> RawModelOutput {
        match &self.mode {
            ReconstructionMode::Trained(artifact) => self.predict_trained(artifact, features),
            ReconstructionMode::Heuristic => self.predict_heuristic(features),
        }
    }
}

/// Per-user boundary-distance model (RBF one-class SVM)
pub struct BoundaryModel {
    artifact: BoundaryArtifact,
}

impl BoundaryModel {
    pub fn new(artifact: BoundaryArtifact) -> Self {
        Self { artifact }
    }
}

impl InferenceAdapter for BoundaryModel {
    fn model_name(&self) -> &'static str {
        MODEL_ONE_CLASS_SVM
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::Boundary
    }

    fn predict(&self, features: &FeatureVector) -> RawModelOutput {
        let scaled = self.artifact.scaler.transform(features.as_slice());
        let distance = decision_function(&self.artifact, &scaled);

        // More negative = further outside the learned boundary
        RawModelOutput {
            model_name: MODEL_ONE_CLASS_SVM.to_string(),
            family: ModelFamily::Boundary,
            raw_score: distance,
            threshold: None,
            is_anomaly: distance < 0.0,
        }
    }
}

/// Forward pass through the dense encoder/decoder stack. ReLU on every layer
/// except the final reconstruction layer.
fn forward(layers: &[DenseLayer], input: &[f64]) -> Vec<f64> {
    let mut activations = input.to_vec();
    let last = layers.len().saturating_sub(1);
    for (idx, layer) in layers.iter().enumerate() {
        let mut out = Vec::with_capacity(layer.bias.len());
        for (j, bias) in layer.bias.iter().enumerate() {
            let mut sum = *bias;
            if let Some(row) = layer.weights.get(j) {
                for (i, &x) in activations.iter().enumerate() {
                    sum += row.get(i).copied().unwrap_or(0.0) * x;
                }
            }
            if idx != last {
                sum = sum.max(0.0);
            }
            out.push(sum);
        }
        activations = out;
    }
    activations
}

fn mean_squared_error(original: &[f64], reconstruction: &[f64]) -> f64 {
    if original.is_empty() {
        return 0.0;
    }
    let sum: f64 = original
        .iter()
        .zip(reconstruction.iter())
        .map(|(o, r)| (o - r).powi(2))
        .sum();
    sum / original.len() as f64
}

/// RBF one-class SVM decision function:
/// `f(x) = sum_i dual_coef_i * exp(-gamma * ||sv_i - x||^2) + intercept`.
/// Positive inside the boundary, negative outside.
fn decision_function(artifact: &BoundaryArtifact, scaled: &[f64]) -> f64 {
    let mut sum = artifact.intercept;
    for (sv, coef) in artifact.support_vectors.iter().zip(artifact.dual_coef.iter()) {
        let sq_dist: f64 = sv
            .iter()
            .zip(scaled.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        sum += coef * (-artifact.gamma * sq_dist).exp();
    }
    sum
}
