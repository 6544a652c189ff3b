//! Trained model artifacts
//!
//! Artifact bundles are produced by the offline training pipeline and consumed
//! here as opaque, immutable inputs: the engine never fits or updates them.
//! On disk they are JSON documents laid out the way training writes them:
//!
//! ```text
//! <root>/autoencoder/autoencoder.json      population bundle
//! <root>/user/user_<id>/ocsvm.json         per-user bundle
//! ```
//!
//! The [`ArtifactStore`] trait is the seam between the registry and storage,
//! so tests can substitute counting or failing stores.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Standard scaler parameters fitted during training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature means
    pub mean: Vec<f64>,
    /// Per-feature standard deviations
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Apply `(x - mean) / scale` per feature. A missing or zero scale entry
    /// leaves the centered value unscaled.
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let mean = self.mean.get(i).copied().unwrap_or(0.0);
                let scale = self.scale.get(i).copied().unwrap_or(1.0);
                if scale.abs() > f64::EPSILON {
                    (x - mean) / scale
                } else {
                    x - mean
                }
            })
            .collect()
    }
}

/// One fully-connected layer of the autoencoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weight matrix, `weights[out][in]`
    pub weights: Vec<Vec<f64>>,
    /// Bias vector, one entry per output unit
    pub bias: Vec<f64>,
}

/// Population autoencoder bundle: network weights, feature scaler, and the
/// percentile reconstruction-error threshold chosen during training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoencoderArtifact {
    pub layers: Vec<DenseLayer>,
    pub scaler: StandardScaler,
    pub threshold: f64,
}

/// Per-user one-class SVM bundle (RBF kernel) plus the user's scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryArtifact {
    pub support_vectors: Vec<Vec<f64>>,
    /// Dual coefficients, one per support vector
    pub dual_coef: Vec<f64>,
    /// Decision function intercept (sklearn's `-rho`)
    pub intercept: f64,
    /// RBF kernel width
    pub gamma: f64,
    pub scaler: StandardScaler,
}

/// Storage seam for trained artifacts
pub trait ArtifactStore: Send + Sync {
    /// Load the population bundle. `Ok(None)` means no population model has
    /// been trained yet; the caller degrades to the heuristic fallback.
    fn load_population(&self) -> Result<Option<AutoencoderArtifact>, EngineError>;

    /// Load the bundle for one enrolled user. A missing bundle is
    /// [`EngineError::ModelNotFound`]; a present-but-undecodable bundle is an
    /// artifact format error and rejects the request.
    fn load_user(&self, user_id: &str) -> Result<BoundaryArtifact, EngineError>;
}

/// Filesystem-backed artifact store
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn population_path(&self) -> PathBuf {
        self.root.join("autoencoder").join("autoencoder.json")
    }

    fn user_path(&self, user_id: &str) -> PathBuf {
        self.root
            .join("user")
            .join(format!("user_{}", user_id))
            .join("ocsvm.json")
    }
}

impl ArtifactStore for FsArtifactStore {
    fn load_population(&self) -> Result<Option<AutoencoderArtifact>, EngineError> {
        let path = self.population_path();
        if !path.exists() {
            return Ok(None);
        }
        let artifact = read_json(&path)?;
        log::info!("Loaded population artifact from {}", path.display());
        Ok(Some(artifact))
    }

    fn load_user(&self, user_id: &str) -> Result<BoundaryArtifact, EngineError> {
        let path = self.user_path(user_id);
        if !path.exists() {
            return Err(EngineError::ModelNotFound {
                user_id: user_id.to_string(),
            });
        }
        let artifact = read_json(&path)?;
        log::info!(
            "Loaded boundary artifact for user '{}' from {}",
            user_id,
            path.display()
        );
        Ok(artifact)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
