//! Error types for the risk decision engine

use thiserror::Error;

/// Errors that can occur while scoring a login attempt
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested per-user artifact does not exist. This is an enrollment
    /// problem and is always propagated to the caller: substituting a different
    /// model for an enrolled user would be a security defect.
    #[error("No trained model for user '{user_id}'")]
    ModelNotFound { user_id: String },

    /// The population artifact is missing. Recovered locally via the heuristic
    /// fallback; never surfaced to callers.
    #[error("Population artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    /// The out-of-process inference call timed out or failed in transport.
    /// Recovered locally via the neutral fail-open result.
    #[error("Inference service unavailable: {0}")]
    InferenceUnavailable(String),

    /// The request failed validation before entering the pipeline.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Engine configuration failed validation at startup.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An artifact file exists but could not be decoded.
    #[error("Artifact decode error: {0}")]
    ArtifactFormat(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the pipeline may recover from this error by substituting the
    /// neutral fail-open result. `ModelNotFound` and malformed requests are
    /// rejections and never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::ArtifactUnavailable(_) | EngineError::InferenceUnavailable(_)
        )
    }
}
