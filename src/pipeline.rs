//! Pipeline orchestration
//!
//! This module provides the public API for the risk decision engine. It
//! orchestrates the full pipeline for one login attempt:
//! encode -> route -> predict -> normalize -> decide.
//!
//! The engine is constructed once at startup, injected into request handling,
//! and shared across concurrent requests; all per-request state is created
//! fresh and discarded after the decision.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::artifact::{ArtifactStore, FsArtifactStore};
use crate::config::EngineConfig;
use crate::encoder::FeatureEncoder;
use crate::error::EngineError;
use crate::normalizer::ScoreNormalizer;
use crate::policy;
use crate::registry::ModelRegistry;
use crate::remote::RemoteScorer;
use crate::types::{FeatureVector, NormalizedRisk, RiskAssessment, ScoreRequest};

/// Behavioral risk decision engine
pub struct RiskEngine {
    config: EngineConfig,
    registry: ModelRegistry,
    remote: Option<RemoteScorer>,
}

impl RiskEngine {
    /// Engine backed by the filesystem artifact store at `config.model_dir`.
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(FsArtifactStore::new(&config.model_dir));
        Self::with_store(config, store)
    }

    /// Engine with an injected artifact store.
    pub fn with_store(config: EngineConfig, store: Arc<dyn ArtifactStore>) -> Self {
        let remote = config.remote.clone().map(RemoteScorer::new);
        Self {
            registry: ModelRegistry::new(store),
            remote,
            config,
        }
    }

    /// Evaluate a pre-encoded scoring request.
    ///
    /// Malformed requests (wrong feature count, missing user id for a
    /// registered attempt) and unenrolled users are rejected. An unavailable
    /// scoring subsystem is not: the neutral fail-open descriptor substitutes
    /// and the attempt decides Allow, with the occurrence logged for audit.
    pub fn evaluate(&self, request: &ScoreRequest) -> Result<RiskAssessment, EngineError> {
        // Stage 1: Validate and fix the vector shape
        let features = FeatureVector::from_slice(&request.features)?;

        // Stage 2-4: Route, predict, normalize (or recover fail-open)
        let risk = match self.score(&features, request.registered_user, request.user_id.as_deref())
        {
            Ok(risk) => risk,
            Err(err) if err.is_recoverable() => {
                log::warn!("Scoring unavailable, failing open: {}", err);
                NormalizedRisk::neutral()
            }
            Err(err) => return Err(err),
        };

        // Stage 5: Decide
        let decision = policy::decide(&risk, &self.config.thresholds);

        Ok(RiskAssessment {
            assessment_id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            decision,
            risk,
        })
    }

    /// Evaluate a nested telemetry record, encoding it first.
    ///
    /// Encoding is total, so any telemetry shape reaches the models; only
    /// routing problems can reject the attempt.
    pub fn evaluate_telemetry(
        &self,
        telemetry: &Value,
        registered_user: bool,
        user_id: Option<&str>,
    ) -> Result<RiskAssessment, EngineError> {
        let features = FeatureEncoder::encode(telemetry);
        let request = ScoreRequest {
            features: features.as_slice().to_vec(),
            registered_user,
            user_id: user_id.map(str::to_string),
        };
        self.evaluate(&request)
    }

    /// Score without deciding: route to a model and normalize its output.
    pub fn score(
        &self,
        features: &FeatureVector,
        registered_user: bool,
        user_id: Option<&str>,
    ) -> Result<NormalizedRisk, EngineError> {
        // Routing errors must surface before any remote call
        self.registry.route(registered_user, user_id)?;

        if let Some(remote) = &self.remote {
            return remote.analyze(features, registered_user, user_id);
        }

        let adapter = self.registry.resolve(registered_user, user_id)?;
        let raw = adapter.predict(features);
        Ok(ScoreNormalizer::normalize(&raw))
    }

    pub fn thresholds(&self) -> &crate::config::Thresholds {
        &self.config.thresholds
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}
