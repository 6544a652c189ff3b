//! Out-of-process scoring client
//!
//! Some deployments run the model service as a separate process bound to
//! loopback; the engine then scores over HTTP instead of the in-process
//! registry. The call is authenticated with a shared internal key and guarded
//! by a bounded timeout; a timeout or transport failure is treated identically
//! to inference-unavailable and triggers the fail-open fallback upstream.

use serde_json::json;

use crate::config::RemoteConfig;
use crate::error::EngineError;
use crate::types::{FeatureVector, NormalizedRisk};

/// Header carrying the shared internal key
const INTERNAL_KEY_HEADER: &str = "x-internal-api-key";

/// HTTP client for the remote model service
pub struct RemoteScorer {
    config: RemoteConfig,
    agent: ureq::Agent,
}

impl RemoteScorer {
    pub fn new(config: RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    /// Score a feature vector against the remote service.
    ///
    /// Error mapping: HTTP 404 means the per-user model does not exist
    /// (`ModelNotFound`), 400 means the request was rejected
    /// (`MalformedRequest`); every other status, transport failure, or
    /// timeout is `InferenceUnavailable` and recoverable.
    pub fn analyze(
        &self,
        features: &FeatureVector,
        registered_user: bool,
        user_id: Option<&str>,
    ) -> Result<NormalizedRisk, EngineError> {
        let url = format!("{}/analyze", self.config.base_url.trim_end_matches('/'));
        let mut request = self.agent.post(&url);
        if let Some(key) = &self.config.api_key {
            request = request.set(INTERNAL_KEY_HEADER, key);
        }

        let response = request
            .send_json(json!({
                "features": features.as_slice(),
                "registered_user": registered_user,
                "user_id": user_id,
            }))
            .map_err(|err| map_transport_error(err, user_id))?;

        response
            .into_json::<NormalizedRisk>()
            .map_err(|err| EngineError::InferenceUnavailable(format!("bad response body: {}", err)))
    }
}

fn map_transport_error(err: ureq::Error, user_id: Option<&str>) -> EngineError {
    match err {
        ureq::Error::Status(404, _) => EngineError::ModelNotFound {
            user_id: user_id.unwrap_or("unknown").to_string(),
        },
        ureq::Error::Status(400, response) => EngineError::MalformedRequest(
            response
                .into_string()
                .unwrap_or_else(|_| "rejected by model service".to_string()),
        ),
        ureq::Error::Status(code, _) => {
            EngineError::InferenceUnavailable(format!("model service returned HTTP {}", code))
        }
        ureq::Error::Transport(transport) => {
            EngineError::InferenceUnavailable(transport.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unreachable_service_is_inference_unavailable() {
        // Nothing listens on this port; connection refused must map to the
        // recoverable inference-unavailable condition, not a hard failure.
        let scorer = RemoteScorer::new(RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            timeout: Duration::from_millis(200),
        });
        let result = scorer.analyze(&FeatureVector::zeros(), false, None);
        match result {
            Err(err) => assert!(err.is_recoverable(), "unexpected error kind: {}", err),
            Ok(_) => panic!("expected transport failure"),
        }
    }
}
