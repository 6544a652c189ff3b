//! Score normalization
//!
//! The two model families report scores on incompatible scales: bounded
//! reconstruction error versus unbounded signed boundary distance. This module
//! maps both onto one 0..1 risk scale so the decision policy can apply a
//! single pair of thresholds regardless of which model answered.
//!
//! Dispatch is on the family tag carried by the raw output, never on the
//! number itself. The anomaly verdict and raw score pass through unchanged
//! for auditing.

use crate::types::{ModelFamily, NormalizedRisk, RawModelOutput};

/// Normalizer for mapping raw model outputs onto the common risk scale
pub struct ScoreNormalizer;

impl ScoreNormalizer {
    /// Normalize a raw model output into a risk descriptor.
    pub fn normalize(output: &RawModelOutput) -> NormalizedRisk {
        let (risk_score, threshold) = match output.family {
            ModelFamily::Reconstruction => normalize_reconstruction(output),
            ModelFamily::Boundary => normalize_boundary(output),
        };

        NormalizedRisk {
            model_used: output.model_name.clone(),
            risk_score,
            threshold,
            is_anomaly: output.is_anomaly,
            raw_score: output.raw_score,
        }
    }
}

/// Reconstruction family: risk is the error as a fraction of the trained
/// threshold, clamped to [0, 1]. A missing or non-positive threshold is
/// treated as 1.0 to avoid division artifacts.
fn normalize_reconstruction(output: &RawModelOutput) -> (f64, f64) {
    let threshold = match output.threshold {
        Some(t) if t > 0.0 && t.is_finite() => t,
        _ => 1.0,
    };
    let risk = (output.raw_score / threshold).clamp(0.0, 1.0);
    (risk, threshold)
}

/// Boundary family: logistic squashing of the signed distance. Distance 0
/// (on the boundary) maps to risk 0.5; increasingly negative distance
/// (further outside) approaches 1; increasingly positive approaches 0.
/// The reported threshold is 0.5, the risk at the boundary, since the model
/// carries no native one.
fn normalize_boundary(output: &RawModelOutput) -> (f64, f64) {
    let risk = 1.0 / (1.0 + output.raw_score.exp());
    (risk, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reconstruction_output(raw_score: f64, threshold: Option<f64>) -> RawModelOutput {
        RawModelOutput {
            model_name: "autoencoder".to_string(),
            family: ModelFamily::Reconstruction,
            raw_score,
            threshold,
            is_anomaly: threshold.map(|t| raw_score > t).unwrap_or(false),
        }
    }

    fn boundary_output(distance: f64) -> RawModelOutput {
        RawModelOutput {
            model_name: "one_class_svm".to_string(),
            family: ModelFamily::Boundary,
            raw_score: distance,
            threshold: None,
            is_anomaly: distance < 0.0,
        }
    }

    #[test]
    fn test_reconstruction_ratio() {
        let risk = ScoreNormalizer::normalize(&reconstruction_output(0.3, Some(0.6)));
        assert_eq!(risk.risk_score, 0.5);
        assert_eq!(risk.threshold, 0.6);
        assert_eq!(risk.raw_score, 0.3);
        assert!(!risk.is_anomaly);
    }

    #[test]
    fn test_reconstruction_clamps_to_one() {
        let risk = ScoreNormalizer::normalize(&reconstruction_output(5.0, Some(0.5)));
        assert_eq!(risk.risk_score, 1.0);
        assert!(risk.is_anomaly);
    }

    #[test]
    fn test_reconstruction_bounds_hold() {
        for error in [0.0, 0.01, 0.5, 1.0, 10.0, 1e6] {
            for threshold in [0.001, 0.5, 1.0, 100.0] {
                let risk =
                    ScoreNormalizer::normalize(&reconstruction_output(error, Some(threshold)));
                assert!((0.0..=1.0).contains(&risk.risk_score));
            }
        }
    }

    #[test]
    fn test_degenerate_threshold_treated_as_one() {
        let risk = ScoreNormalizer::normalize(&reconstruction_output(0.4, Some(0.0)));
        assert_eq!(risk.risk_score, 0.4);
        assert_eq!(risk.threshold, 1.0);

        let risk = ScoreNormalizer::normalize(&reconstruction_output(0.4, Some(-2.0)));
        assert_eq!(risk.threshold, 1.0);

        let risk = ScoreNormalizer::normalize(&reconstruction_output(0.4, None));
        assert_eq!(risk.threshold, 1.0);
    }

    #[test]
    fn test_boundary_logistic_midpoint() {
        let risk = ScoreNormalizer::normalize(&boundary_output(0.0));
        assert_eq!(risk.risk_score, 0.5);
        assert_eq!(risk.threshold, 0.5);
    }

    #[test]
    fn test_boundary_direction() {
        // Further outside the boundary (more negative) means higher risk
        let far_out = ScoreNormalizer::normalize(&boundary_output(-4.0));
        let just_out = ScoreNormalizer::normalize(&boundary_output(-0.5));
        let inside = ScoreNormalizer::normalize(&boundary_output(3.0));
        assert!(far_out.risk_score > just_out.risk_score);
        assert!(just_out.risk_score > 0.5);
        assert!(inside.risk_score < 0.5);
    }

    #[test]
    fn test_boundary_bounds_hold() {
        for distance in [-100.0, -10.0, -1.0, 0.0, 1.0, 10.0, 100.0] {
            let risk = ScoreNormalizer::normalize(&boundary_output(distance));
            assert!(risk.risk_score > 0.0 && risk.risk_score < 1.0);
        }
    }

    #[test]
    fn test_passthrough_fields() {
        let risk = ScoreNormalizer::normalize(&boundary_output(-2.5));
        assert_eq!(risk.model_used, "one_class_svm");
        assert_eq!(risk.raw_score, -2.5);
        assert!(risk.is_anomaly);
    }
}
