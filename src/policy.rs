//! Decision policy
//!
//! Maps a normalized risk descriptor plus the configured thresholds to the
//! final Allow/Challenge/Deny decision. Pure and total: given valid inputs it
//! never fails.

use crate::config::Thresholds;
use crate::types::{Decision, NormalizedRisk};

/// Decide the outcome for a scored login attempt.
///
/// Rules are evaluated in order, first match wins:
/// 1. anomaly flag and risk at or above the challenge threshold -> Deny
/// 2. risk at or above the challenge threshold -> Challenge
/// 3. risk at or above the allow threshold -> Challenge
/// 4. otherwise -> Allow
///
/// Rule 1's condition is a strict subset of rule 2's; the ordering is what
/// turns a flagged high-risk attempt into a denial instead of a challenge.
/// Do not collapse the overlap.
pub fn decide(risk: &NormalizedRisk, thresholds: &Thresholds) -> Decision {
    if risk.is_anomaly && risk.risk_score >= thresholds.challenge_threshold {
        Decision::Deny
    } else if risk.risk_score >= thresholds.challenge_threshold {
        Decision::Challenge
    } else if risk.risk_score >= thresholds.allow_threshold {
        Decision::Challenge
    } else {
        Decision::Allow
    }
}

/// Decide with the default thresholds (allow 0.80, challenge 0.95).
pub fn decide_default(risk: &NormalizedRisk) -> Decision {
    decide(risk, &Thresholds::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn risk(score: f64, is_anomaly: bool) -> NormalizedRisk {
        NormalizedRisk {
            model_used: "autoencoder".to_string(),
            risk_score: score,
            threshold: 0.5,
            is_anomaly,
            raw_score: score,
        }
    }

    #[test]
    fn test_concrete_scenarios() {
        // allow_threshold=0.80, challenge_threshold=0.95
        let thresholds = Thresholds::default();
        assert_eq!(decide(&risk(0.50, false), &thresholds), Decision::Allow);
        assert_eq!(decide(&risk(0.85, false), &thresholds), Decision::Challenge);
        assert_eq!(decide(&risk(0.96, true), &thresholds), Decision::Deny);
        assert_eq!(decide(&risk(0.96, false), &thresholds), Decision::Challenge);
    }

    #[test]
    fn test_boundary_values_inclusive() {
        let thresholds = Thresholds::default();
        assert_eq!(decide(&risk(0.80, false), &thresholds), Decision::Challenge);
        assert_eq!(decide(&risk(0.95, false), &thresholds), Decision::Challenge);
        assert_eq!(decide(&risk(0.95, true), &thresholds), Decision::Deny);
        assert_eq!(
            decide(&risk(0.7999999, false), &thresholds),
            Decision::Allow
        );
    }

    #[test]
    fn test_anomaly_below_challenge_does_not_deny() {
        // The anomaly flag alone never denies; it must coincide with risk at
        // or above the challenge threshold
        let thresholds = Thresholds::default();
        assert_eq!(decide(&risk(0.85, true), &thresholds), Decision::Challenge);
        assert_eq!(decide(&risk(0.10, true), &thresholds), Decision::Allow);
    }

    #[test]
    fn test_monotone_severity_in_risk() {
        let thresholds = Thresholds::default();
        for is_anomaly in [false, true] {
            let mut previous = Decision::Allow;
            for step in 0..=100 {
                let score = step as f64 / 100.0;
                let decision = decide(&risk(score, is_anomaly), &thresholds);
                assert!(
                    decision >= previous,
                    "severity decreased at score {} (anomaly={})",
                    score,
                    is_anomaly
                );
                previous = decision;
            }
        }
    }

    #[test]
    fn test_neutral_fallback_always_allows() {
        let neutral = NormalizedRisk::neutral();
        assert_eq!(decide_default(&neutral), Decision::Allow);
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = Thresholds::new(0.30, 0.60).unwrap();
        assert_eq!(decide(&risk(0.45, false), &strict), Decision::Challenge);
        assert_eq!(decide(&risk(0.65, true), &strict), Decision::Deny);
        assert_eq!(decide(&risk(0.10, false), &strict), Decision::Allow);
    }
}
