//! Feature encoding
//!
//! This module deterministically maps a nested behavioral telemetry record
//! (the client tracker's JSON output) into the fixed 28-dimensional feature
//! vector consumed by the models.
//!
//! The encoder is total: a missing path, a non-numeric leaf, or a broken path
//! (an intermediate value that is not an object) all resolve to 0.0. It sits
//! upstream of fixed-shape numeric models, so partial telemetry must still
//! produce a well-formed vector and encoding must never abort a login attempt.

use serde_json::Value;

use crate::types::FeatureVector;

/// Number of features in the global schema
pub const FEATURE_COUNT: usize = 28;

/// Global feature schema: dotted paths into the telemetry record, in the
/// order the models were trained on. Changing this order invalidates every
/// trained artifact.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    // mouse
    "mouse.total_moves",
    "mouse.total_distance",
    "mouse.normalized_distance",
    "mouse.mean_speed",
    "mouse.speed_std",
    "mouse.max_speed",
    "mouse.direction_changes",
    "mouse.pause_count",
    "mouse.movement_entropy",
    // keyboard
    "keyboard.total_keystrokes",
    "keyboard.mean_interval_ms",
    "keyboard.interval_std_ms",
    "keyboard.min_interval_ms",
    "keyboard.max_interval_ms",
    "keyboard.backspace_ratio",
    "keyboard.paste_detected",
    // interaction
    "interaction.click_count",
    "interaction.scroll_count",
    "interaction.focus_changes",
    "interaction.mouse_keyboard_ratio",
    "interaction.interaction_rate",
    // timing
    "timing.session_duration_ms",
    "timing.time_to_first_action_ms",
    "timing.idle_time_ratio",
    // environment
    "environment.viewport_width",
    "environment.viewport_height",
    "environment.timezone_offset",
    "environment.device_pixel_ratio",
];

// Schema positions the heuristic fallback inspects (see model.rs)
pub(crate) const IDX_TOTAL_KEYSTROKES: usize = 9;
pub(crate) const IDX_PASTE_DETECTED: usize = 15;
pub(crate) const IDX_CLICK_COUNT: usize = 16;
pub(crate) const IDX_SESSION_DURATION_MS: usize = 21;
pub(crate) const IDX_TIME_TO_FIRST_ACTION_MS: usize = 22;

/// Encoder for converting telemetry records to feature vectors
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode a telemetry record into the fixed feature vector.
    ///
    /// Pure and total: identical input always yields an identical output, and
    /// no input can make it fail.
    pub fn encode(record: &Value) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        for (i, path) in FEATURE_ORDER.iter().enumerate() {
            values[i] = coerce(lookup_path(record, path));
        }
        FeatureVector::new(values)
    }
}

/// Walk a dotted path through nested JSON objects. Any miss returns None.
fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Coerce a telemetry leaf to f64: booleans become 1.0/0.0, finite numbers
/// pass through, everything else (strings, arrays, objects, null, missing,
/// non-finite) becomes 0.0.
fn coerce(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.is_finite() => f,
            _ => 0.0,
        },
        _ => 0.0,
    }
}
