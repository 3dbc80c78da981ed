use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Benign,
    Malignant,
}

/// Result of one prediction, built fresh per request and discarded after
/// serialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub classification: Classification,
    pub confidence: f64,
    pub raw_prediction: f64,
    pub processing_time: f64,
}

impl PredictionResponse {
    /// A sigmoid score above 0.5 denotes the benign class; confidence is
    /// the winning side of the score as a percentage.
    pub fn from_score(raw: f32, elapsed_secs: f64) -> Self {
        let raw = f64::from(raw);
        let classification = if raw > 0.5 {
            Classification::Benign
        } else {
            Classification::Malignant
        };
        Self {
            classification,
            confidence: round2(100.0 * raw.max(1.0 - raw)),
            raw_prediction: raw,
            processing_time: round2(elapsed_secs),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

impl HealthResponse {
    pub fn new(model_loaded: bool) -> Self {
        Self {
            status: "healthy",
            model_loaded,
        }
    }
}
