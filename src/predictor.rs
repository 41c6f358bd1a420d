use std::path::Path;

use log::{info, warn};

use crate::error::PredictionError;
use crate::forest::ForestModel;
use crate::models::{RiskFeatures, RiskStatus, RiskVerdict};

pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "Model file not found. Train and export the risk model first.";

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A binary pass/fail classifier over `[Attendance_Pct, Quiz_Avg, Assignment_Avg, Study_Hours]`.
///
/// Class `0` is fail and class `1` is pass; probabilities are `[p_fail, p_pass]`.
pub trait Classifier {
    fn predict(&self, features: &[f64]) -> Result<u8, PredictionError>;
    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

pub struct RiskPredictor {
    classifier: Option<Box<dyn Classifier>>,
}

impl RiskPredictor {
    /// Loads the forest artifact at `path`.
    ///
    /// An artifact that cannot be read leaves the predictor without a model, and every
    /// verdict is then `UNAVAILABLE`. An artifact that reads but is not UTF-8 JSON, or
    /// does not describe a valid forest, is an error.
    pub fn from_artifact(path: &Path) -> Result<Self, PredictionError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("risk model {} unavailable: {err}", path.display());
                return Ok(Self::unavailable());
            }
        };
        let content =
            String::from_utf8(bytes).map_err(|err| PredictionError::MalformedArtifact {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        let model = ForestModel::from_json(path, &content)?;
        info!(
            "loaded risk model {} ({} trees)",
            path.display(),
            model.trees.len()
        );
        Ok(Self::with_classifier(Box::new(model)))
    }

    pub fn with_classifier(classifier: Box<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    pub fn unavailable() -> Self {
        Self { classifier: None }
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn predict(&self, features: &RiskFeatures) -> Result<RiskVerdict, PredictionError> {
        let Some(classifier) = self.classifier.as_deref() else {
            return Ok(RiskVerdict {
                status: RiskStatus::Unavailable,
                pass_probability: None,
                fail_probability: None,
                message: MODEL_UNAVAILABLE_MESSAGE.to_string(),
            });
        };

        let vector = features.to_vector();
        let prediction = classifier.predict(&vector)?;
        let probabilities = classifier.predict_probabilities(&vector)?;
        if probabilities.len() != 2 {
            return Err(PredictionError::ProbabilityShape(probabilities.len()));
        }
        let in_range = probabilities
            .iter()
            .all(|p| p.is_finite() && (0.0..=1.0).contains(p));
        let total = probabilities[0] + probabilities[1];
        if !in_range || (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(PredictionError::ProbabilityRange(probabilities));
        }
        let fail_probability = probabilities[0];
        let pass_probability = probabilities[1];

        let (status, message) = match prediction {
            1 => (
                RiskStatus::LowRisk,
                format!(
                    "The likelihood of you passing is {:.1}%.",
                    pass_probability * 100.0
                ),
            ),
            0 => (
                RiskStatus::HighRisk,
                format!(
                    "Danger! The likelihood of you failing is {:.1}%. \
                     Immediate action is required!",
                    fail_probability * 100.0
                ),
            ),
            other => return Err(PredictionError::UnknownClass(other)),
        };

        Ok(RiskVerdict {
            status,
            pass_probability: Some(pass_probability),
            fail_probability: Some(fail_probability),
            message,
        })
    }
}
