//! Decision-forest classifier exported as JSON.
//!
//! Each tree is a flat node list rooted at index 0. A split sends the sample left
//! when `x[feature] <= threshold`. Leaves carry `[fail, pass]` weights, either
//! probabilities or raw class counts; each reached leaf is normalized to sum to 1
//! and the forest averages them.

use std::path::Path;

use serde::Deserialize;

use crate::error::PredictionError;
use crate::models::RiskFeatures;
use crate::predictor::Classifier;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probabilities: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestModel {
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
}

impl ForestModel {
    pub fn from_json(path: &Path, content: &str) -> Result<Self, PredictionError> {
        let model: ForestModel =
            serde_json::from_str(content).map_err(|err| PredictionError::MalformedArtifact {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        model
            .validate()
            .map_err(|reason| PredictionError::MalformedArtifact {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.feature_names != RiskFeatures::FEATURE_NAMES {
            return Err(format!(
                "feature_names {:?} do not match {:?}",
                self.feature_names,
                RiskFeatures::FEATURE_NAMES
            ));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} has no nodes"));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.feature_names.len() {
                            return Err(format!(
                                "tree {t} node {n}: feature {feature} out of range"
                            ));
                        }
                        if !threshold.is_finite() {
                            return Err(format!("tree {t} node {n}: threshold is not finite"));
                        }
                        // Children must point forward so every walk terminates.
                        for child in [left, right] {
                            if *child <= n || *child >= tree.nodes.len() {
                                return Err(format!(
                                    "tree {t} node {n}: bad child index {child}"
                                ));
                            }
                        }
                    }
                    Node::Leaf { probabilities } => {
                        if probabilities.len() != 2
                            || probabilities.iter().any(|p| !p.is_finite() || *p < 0.0)
                        {
                            return Err(format!(
                                "tree {t} node {n}: leaf needs two non-negative weights"
                            ));
                        }
                        if probabilities.iter().sum::<f64>() <= 0.0 {
                            return Err(format!("tree {t} node {n}: leaf weights sum to zero"));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn check_shape(&self, features: &[f64]) -> Result<(), PredictionError> {
        if features.len() != self.feature_names.len() {
            return Err(PredictionError::FeatureShape {
                expected: self.feature_names.len(),
                actual: features.len(),
            });
        }
        Ok(())
    }
}

impl Tree {
    fn leaf_for(&self, features: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { probabilities } => return probabilities,
            }
        }
    }
}

impl Classifier for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<u8, PredictionError> {
        let probabilities = self.predict_probabilities(features)?;
        Ok(if probabilities[1] > probabilities[0] { 1 } else { 0 })
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.check_shape(features)?;

        let mut totals = [0.0; 2];
        for tree in &self.trees {
            let leaf = tree.leaf_for(features);
            let weight = leaf[0] + leaf[1];
            totals[0] += leaf[0] / weight;
            totals[1] += leaf[1] / weight;
        }

        let count = self.trees.len() as f64;
        Ok(totals.iter().map(|total| total / count).collect())
    }
}
