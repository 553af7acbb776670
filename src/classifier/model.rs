//! Linear bag-of-words classifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{preprocess_text, ClassifierError, Prediction, Result, TextClassifier};

fn default_true() -> bool {
    true
}

/// On-disk form of a linear text classifier.
///
/// `coefficients` holds one row per class, each as wide as the vocabulary. A
/// two-class model may instead carry a single row whose positive scores favour
/// `classes[1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub format: String,
    pub classes: Vec<String>,
    pub vocabulary: HashMap<String, usize>,
    pub coefficients: Vec<Vec<f32>>,
    pub intercepts: Vec<f32>,
    /// Inverse document frequencies; raw term counts are used when absent.
    #[serde(default)]
    pub idf: Option<Vec<f32>>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    /// Whether scores can be turned into probabilities.
    #[serde(default = "default_true")]
    pub probability: bool,
}

/// A validated, ready-to-run linear classifier.
///
/// Built only through [`ModelLoader`](super::ModelLoader).
#[derive(Debug, Clone)]
pub struct LinearTextClassifier {
    artifact: LinearModelArtifact,
}

impl LinearTextClassifier {
    pub(super) fn from_validated(artifact: LinearModelArtifact) -> Self {
        Self { artifact }
    }

    /// Number of vocabulary terms.
    pub fn vocabulary_size(&self) -> usize {
        self.artifact.vocabulary.len()
    }

    /// Splits text into terms of two or more word characters.
    fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
    }

    /// L2-normalized tf-idf features, as sparse `(index, weight)` pairs.
    fn features(&self, text: &str) -> Vec<(usize, f32)> {
        let text = if self.artifact.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in self.tokenize(&text) {
            if let Some(&index) = self.artifact.vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut features: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, count)| {
                let idf = self
                    .artifact
                    .idf
                    .as_ref()
                    .and_then(|idf| idf.get(index).copied())
                    .unwrap_or(1.0);
                (index, count * idf)
            })
            .collect();

        let norm = features.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut features {
                *w /= norm;
            }
        }
        features.sort_unstable_by_key(|(index, _)| *index);
        features
    }

    fn scores(&self, features: &[(usize, f32)]) -> Vec<f32> {
        self.artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(row, intercept)| {
                features
                    .iter()
                    .map(|(index, weight)| row[*index] * weight)
                    .sum::<f32>()
                    + intercept
            })
            .collect()
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl TextClassifier for LinearTextClassifier {
    fn labels(&self) -> &[String] {
        &self.artifact.classes
    }

    fn predict(&self, text: &str) -> Result<Prediction> {
        let text = preprocess_text(text);
        if text.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let scores = self.scores(&self.features(text));
        let classes = &self.artifact.classes;

        let (index, probability) = if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            if scores[0] > 0.0 {
                (1, p)
            } else {
                (0, 1.0 - p)
            }
        } else {
            let probs = softmax(&scores);
            probs
                .iter()
                .copied()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, p)| {
                    if p > best.1 {
                        (i, p)
                    } else {
                        best
                    }
                })
        };

        let label = classes
            .get(index)
            .cloned()
            .ok_or_else(|| ClassifierError::IncompatibleModel("class index out of range".into()))?;

        Ok(Prediction {
            label,
            confidence: self.artifact.probability.then_some(probability),
        })
    }
}
