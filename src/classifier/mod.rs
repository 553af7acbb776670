//! Pre-trained text classification.
//!
//! Models are linear bag-of-words classifiers exported as JSON. The
//! [`ModelLoader`] checks an artifact's format tag and shapes before anything
//! is handed out, so a loaded [`LinearTextClassifier`] can always predict.
//!
//! # Example
//!
//! ```ignore
//! use mailbuddy::classifier::{ModelLoader, TextClassifier};
//!
//! let model = ModelLoader::from_path("spam.json")?;
//! let prediction = model.predict("Claim your prize now")?;
//! println!("{} ({:?})", prediction.label, prediction.confidence);
//! ```

mod loader;
mod model;

pub use loader::{ModelLoader, MODEL_FORMAT};
pub use model::{LinearModelArtifact, LinearTextClassifier};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or running a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model artifact: {0}")]
    Malformed(String),

    #[error("incompatible model: {0}")]
    IncompatibleModel(String),

    #[error("nothing to classify")]
    EmptyInput,
}

/// Result type for classifier operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// A predicted label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Probability of `label`, when the model produces probabilities.
    pub confidence: Option<f32>,
}

/// Anything that maps text to a label.
pub trait TextClassifier: Send + Sync {
    /// Labels the model can produce, in model order.
    fn labels(&self) -> &[String];

    /// Predicts a label for `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::EmptyInput`] if the text is blank.
    fn predict(&self, text: &str) -> Result<Prediction>;
}

/// Trims surrounding whitespace before classification.
pub fn preprocess_text(text: &str) -> &str {
    text.trim()
}
