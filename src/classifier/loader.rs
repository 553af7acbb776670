//! Model artifact loading and validation.

use std::path::Path;

use super::{ClassifierError, LinearModelArtifact, LinearTextClassifier, Result, TextClassifier};

/// Format tag every supported artifact must carry.
pub const MODEL_FORMAT: &str = "mailbuddy.linear.v1";

/// Loads classifier artifacts.
pub struct ModelLoader;

impl ModelLoader {
    /// Reads and validates an artifact file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<LinearTextClassifier> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let model = Self::from_bytes(&bytes)?;
        tracing::info!(path = %path.display(), classes = model.labels().len(), "Loaded classifier");
        Ok(model)
    }

    /// Parses and validates an artifact from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<LinearTextClassifier> {
        let artifact: LinearModelArtifact =
            serde_json::from_slice(bytes).map_err(|e| ClassifierError::Malformed(e.to_string()))?;
        Self::from_artifact(artifact)
    }

    /// Validates an in-memory artifact.
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<LinearTextClassifier> {
        validate(&artifact)?;
        Ok(LinearTextClassifier::from_validated(artifact))
    }
}

fn incompatible(message: impl Into<String>) -> ClassifierError {
    ClassifierError::IncompatibleModel(message.into())
}

fn validate(artifact: &LinearModelArtifact) -> Result<()> {
    if artifact.format != MODEL_FORMAT {
        return Err(incompatible(format!(
            "unsupported format '{}', expected '{}'",
            artifact.format, MODEL_FORMAT
        )));
    }

    let n_classes = artifact.classes.len();
    if n_classes < 2 {
        return Err(incompatible(format!(
            "need at least two classes, found {}",
            n_classes
        )));
    }

    let vocab_size = artifact.vocabulary.len();
    if vocab_size == 0 {
        return Err(incompatible("vocabulary is empty"));
    }
    if let Some((term, index)) = artifact
        .vocabulary
        .iter()
        .find(|(_, index)| **index >= vocab_size)
    {
        return Err(incompatible(format!(
            "term '{}' has index {} outside vocabulary of {}",
            term, index, vocab_size
        )));
    }

    let n_rows = artifact.coefficients.len();
    let binary_single_row = n_classes == 2 && n_rows == 1;
    if n_rows != n_classes && !binary_single_row {
        return Err(incompatible(format!(
            "{} coefficient rows for {} classes",
            n_rows, n_classes
        )));
    }

    if let Some((row, width)) = artifact
        .coefficients
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|(_, width)| *width != vocab_size)
    {
        return Err(incompatible(format!(
            "coefficient row {} has {} weights, vocabulary has {} terms",
            row, width, vocab_size
        )));
    }

    if artifact.intercepts.len() != n_rows {
        return Err(incompatible(format!(
            "{} intercepts for {} coefficient rows",
            artifact.intercepts.len(),
            n_rows
        )));
    }

    if let Some(ref idf) = artifact.idf {
        if idf.len() != vocab_size {
            return Err(incompatible(format!(
                "idf has {} entries, vocabulary has {} terms",
                idf.len(),
                vocab_size
            )));
        }
    }

    let all_finite = artifact
        .coefficients
        .iter()
        .flatten()
        .chain(&artifact.intercepts)
        .chain(artifact.idf.iter().flatten())
        .all(|v| v.is_finite());
    if !all_finite {
        return Err(incompatible("weights contain NaN or infinity"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn artifact_json(coefficients: &str, intercepts: &str) -> String {
        format!(
            r#"{{
                "format": "{}",
                "classes": ["ham", "spam"],
                "vocabulary": {{"free": 0, "prize": 1, "meeting": 2}},
                "coefficients": {},
                "intercepts": {},
                "idf": [1.5, 2.0, 1.0]
            }}"#,
            MODEL_FORMAT, coefficients, intercepts
        )
    }

    #[test]
    fn loads_valid_artifact_from_bytes() {
        let json = artifact_json("[[1.0, 2.0, -1.0]]", "[0.0]");
        let model = ModelLoader::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(model.labels(), &["ham".to_string(), "spam".to_string()]);
        assert_eq!(model.vocabulary_size(), 3);
    }

    #[test]
    fn loads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(artifact_json("[[-1.0, -2.0, 1.0], [1.0, 2.0, -1.0]]", "[0.1, -0.1]").as_bytes())
            .unwrap();

        let model = ModelLoader::from_path(file.path()).unwrap();
        assert_eq!(model.predict("free prize").unwrap().label, "spam");
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ModelLoader::from_path("/definitely/not/here.json");
        assert!(matches!(result, Err(ClassifierError::Io(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        let result = ModelLoader::from_bytes(b"\x80\x04\x95pickle");
        assert!(matches!(result, Err(ClassifierError::Malformed(_))));
    }

    #[test]
    fn rejects_unknown_format() {
        let json = artifact_json("[[1.0, 2.0, -1.0]]", "[0.0]").replace(MODEL_FORMAT, "sklearn.pickle");
        let result = ModelLoader::from_bytes(json.as_bytes());
        assert!(matches!(result, Err(ClassifierError::IncompatibleModel(_))));
    }

    #[test]
    fn rejects_row_width_mismatch() {
        let json = artifact_json("[[1.0, 2.0]]", "[0.0]");
        let result = ModelLoader::from_bytes(json.as_bytes());
        assert!(matches!(result, Err(ClassifierError::IncompatibleModel(_))));
    }

    #[test]
    fn rejects_class_count_mismatch() {
        let json = artifact_json("[[1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [1.0, 2.0, 3.0]]", "[0.0, 0.0, 0.0]");
        let result = ModelLoader::from_bytes(json.as_bytes());
        assert!(matches!(result, Err(ClassifierError::IncompatibleModel(_))));
    }

    #[test]
    fn rejects_intercept_mismatch() {
        let json = artifact_json("[[1.0, 2.0, 3.0]]", "[0.0, 1.0]");
        let result = ModelLoader::from_bytes(json.as_bytes());
        assert!(matches!(result, Err(ClassifierError::IncompatibleModel(_))));
    }

    #[test]
    fn rejects_idf_mismatch() {
        let json = artifact_json("[[1.0, 2.0, 3.0]]", "[0.0]").replace("[1.5, 2.0, 1.0]", "[1.5]");
        let result = ModelLoader::from_bytes(json.as_bytes());
        assert!(matches!(result, Err(ClassifierError::IncompatibleModel(_))));
    }

    #[test]
    fn rejects_out_of_range_vocabulary_index() {
        let json = artifact_json("[[1.0, 2.0, 3.0]]", "[0.0]").replace("\"meeting\": 2", "\"meeting\": 7");
        let result = ModelLoader::from_bytes(json.as_bytes());
        assert!(matches!(result, Err(ClassifierError::IncompatibleModel(_))));
    }
}
