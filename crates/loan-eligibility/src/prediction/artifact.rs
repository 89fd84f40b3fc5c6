use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::classifier::{Classifier, ClassifierError, LogisticClassifier, ModelDocument};
use super::features::FeatureSpec;

/// Failure while decoding one of the artifact files. Never escapes [`ModelArtifact::load`].
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("model is not a JSON model document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("model is not a weight table: {0}")]
    WeightTable(#[from] csv::Error),
    #[error("weight table is missing the intercept row")]
    MissingIntercept,
    #[error("weight table has no feature weights")]
    EmptyWeights,
    #[error("model document is inconsistent: {0}")]
    InvalidModel(#[from] ClassifierError),
}

/// Classifier plus its column order, loaded once and shared read-only.
#[derive(Clone, Default)]
pub struct ModelArtifact {
    classifier: Option<Arc<dyn Classifier>>,
    features: Option<FeatureSpec>,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("classifier", &self.classifier.is_some())
            .field("features", &self.features)
            .finish()
    }
}

impl ModelArtifact {
    pub fn new(classifier: Option<Arc<dyn Classifier>>, features: Option<FeatureSpec>) -> Self {
        Self {
            classifier,
            features,
        }
    }

    /// Artifact with neither model nor feature list; every prediction uses the fallback rule.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load both files, degrading to absent parts instead of failing.
    pub fn load(model_path: impl AsRef<Path>, features_path: impl AsRef<Path>) -> Self {
        let model_path = model_path.as_ref();
        let features_path = features_path.as_ref();

        let classifier = if model_path.exists() {
            match load_classifier(model_path) {
                Ok(classifier) => Some(classifier),
                Err(err) => {
                    warn!(path = %model_path.display(), error = %err, "model artifact unusable, predictions will use the fallback rule");
                    None
                }
            }
        } else {
            warn!(path = %model_path.display(), "model artifact not found");
            None
        };

        let features = if features_path.exists() {
            match load_features(features_path) {
                Ok(spec) => {
                    info!(path = %features_path.display(), columns = spec.len(), "feature list loaded");
                    Some(spec)
                }
                Err(err) => {
                    warn!(path = %features_path.display(), error = %err, "feature list unusable, using default columns");
                    None
                }
            }
        } else {
            warn!(path = %features_path.display(), "feature list not found, using default columns");
            None
        };

        Self {
            classifier,
            features,
        }
    }

    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.classifier.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.classifier.is_some()
    }

    /// Loaded column order, or [`FeatureSpec::default_columns`] when none was loaded.
    pub fn feature_spec(&self) -> FeatureSpec {
        self.features
            .clone()
            .unwrap_or_else(FeatureSpec::default_columns)
    }

    pub fn loaded_features(&self) -> Option<&FeatureSpec> {
        self.features.as_ref()
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ArtifactError> {
    let bytes = read(path)?;

    match decode_document(&bytes) {
        Ok(classifier) => {
            info!(path = %path.display(), format = "json", "model loaded");
            Ok(classifier)
        }
        Err(err @ ArtifactError::InvalidModel(_)) => Err(err),
        Err(primary) => {
            warn!(path = %path.display(), error = %primary, "primary model format failed, trying weight table");
            let classifier = decode_weight_table(&bytes)?;
            info!(path = %path.display(), format = "csv", "model loaded");
            Ok(classifier)
        }
    }
}

pub(crate) fn decode_document(bytes: &[u8]) -> Result<Arc<dyn Classifier>, ArtifactError> {
    let document: ModelDocument = serde_json::from_slice(bytes)?;
    Ok(document.into_classifier()?)
}

/// Generic `term,weight` table; the `intercept` row is the bias, the rest are weights in order.
pub(crate) fn decode_weight_table(bytes: &[u8]) -> Result<Arc<dyn Classifier>, ArtifactError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut intercept = None;
    let mut weights = Vec::new();
    for row in reader.deserialize::<(String, f64)>() {
        let (term, weight) = row?;
        if term.eq_ignore_ascii_case("intercept") {
            intercept = Some(weight);
        } else {
            weights.push(weight);
        }
    }

    let intercept = intercept.ok_or(ArtifactError::MissingIntercept)?;
    if weights.is_empty() {
        return Err(ArtifactError::EmptyWeights);
    }
    Ok(Arc::new(LogisticClassifier::new(weights, intercept)))
}

fn load_features(path: &Path) -> Result<FeatureSpec, ArtifactError> {
    let bytes = read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
