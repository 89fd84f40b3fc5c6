//! Prediction adapter: artifact loading, the two vectorization paths, and the
//! fail-soft classifier invocation with its deterministic fallback rule.

pub mod adapter;
pub mod artifact;
pub mod classifier;
pub mod features;
pub mod form;
pub mod offers;

#[cfg(test)]
mod tests;

pub use adapter::{fallback_decision, predict, predict_with_source, PredictionResult, VerdictSource};
pub use artifact::{ArtifactError, ModelArtifact};
pub use classifier::{
    Classifier, ClassifierError, LogisticClassifier, ModelDocument, RuleSetClassifier,
    ThresholdRule,
};
pub use features::{
    coerce, project, resolve, vectorize, FeatureSpec, FeatureValue, FeatureVector,
    RawApplication, DEFAULT_FEATURES,
};
pub use form::{check_eligibility, check_eligibility_with_source, EligibilityForm, FormError, LoanVerdict};
pub use offers::{suggested_offers, BankOffer};
