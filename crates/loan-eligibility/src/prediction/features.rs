use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column order used when no feature-list file accompanies the model.
pub const DEFAULT_FEATURES: [&str; 12] = [
    "Married",
    "Gender",
    "Dependents",
    "Education",
    "Self_Employed",
    "ApplicantIncome",
    "CoapplicantIncome",
    "LoanAmount",
    "Loan_Amount_Term",
    "CreditScore",
    "Property_Area",
    "Age",
];

/// Scalar carried by raw submissions and feature vectors alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FeatureValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Numeric reading used by classifiers: text must parse as a float.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(value) => Some(*value),
            FeatureValue::Flag(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            FeatureValue::Text(raw) => raw.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(value) => write!(f, "{value}"),
            FeatureValue::Flag(flag) => write!(f, "{flag}"),
            FeatureValue::Text(raw) => write!(f, "{raw:?}"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Untyped form submission keyed by whatever names the caller used.
pub type RawApplication = BTreeMap<String, FeatureValue>;

/// Ordered column names the classifier was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSpec(Vec<String>);

impl FeatureSpec {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn default_columns() -> Self {
        Self::new(DEFAULT_FEATURES)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Positionally aligned input row; built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<FeatureValue>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[FeatureValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<FeatureValue> {
        self.0
    }
}

impl FromIterator<FeatureValue> for FeatureVector {
    fn from_iter<T: IntoIterator<Item = FeatureValue>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Strategies tried in order when resolving a column against a raw submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyLookup {
    Exact,
    Lower,
    Upper,
}

const LOOKUP_ORDER: [KeyLookup; 3] = [KeyLookup::Exact, KeyLookup::Lower, KeyLookup::Upper];

impl KeyLookup {
    fn key(self, name: &str) -> String {
        match self {
            KeyLookup::Exact => name.to_string(),
            KeyLookup::Lower => name.to_lowercase(),
            KeyLookup::Upper => name.to_uppercase(),
        }
    }
}

/// Resolve one column: exact key, then lower-cased, then upper-cased, else `""`.
///
/// Only case is folded. A snake_case key such as `credit_score` never matches
/// the PascalCase column `CreditScore`, so that column falls through to `""`.
pub fn resolve(name: &str, raw: &RawApplication) -> FeatureValue {
    LOOKUP_ORDER
        .iter()
        .find_map(|lookup| raw.get(&lookup.key(name)))
        .cloned()
        .unwrap_or_else(|| FeatureValue::text(""))
}

/// Text made only of ASCII digits (after trimming) becomes a number.
///
/// Signs and decimal points disqualify the value; it passes through untouched.
pub fn coerce(value: FeatureValue) -> FeatureValue {
    match value {
        FeatureValue::Text(raw) => {
            let trimmed = raw.trim();
            if !trimmed.is_empty() && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
                match trimmed.parse::<f64>() {
                    Ok(number) => FeatureValue::Number(number),
                    Err(_) => FeatureValue::Text(raw),
                }
            } else {
                FeatureValue::Text(raw)
            }
        }
        other => other,
    }
}

/// Generic-lookup vectorization. Never fails; unresolved columns become `""`.
pub fn vectorize(spec: &FeatureSpec, raw: &RawApplication) -> FeatureVector {
    spec.names()
        .iter()
        .map(|name| coerce(resolve(name, raw)))
        .collect()
}

/// Project a mapping keyed by canonical column names onto `spec`, defaulting to `0`.
pub fn project(spec: &FeatureSpec, mapping: &BTreeMap<&'static str, FeatureValue>) -> FeatureVector {
    spec.names()
        .iter()
        .map(|name| {
            mapping
                .get(name.as_str())
                .cloned()
                .unwrap_or(FeatureValue::Number(0.0))
        })
        .collect()
}
