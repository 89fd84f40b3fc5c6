//! Fixed-mapping path used by the eligibility form endpoint.
//!
//! Unlike the generic lookup, the named fields are parsed eagerly: a numeric
//! field that is missing or malformed is a caller error, while model trouble is
//! still absorbed by the fallback rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::adapter::{fallback_decision, VerdictSource};
use super::artifact::ModelArtifact;
use super::features::{project, FeatureValue, RawApplication};
use super::offers::{suggested_offers, BankOffer};

pub const PROPERTY_AREAS: [&str; 3] = ["Rural", "Semiurban", "Urban"];

/// Raw eligibility form exactly as posted; every field is optional text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityForm {
    #[serde(default, deserialize_with = "lenient_text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub married: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dependents: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub education: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub self_employed: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub applicant_income: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub coapplicant_income: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub loan_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub loan_term: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub credit_score: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub property_area: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub age: Option<String>,
}

/// Form posts carry text; JSON bodies may also carry bare numbers or booleans.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Number(f64),
        Flag(bool),
    }

    Ok(Option::<Field>::deserialize(deserializer)?.map(|field| match field {
        Field::Text(text) => text,
        Field::Number(number) => number.to_string(),
        Field::Flag(flag) => flag.to_string(),
    }))
}

/// A numeric form field could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("field '{field}' is required")]
    MissingField { field: &'static str },
    #[error("field '{field}' must be a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

fn flag(value: &Option<String>, expected: &str) -> &'static str {
    if value.as_deref() == Some(expected) {
        "1"
    } else {
        "0"
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, FormError> {
    value
        .as_deref()
        .map(str::trim)
        .ok_or(FormError::MissingField { field })
}

fn parse_float(field: &'static str, value: &Option<String>) -> Result<f64, FormError> {
    let raw = required(field, value)?;
    raw.parse::<f64>().map_err(|_| FormError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_integer(field: &'static str, value: &Option<String>) -> Result<i64, FormError> {
    let raw = required(field, value)?;
    raw.parse::<i64>().map_err(|_| FormError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// Typed applicant data after eager coercion of the form.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantInputs {
    pub gender_male: &'static str,
    pub married: &'static str,
    pub dependents: i64,
    pub graduate: &'static str,
    pub self_employed: &'static str,
    pub applicant_income: f64,
    pub coapplicant_income: f64,
    pub loan_amount: f64,
    pub loan_term: f64,
    pub credit_history: f64,
    pub property_area: Option<String>,
    pub age: f64,
}

impl EligibilityForm {
    pub fn parse(&self) -> Result<ApplicantInputs, FormError> {
        Ok(ApplicantInputs {
            gender_male: flag(&self.gender, "Male"),
            married: flag(&self.married, "Yes"),
            dependents: parse_integer("dependents", &self.dependents)?,
            graduate: flag(&self.education, "Graduate"),
            self_employed: flag(&self.self_employed, "Yes"),
            applicant_income: parse_float("applicant_income", &self.applicant_income)?,
            coapplicant_income: parse_float("coapplicant_income", &self.coapplicant_income)?,
            loan_amount: parse_float("loan_amount", &self.loan_amount)?,
            loan_term: parse_float("loan_term", &self.loan_term)?,
            credit_history: parse_float("credit_score", &self.credit_score)?,
            property_area: self.property_area.clone(),
            age: parse_float("age", &self.age)?,
        })
    }
}

impl ApplicantInputs {
    /// Mapping keyed by the classifier's canonical column names.
    pub fn canonical_columns(&self) -> BTreeMap<&'static str, FeatureValue> {
        let mut columns = BTreeMap::new();
        columns.insert("Gender", FeatureValue::text(self.gender_male));
        columns.insert("Married", FeatureValue::text(self.married));
        columns.insert("Dependents", FeatureValue::Number(self.dependents as f64));
        columns.insert("Education", FeatureValue::text(self.graduate));
        columns.insert("Self_Employed", FeatureValue::text(self.self_employed));
        columns.insert("ApplicantIncome", self.applicant_income.into());
        columns.insert("CoapplicantIncome", self.coapplicant_income.into());
        columns.insert("LoanAmount", self.loan_amount.into());
        columns.insert("Loan_Amount_Term", self.loan_term.into());
        columns.insert("Credit_History", self.credit_history.into());
        for (column, area) in [
            "Property_Area_Rural",
            "Property_Area_Semiurban",
            "Property_Area_Urban",
        ]
        .into_iter()
        .zip(PROPERTY_AREAS)
        {
            let hit = self.property_area.as_deref() == Some(area);
            columns.insert(column, FeatureValue::Number(if hit { 1.0 } else { 0.0 }));
        }
        columns.insert("Age", self.age.into());
        columns
    }

    fn fallback_inputs(&self) -> RawApplication {
        let mut raw = RawApplication::new();
        raw.insert("CreditScore".to_string(), self.credit_history.into());
        raw.insert("ApplicantIncome".to_string(), self.applicant_income.into());
        raw
    }
}

/// Verdict rendered for the eligibility form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanVerdict {
    pub result: String,
    pub message: String,
    pub chance: String,
    pub eligible_banks: Vec<BankOffer>,
}

impl LoanVerdict {
    pub const ELIGIBLE: &'static str = "Eligible";
    pub const NOT_ELIGIBLE: &'static str = "Not Eligible";

    pub fn from_decision(eligible: bool) -> Self {
        if eligible {
            Self {
                result: Self::ELIGIBLE.to_string(),
                message: "Congratulations! You are eligible for a loan.".to_string(),
                chance: "High".to_string(),
                eligible_banks: suggested_offers(),
            }
        } else {
            Self {
                result: Self::NOT_ELIGIBLE.to_string(),
                message: "Unfortunately, you are not eligible right now.".to_string(),
                chance: "Low".to_string(),
                eligible_banks: Vec::new(),
            }
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.result == Self::ELIGIBLE
    }
}

/// Fixed-mapping prediction: eager form parsing, then model or fallback rule.
pub fn check_eligibility(
    artifact: &ModelArtifact,
    form: &EligibilityForm,
) -> Result<LoanVerdict, FormError> {
    Ok(check_eligibility_with_source(artifact, form)?.0)
}

pub fn check_eligibility_with_source(
    artifact: &ModelArtifact,
    form: &EligibilityForm,
) -> Result<(LoanVerdict, VerdictSource), FormError> {
    let inputs = form.parse().inspect_err(|err| {
        warn!(error = %err, "rejecting eligibility form");
    })?;

    let spec = artifact.feature_spec();
    let row = project(&spec, &inputs.canonical_columns());

    let (eligible, source) = match artifact.classifier() {
        Some(classifier) => match classifier.predict(row.as_slice()) {
            Ok(eligible) => (eligible, VerdictSource::Model),
            Err(err) => {
                warn!(error = %err, columns = spec.len(), "model invocation failed, applying fallback rule");
                (fallback_decision(&inputs.fallback_inputs()).eligible, VerdictSource::Fallback)
            }
        },
        None => {
            warn!("no model loaded, applying fallback rule");
            (fallback_decision(&inputs.fallback_inputs()).eligible, VerdictSource::Fallback)
        }
    };

    Ok((LoanVerdict::from_decision(eligible), source))
}
