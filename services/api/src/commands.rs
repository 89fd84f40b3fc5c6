use std::fs;
use std::path::PathBuf;

use clap::Args;
use loan_eligibility::config::AppConfig;
use loan_eligibility::error::AppError;
use loan_eligibility::prediction::{
    check_eligibility_with_source, predict_with_source, EligibilityForm, FeatureValue,
    ModelArtifact, RawApplication,
};

#[derive(Args, Debug, Default)]
pub(crate) struct ArtifactArgs {
    /// Override the configured model file
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Override the configured feature-list file
    #[arg(long)]
    pub(crate) features: Option<PathBuf>,
}

impl ArtifactArgs {
    fn load(self) -> Result<ModelArtifact, AppError> {
        let config = AppConfig::load()?;
        let model = self.model.unwrap_or(config.model.model_path);
        let features = self.features.unwrap_or(config.model.features_path);
        Ok(ModelArtifact::load(model, features))
    }
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Application field as KEY=VALUE; repeat for each field
    #[arg(long = "set", value_parser = parse_pair)]
    pub(crate) fields: Vec<(String, String)>,
    /// JSON object with application fields; `--set` entries override it
    #[arg(long)]
    pub(crate) json: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) artifact: ArtifactArgs,
}

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    #[arg(long)]
    pub(crate) gender: Option<String>,
    #[arg(long)]
    pub(crate) married: Option<String>,
    #[arg(long)]
    pub(crate) dependents: Option<String>,
    #[arg(long)]
    pub(crate) education: Option<String>,
    #[arg(long)]
    pub(crate) self_employed: Option<String>,
    #[arg(long)]
    pub(crate) applicant_income: Option<String>,
    #[arg(long)]
    pub(crate) coapplicant_income: Option<String>,
    #[arg(long)]
    pub(crate) loan_amount: Option<String>,
    #[arg(long)]
    pub(crate) loan_term: Option<String>,
    #[arg(long)]
    pub(crate) credit_score: Option<String>,
    #[arg(long)]
    pub(crate) property_area: Option<String>,
    #[arg(long)]
    pub(crate) age: Option<String>,
    #[command(flatten)]
    pub(crate) artifact: ArtifactArgs,
}

pub(crate) fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn read_application(path: Option<PathBuf>) -> Result<RawApplication, AppError> {
    let Some(path) = path else {
        return Ok(RawApplication::new());
    };
    let bytes = fs::read(&path)?;
    serde_json::from_slice(&bytes).map_err(|source| AppError::Application {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        fields,
        json,
        artifact,
    } = args;

    let artifact = artifact.load()?;
    let mut raw = read_application(json)?;
    for (key, value) in fields {
        raw.insert(key, FeatureValue::Text(value));
    }

    let (result, source) = predict_with_source(&artifact, &raw);
    println!("Eligible: {}", if result.eligible { "yes" } else { "no" });
    println!("Probability: {:.2}", result.probability);
    println!("Decided by: {source:?}");
    Ok(())
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let form = EligibilityForm {
        gender: args.gender,
        married: args.married,
        dependents: args.dependents,
        education: args.education,
        self_employed: args.self_employed,
        applicant_income: args.applicant_income,
        coapplicant_income: args.coapplicant_income,
        loan_amount: args.loan_amount,
        loan_term: args.loan_term,
        credit_score: args.credit_score,
        property_area: args.property_area,
        age: args.age,
    };
    let artifact = args.artifact.load()?;

    let (verdict, source) = check_eligibility_with_source(&artifact, &form)?;
    println!("{} ({} chance, decided by {source:?})", verdict.result, verdict.chance);
    println!("{}", verdict.message);
    for offer in &verdict.eligible_banks {
        println!(
            "- {} | {} | {} | docs: {}",
            offer.bank, offer.loan_type, offer.rate, offer.docs
        );
    }
    Ok(())
}
