use serde::{Deserialize, Serialize};

/// Loan product suggested to eligible applicants and saved to interest lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankOffer {
    pub bank: String,
    #[serde(rename = "type", alias = "loan_type")]
    pub loan_type: String,
    pub rate: String,
    pub docs: String,
}

impl BankOffer {
    pub fn new(bank: &str, loan_type: &str, rate: &str, docs: &str) -> Self {
        Self {
            bank: bank.to_string(),
            loan_type: loan_type.to_string(),
            rate: rate.to_string(),
            docs: docs.to_string(),
        }
    }
}

/// Static reference list shown with every eligible verdict; not derived from the model.
pub fn suggested_offers() -> Vec<BankOffer> {
    vec![
        BankOffer::new("HDFC Bank", "Home Loan", "8.5%", "ID Proof, Property Papers"),
        BankOffer::new("ICICI Bank", "Personal Loan", "10.2%", "ID Proof, Salary Slips"),
        BankOffer::new("SBI Bank", "Education Loan", "9.1%", "ID Proof, Admission Letter"),
    ]
}
