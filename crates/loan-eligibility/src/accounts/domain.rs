use serde::{Deserialize, Serialize};

use crate::prediction::BankOffer;

/// Registered account as exposed to callers; the password digest never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Signup form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Contact-form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Loan offer a user bookmarked. Columns the client omits are stored empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestedLoan {
    #[serde(default)]
    pub bank: String,
    #[serde(default, alias = "type")]
    pub loan_type: String,
    #[serde(default)]
    pub rate: String,
    #[serde(default)]
    pub docs: String,
}

impl From<BankOffer> for InterestedLoan {
    fn from(offer: BankOffer) -> Self {
        Self {
            bank: offer.bank,
            loan_type: offer.loan_type,
            rate: offer.rate,
            docs: offer.docs,
        }
    }
}

/// Selector for removing bookmarked loans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestKey {
    #[serde(default)]
    pub bank: String,
    #[serde(default)]
    pub loan_type: String,
}
