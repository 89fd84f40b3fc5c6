//! Loan eligibility screening: model artifact loading, feature vectorization,
//! the prediction adapter, and the account/interest persistence it sits beside.

pub mod accounts;
pub mod config;
pub mod error;
pub mod prediction;
pub mod telemetry;
