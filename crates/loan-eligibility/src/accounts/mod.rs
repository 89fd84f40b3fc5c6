//! Accounts, contact messages, and per-user interest lists backed by SQLite.

pub mod domain;
pub mod password;
pub mod repository;
pub mod service;
pub mod sqlite;

pub use domain::{ContactMessage, InterestKey, InterestedLoan, LoginRequest, SignupRequest, User};
pub use password::PasswordDigest;
pub use repository::{LoanStore, StoreError};
pub use service::{AccountError, AccountService};
pub use sqlite::SqliteLoanStore;
