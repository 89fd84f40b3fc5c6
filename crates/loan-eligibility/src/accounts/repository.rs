use super::domain::{ContactMessage, InterestedLoan, User};

/// Storage abstraction for accounts, contact messages, and interest lists.
pub trait LoanStore: Send + Sync {
    /// Insert a user; a duplicate email is [`StoreError::Conflict`].
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_digest: &str,
    ) -> Result<User, StoreError>;
    fn find_user(&self, email: &str, password_digest: &str) -> Result<Option<User>, StoreError>;
    fn insert_contact(&self, message: &ContactMessage) -> Result<(), StoreError>;
    fn add_interest(&self, user_email: &str, loan: &InterestedLoan) -> Result<(), StoreError>;
    fn list_interests(&self, user_email: &str) -> Result<Vec<InterestedLoan>, StoreError>;
    /// Delete every bookmarked row matching bank and loan type; returns the count removed.
    fn remove_interest(
        &self,
        user_email: &str,
        bank: &str,
        loan_type: &str,
    ) -> Result<usize, StoreError>;
    fn count_interests(&self, user_email: &str) -> Result<usize, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
