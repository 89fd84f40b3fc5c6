use std::sync::Arc;

use tracing::info;

use super::domain::{ContactMessage, InterestKey, InterestedLoan, LoginRequest, SignupRequest, User};
use super::password::PasswordDigest;
use super::repository::{LoanStore, StoreError};

/// Service composing the store with password digests and input checks.
pub struct AccountService<S> {
    store: Arc<S>,
    digest: PasswordDigest,
}

fn require(field: &'static str, value: &str) -> Result<(), AccountError> {
    if value.trim().is_empty() {
        Err(AccountError::MissingField(field))
    } else {
        Ok(())
    }
}

impl<S> AccountService<S>
where
    S: LoanStore + 'static,
{
    pub fn new(store: Arc<S>, digest: PasswordDigest) -> Self {
        Self { store, digest }
    }

    /// Register a new account keyed by email.
    pub fn signup(&self, request: SignupRequest) -> Result<User, AccountError> {
        require("name", &request.name)?;
        require("email", &request.email)?;
        require("password", &request.password)?;

        let digest = self.digest.digest(&request.password);
        let user = self
            .store
            .create_user(request.name.trim(), request.email.trim(), &digest)
            .map_err(|err| match err {
                StoreError::Conflict => AccountError::EmailTaken,
                other => AccountError::Store(other),
            })?;
        info!(user_id = user.id, "account created");
        Ok(user)
    }

    /// Check credentials by comparing digests.
    pub fn login(&self, request: LoginRequest) -> Result<User, AccountError> {
        require("email", &request.email)?;
        require("password", &request.password)?;

        let digest = self.digest.digest(&request.password);
        self.store
            .find_user(request.email.trim(), &digest)?
            .ok_or(AccountError::InvalidCredentials)
    }

    pub fn contact(&self, message: ContactMessage) -> Result<(), AccountError> {
        require("name", &message.name)?;
        require("email", &message.email)?;
        require("message", &message.message)?;
        self.store.insert_contact(&message)?;
        Ok(())
    }

    pub fn add_interest(&self, user_email: &str, loan: InterestedLoan) -> Result<(), AccountError> {
        self.store.add_interest(user_email, &loan)?;
        info!(bank = %loan.bank, loan_type = %loan.loan_type, "loan added to interests");
        Ok(())
    }

    pub fn interests(&self, user_email: &str) -> Result<Vec<InterestedLoan>, AccountError> {
        Ok(self.store.list_interests(user_email)?)
    }

    pub fn remove_interest(&self, user_email: &str, key: &InterestKey) -> Result<usize, AccountError> {
        Ok(self
            .store
            .remove_interest(user_email, &key.bank, &key.loan_type)?)
    }

    pub fn interest_count(&self, user_email: &str) -> Result<usize, AccountError> {
        Ok(self.store.count_interests(user_email)?)
    }
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("field '{0}' is required")]
    MissingField(&'static str),
    #[error("email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}
