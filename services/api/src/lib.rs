mod cli;
mod commands;
mod infra;
mod routes;
mod server;

#[cfg(test)]
mod tests;

use loan_eligibility::error::AppError;

pub use routes::{loan_router, ServiceState};

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
