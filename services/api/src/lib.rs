mod cli;
mod infra;
mod routes;
mod server;
mod simulate;

use scorecard::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
