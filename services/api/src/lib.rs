mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use association_pulse::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
