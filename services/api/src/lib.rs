mod cli;
mod console;
mod demo;
mod infra;
mod routes;
mod server;

use civic_intake::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
