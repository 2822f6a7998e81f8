// sso-profile-sync - generate AWS config profiles from a cached SSO session

mod auth;
mod aws_config;
mod cli;
mod credentials;
mod error;
mod models;
mod sync;

use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first to get verbose flag
    let args = cli::Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr; stdout is reserved for --dry-run output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli::execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Display keeps the scan trail one entry per line
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
