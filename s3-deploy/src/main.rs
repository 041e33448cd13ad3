use anyhow::Result;
use clap::Parser;
use s3_deploy::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let mut cli = Cli::parse();
    let mut env_file_error = None;
    if let Some(env_file) = cli.env_file.clone() {
        // Re-parse so the file's variables feed the env fallbacks of every flag.
        match dotenvy::from_path(&env_file) {
            Ok(()) => cli = Cli::parse(),
            Err(e) => env_file_error = Some((env_file, e)),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");
    if let Some((env_file, e)) = env_file_error {
        tracing::warn!(env_file = ?env_file, error = %e, "Could not load env file, continuing without it");
    }

    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result.map(|_| ())
}
