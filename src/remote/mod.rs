//! Result-artifact download tool
//!
//! Fetches files from a dataset on the experiment-tracking service and
//! optionally re-uploads them to S3. The whole requested batch is validated
//! against the remote listing before any download starts.

pub mod client;
pub mod s3;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub use client::{local_destination, resolve_requested, TrackingClient, DEFAULT_ADDRESS};

/// Environment variables the tool requires before doing anything.
pub const REQUIRED_ENV: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "BEAKER_CLIENT_TOKEN",
];

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub dataset: String,
    pub output_dir: PathBuf,
    pub files: Vec<String>,
    pub s3: bool,
}

/// Check that every required environment variable is set, returning the
/// tracking-service token.
fn require_env() -> Result<String> {
    for key in REQUIRED_ENV {
        env::var(key).with_context(|| format!("{key} must be set"))?;
    }
    env::var("BEAKER_CLIENT_TOKEN").context("BEAKER_CLIENT_TOKEN must be set")
}

/// Run the download tool end to end.
pub async fn run(config: &DownloadConfig) -> Result<()> {
    let token = require_env()?;
    let client = TrackingClient::new(DEFAULT_ADDRESS, token);

    let available = client.list_files(&config.dataset).await?;
    resolve_requested(&available, &config.files)?;

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    for file in &config.files {
        let dest = local_destination(&config.output_dir, file);
        if dest.exists() {
            info!("{} already exists, skipping", dest.display());
            continue;
        }
        client
            .download_file(&config.dataset, file, &config.output_dir)
            .await?;
    }

    if config.s3 {
        s3::upload_results(&config.output_dir, &config.files).await?;
    }
    Ok(())
}
