use std::time::Duration;

use anyhow::{anyhow, Error};
use avwx_core::{MetarReport, TafDocument};
use reqwest::Client;
use serde::Serialize;
use slog::{info, Logger};

use crate::Cli;

/// Upload a fetch cycle's reports to the monitor server's ingest routes.
/// The server computes and persists snapshots; repeated uploads of an
/// unchanged report are deduplicated there, so this fires blindly.
pub async fn send_reports(
    cli: &Cli,
    logger: &Logger,
    metars: Vec<MetarReport>,
    tafs: Vec<TafDocument>,
) -> Result<(), Error> {
    let client = Client::builder()
        .user_agent(cli.user_agent())
        .timeout(Duration::from_secs(30))
        .build()?;

    if !metars.is_empty() {
        post_batch(&client, logger, &cli.base_url(), "ingest/metars", &metars).await?;
    }
    if !tafs.is_empty() {
        post_batch(&client, logger, &cli.base_url(), "ingest/tafs", &tafs).await?;
    }

    Ok(())
}

async fn post_batch<T: Serialize>(
    client: &Client,
    logger: &Logger,
    base_url: &str,
    route: &str,
    batch: &[T],
) -> Result<(), Error> {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), route);
    let response = client
        .post(&url)
        .json(batch)
        .send()
        .await
        .map_err(|e| anyhow!("error uploading to {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "upload to {} rejected: {}",
            url,
            response.status()
        ));
    }

    info!(logger, "uploaded {} reports to {}", batch.len(), route);
    Ok(())
}
