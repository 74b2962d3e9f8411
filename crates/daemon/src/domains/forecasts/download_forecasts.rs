use std::sync::Arc;

use anyhow::Error;
use avwx_core::TafDocument;
use slog::{info, Logger};

use crate::{chunk_stations, ApiFetcher, MAX_STATIONS_PER_REQUEST};

/// Fetches TAF forecast documents for a station set. Not every station
/// publishes a TAF, so a batch may come back smaller than requested.
pub struct ForecastService {
    logger: Logger,
    fetcher: Arc<ApiFetcher>,
    provider_url: String,
}

impl ForecastService {
    pub fn new(logger: Logger, fetcher: Arc<ApiFetcher>, provider_url: String) -> Self {
        Self {
            logger,
            fetcher,
            provider_url,
        }
    }

    pub async fn get_tafs(&self, stations: &[String]) -> Result<Vec<TafDocument>, Error> {
        let mut all_documents = Vec::new();

        for ids in chunk_stations(stations, MAX_STATIONS_PER_REQUEST) {
            let url = format!("{}/api/data/taf?ids={}&format=json", self.provider_url, ids);
            let batch: Vec<TafDocument> = self.fetcher.fetch_json(&url).await?;
            info!(
                self.logger,
                "fetched {} tafs for {} requested stations",
                batch.len(),
                ids.split(',').count()
            );
            all_documents.extend(batch);
        }

        Ok(all_documents)
    }
}
