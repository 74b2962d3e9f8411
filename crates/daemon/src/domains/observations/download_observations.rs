use std::sync::Arc;

use anyhow::Error;
use avwx_core::MetarReport;
use slog::{info, Logger};

use crate::{chunk_stations, ApiFetcher, MAX_STATIONS_PER_REQUEST};

/// Fetches current METAR observations for a station set, batched to stay
/// inside the provider's per-request id cap.
pub struct ObservationService {
    logger: Logger,
    fetcher: Arc<ApiFetcher>,
    provider_url: String,
}

impl ObservationService {
    pub fn new(logger: Logger, fetcher: Arc<ApiFetcher>, provider_url: String) -> Self {
        Self {
            logger,
            fetcher,
            provider_url,
        }
    }

    pub async fn get_metars(&self, stations: &[String]) -> Result<Vec<MetarReport>, Error> {
        let mut all_reports = Vec::new();

        for ids in chunk_stations(stations, MAX_STATIONS_PER_REQUEST) {
            let url = format!(
                "{}/api/data/metar?ids={}&format=json",
                self.provider_url, ids
            );
            let batch: Vec<MetarReport> = self.fetcher.fetch_json(&url).await?;
            info!(
                self.logger,
                "fetched {} metars for {} requested stations",
                batch.len(),
                ids.split(',').count()
            );
            all_reports.extend(batch);
        }

        Ok(all_reports)
    }
}
