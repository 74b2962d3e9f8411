use std::sync::Arc;

use avwx_core::{MetarReport, TafDocument};
use axum::{extract::State, http::StatusCode, Json};
use log::{error, warn};
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    db::{MetarSnapshot, TafSnapshot},
    AppState,
};

/// Outcome of one uploaded batch. `skipped` counts both rows the store
/// already had (idempotent re-fetch) and reports with no usable key.
#[derive(Serialize, Debug, Default, ToSchema)]
pub struct IngestSummary {
    pub received: usize,
    pub stored: usize,
    pub skipped: usize,
}

/// Accepts a JSON array of provider METAR objects. Each report is
/// classified once, here at the write site, and frozen into a snapshot.
#[utoipa::path(
    post,
    path = "/ingest/metars",
    responses(
        (status = OK, description = "Batch processed", body = IngestSummary),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to store snapshot")
    ))]
pub async fn ingest_metars(
    State(state): State<Arc<AppState>>,
    Json(reports): Json<Vec<MetarReport>>,
) -> Result<Json<IngestSummary>, (StatusCode, String)> {
    let fetched_at = OffsetDateTime::now_utc().unix_timestamp();
    let mut summary = IngestSummary {
        received: reports.len(),
        ..Default::default()
    };

    for report in &reports {
        let Some(snapshot) = MetarSnapshot::from_report(report, fetched_at, state.scheme) else {
            warn!(
                "metar for {} has no usable observation time, dropping",
                report.icao_id
            );
            summary.skipped += 1;
            continue;
        };

        match state.store.store_metar(snapshot).await {
            Ok(true) => summary.stored += 1,
            Ok(false) => summary.skipped += 1,
            Err(err) => {
                error!("error storing metar snapshot: {}", err);
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to store snapshot: {}", err),
                ));
            }
        }
    }

    Ok(Json(summary))
}

/// Accepts a JSON array of provider TAF documents. The engine runs once
/// per document at fetch time; the computed outlook and the document
/// itself are persisted together.
#[utoipa::path(
    post,
    path = "/ingest/tafs",
    responses(
        (status = OK, description = "Batch processed", body = IngestSummary),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to store snapshot")
    ))]
pub async fn ingest_tafs(
    State(state): State<Arc<AppState>>,
    Json(documents): Json<Vec<TafDocument>>,
) -> Result<Json<IngestSummary>, (StatusCode, String)> {
    let fetched_at = OffsetDateTime::now_utc().unix_timestamp();
    let mut summary = IngestSummary {
        received: documents.len(),
        ..Default::default()
    };

    for document in &documents {
        let snapshot = match TafSnapshot::from_document(document, fetched_at, state.scheme) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("taf for {} does not re-serialize: {}", document.icao_id, err);
                summary.skipped += 1;
                continue;
            }
        };

        match state.store.store_taf(snapshot).await {
            Ok(true) => summary.stored += 1,
            Ok(false) => summary.skipped += 1,
            Err(err) => {
                error!("error storing taf snapshot: {}", err);
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to store snapshot: {}", err),
                ));
            }
        }
    }

    Ok(Json(summary))
}
