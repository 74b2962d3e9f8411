use std::collections::BTreeMap;
use std::sync::Arc;

use avwx_core::{category_at, weather_at};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    db::{MetarSnapshot, TafSnapshot},
    expand_taf_series, metar_series, AppState, StationHistory,
};

#[derive(Debug, Deserialize)]
pub struct StationsQuery {
    /// Comma-separated ICAO ids; unset means every known station
    pub stations: Option<String>,
}

/// Normalize a `?stations=kbos,ksea` filter into ids the store understands
pub fn parse_station_filter(stations: &Option<String>) -> Vec<String> {
    stations
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    error!("error querying snapshot store: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to query snapshot store: {}", err),
    )
}

/// Latest stored state of one station: the most recent METAR snapshot and
/// the most recently fetched TAF snapshot with its frozen outlook
#[derive(Serialize, Debug, ToSchema)]
pub struct StationCategories {
    pub station_id: String,
    pub metar: Option<MetarSnapshot>,
    pub taf: Option<TafSnapshot>,
}

#[utoipa::path(
    get,
    path = "/stations",
    responses(
        (status = OK, description = "Every station with at least one stored snapshot", body = Vec<String>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query snapshot store")
    ))]
pub async fn get_stations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let stations = state.store.stations().await.map_err(internal_error)?;
    Ok(Json(stations))
}

#[utoipa::path(
    get,
    path = "/stations/flight-categories",
    params(
        ("stations" = Option<String>, Query, description = "Comma-separated ICAO ids, defaults to all"),
    ),
    responses(
        (status = OK, description = "Latest stored snapshot per station", body = Vec<StationCategories>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query snapshot store")
    ))]
pub async fn flight_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StationsQuery>,
) -> Result<Json<Vec<StationCategories>>, (StatusCode, String)> {
    let filter = parse_station_filter(&query.stations);

    let metars = state
        .store
        .latest_metars(&filter)
        .await
        .map_err(internal_error)?;
    let tafs = state
        .store
        .latest_tafs(&filter)
        .await
        .map_err(internal_error)?;

    let mut by_station: BTreeMap<String, StationCategories> = BTreeMap::new();
    for metar in metars {
        by_station.insert(
            metar.station_id.clone(),
            StationCategories {
                station_id: metar.station_id.clone(),
                metar: Some(metar),
                taf: None,
            },
        );
    }
    for taf in tafs {
        let station_id = taf.station_id.clone();
        let entry = by_station
            .entry(station_id.clone())
            .or_insert_with(|| StationCategories {
                station_id,
                metar: None,
                taf: None,
            });
        entry.taf = Some(taf);
    }

    Ok(Json(by_station.into_values().collect()))
}

/// Live evaluation of the latest stored document at this instant
#[derive(Serialize, Debug, ToSchema)]
pub struct LiveTaf {
    pub station_id: String,
    /// Evaluation time, unix seconds
    pub at: i64,
    pub category: Option<String>,
    pub wind_speed: Option<i64>,
    pub wind_gust: Option<i64>,
    pub wind_direction: Option<i64>,
    pub ceiling_ft: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/stations/{station}/taf/now",
    params(
        ("station" = String, Path, description = "ICAO station id"),
    ),
    responses(
        (status = OK, description = "Latest stored document evaluated at the current instant", body = LiveTaf),
        (status = NOT_FOUND, description = "No stored TAF for this station"),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query snapshot store")
    ))]
pub async fn taf_now(
    State(state): State<Arc<AppState>>,
    Path(station): Path<String>,
) -> Result<Json<LiveTaf>, (StatusCode, String)> {
    let station = station.to_uppercase();
    let snapshots = state
        .store
        .latest_tafs(std::slice::from_ref(&station))
        .await
        .map_err(internal_error)?;
    let snapshot = snapshots.first().ok_or((
        StatusCode::NOT_FOUND,
        format!("No stored TAF for {}", station),
    ))?;
    let document = snapshot.parse_document().ok_or_else(|| {
        error!("stored TAF document for {} does not parse", station);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Stored document is unreadable".to_string(),
        )
    })?;

    let now = OffsetDateTime::now_utc().unix_timestamp();
    let category = category_at(&document, now, state.scheme);
    let conditions = weather_at(&document, now).unwrap_or_default();

    Ok(Json(LiveTaf {
        station_id: station,
        at: now,
        category: category.map(|c| c.as_str().to_string()),
        wind_speed: conditions.wspd,
        wind_gust: conditions.wgst,
        wind_direction: conditions.wdir,
        ceiling_ft: conditions.ceiling,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Range start, unix seconds. Defaults to one day before `end`.
    pub start: Option<i64>,
    /// Range end, unix seconds. Defaults to now.
    pub end: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/stations/{station}/history",
    params(
        ("station" = String, Path, description = "ICAO station id"),
        ("start" = Option<i64>, Query, description = "Range start, unix seconds"),
        ("end" = Option<i64>, Query, description = "Range end, unix seconds"),
    ),
    responses(
        (status = OK, description = "Observed and reconstructed forecast series", body = StationHistory),
        (status = BAD_REQUEST, description = "Invalid range"),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query snapshot store")
    ))]
pub async fn station_history(
    State(state): State<Arc<AppState>>,
    Path(station): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<StationHistory>, (StatusCode, String)> {
    let station = station.to_uppercase();
    let end = query
        .end
        .unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
    let start = query.start.unwrap_or(end - 86_400);
    if start >= end {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Invalid range: start {} is not before end {}", start, end),
        ));
    }

    let metars = state
        .store
        .metar_range(&station, start, end)
        .await
        .map_err(internal_error)?;
    let tafs = state
        .store
        .taf_range(&station, start, end)
        .await
        .map_err(internal_error)?;

    Ok(Json(StationHistory {
        station_id: station,
        start,
        end,
        observed: metar_series(&metars),
        forecast: expand_taf_series(&tafs, start, end, state.scheme),
    }))
}
