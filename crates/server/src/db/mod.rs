mod sqlite;

pub use sqlite::Database;

use async_trait::async_trait;
use avwx_core::{
    ceiling, lowest_cloud_base, ClassificationScheme, MetarReport, TafDocument, TafOutlook,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Failed to encode stored document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database integrity check failed: {0}")]
    Integrity(String),
    #[error("Database writer channel closed")]
    WriterClosed,
}

/// One stored METAR snapshot: the raw fields worth keeping plus the
/// category our classifier assigned at fetch time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct MetarSnapshot {
    pub station_id: String,
    /// Observation time, unix seconds
    pub observed_at: i64,
    /// When this fetch cycle saw the report, unix seconds
    pub fetched_at: i64,
    pub flight_category: Option<String>,
    pub ceiling_ft: Option<i64>,
    pub lowest_cloud_ft: Option<i64>,
    pub visibility: Option<String>,
    pub wind_direction: Option<i64>,
    pub wind_speed: Option<i64>,
    pub wind_gust: Option<i64>,
    pub temperature: Option<f64>,
    pub dewpoint: Option<f64>,
    pub altimeter: Option<f64>,
    pub wx_string: Option<String>,
    pub raw_ob: Option<String>,
}

impl MetarSnapshot {
    /// Write-time adapter: classify a fetched report once and freeze the
    /// result. Reports without a parseable observation time have no
    /// idempotence key and are dropped (`None`).
    pub fn from_report(
        report: &MetarReport,
        fetched_at: i64,
        scheme: ClassificationScheme,
    ) -> Option<Self> {
        let observed_at = report.observed_at()?;
        let ceiling_ft = ceiling(&report.clouds);
        let category = scheme.classify(ceiling_ft, report.visib.as_ref());

        Some(Self {
            station_id: report.icao_id.clone(),
            observed_at,
            fetched_at,
            flight_category: Some(category.as_str().to_string()),
            ceiling_ft,
            lowest_cloud_ft: lowest_cloud_base(&report.clouds),
            visibility: report.visib.as_ref().map(|v| v.to_string()),
            wind_direction: report.wdir,
            wind_speed: report.wspd,
            wind_gust: report.wgst,
            temperature: report.temp,
            dewpoint: report.dewp,
            altimeter: report.altim,
            wx_string: report.wx_string.clone(),
            raw_ob: report.raw_ob.clone(),
        })
    }
}

/// One stored TAF snapshot: fixed-horizon categories computed at fetch
/// time plus the serialized document for retroactive re-evaluation.
/// Immutable once stored; the next fetch supersedes it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct TafSnapshot {
    pub station_id: String,
    pub valid_from: i64,
    pub valid_to: i64,
    pub fetched_at: i64,
    pub category_now: Option<String>,
    pub category_2h: Option<String>,
    pub category_4h: Option<String>,
    pub category_8h: Option<String>,
    pub category_24h: Option<String>,
    /// Full TAF document as JSON
    pub document: String,
}

impl TafSnapshot {
    /// Write-time adapter: run the engine once at fetch time for every
    /// horizon and freeze the result next to the document itself.
    pub fn from_document(
        taf: &TafDocument,
        fetched_at: i64,
        scheme: ClassificationScheme,
    ) -> Result<Self, serde_json::Error> {
        let outlook = TafOutlook::compute(taf, fetched_at, scheme);
        let category = |c: Option<avwx_core::FlightCategory>| c.map(|c| c.as_str().to_string());

        Ok(Self {
            station_id: taf.icao_id.clone(),
            valid_from: taf.valid_time_from,
            valid_to: taf.valid_time_to,
            fetched_at,
            category_now: category(outlook.now),
            category_2h: category(outlook.in_2h),
            category_4h: category(outlook.in_4h),
            category_8h: category(outlook.in_8h),
            category_24h: category(outlook.in_24h),
            document: serde_json::to_string(taf)?,
        })
    }

    /// Deserialize the stored document for re-evaluation. A row written by
    /// an older build that no longer parses degrades to `None` rather than
    /// failing the whole series.
    pub fn parse_document(&self) -> Option<TafDocument> {
        serde_json::from_str(&self.document).ok()
    }
}

/// Storage boundary for computed snapshots. Inserts are idempotent on the
/// natural key, so callers re-send whole fetch batches blindly.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Store one METAR snapshot. Returns whether a new row was written.
    async fn store_metar(&self, snapshot: MetarSnapshot) -> Result<bool, Error>;
    /// Store one TAF snapshot. Returns whether a new row was written.
    async fn store_taf(&self, snapshot: TafSnapshot) -> Result<bool, Error>;
    /// Every station id with at least one stored snapshot.
    async fn stations(&self) -> Result<Vec<String>, Error>;
    /// Most recent METAR per station; all stations when the filter is empty.
    async fn latest_metars(&self, station_ids: &[String]) -> Result<Vec<MetarSnapshot>, Error>;
    /// Most recently fetched TAF per station; all stations when the filter
    /// is empty.
    async fn latest_tafs(&self, station_ids: &[String]) -> Result<Vec<TafSnapshot>, Error>;
    /// METAR snapshots observed in `[start, end)`, oldest first.
    async fn metar_range(
        &self,
        station_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<MetarSnapshot>, Error>;
    /// TAF snapshots whose authority could overlap `[start, end)`, ordered
    /// by fetch time.
    async fn taf_range(
        &self,
        station_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<TafSnapshot>, Error>;
    /// Connectivity/integrity probe for the health endpoint.
    async fn health_check(&self) -> Result<(), Error>;
}
