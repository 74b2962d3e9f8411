//! Historical reconstruction of flight-category series from stored
//! snapshots.
//!
//! METAR series come straight from the rows. TAF series re-invoke the
//! evaluation engine at hourly ticks across each stored document's
//! *authority window*: from its own fetch time until the next stored
//! document's fetch time (or the query boundary), never beyond the
//! document's own validity window. Backfill and live display share one
//! engine, so a reconstructed point always equals what the dashboard
//! showed at that instant.

use avwx_core::{category_at, ClassificationScheme};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{MetarSnapshot, TafSnapshot};

/// Reconstruction grid step
pub const HISTORY_STEP_SECS: i64 = 3600;

/// One point of a reconstructed series. `category` is `None` where the
/// governing document had nothing to say - a valid data point, not a gap
/// marker.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct CategoryPoint {
    /// Unix seconds
    pub at: i64,
    pub category: Option<String>,
}

/// Observed and forecast series for one station over one query range
#[derive(Serialize, Debug, ToSchema)]
pub struct StationHistory {
    pub station_id: String,
    pub start: i64,
    pub end: i64,
    /// Stored METAR categories, oldest first
    pub observed: Vec<CategoryPoint>,
    /// Hourly re-evaluation of stored TAF documents, oldest first
    pub forecast: Vec<CategoryPoint>,
}

/// Categories observed in stored METAR rows, as-is.
pub fn metar_series(snapshots: &[MetarSnapshot]) -> Vec<CategoryPoint> {
    snapshots
        .iter()
        .map(|snapshot| CategoryPoint {
            at: snapshot.observed_at,
            category: snapshot.flight_category.clone(),
        })
        .collect()
}

/// Expand stored TAF snapshots across `[start, end)` at hourly ticks.
///
/// `snapshots` must be ordered by fetch time (the store query guarantees
/// it). Each document holds authority from its fetch time until the next
/// document's, clamped to the query range and to its own validity window;
/// ticks land on whole UTC hours so series from adjacent documents line
/// up. A stored document that no longer parses contributes nothing.
pub fn expand_taf_series(
    snapshots: &[TafSnapshot],
    start: i64,
    end: i64,
    scheme: ClassificationScheme,
) -> Vec<CategoryPoint> {
    let mut points = Vec::new();

    for (idx, snapshot) in snapshots.iter().enumerate() {
        let Some(document) = snapshot.parse_document() else {
            continue;
        };

        let authority_start = snapshot
            .fetched_at
            .max(start)
            .max(document.valid_time_from);
        let next_fetch = snapshots
            .get(idx + 1)
            .map(|next| next.fetched_at)
            .unwrap_or(end);
        let authority_end = next_fetch.min(end).min(document.valid_time_to);

        let mut tick = align_to_hour(authority_start);
        while tick < authority_end {
            points.push(CategoryPoint {
                at: tick,
                category: category_at(&document, tick, scheme).map(|c| c.as_str().to_string()),
            });
            tick += HISTORY_STEP_SECS;
        }
    }

    points
}

/// First whole UTC hour at or after `t`
fn align_to_hour(t: i64) -> i64 {
    let remainder = t.rem_euclid(HISTORY_STEP_SECS);
    if remainder == 0 {
        t
    } else {
        t - remainder + HISTORY_STEP_SECS
    }
}
