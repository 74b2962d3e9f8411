//! Data model for the aviation weather provider's JSON feeds.
//!
//! Field names mirror the provider payloads (`icaoId`, `validTimeFrom`,
//! `fcstChange`, ...) so both services can pass documents through without a
//! mapping layer. Deserialization is deliberately lenient: every optional
//! field defaults, and values the provider reports in a surprising shape
//! (a `"VRB"` wind direction, an unlisted sky-cover code) degrade to
//! "not reported" instead of failing the whole batch.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use time::macros::format_description;
use time::PrimitiveDateTime;

/// Sky cover of a single cloud layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum CloudCover {
    #[serde(rename = "SKC")]
    Skc,
    #[serde(rename = "CLR")]
    Clr,
    #[serde(rename = "FEW")]
    Few,
    #[serde(rename = "SCT")]
    Sct,
    #[serde(rename = "BKN")]
    Bkn,
    #[serde(rename = "OVC")]
    Ovc,
    #[serde(rename = "OVX")]
    Ovx,
    /// Cover codes outside the evaluated set (CAVOK, NSC, ...). Never a
    /// ceiling.
    Other,
}

impl CloudCover {
    /// Broken or denser cover defines a ceiling.
    pub fn is_ceiling(self) -> bool {
        matches!(self, CloudCover::Bkn | CloudCover::Ovc | CloudCover::Ovx)
    }
}

impl<'de> Deserialize<'de> for CloudCover {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Ok(match code.as_str() {
            "SKC" => CloudCover::Skc,
            "CLR" => CloudCover::Clr,
            "FEW" => CloudCover::Few,
            "SCT" => CloudCover::Sct,
            "BKN" => CloudCover::Bkn,
            "OVC" => CloudCover::Ovc,
            "OVX" => CloudCover::Ovx,
            _ => CloudCover::Other,
        })
    }
}

/// One reported cloud layer. The provider lists layers lowest-first; that
/// ordering is an input contract, not something this model enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CloudLayer {
    pub cover: CloudCover,
    /// Layer base in feet AGL
    #[serde(default)]
    pub base: Option<i64>,
}

/// Reported visibility: numeric statute miles or the provider's
/// plus-notation strings (`"6+"`, `"10+"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Visibility {
    Miles(f64),
    Text(String),
}

impl Visibility {
    /// Numeric value in statute miles.
    ///
    /// Plus-notation resolves a hair above the stated number, so "6 or
    /// greater" sorts into the better category at the 6 SM boundary.
    /// Unparseable strings carry no constraint.
    pub fn statute_miles(&self) -> Option<f64> {
        match self {
            Visibility::Miles(value) => Some(*value),
            Visibility::Text(text) => {
                let text = text.trim();
                match text.strip_suffix('+') {
                    Some(number) => number.trim().parse::<f64>().ok().map(|v| v + 0.1),
                    None => text.parse::<f64>().ok(),
                }
            }
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Miles(value) => write!(f, "{}", value),
            Visibility::Text(text) => f.write_str(text),
        }
    }
}

/// Deserialize an integer field the provider sometimes reports as a string
/// (`"wdir": "VRB"`) or as a float. Non-numeric text becomes `None`.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(value)) => Some(value),
        Some(Raw::Float(value)) => Some(value.round() as i64),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

/// Change-group marker on a TAF forecast period. Base periods carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ChangeIndicator {
    #[serde(rename = "BECMG")]
    Becmg,
    #[serde(rename = "TEMPO")]
    Tempo,
    #[serde(rename = "PROB")]
    Prob,
    /// Markers outside the evaluated set. Matched by no combination rule.
    Other,
}

impl<'de> Deserialize<'de> for ChangeIndicator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let marker = String::deserialize(deserializer)?;
        Ok(match marker.as_str() {
            "BECMG" => ChangeIndicator::Becmg,
            "TEMPO" => ChangeIndicator::Tempo,
            // Some feeds fold the percentage into the marker ("PROB30")
            m if m.starts_with("PROB") => ChangeIndicator::Prob,
            _ => ChangeIndicator::Other,
        })
    }
}

/// One period of a TAF document: either a base period (no `fcst_change`)
/// or a conditional change group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub time_from: i64,
    pub time_to: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcst_change: Option<ChangeIndicator>,
    /// When a BECMG transition completes. Stored, not evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_bec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub wdir: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub wspd: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub wgst: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visib: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wx_string: Option<String>,
    #[serde(default)]
    pub clouds: Vec<CloudLayer>,
}

impl ForecastPeriod {
    /// Whether `target` falls inside the period's half-open window.
    /// Malformed windows (`time_to <= time_from`) contain nothing.
    pub fn contains(&self, target: i64) -> bool {
        self.time_from <= target && target < self.time_to
    }
}

/// A full TAF document as fetched: validity window plus an ordered list of
/// forecast periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TafDocument {
    pub icao_id: String,
    pub valid_time_from: i64,
    pub valid_time_to: i64,
    #[serde(default, rename = "rawTAF", skip_serializing_if = "Option::is_none")]
    pub raw_taf: Option<String>,
    #[serde(default)]
    pub fcsts: Vec<ForecastPeriod>,
}

impl TafDocument {
    /// The document has no authority outside `[valid_time_from, valid_time_to)`.
    pub fn in_validity(&self, target: i64) -> bool {
        self.valid_time_from <= target && target < self.valid_time_to
    }

    /// Periods with no change marker, in document order.
    pub fn base_periods(&self) -> impl Iterator<Item = &ForecastPeriod> {
        self.fcsts.iter().filter(|p| p.fcst_change.is_none())
    }

    /// Change groups (BECMG/TEMPO/PROB/...), in document order.
    pub fn change_groups(&self) -> impl Iterator<Item = &ForecastPeriod> {
        self.fcsts.iter().filter(|p| p.fcst_change.is_some())
    }
}

/// A current-observation report as fetched from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetarReport {
    pub icao_id: String,
    /// Observation time, `2024-08-12 15:53:00` (UTC)
    #[serde(default)]
    pub report_time: Option<String>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub dewp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub wdir: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub wspd: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub wgst: Option<i64>,
    #[serde(default)]
    pub visib: Option<Visibility>,
    #[serde(default)]
    pub altim: Option<f64>,
    #[serde(default)]
    pub wx_string: Option<String>,
    /// The provider's own category call. Carried for reference; storage
    /// uses our classifier so every station is judged by one table.
    #[serde(default)]
    pub flt_cat: Option<String>,
    #[serde(default)]
    pub raw_ob: Option<String>,
    #[serde(default)]
    pub clouds: Vec<CloudLayer>,
}

impl MetarReport {
    /// Observation time as unix seconds, parsed from `report_time`.
    pub fn observed_at(&self) -> Option<i64> {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let text = self.report_time.as_deref()?;
        PrimitiveDateTime::parse(text.trim(), &format)
            .ok()
            .map(|dt| dt.assume_utc().unix_timestamp())
    }
}
