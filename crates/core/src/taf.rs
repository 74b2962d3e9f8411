//! TAF evaluation engine.
//!
//! Pure functions of an immutable [`TafDocument`] and a target unix time.
//! The same engine backs the live display path and the retroactive
//! expansion of stored documents, so the two can never drift apart.
//!
//! Category resolution combines worst-case-wins; wind/gust/ceiling resolve
//! under a separate overwrite-vs-overlay rule because they are point
//! values, not severities.

use serde::{Deserialize, Serialize};

use crate::category::{worst, ClassificationScheme, FlightCategory};
use crate::model::{ChangeIndicator, CloudLayer, ForecastPeriod, TafDocument};

/// Ceiling in feet AGL: the base of the first broken-or-denser layer.
///
/// Layers are scanned in list order; the provider orders them lowest-first
/// (an input contract this function relies on but does not enforce). FEW
/// and SCT never define a ceiling regardless of height.
pub fn ceiling(clouds: &[CloudLayer]) -> Option<i64> {
    clouds
        .iter()
        .find(|layer| layer.cover.is_ceiling())
        .and_then(|layer| layer.base)
}

/// Lowest reported cloud base of any cover type. Storage and display only,
/// never classification.
pub fn lowest_cloud_base(clouds: &[CloudLayer]) -> Option<i64> {
    clouds.iter().filter_map(|layer| layer.base).min()
}

/// Category a single forecast period reports on its own.
///
/// `None` only when the period carries neither a derived ceiling nor a
/// visibility - "nothing reported", as opposed to "reported and clear",
/// which classifies VFR.
pub fn period_category(
    period: &ForecastPeriod,
    scheme: ClassificationScheme,
) -> Option<FlightCategory> {
    let ceiling_ft = ceiling(&period.clouds);
    if ceiling_ft.is_none() && period.visib.is_none() {
        return None;
    }
    Some(scheme.classify(ceiling_ft, period.visib.as_ref()))
}

/// Flight category the document forecasts for `target` (unix seconds).
///
/// Resolution order: the first base period containing the target seeds the
/// category; every BECMG group whose transition has begun
/// (`time_from <= target`, permanent from then on - `time_bec` is not
/// consulted) combines in; every TEMPO/PROB group whose own window contains
/// the target overlays. All combination is worst-case-wins, which is
/// associative and commutative, so one pass in document order suffices.
pub fn category_at(
    taf: &TafDocument,
    target: i64,
    scheme: ClassificationScheme,
) -> Option<FlightCategory> {
    if !taf.in_validity(target) {
        return None;
    }

    let mut category = taf
        .base_periods()
        .find(|period| period.contains(target))
        .and_then(|period| period_category(period, scheme));

    for group in taf.change_groups() {
        let applies = match group.fcst_change {
            Some(ChangeIndicator::Becmg) => group.time_from <= target,
            Some(ChangeIndicator::Tempo) | Some(ChangeIndicator::Prob) => {
                group.contains(target)
            }
            _ => false,
        };
        if applies {
            category = worst(category, period_category(group, scheme));
        }
    }

    category
}

/// Point-value weather parameters resolved for one instant. Fields are
/// individually nullable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastConditions {
    pub wspd: Option<i64>,
    pub wgst: Option<i64>,
    pub wdir: Option<i64>,
    pub ceiling: Option<i64>,
}

/// Wind and ceiling the document forecasts for `target`.
///
/// Unlike categories, point values do not combine worst-case overall:
/// a begun BECMG *overwrites* every field it explicitly reports, while a
/// covering TEMPO/PROB contributes the more extreme value per field -
/// higher wind and gust, lower ceiling. Direction has no "worse" ordering,
/// so only BECMG ever touches `wdir`.
///
/// Returns `None` outside the validity window.
pub fn weather_at(taf: &TafDocument, target: i64) -> Option<ForecastConditions> {
    if !taf.in_validity(target) {
        return None;
    }

    let mut conditions = match taf.base_periods().find(|period| period.contains(target)) {
        Some(base) => ForecastConditions {
            wspd: base.wspd,
            wgst: base.wgst,
            wdir: base.wdir,
            ceiling: ceiling(&base.clouds),
        },
        None => ForecastConditions::default(),
    };

    // Overwrite and overlay do not commute, so permanent transitions apply
    // strictly before temporary overlays, whatever the document order
    for group in taf.change_groups() {
        if group.fcst_change == Some(ChangeIndicator::Becmg) && group.time_from <= target {
            if group.wspd.is_some() {
                conditions.wspd = group.wspd;
            }
            if group.wgst.is_some() {
                conditions.wgst = group.wgst;
            }
            if group.wdir.is_some() {
                conditions.wdir = group.wdir;
            }
            if !group.clouds.is_empty() {
                // A reported cloud state replaces the old one outright,
                // even when the new state has no ceiling
                conditions.ceiling = ceiling(&group.clouds);
            }
        }
    }

    for group in taf.change_groups() {
        let overlays = matches!(
            group.fcst_change,
            Some(ChangeIndicator::Tempo) | Some(ChangeIndicator::Prob)
        );
        if overlays && group.contains(target) {
            if let Some(wspd) = group.wspd {
                conditions.wspd =
                    Some(conditions.wspd.map_or(wspd, |current| current.max(wspd)));
            }
            if let Some(wgst) = group.wgst {
                conditions.wgst =
                    Some(conditions.wgst.map_or(wgst, |current| current.max(wgst)));
            }
            if let Some(base_ft) = ceiling(&group.clouds) {
                conditions.ceiling = Some(
                    conditions
                        .ceiling
                        .map_or(base_ft, |current| current.min(base_ft)),
                );
            }
        }
    }

    Some(conditions)
}

/// Fixed-horizon categories computed once at fetch time and persisted, so
/// reads never re-run the engine. Immutable once stored; the next fetch
/// supersedes rather than mutates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TafOutlook {
    pub now: Option<FlightCategory>,
    pub in_2h: Option<FlightCategory>,
    pub in_4h: Option<FlightCategory>,
    pub in_8h: Option<FlightCategory>,
    pub in_24h: Option<FlightCategory>,
}

impl TafOutlook {
    pub fn compute(taf: &TafDocument, now: i64, scheme: ClassificationScheme) -> Self {
        let at = |hours: i64| category_at(taf, now + hours * 3600, scheme);
        Self {
            now: at(0),
            in_2h: at(2),
            in_4h: at(4),
            in_8h: at(8),
            in_24h: at(24),
        }
    }
}
