//! Flight-category classification.
//!
//! Two threshold tables share one classification shape: each axis (ceiling,
//! visibility) is judged on its own, and the more severe result wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Visibility;

const KM_PER_STATUTE_MILE: f64 = 1.60934;

/// Overall visual-flight-suitability classification, ordered by severity:
/// `VFR < MVFR < IFR < LIFR`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FlightCategory {
    #[serde(rename = "VFR")]
    Vfr,
    #[serde(rename = "MVFR")]
    Mvfr,
    #[serde(rename = "IFR")]
    Ifr,
    #[serde(rename = "LIFR")]
    Lifr,
}

impl FlightCategory {
    pub fn severity(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlightCategory::Vfr => "VFR",
            FlightCategory::Mvfr => "MVFR",
            FlightCategory::Ifr => "IFR",
            FlightCategory::Lifr => "LIFR",
        }
    }
}

impl fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown flight category: {0}")]
pub struct ParseCategoryError(String);

impl FromStr for FlightCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VFR" => Ok(FlightCategory::Vfr),
            "MVFR" => Ok(FlightCategory::Mvfr),
            "IFR" => Ok(FlightCategory::Ifr),
            "LIFR" => Ok(FlightCategory::Lifr),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// Worst-case combination. `None` means "insufficient data" and combines as
/// identity: `worst(None, x) = x`. Associative and commutative.
pub fn worst(
    a: Option<FlightCategory>,
    b: Option<FlightCategory>,
) -> Option<FlightCategory> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Threshold table selector. The engine never branches on the scheme; only
/// the per-axis tables below differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationScheme {
    /// Four tiers on ceiling feet / visibility statute miles
    #[default]
    FourTier,
    /// Simplified VFR/IFR split on ceiling feet / visibility kilometers
    TwoTier,
}

impl ClassificationScheme {
    fn ceiling_category(self, ceiling_ft: Option<i64>) -> FlightCategory {
        let Some(ceiling_ft) = ceiling_ft else {
            // No ceiling reported means no restriction on this axis
            return FlightCategory::Vfr;
        };
        match self {
            ClassificationScheme::FourTier => {
                if ceiling_ft < 500 {
                    FlightCategory::Lifr
                } else if ceiling_ft < 1000 {
                    FlightCategory::Ifr
                } else if ceiling_ft <= 3000 {
                    FlightCategory::Mvfr
                } else {
                    FlightCategory::Vfr
                }
            }
            ClassificationScheme::TwoTier => {
                if ceiling_ft <= 1500 {
                    FlightCategory::Ifr
                } else {
                    FlightCategory::Vfr
                }
            }
        }
    }

    fn visibility_category(self, visib: Option<&Visibility>) -> FlightCategory {
        let Some(miles) = visib.and_then(Visibility::statute_miles) else {
            return FlightCategory::Vfr;
        };
        match self {
            ClassificationScheme::FourTier => {
                if miles < 1.0 {
                    FlightCategory::Lifr
                } else if miles < 3.0 {
                    FlightCategory::Ifr
                } else if miles <= 5.0 {
                    FlightCategory::Mvfr
                } else {
                    FlightCategory::Vfr
                }
            }
            ClassificationScheme::TwoTier => {
                if miles * KM_PER_STATUTE_MILE <= 5.0 {
                    FlightCategory::Ifr
                } else {
                    FlightCategory::Vfr
                }
            }
        }
    }

    /// Classify reported conditions. Each axis is judged independently and
    /// the more severe result wins; an absent axis is unrestricted, so a
    /// report with neither ceiling nor visibility classifies VFR.
    pub fn classify(
        self,
        ceiling_ft: Option<i64>,
        visib: Option<&Visibility>,
    ) -> FlightCategory {
        self.ceiling_category(ceiling_ft)
            .max(self.visibility_category(visib))
    }
}

impl FromStr for ClassificationScheme {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "four_tier" => Ok(ClassificationScheme::FourTier),
            "two_tier" => Ok(ClassificationScheme::TwoTier),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vis(text: &str) -> Option<Visibility> {
        Some(Visibility::Text(text.to_string()))
    }

    #[test]
    fn no_data_defaults_to_vfr() {
        let scheme = ClassificationScheme::FourTier;
        assert_eq!(scheme.classify(None, None), FlightCategory::Vfr);
    }

    #[test]
    fn four_tier_ceiling_thresholds() {
        let scheme = ClassificationScheme::FourTier;
        assert_eq!(scheme.classify(Some(400), vis("10").as_ref()), FlightCategory::Lifr);
        assert_eq!(scheme.classify(Some(500), None), FlightCategory::Ifr);
        assert_eq!(scheme.classify(Some(999), None), FlightCategory::Ifr);
        assert_eq!(scheme.classify(Some(1000), None), FlightCategory::Mvfr);
        assert_eq!(scheme.classify(Some(3000), None), FlightCategory::Mvfr);
        assert_eq!(scheme.classify(Some(3500), vis("10").as_ref()), FlightCategory::Vfr);
    }

    #[test]
    fn four_tier_visibility_thresholds() {
        let scheme = ClassificationScheme::FourTier;
        assert_eq!(scheme.classify(None, vis("0.5").as_ref()), FlightCategory::Lifr);
        assert_eq!(scheme.classify(None, vis("1").as_ref()), FlightCategory::Ifr);
        assert_eq!(scheme.classify(None, vis("2").as_ref()), FlightCategory::Ifr);
        assert_eq!(scheme.classify(None, vis("3").as_ref()), FlightCategory::Mvfr);
        assert_eq!(scheme.classify(None, vis("5").as_ref()), FlightCategory::Mvfr);
        assert_eq!(scheme.classify(None, vis("6+").as_ref()), FlightCategory::Vfr);
    }

    #[test]
    fn visibility_dominates_a_better_ceiling() {
        let scheme = ClassificationScheme::FourTier;
        assert_eq!(scheme.classify(Some(1500), vis("2").as_ref()), FlightCategory::Ifr);
    }

    #[test]
    fn plus_notation_resolves_to_the_better_category() {
        let scheme = ClassificationScheme::FourTier;
        // Exactly 5 SM is MVFR; "5+" means more than 5 and is VFR
        assert_eq!(scheme.classify(None, vis("5").as_ref()), FlightCategory::Mvfr);
        assert_eq!(scheme.classify(None, vis("5+").as_ref()), FlightCategory::Vfr);
    }

    #[test]
    fn classify_is_monotonic_in_each_axis() {
        let scheme = ClassificationScheme::FourTier;
        let ceilings = [None, Some(5000), Some(2500), Some(800), Some(300)];
        let visibilities = ["10", "4", "2", "0.5"];

        // Lowering the ceiling never improves the category
        for v in visibilities {
            let mut last = FlightCategory::Vfr;
            for c in ceilings {
                let cat = scheme.classify(c, vis(v).as_ref());
                assert!(cat >= last, "ceiling {c:?} vis {v} regressed");
                last = cat;
            }
        }

        // Lowering the visibility never improves the category
        for c in ceilings {
            let mut last = FlightCategory::Vfr;
            for v in visibilities {
                let cat = scheme.classify(c, vis(v).as_ref());
                assert!(cat >= last, "ceiling {c:?} vis {v} regressed");
                last = cat;
            }
        }
    }

    #[test]
    fn two_tier_splits_on_ceiling_or_visibility() {
        let scheme = ClassificationScheme::TwoTier;
        assert_eq!(scheme.classify(Some(1500), vis("10").as_ref()), FlightCategory::Ifr);
        assert_eq!(scheme.classify(Some(1600), vis("10").as_ref()), FlightCategory::Vfr);
        // 3 SM is ~4.8 km, inside the 5 km IFR bound
        assert_eq!(scheme.classify(None, vis("3").as_ref()), FlightCategory::Ifr);
        assert_eq!(scheme.classify(None, vis("4").as_ref()), FlightCategory::Vfr);
        assert_eq!(scheme.classify(None, None), FlightCategory::Vfr);
    }

    #[test]
    fn worst_treats_none_as_identity() {
        assert_eq!(worst(None, None), None);
        assert_eq!(worst(None, Some(FlightCategory::Ifr)), Some(FlightCategory::Ifr));
        assert_eq!(worst(Some(FlightCategory::Mvfr), None), Some(FlightCategory::Mvfr));
        assert_eq!(
            worst(Some(FlightCategory::Vfr), Some(FlightCategory::Lifr)),
            Some(FlightCategory::Lifr)
        );
    }

    #[test]
    fn category_severity_order() {
        assert!(FlightCategory::Vfr < FlightCategory::Mvfr);
        assert!(FlightCategory::Mvfr < FlightCategory::Ifr);
        assert!(FlightCategory::Ifr < FlightCategory::Lifr);
        assert_eq!(FlightCategory::Lifr.severity(), 3);
    }

    #[test]
    fn category_parses_from_stored_text() {
        assert_eq!("IFR".parse::<FlightCategory>(), Ok(FlightCategory::Ifr));
        assert_eq!("lifr".parse::<FlightCategory>(), Ok(FlightCategory::Lifr));
        assert!("SVFR".parse::<FlightCategory>().is_err());
    }
}
