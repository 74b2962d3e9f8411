//! avwx-monitor Core Library
//!
//! Shared pieces for the server and daemon services:
//! - Configuration loading (XDG-compliant)
//! - File system utilities
//! - Provider-shaped METAR/TAF data model
//! - Flight-category classification and the TAF evaluation engine

mod category;
mod config;
pub mod fs;
mod model;
mod taf;

pub use category::{worst, ClassificationScheme, FlightCategory, ParseCategoryError};
pub use config::{
    find_config_file, get_xdg_cache_dir, get_xdg_data_dir, load_config, ConfigSource,
};
pub use fs::{create_dir_all, ensure_dir_exists, path_exists};
pub use model::{
    ChangeIndicator, CloudCover, CloudLayer, ForecastPeriod, MetarReport, TafDocument, Visibility,
};
pub use taf::{
    category_at, ceiling, lowest_cloud_base, period_category, weather_at, ForecastConditions,
    TafOutlook,
};

/// Application name used for XDG paths
pub const APP_NAME: &str = "avwx-monitor";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 9810;

/// Default daemon fetch interval (10 minutes; METARs refresh roughly hourly)
pub const DEFAULT_FETCH_INTERVAL: u64 = 600;
