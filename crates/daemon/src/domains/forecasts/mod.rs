mod download_forecasts;

pub use download_forecasts::*;
