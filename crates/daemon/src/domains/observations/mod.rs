mod download_observations;

pub use download_observations::*;
