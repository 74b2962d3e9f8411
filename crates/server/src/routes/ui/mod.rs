mod dashboard;
mod fragments;

pub use dashboard::*;
pub use fragments::*;
