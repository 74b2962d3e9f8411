pub mod ingest;
pub mod stations;
pub mod ui;

pub use ingest::*;
pub use stations::*;
pub use ui::*;
