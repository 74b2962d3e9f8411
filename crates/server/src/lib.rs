pub mod db;
mod history;
mod routes;
mod startup;
mod templates;
mod utils;

pub use db::{Database, MetarSnapshot, SnapshotStore, TafSnapshot};
pub use history::*;
pub use routes::*;
pub use startup::*;
pub use templates::*;
pub use utils::*;
