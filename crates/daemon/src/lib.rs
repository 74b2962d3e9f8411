mod domains;
mod stations;
mod upload;
mod utils;

pub use domains::*;
pub use stations::*;
pub use upload::*;
pub use utils::*;
