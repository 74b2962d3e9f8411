pub mod category_routes;

pub use category_routes::*;
