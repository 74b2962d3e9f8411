pub mod upload_routes;

pub use upload_routes::*;
