pub mod app;
pub mod routes;
pub mod sink;

pub use app::{build_app, AppState};
