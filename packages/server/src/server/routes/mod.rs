pub mod download;
pub mod export;
pub mod health;
pub mod scrape;
pub mod sessions;

pub use download::download_handler;
pub use export::export_handler;
pub use health::health_handler;
pub use scrape::scrape_handler;
pub use sessions::stop_handler;
