//! Page-driver implementations.

mod chrome;

pub use chrome::{ChromeDriver, ChromeDriverFactory};
