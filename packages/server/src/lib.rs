//! HTTP layer for the map-feed extraction service.
//!
//! Thin by design: session lifecycle, extraction semantics, and export live
//! in the `harvester` crate; this crate owns request validation, the
//! streamed NDJSON response plumbing, and configuration from the
//! environment.

pub mod config;
pub mod server;

pub use config::Config;
