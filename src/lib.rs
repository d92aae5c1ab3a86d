//! Library crate for port-scan-rs: an async TCP port scan job engine behind a JSON polling API.
pub mod config;
pub mod error;
pub mod job;
pub mod prober;
pub mod registry;
pub mod runner;
pub mod server;
pub mod types;

pub use error::ScanError;
pub use registry::JobRegistry;
