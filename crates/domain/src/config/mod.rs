//! Configuration module for Ferrous Forwarder
//!
//! This module contains all configuration structures organized by concern:
//! - `root`: Main configuration and CLI overrides
//! - `server`: Listen address, workers and TCP connection limits
//! - `upstream`: Upstream servers, timeouts and attempt budget
//! - `cache`: Cache capacity and TTL bounds
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod cache;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;

pub use cache::CacheConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
