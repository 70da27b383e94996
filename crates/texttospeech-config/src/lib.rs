#![allow(clippy::must_use_candidate)]

pub mod auth;
mod env;
mod environment;
mod loader;
pub mod service;
pub mod telemetry;

use serde::Deserialize;

pub use auth::*;
pub use service::*;
pub use telemetry::TelemetryConfig;

/// Service name used for environment lookups when none is given
pub const DEFAULT_SERVICE_NAME: &str = "text_to_speech";

/// Top-level client configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Endpoint and transport settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Credentials
    #[serde(default)]
    pub auth: AuthConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
