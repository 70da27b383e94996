use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// OTLP exporter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// OTLP endpoint URL
    pub endpoint: Url,
    /// Export protocol
    #[serde(default)]
    pub protocol: ExportProtocol,
    /// Additional headers sent to the collector (`http_proto` only)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Export timeout (e.g. "10s")
    #[serde(default)]
    pub timeout: Option<String>,
}

impl ExporterConfig {
    /// Parsed export timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout string is not a valid duration
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|s| crate::service::parse_duration("telemetry exporter timeout", s))
            .transpose()
    }
}

/// OTLP export protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportProtocol {
    /// gRPC (default)
    #[default]
    Grpc,
    /// HTTP/protobuf
    HttpProto,
}
