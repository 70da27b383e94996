use std::path::Path;

use secrecy::ExposeSecret;

use crate::telemetry::exporters::ExportProtocol;
use crate::{AuthConfig, Config};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns an error if the service URL, headers, durations or
    /// credentials are invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_service()?;
        self.validate_auth()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_service(&self) -> anyhow::Result<()> {
        let service = &self.service;

        if has_bad_first_or_last_char(&service.url) {
            anyhow::bail!(
                "service.url must not be enclosed in braces or quotes; remove them from `{}`",
                service.url
            );
        }
        url::Url::parse(&service.url).map_err(|e| anyhow::anyhow!("invalid service.url '{}': {e}", service.url))?;

        for (name, value) in &service.headers {
            http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| anyhow::anyhow!("invalid header name '{name}' in service.headers: {e}"))?;
            http::HeaderValue::from_str(value)
                .map_err(|e| anyhow::anyhow!("invalid value for header '{name}' in service.headers: {e}"))?;
        }

        service.timeout()?;
        if let Some(ref retries) = service.retries {
            retries.max_retry_interval()?;
        }

        Ok(())
    }

    fn validate_auth(&self) -> anyhow::Result<()> {
        match &self.auth {
            AuthConfig::Iam(iam) => {
                check_credential("auth.apikey", iam.apikey.expose_secret())?;

                if iam.client_id.is_some() != iam.client_secret.is_some() {
                    anyhow::bail!("auth.client_id and auth.client_secret must be set together");
                }

                if let Some(ref url) = iam.url {
                    url::Url::parse(url).map_err(|e| anyhow::anyhow!("invalid auth.url '{url}': {e}"))?;
                }
            }
            AuthConfig::BearerToken(bearer) => {
                check_credential("auth.bearer_token", bearer.bearer_token.expose_secret())?;
            }
            AuthConfig::Basic(basic) => {
                check_credential("auth.username", &basic.username)?;
                check_credential("auth.password", basic.password.expose_secret())?;

                if basic.username.contains(':') {
                    anyhow::bail!("auth.username must not contain ':'");
                }
            }
            AuthConfig::NoAuth => {}
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        if let Some(rate) = self
            .telemetry
            .as_ref()
            .and_then(|t| t.tracing.as_ref())
            .map(|t| t.sampling_rate)
            && !(0.0..=1.0).contains(&rate)
        {
            anyhow::bail!("telemetry.tracing.sampling_rate must be between 0.0 and 1.0, got {rate}");
        }

        if let Some(exporter) = self.telemetry.as_ref().and_then(crate::TelemetryConfig::span_exporter) {
            exporter.timeout()?;

            if exporter.protocol == ExportProtocol::Grpc && !exporter.headers.is_empty() {
                anyhow::bail!("telemetry exporter headers require protocol = \"http_proto\"");
            }
        }

        Ok(())
    }
}

fn check_credential(field: &str, value: &str) -> anyhow::Result<()> {
    if value.is_empty() {
        anyhow::bail!("{field} must not be empty");
    }

    if has_bad_first_or_last_char(value) {
        anyhow::bail!("{field} must not be enclosed in braces or quotes");
    }

    Ok(())
}

/// Values copied from templates often keep their `{}` or `""` wrappers
fn has_bad_first_or_last_char(value: &str) -> bool {
    let bad = |c: char| matches!(c, '{' | '}' | '"');
    value.starts_with(bad) || value.ends_with(bad)
}
