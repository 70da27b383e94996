use secrecy::SecretString;

use crate::{
    AuthConfig, BasicAuthConfig, BearerTokenAuthConfig, Config, IamAuthConfig, RetryConfig, ServiceConfig,
};

impl Config {
    /// Build configuration from `<SERVICE_NAME>_*` environment variables
    ///
    /// The service name is upper-cased and `-` becomes `_`, so
    /// `text_to_speech` reads `TEXT_TO_SPEECH_URL`, `TEXT_TO_SPEECH_APIKEY`
    /// and so on. Without `_AUTH_TYPE` the type follows from whichever
    /// credential is present, falling back to no authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparsable value or the
    /// selected auth type lacks its credentials
    pub fn from_env(service_name: &str) -> anyhow::Result<Self> {
        let prefix = service_name.to_uppercase().replace('-', "_");
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok().filter(|v| !v.is_empty());

        let mut service = ServiceConfig::default();
        if let Some(url) = var("URL") {
            service.url = url;
        }
        service.disable_ssl_verification = flag(&prefix, "DISABLE_SSL", var("DISABLE_SSL"))?;
        service.enable_gzip = flag(&prefix, "ENABLE_GZIP", var("ENABLE_GZIP"))?;

        if flag(&prefix, "ENABLE_RETRIES", var("ENABLE_RETRIES"))? {
            let max_retries = var("MAX_RETRIES")
                .map(|v| {
                    v.parse::<u32>()
                        .map_err(|e| anyhow::anyhow!("{prefix}_MAX_RETRIES must be a number: {e}"))
                })
                .transpose()?
                .unwrap_or_default();

            // A bare number is a count of seconds
            let max_retry_interval = var("RETRY_INTERVAL").map(|v| {
                if v.chars().all(|c| c.is_ascii_digit()) {
                    format!("{v}s")
                } else {
                    v
                }
            });

            service.retries = Some(RetryConfig {
                max_retries,
                max_retry_interval,
            });
        }

        let auth_type = var("AUTH_TYPE").map(|t| t.to_lowercase()).unwrap_or_else(|| {
            if var("APIKEY").is_some() {
                "iam".to_owned()
            } else if var("BEARER_TOKEN").is_some() {
                "bearer_token".to_owned()
            } else if var("USERNAME").is_some() {
                "basic".to_owned()
            } else {
                "no_auth".to_owned()
            }
        });

        let required = |suffix: &str| {
            var(suffix).ok_or_else(|| anyhow::anyhow!("{prefix}_{suffix} is required for {auth_type} authentication"))
        };

        let auth = match auth_type.as_str() {
            "iam" => AuthConfig::Iam(IamAuthConfig {
                apikey: SecretString::from(required("APIKEY")?),
                url: var("AUTH_URL"),
                client_id: var("CLIENT_ID"),
                client_secret: var("CLIENT_SECRET").map(SecretString::from),
                disable_ssl_verification: flag(&prefix, "AUTH_DISABLE_SSL", var("AUTH_DISABLE_SSL"))?,
            }),
            "bearer_token" | "bearertoken" => AuthConfig::BearerToken(BearerTokenAuthConfig {
                bearer_token: SecretString::from(required("BEARER_TOKEN")?),
            }),
            "basic" => AuthConfig::Basic(BasicAuthConfig {
                username: required("USERNAME")?,
                password: SecretString::from(required("PASSWORD")?),
            }),
            "no_auth" | "noauth" => AuthConfig::NoAuth,
            other => anyhow::bail!("unsupported {prefix}_AUTH_TYPE '{other}'"),
        };

        tracing::debug!(service = %prefix, auth = auth.kind(), "loaded configuration from environment");

        let config = Self {
            service,
            auth,
            telemetry: None,
        };
        config.validate()?;

        Ok(config)
    }
}

fn flag(prefix: &str, suffix: &str, value: Option<String>) -> anyhow::Result<bool> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("false" | "0") => Ok(false),
        Some("true" | "1") => Ok(true),
        Some(other) => anyhow::bail!("{prefix}_{suffix} must be true or false, got '{other}'"),
    }
}
