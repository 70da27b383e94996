//! Programmatic configuration builder for integration tests

use secrecy::SecretString;
use texttospeech_client::TextToSpeech;
use texttospeech_config::{AuthConfig, BearerTokenAuthConfig, Config, IamAuthConfig, RetryConfig, ServiceConfig};

/// Builder for client configurations pointed at a mock service
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Unauthenticated configuration for `url`
    pub fn new(url: &str) -> Self {
        Self {
            config: Config {
                service: ServiceConfig {
                    url: url.to_owned(),
                    ..ServiceConfig::default()
                },
                auth: AuthConfig::NoAuth,
                telemetry: None,
            },
        }
    }

    /// Send a static bearer token
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.config.auth = AuthConfig::BearerToken(BearerTokenAuthConfig {
            bearer_token: SecretString::from(token),
        });
        self
    }

    /// Exchange `apikey` at the token service under `url`
    pub fn with_iam(mut self, apikey: &str, url: &str) -> Self {
        self.config.auth = AuthConfig::Iam(IamAuthConfig {
            apikey: SecretString::from(apikey),
            url: Some(url.to_owned()),
            client_id: None,
            client_secret: None,
            disable_ssl_verification: false,
        });
        self
    }

    /// Retry transient failures with a short backoff ceiling
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.config.service.retries = Some(RetryConfig {
            max_retries,
            max_retry_interval: Some("1s".to_owned()),
        });
        self
    }

    /// Gzip request bodies
    pub fn with_gzip(mut self) -> Self {
        self.config.service.enable_gzip = true;
        self
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.config.service.headers.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Validated configuration
    pub fn build(self) -> Config {
        self.config.validate().expect("valid test configuration");
        self.config
    }

    /// Client for the validated configuration
    pub fn client(self) -> TextToSpeech {
        TextToSpeech::from_config(&self.build()).expect("client from test configuration")
    }
}
