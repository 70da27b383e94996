use secrecy::SecretString;
use serde::Deserialize;

/// Token service used when `iam.url` is not set
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

/// How requests are authenticated
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Exchange an API key for short-lived IAM access tokens
    Iam(IamAuthConfig),
    /// Send a caller-managed bearer token
    BearerToken(BearerTokenAuthConfig),
    /// HTTP basic authentication
    Basic(BasicAuthConfig),
    /// No credentials (e.g. behind an authenticating proxy)
    #[default]
    NoAuth,
}

impl AuthConfig {
    /// Name of the auth type as written in configuration
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Iam(_) => "iam",
            Self::BearerToken(_) => "bearer_token",
            Self::Basic(_) => "basic",
            Self::NoAuth => "no_auth",
        }
    }
}

/// IAM API key authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IamAuthConfig {
    /// API key
    pub apikey: SecretString,
    /// Token service base URL
    #[serde(default)]
    pub url: Option<String>,
    /// Client ID sent as basic auth to the token service
    #[serde(default)]
    pub client_id: Option<String>,
    /// Client secret sent as basic auth to the token service
    #[serde(default)]
    pub client_secret: Option<SecretString>,
    /// Accept invalid TLS certificates from the token service
    #[serde(default)]
    pub disable_ssl_verification: bool,
}

/// Static bearer token authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BearerTokenAuthConfig {
    /// Access token
    pub bearer_token: SecretString,
}

/// HTTP basic authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthConfig {
    /// Username
    pub username: String,
    /// Password
    pub password: SecretString,
}
