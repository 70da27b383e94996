//! Request authenticators
//!
//! The transport hands each outgoing request's headers to an
//! [`Authenticator`] and never looks at credentials itself.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http::header::{ACCEPT, AUTHORIZATION};
use http::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use texttospeech_config::{AuthConfig, DEFAULT_IAM_URL};
use tokio::sync::Mutex;
use url::Url;

use crate::error::{Error, HttpStatusError, Result};
use crate::transport::build_http_client;

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Share of a token's lifetime after which it is refreshed
const REFRESH_FRACTION: f64 = 0.8;

/// Authentication scheme of an [`Authenticator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Iam,
    BearerToken,
    Basic,
    NoAuth,
}

/// Decorates outgoing requests with credentials
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Add credentials to the request headers
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()>;

    /// Authentication scheme
    fn kind(&self) -> AuthKind;
}

/// Build the authenticator selected by configuration
///
/// # Errors
///
/// Returns [`Error::Config`] if the credentials are malformed
pub fn from_config(config: &AuthConfig) -> Result<Arc<dyn Authenticator>> {
    Ok(match config {
        AuthConfig::Iam(iam) => {
            let mut authenticator = IamAuthenticator::new(iam.apikey.clone())?
                .with_disable_ssl_verification(iam.disable_ssl_verification)?;
            if let Some(ref url) = iam.url {
                authenticator = authenticator.with_url(url)?;
            }
            if let (Some(id), Some(secret)) = (&iam.client_id, &iam.client_secret) {
                authenticator = authenticator.with_client_credentials(id.clone(), secret.clone());
            }
            Arc::new(authenticator)
        }
        AuthConfig::BearerToken(bearer) => Arc::new(BearerTokenAuthenticator::new(bearer.bearer_token.clone())?),
        AuthConfig::Basic(basic) => Arc::new(BasicAuthenticator::new(basic.username.clone(), basic.password.clone())?),
        AuthConfig::NoAuth => Arc::new(NoAuthAuthenticator),
    })
}

/// Sends no credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthAuthenticator;

#[async_trait]
impl Authenticator for NoAuthAuthenticator {
    async fn authenticate(&self, _headers: &mut HeaderMap) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> AuthKind {
        AuthKind::NoAuth
    }
}

/// Sends a caller-managed bearer token
pub struct BearerTokenAuthenticator {
    token: SecretString,
}

impl BearerTokenAuthenticator {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the token is empty
    pub fn new(token: SecretString) -> Result<Self> {
        if token.expose_secret().is_empty() {
            return Err(Error::Config("bearer token must not be empty".to_owned()));
        }
        Ok(Self { token })
    }

    /// Replace the token, e.g. after the caller refreshed it
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = token;
        self
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(AUTHORIZATION, sensitive(format!("Bearer {}", self.token.expose_secret()))?);
        Ok(())
    }

    fn kind(&self) -> AuthKind {
        AuthKind::BearerToken
    }
}

/// HTTP basic authentication
pub struct BasicAuthenticator {
    username: String,
    password: SecretString,
}

impl BasicAuthenticator {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either value is empty or wrapped in
    /// braces or quotes, or the username contains `:`
    pub fn new(username: String, password: SecretString) -> Result<Self> {
        check_credential("username", &username)?;
        check_credential("password", password.expose_secret())?;
        if username.contains(':') {
            return Err(Error::Config("basic auth username must not contain ':'".to_owned()));
        }

        Ok(Self { username, password })
    }
}

impl fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let credentials = STANDARD.encode(format!("{}:{}", self.username, self.password.expose_secret()));
        headers.insert(AUTHORIZATION, sensitive(format!("Basic {credentials}"))?);
        Ok(())
    }

    fn kind(&self) -> AuthKind {
        AuthKind::Basic
    }
}

/// Exchanges an API key for IAM access tokens and caches them
pub struct IamAuthenticator {
    apikey: SecretString,
    token_url: Url,
    client_credentials: Option<(String, SecretString)>,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: SecretString,
    refresh_at: Instant,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl IamAuthenticator {
    /// Authenticator against the public IAM token service
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key is empty or wrapped in braces or quotes
    pub fn new(apikey: SecretString) -> Result<Self> {
        check_credential("apikey", apikey.expose_secret())?;

        Ok(Self {
            apikey,
            token_url: token_url(DEFAULT_IAM_URL)?,
            client_credentials: None,
            http: build_http_client(None, false)?,
            cached: Mutex::new(None),
        })
    }

    /// Use a different token service
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is invalid
    pub fn with_url(mut self, url: &str) -> Result<Self> {
        self.token_url = token_url(url)?;
        Ok(self)
    }

    /// Authenticate to the token service with a client ID and secret
    #[must_use]
    pub fn with_client_credentials(mut self, client_id: String, client_secret: SecretString) -> Self {
        self.client_credentials = Some((client_id, client_secret));
        self
    }

    /// Accept invalid TLS certificates from the token service
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built
    pub fn with_disable_ssl_verification(mut self, disable: bool) -> Result<Self> {
        if disable {
            self.http = build_http_client(None, true)?;
        }
        Ok(self)
    }

    /// Current access token, fetching a new one when due
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the token service rejects the key
    /// and no unexpired token is cached
    pub async fn token(&self) -> Result<SecretString> {
        let mut cached = self.cached.lock().await;
        let now = Instant::now();

        if let Some(token) = cached.as_ref()
            && now < token.refresh_at
        {
            return Ok(token.access_token.clone());
        }

        match self.request_token().await {
            Ok(fresh) => {
                let token = fresh.access_token.clone();
                *cached = Some(fresh);
                Ok(token)
            }
            Err(e) => match cached.as_ref() {
                Some(token) if now < token.expires_at => {
                    tracing::warn!("IAM token refresh failed, using cached token: {e}");
                    Ok(token.access_token.clone())
                }
                _ => Err(e),
            },
        }
    }

    async fn request_token(&self) -> Result<CachedToken> {
        tracing::debug!(url = %self.token_url, "requesting IAM access token");

        let form = [
            ("grant_type", IAM_GRANT_TYPE),
            ("apikey", self.apikey.expose_secret()),
            ("response_type", "cloud_iam"),
        ];

        let mut request = self
            .http
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&form);

        if let Some((ref id, ref secret)) = self.client_credentials {
            request = request.basic_auth(id, Some(secret.expose_secret()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("IAM token request failed: {e}")))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Authentication(format!("failed to read IAM token response: {e}")))?;

        if !status.is_success() {
            let err = HttpStatusError::new(status, headers, &body);
            return Err(Error::Authentication(format!("IAM token request failed: {err}")));
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::Authentication(format!("invalid IAM token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in);
        let now = Instant::now();

        Ok(CachedToken {
            access_token: SecretString::from(token.access_token),
            refresh_at: now + lifetime.mul_f64(REFRESH_FRACTION),
            expires_at: now + lifetime,
        })
    }
}

impl fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("token_url", &self.token_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for IamAuthenticator {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let token = self.token().await?;
        headers.insert(AUTHORIZATION, sensitive(format!("Bearer {}", token.expose_secret()))?);
        Ok(())
    }

    fn kind(&self) -> AuthKind {
        AuthKind::Iam
    }
}

fn token_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::Config(format!("invalid IAM URL '{base}': {e}")))?;

    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("invalid IAM URL '{base}'")))?
        .pop_if_empty()
        .extend(["identity", "token"]);

    Ok(url)
}

fn sensitive(value: String) -> Result<HeaderValue> {
    let mut value = HeaderValue::try_from(value)
        .map_err(|_| Error::Authentication("credentials contain invalid header characters".to_owned()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn check_credential(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Config(format!("{field} must not be empty")));
    }

    let bad = |c: char| matches!(c, '{' | '}' | '"');
    if value.starts_with(bad) || value.ends_with(bad) {
        return Err(Error::Config(format!("{field} must not be enclosed in braces or quotes")));
    }

    Ok(())
}
