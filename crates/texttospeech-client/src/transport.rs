//! HTTP transport
//!
//! The endpoint layer only produces [`RequestDescriptor`]s and consumes
//! [`RawResponse`]s. Everything between (base URL, default headers,
//! credentials, gzip, retries and TLS) lives behind the [`Transport`] trait.

use std::fmt;
use std::io::Write as _;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use http::header::{CONTENT_ENCODING, RETRY_AFTER};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use texttospeech_config::{AuthConfig, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_INTERVAL, ServiceConfig};
use url::Url;

use crate::auth::Authenticator;
use crate::error::{Error, Result, is_retryable_status};
use crate::request::RequestDescriptor;

/// Request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Sends request descriptors over the wire
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send the request and return the raw response, whatever its status
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on connection or timeout failures,
    /// [`Error::Authentication`] if credentials cannot be attached and
    /// [`Error::PathResolution`] if the URL cannot be built
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse>;
}

/// Status, headers and undecoded body of a response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// When and how often transient failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Upper bound on any single delay
    pub max_interval: Duration,
}

impl RetryPolicy {
    /// Zero for either value selects its default
    pub fn new(max_retries: u32, max_interval: Duration) -> Self {
        Self {
            max_retries: if max_retries == 0 { DEFAULT_MAX_RETRIES } else { max_retries },
            max_interval: if max_interval.is_zero() {
                DEFAULT_MAX_RETRY_INTERVAL
            } else {
                max_interval
            },
        }
    }

    /// Exponential delay before retry number `attempt + 1`
    pub fn backoff(&self, attempt: u32) -> Duration {
        INITIAL_BACKOFF
            .saturating_mul(1_u32 << attempt.min(16))
            .min(self.max_interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

#[derive(Debug, Clone)]
struct TransportSettings {
    base_url: Url,
    default_headers: HeaderMap,
    gzip: bool,
    retry: Option<RetryPolicy>,
}

/// [`Transport`] over `reqwest`
///
/// Settings may be changed at any time; each request works on the snapshot
/// taken when it started.
pub struct HttpTransport {
    http: reqwest::Client,
    authenticator: Arc<dyn Authenticator>,
    settings: RwLock<Arc<TransportSettings>>,
}

impl HttpTransport {
    /// Create a transport for `service_url` using the shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] if the URL is invalid
    pub fn new(service_url: &str, authenticator: Arc<dyn Authenticator>) -> Result<Self> {
        Ok(Self {
            http: shared_http_client(),
            authenticator,
            settings: RwLock::new(Arc::new(TransportSettings {
                base_url: parse_service_url(service_url)?,
                default_headers: HeaderMap::new(),
                gzip: false,
                retry: None,
            })),
        })
    }

    /// Create a transport from service and auth configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid durations, headers or credentials
    /// and [`Error::PathResolution`] for an invalid service URL
    pub fn from_config(service: &ServiceConfig, auth: &AuthConfig) -> Result<Self> {
        let timeout = service.timeout().map_err(|e| Error::Config(e.to_string()))?;
        if service.disable_ssl_verification {
            tracing::warn!("TLS certificate verification is disabled for {}", service.url);
        }

        let transport = Self::new(&service.url, crate::auth::from_config(auth)?)?
            .with_http_client(build_http_client(timeout, service.disable_ssl_verification)?);

        let mut headers = HeaderMap::with_capacity(service.headers.len());
        for (name, value) in &service.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("invalid value for header '{name}': {e}")))?;
            headers.append(name, value);
        }
        transport.set_default_headers(headers);
        transport.set_enable_gzip_compression(service.enable_gzip);

        if let Some(ref retries) = service.retries {
            let interval = retries.max_retry_interval().map_err(|e| Error::Config(e.to_string()))?;
            transport.enable_retries(retries.max_retries(), interval);
        }

        Ok(transport)
    }

    /// Use a specific `reqwest` client
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Current base URL
    pub fn service_url(&self) -> Url {
        self.snapshot().base_url.clone()
    }

    /// Point later requests at a different base URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] if the URL is invalid
    pub fn set_service_url(&self, service_url: &str) -> Result<()> {
        let base_url = parse_service_url(service_url)?;
        self.update(|settings| settings.base_url = base_url);
        Ok(())
    }

    /// Replace the headers sent with every request
    ///
    /// Per-call headers of the same name take precedence.
    pub fn set_default_headers(&self, headers: HeaderMap) {
        self.update(|settings| settings.default_headers = headers);
    }

    /// Gzip request bodies
    pub fn set_enable_gzip_compression(&self, enabled: bool) {
        self.update(|settings| settings.gzip = enabled);
    }

    /// Whether request bodies are gzipped
    pub fn gzip_compression_enabled(&self) -> bool {
        self.snapshot().gzip
    }

    /// Retry connection failures, 429 and 5xx (except 501)
    ///
    /// Zero for either argument selects its default.
    pub fn enable_retries(&self, max_retries: u32, max_interval: Duration) {
        let policy = RetryPolicy::new(max_retries, max_interval);
        self.update(|settings| settings.retry = Some(policy));
    }

    /// Stop retrying
    pub fn disable_retries(&self) {
        self.update(|settings| settings.retry = None);
    }

    /// Active retry policy, if any
    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.snapshot().retry
    }

    /// Authenticator attached to every request
    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    fn snapshot(&self) -> Arc<TransportSettings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, f: impl FnOnce(&mut TransportSettings)) {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = TransportSettings::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.snapshot();
        f.debug_struct("HttpTransport")
            .field("base_url", &settings.base_url.as_str())
            .field("gzip", &settings.gzip)
            .field("retry", &settings.retry)
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let settings = self.snapshot();
        let url = request.url(&settings.base_url)?;

        let body = match request.body {
            Some(ref body) if settings.gzip => Some(gzip(body)?),
            ref body => body.clone(),
        };

        let policy = settings.retry.unwrap_or_default();
        let max_retries = settings.retry.map_or(0, |r| r.max_retries);
        let mut attempt = 0;

        loop {
            let mut headers = settings.default_headers.clone();
            headers.extend(request.headers.clone());
            if settings.gzip && body.is_some() {
                headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            }
            self.authenticator.authenticate(&mut headers).await?;

            let mut builder = self.http.request(request.method.clone(), url.clone()).headers(headers);
            if let Some(ref body) = body {
                builder = builder.body(body.clone());
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();

                    if attempt < max_retries && is_retryable_status(status) {
                        let delay = retry_after(response.headers()).map_or_else(
                            || policy.backoff(attempt),
                            |delay| delay.min(policy.max_interval),
                        );
                        attempt += 1;
                        tracing::warn!(
                            operation = request.operation,
                            %status,
                            attempt,
                            "retrying in {delay:?}"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let headers = response.headers().clone();
                    let body = response.bytes().await?;

                    return Ok(RawResponse { status, headers, body });
                }
                Err(e) if attempt < max_retries && (e.is_connect() || e.is_timeout()) => {
                    let delay = policy.backoff(attempt);
                    attempt += 1;
                    tracing::warn!(operation = request.operation, attempt, "retrying in {delay:?}: {e}");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(Error::Network(e)),
            }
        }
    }
}

/// Shared HTTP client with default settings, reused across transports
pub fn shared_http_client() -> reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| client_builder(DEFAULT_TIMEOUT).build().unwrap_or_default())
        .clone()
}

/// HTTP client for the given timeout and TLS setting
///
/// Falls back to the shared client when both are at their defaults.
pub(crate) fn build_http_client(timeout: Option<Duration>, disable_ssl_verification: bool) -> Result<reqwest::Client> {
    if timeout.is_none() && !disable_ssl_verification {
        return Ok(shared_http_client());
    }

    client_builder(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .danger_accept_invalid_certs(disable_ssl_verification)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
}

fn parse_service_url(service_url: &str) -> Result<Url> {
    let bad = |c: char| matches!(c, '{' | '}' | '"');
    if service_url.starts_with(bad) || service_url.ends_with(bad) {
        return Err(Error::PathResolution(format!(
            "service URL must not be enclosed in braces or quotes: {service_url}"
        )));
    }

    let url = Url::parse(service_url)
        .map_err(|e| Error::PathResolution(format!("invalid service URL '{service_url}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::PathResolution(format!("`{service_url}` cannot be used as a base URL")));
    }

    Ok(url)
}

/// Delay requested by a numeric `Retry-After` header
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn gzip(body: &[u8]) -> Result<Bytes> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
    encoder
        .write_all(body)
        .and_then(|()| encoder.finish())
        .map(Bytes::from)
        .map_err(|e| Error::Config(format!("failed to compress request body: {e}")))
}
