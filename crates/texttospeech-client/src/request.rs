//! Request descriptors
//!
//! An options record is turned into an immutable [`RequestDescriptor`] before
//! any I/O happens. The descriptor carries everything the transport needs:
//! method, resolved path segments, query pairs, headers and the serialized body.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, header};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result, ValidationError};

/// Service name reported in the analytics header
pub const ANALYTICS_SERVICE_NAME: &str = "text_to_speech";

/// API version reported in the analytics header
pub const ANALYTICS_SERVICE_VERSION: &str = "V1";

/// Header the service uses to attribute calls to an SDK operation
pub const ANALYTICS_HEADER: HeaderName = HeaderName::from_static("x-ibmcloud-sdk-analytics");

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("texttospeech-rust/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

/// Per-call extras every options record carries
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Headers added after the standard ones; same-named standard headers are replaced
    pub headers: HeaderMap,
    /// Aborts the in-flight call when cancelled
    pub cancellation: Option<CancellationToken>,
}

/// What the caller gets back from a successful call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// JSON object decoded into a model
    Structured,
    /// Raw bytes handed over without decoding
    Binary,
    /// No result; the body is ignored
    Empty,
}

/// Fully validated description of one HTTP request
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Stable operation id (`ListVoices`, `GetVoice`, ...)
    pub operation: &'static str,
    /// HTTP method
    pub method: Method,
    /// Path template the segments were resolved from
    pub path_template: &'static str,
    /// Raw (not yet percent-encoded) path segments
    pub segments: Vec<String>,
    /// Query pairs, only for fields that were set
    pub query: Vec<(&'static str, String)>,
    /// Standard and caller headers
    pub headers: HeaderMap,
    /// Serialized JSON body
    pub body: Option<Bytes>,
    /// Expected response shape
    pub response: ResponseKind,
    /// Cancellation signal for this call
    pub cancellation: Option<CancellationToken>,
}

impl RequestDescriptor {
    /// Start building a descriptor for `operation`
    pub fn builder(operation: &'static str, method: Method, path_template: &'static str) -> RequestBuilder {
        RequestBuilder {
            operation,
            method,
            path_template,
            path_params: Vec::new(),
            query: Vec::new(),
            accept: None,
            body: None,
            response: ResponseKind::Empty,
            call: CallOptions::default(),
        }
    }

    /// Resolve the request URL against the service base URL
    ///
    /// The base URL path is kept as a prefix. Each segment is percent-encoded
    /// on its own, so a value containing `/` stays a single segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] if the base URL cannot carry a path
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|()| Error::PathResolution(format!("`{base}` cannot be used as a base URL")))?
            .pop_if_empty()
            .extend(&self.segments);

        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(name, value)| (*name, value.as_str())));
        }

        Ok(url)
    }
}

/// Builder for [`RequestDescriptor`]
#[derive(Debug)]
pub struct RequestBuilder {
    operation: &'static str,
    method: Method,
    path_template: &'static str,
    path_params: Vec<(&'static str, String)>,
    query: Vec<(&'static str, String)>,
    accept: Option<HeaderValue>,
    body: Option<Bytes>,
    response: ResponseKind,
    call: CallOptions,
}

impl RequestBuilder {
    /// Bind a `{name}` placeholder of the path template
    #[must_use]
    pub fn path_param(mut self, name: &'static str, value: &str) -> Self {
        self.path_params.push((name, value.to_owned()));
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, name: &'static str, value: &str) -> Self {
        self.query.push((name, value.to_owned()));
        self
    }

    /// Add a query parameter only when the value is set
    #[must_use]
    pub fn query_opt(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    /// Set the `Accept` header
    #[must_use]
    pub fn accept(mut self, value: HeaderValue) -> Self {
        self.accept = Some(value);
        self
    }

    /// Send `Accept: application/json`
    #[must_use]
    pub fn accept_json(self) -> Self {
        self.accept(HeaderValue::from_static(JSON))
    }

    /// Set the expected response shape
    #[must_use]
    pub const fn response(mut self, kind: ResponseKind) -> Self {
        self.response = kind;
        self
    }

    /// Serialize `body` as the JSON request body
    ///
    /// # Errors
    ///
    /// Returns a validation error if the body cannot be serialized
    pub fn json_body<B: Serialize>(mut self, body: &B) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| ValidationError::InvalidValue {
            field: "body",
            reason: e.to_string(),
        })?;
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Attach the caller's per-call headers and cancellation signal
    #[must_use]
    pub fn call_options(mut self, call: &CallOptions) -> Self {
        self.call = call.clone();
        self
    }

    /// Resolve the path template and assemble the headers
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] if the template is malformed or a
    /// placeholder has no bound value
    pub fn build(self) -> Result<RequestDescriptor> {
        let segments = resolve_template(self.path_template, &self.path_params)?;

        let mut headers = HeaderMap::new();
        headers.insert(ANALYTICS_HEADER, analytics_value(self.operation)?);
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        if let Some(accept) = self.accept {
            headers.insert(header::ACCEPT, accept);
        }
        if self.body.is_some() {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON));
        }
        headers.extend(self.call.headers);

        Ok(RequestDescriptor {
            operation: self.operation,
            method: self.method,
            path_template: self.path_template,
            segments,
            query: self.query,
            headers,
            body: self.body,
            response: self.response,
            cancellation: self.call.cancellation,
        })
    }
}

/// An options record that can be turned into a request
pub trait Operation {
    /// Validate the record and build its request descriptor
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a missing or empty required field and
    /// [`Error::PathResolution`] for an unresolvable path
    fn descriptor(&self) -> Result<RequestDescriptor>;

    /// Per-call headers and cancellation
    fn call_options(&self) -> &CallOptions;

    /// Mutable access to the per-call headers and cancellation
    fn call_options_mut(&mut self) -> &mut CallOptions;

    /// Add a header to this call only
    #[must_use]
    fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self
    where
        Self: Sized,
    {
        self.call_options_mut().headers.insert(name, value);
        self
    }

    /// Abort this call when `token` is cancelled
    #[must_use]
    fn with_cancellation(mut self, token: CancellationToken) -> Self
    where
        Self: Sized,
    {
        self.call_options_mut().cancellation = Some(token);
        self
    }
}

/// Require a field to be set; an empty string is accepted
///
/// # Errors
///
/// Returns [`ValidationError::MissingRequiredField`] if `value` is `None`
pub fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    value.ok_or(ValidationError::MissingRequiredField(field))
}

/// Require a field to be set and non-empty
///
/// # Errors
///
/// Returns [`ValidationError::MissingRequiredField`] if `value` is `None` and
/// [`ValidationError::EmptyRequiredField`] if it is `""`
pub fn required_non_empty<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match required(field, value)? {
        "" => Err(ValidationError::EmptyRequiredField(field)),
        value => Ok(value),
    }
}

/// Require a list to be set; an empty list is accepted
///
/// # Errors
///
/// Returns [`ValidationError::MissingRequiredField`] if `value` is `None`
pub fn required_list<'a, T>(field: &'static str, value: Option<&'a [T]>) -> Result<&'a [T], ValidationError> {
    value.ok_or(ValidationError::MissingRequiredField(field))
}

fn analytics_value(operation: &str) -> Result<HeaderValue> {
    let value = format!(
        "service_name={ANALYTICS_SERVICE_NAME};service_version={ANALYTICS_SERVICE_VERSION};operation_id={operation}"
    );
    HeaderValue::try_from(value).map_err(|e| {
        Error::from(ValidationError::InvalidValue {
            field: "operation",
            reason: e.to_string(),
        })
    })
}

fn resolve_template(template: &str, params: &[(&'static str, String)]) -> Result<Vec<String>> {
    template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
                if segment.contains(['{', '}']) {
                    return Err(Error::PathResolution(format!(
                        "malformed placeholder in segment `{segment}` of `{template}`"
                    )));
                }
                return Ok(segment.to_owned());
            };

            if name.is_empty() || name.contains(['{', '}']) {
                return Err(Error::PathResolution(format!(
                    "malformed placeholder in segment `{segment}` of `{template}`"
                )));
            }

            let value = params
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, value)| value)
                .ok_or_else(|| Error::PathResolution(format!("no value bound for `{{{name}}}` in `{template}`")))?;

            // `.` and `..` would be collapsed by URL normalization
            if matches!(value.as_str(), "." | "..") {
                return Err(Error::PathResolution(format!("`{value}` is not a valid value for `{{{name}}}`")));
            }

            Ok(value.clone())
        })
        .collect()
}
