#![allow(clippy::must_use_candidate)]

//! Typed Rust client for the Text to Speech v1 REST API
//!
//! Every endpoint takes an options record, validates it into a
//! [`RequestDescriptor`] before any I/O, sends it through a [`Transport`] and
//! decodes the answer into a [`DetailedResponse`].
//!
//! ```no_run
//! # async fn run() -> texttospeech_client::Result<()> {
//! use texttospeech_client::{SynthesizeOptions, TextToSpeech};
//!
//! let client = TextToSpeech::from_env("text_to_speech")?;
//! let audio = client
//!     .synthesize(&SynthesizeOptions::new("Hello").with_voice("en-US_AllisonV3Voice"))
//!     .await?
//!     .result;
//! # let _ = audio;
//! # Ok(())
//! # }
//! ```

pub mod auth;
mod client;
pub mod constants;
pub mod decode;
pub mod error;
pub mod models;
pub mod options;
pub mod request;
pub mod response;
pub mod transport;

pub use auth::{
    AuthKind, Authenticator, BasicAuthenticator, BearerTokenAuthenticator, IamAuthenticator, NoAuthAuthenticator,
};
pub use client::TextToSpeech;
pub use constants::{AudioFormat, Endianness};
pub use error::{Error, HttpStatusError, Result, ValidationError};
pub use models::*;
pub use options::*;
pub use request::{CallOptions, Operation, RequestDescriptor, ResponseKind};
pub use response::DetailedResponse;
pub use texttospeech_config::{Config, DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_URL};
pub use transport::{HttpTransport, RawResponse, RetryPolicy, Transport};
