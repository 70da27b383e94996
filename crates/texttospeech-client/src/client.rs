use std::sync::Arc;

use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use texttospeech_config::Config;
use tracing::Instrument;

use crate::decode::{decode, parse_fields};
use crate::error::{Error, HttpStatusError, Result};
use crate::models::{AudioStream, CustomModel, CustomModels, Pronunciation, Translation, Voice, Voices, Words};
use crate::options::{
    AddWordOptions, AddWordsOptions, CreateCustomModelOptions, DeleteCustomModelOptions, DeleteUserDataOptions,
    DeleteWordOptions, GetCustomModelOptions, GetPronunciationOptions, GetVoiceOptions, GetWordOptions,
    ListCustomModelsOptions, ListVoicesOptions, ListWordsOptions, SynthesizeOptions, UpdateCustomModelOptions,
};
use crate::request::{Operation, RequestDescriptor};
use crate::response::DetailedResponse;
use crate::transport::{HttpTransport, RawResponse, Transport};

/// Client for the Text to Speech v1 API
///
/// Holds nothing but its transport, so clones share the connection pool and
/// any settings changed on an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TextToSpeech {
    transport: Arc<dyn Transport>,
}

impl TextToSpeech {
    /// Create a client over any transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create a client from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the service URL, headers, durations or
    /// credentials in `config` are invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.service, &config.auth)?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Create a client from `<SERVICE_NAME>_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the variables do not describe a usable
    /// configuration
    pub fn from_env(service_name: &str) -> Result<Self> {
        let config = Config::from_env(service_name).map_err(|e| Error::Config(format!("{e:#}")))?;
        Self::from_config(&config)
    }

    /// Transport the client sends requests through
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    // -- Voices --

    /// List all voices available for synthesis
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded
    pub async fn list_voices(&self, options: &ListVoicesOptions) -> Result<DetailedResponse<Voices>> {
        self.send_json(options).await
    }

    /// Get one voice, including custom model details when a customization ID is given
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a voice name, otherwise an error
    /// if the request fails or the response cannot be decoded
    pub async fn get_voice(&self, options: &GetVoiceOptions) -> Result<DetailedResponse<Voice>> {
        self.send_json(options).await
    }

    // -- Synthesis --

    /// Synthesize text to audio
    ///
    /// The body is handed over undecoded together with its content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without text or with an unusable `accept`
    /// value, otherwise an error if the request fails
    pub async fn synthesize(&self, options: &SynthesizeOptions) -> Result<DetailedResponse<AudioStream>> {
        let response = self.execute(options.descriptor()?).await?;

        let content_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Ok(DetailedResponse {
            status: response.status,
            headers: response.headers,
            result: AudioStream {
                content_type,
                data: response.body,
            },
        })
    }

    // -- Pronunciation --

    /// Get the phonetic pronunciation of a word
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without text, otherwise an error if the
    /// request fails or the response cannot be decoded
    pub async fn get_pronunciation(
        &self,
        options: &GetPronunciationOptions,
    ) -> Result<DetailedResponse<Pronunciation>> {
        self.send_json(options).await
    }

    // -- Custom models --

    /// Create an empty custom model
    ///
    /// Only `customization_id` is set on the returned model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a name, otherwise an error if the
    /// request fails or the response cannot be decoded
    pub async fn create_custom_model(
        &self,
        options: &CreateCustomModelOptions,
    ) -> Result<DetailedResponse<CustomModel>> {
        self.send_json(options).await
    }

    /// List the caller's custom models, optionally for one language
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded
    pub async fn list_custom_models(
        &self,
        options: &ListCustomModelsOptions,
    ) -> Result<DetailedResponse<CustomModels>> {
        self.send_json(options).await
    }

    /// Change the name or description of a custom model, or merge words into it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID, otherwise an
    /// error if the request fails
    pub async fn update_custom_model(&self, options: &UpdateCustomModelOptions) -> Result<DetailedResponse<()>> {
        self.send_empty(options).await
    }

    /// Get a custom model and its words
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID, otherwise an
    /// error if the request fails or the response cannot be decoded
    pub async fn get_custom_model(&self, options: &GetCustomModelOptions) -> Result<DetailedResponse<CustomModel>> {
        self.send_json(options).await
    }

    /// Delete a custom model
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID, otherwise an
    /// error if the request fails
    pub async fn delete_custom_model(&self, options: &DeleteCustomModelOptions) -> Result<DetailedResponse<()>> {
        self.send_empty(options).await
    }

    // -- Words --

    /// Add words to a custom model, overwriting existing translations
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID or word list,
    /// otherwise an error if the request fails
    pub async fn add_words(&self, options: &AddWordsOptions) -> Result<DetailedResponse<()>> {
        self.send_empty(options).await
    }

    /// List the words of a custom model in the service's ordering
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID, otherwise an
    /// error if the request fails or the response cannot be decoded
    pub async fn list_words(&self, options: &ListWordsOptions) -> Result<DetailedResponse<Words>> {
        self.send_json(options).await
    }

    /// Add or replace one word of a custom model
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID, word or
    /// translation, otherwise an error if the request fails
    pub async fn add_word(&self, options: &AddWordOptions) -> Result<DetailedResponse<()>> {
        self.send_empty(options).await
    }

    /// Get the translation of one word of a custom model
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID or word,
    /// otherwise an error if the request fails or the response cannot be decoded
    pub async fn get_word(&self, options: &GetWordOptions) -> Result<DetailedResponse<Translation>> {
        self.send_json(options).await
    }

    /// Remove one word from a custom model
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customization ID or word,
    /// otherwise an error if the request fails
    pub async fn delete_word(&self, options: &DeleteWordOptions) -> Result<DetailedResponse<()>> {
        self.send_empty(options).await
    }

    // -- User data --

    /// Delete all data associated with a customer ID
    ///
    /// Succeeds even when nothing is stored for the ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without a customer ID, otherwise an error
    /// if the request fails
    pub async fn delete_user_data(&self, options: &DeleteUserDataOptions) -> Result<DetailedResponse<()>> {
        self.send_empty(options).await
    }

    async fn send_json<T: DeserializeOwned>(&self, options: &impl Operation) -> Result<DetailedResponse<T>> {
        let request = options.descriptor()?;
        let operation = request.operation;
        let response = self.execute(request).await?;

        if response.body.is_empty() {
            return Err(Error::Decode {
                path: ".".to_owned(),
                message: format!("{operation} returned an empty body"),
            });
        }
        let result = decode(parse_fields(&response.body)?)?;

        Ok(DetailedResponse {
            status: response.status,
            headers: response.headers,
            result,
        })
    }

    async fn send_empty(&self, options: &impl Operation) -> Result<DetailedResponse<()>> {
        let response = self.execute(options.descriptor()?).await?;

        Ok(DetailedResponse {
            status: response.status,
            headers: response.headers,
            result: (),
        })
    }

    /// Send through the transport, racing the call's cancellation token
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse> {
        let span = tracing::debug_span!(
            "text_to_speech",
            operation = request.operation,
            method = %request.method,
        );

        let call = async {
            let response = self.transport.send(&request).await?;
            tracing::debug!(status = response.status.as_u16(), bytes = response.body.len(), "response received");

            if !response.status.is_success() {
                return Err(HttpStatusError::new(response.status, response.headers, &response.body).into());
            }

            Ok::<_, Error>(response)
        }
        .instrument(span);

        match request.cancellation {
            Some(ref token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(Error::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        }
    }
}
