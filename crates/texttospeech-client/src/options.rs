//! One options record per endpoint
//!
//! Required fields are `Option`s too, so an incomplete record can be built and
//! is only rejected when its descriptor is requested. Unset optional fields
//! never reach the query string or the body.

use http::{HeaderValue, Method};
use serde::Serialize;

use crate::constants::{AudioFormat, DEFAULT_AUDIO_FORMAT, Endianness};
use crate::error::{Result, ValidationError};
use crate::models::Word;
use crate::request::{
    CallOptions, Operation, RequestDescriptor, ResponseKind, required, required_list, required_non_empty,
};

macro_rules! call_options {
    () => {
        fn call_options(&self) -> &CallOptions {
            &self.call
        }

        fn call_options_mut(&mut self) -> &mut CallOptions {
            &mut self.call
        }
    };
}

// -- Voices --

/// List all available voices
#[derive(Debug, Clone, Default)]
pub struct ListVoicesOptions {
    pub call: CallOptions,
}

impl ListVoicesOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Operation for ListVoicesOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        RequestDescriptor::builder("ListVoices", Method::GET, "/v1/voices")
            .accept_json()
            .response(ResponseKind::Structured)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Get a single voice, optionally with a custom model applied
#[derive(Debug, Clone, Default)]
pub struct GetVoiceOptions {
    /// Voice name (required, non-empty)
    pub voice: Option<String>,
    /// Custom model whose information is included in the result
    pub customization_id: Option<String>,
    pub call: CallOptions,
}

impl GetVoiceOptions {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: Some(voice.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_customization_id(mut self, customization_id: impl Into<String>) -> Self {
        self.customization_id = Some(customization_id.into());
        self
    }
}

impl Operation for GetVoiceOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let voice = required_non_empty("voice", self.voice.as_deref())?;

        RequestDescriptor::builder("GetVoice", Method::GET, "/v1/voices/{voice}")
            .path_param("voice", voice)
            .query_opt("customization_id", self.customization_id.as_deref())
            .accept_json()
            .response(ResponseKind::Structured)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

// -- Synthesis --

/// Synthesize text to audio
#[derive(Debug, Clone, Default)]
pub struct SynthesizeOptions {
    /// Plain text or SSML to synthesize (required)
    pub text: Option<String>,
    /// Audio format, sent as `Accept`; [`DEFAULT_AUDIO_FORMAT`] when unset
    pub accept: Option<String>,
    /// Voice to synthesize with
    pub voice: Option<String>,
    /// Custom model to apply
    pub customization_id: Option<String>,
    pub call: CallOptions,
}

#[derive(Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
}

impl SynthesizeOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Request `format`, with optional sampling rate and endianness modifiers
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the modifiers are not valid for the format
    pub fn with_audio_format(
        self,
        format: &AudioFormat,
        rate: Option<u32>,
        endianness: Option<Endianness>,
    ) -> Result<Self, ValidationError> {
        Ok(self.with_accept(format.accept_value(rate, endianness)?))
    }

    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    #[must_use]
    pub fn with_customization_id(mut self, customization_id: impl Into<String>) -> Self {
        self.customization_id = Some(customization_id.into());
        self
    }
}

impl Operation for SynthesizeOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let text = required("text", self.text.as_deref())?;
        let accept = self.accept.as_deref().unwrap_or(DEFAULT_AUDIO_FORMAT);
        let accept = HeaderValue::from_str(accept).map_err(|e| ValidationError::InvalidValue {
            field: "accept",
            reason: e.to_string(),
        })?;

        RequestDescriptor::builder("Synthesize", Method::POST, "/v1/synthesize")
            .query_opt("voice", self.voice.as_deref())
            .query_opt("customization_id", self.customization_id.as_deref())
            .accept(accept)
            .response(ResponseKind::Binary)
            .json_body(&SynthesizeBody { text })?
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Get the phonetic pronunciation of a word
#[derive(Debug, Clone, Default)]
pub struct GetPronunciationOptions {
    /// Word to pronounce (required)
    pub text: Option<String>,
    /// Voice whose language is used
    pub voice: Option<String>,
    /// Phoneme format, `ibm` or `ipa`
    pub format: Option<String>,
    /// Custom model whose translation is used, if it has one for the word
    pub customization_id: Option<String>,
    pub call: CallOptions,
}

impl GetPronunciationOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_customization_id(mut self, customization_id: impl Into<String>) -> Self {
        self.customization_id = Some(customization_id.into());
        self
    }
}

impl Operation for GetPronunciationOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let text = required("text", self.text.as_deref())?;

        RequestDescriptor::builder("GetPronunciation", Method::GET, "/v1/pronunciation")
            .query("text", text)
            .query_opt("voice", self.voice.as_deref())
            .query_opt("format", self.format.as_deref())
            .query_opt("customization_id", self.customization_id.as_deref())
            .accept_json()
            .response(ResponseKind::Structured)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

// -- Custom models --

/// Create an empty custom model
#[derive(Debug, Clone, Default)]
pub struct CreateCustomModelOptions {
    /// Model name (required)
    pub name: Option<String>,
    /// Model language; the service defaults to `en-US`
    pub language: Option<String>,
    /// Model description
    pub description: Option<String>,
    pub call: CallOptions,
}

#[derive(Serialize)]
struct CreateCustomModelBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl CreateCustomModelOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Operation for CreateCustomModelOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let body = CreateCustomModelBody {
            name: required("name", self.name.as_deref())?,
            language: self.language.as_deref(),
            description: self.description.as_deref(),
        };

        RequestDescriptor::builder("CreateCustomModel", Method::POST, "/v1/customizations")
            .accept_json()
            .response(ResponseKind::Structured)
            .json_body(&body)?
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// List the caller's custom models
#[derive(Debug, Clone, Default)]
pub struct ListCustomModelsOptions {
    /// Only list models for this language
    pub language: Option<String>,
    pub call: CallOptions,
}

impl ListCustomModelsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl Operation for ListCustomModelsOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        RequestDescriptor::builder("ListCustomModels", Method::GET, "/v1/customizations")
            .query_opt("language", self.language.as_deref())
            .accept_json()
            .response(ResponseKind::Structured)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Update a custom model's metadata and merge words into it
///
/// Words that already exist are overwritten. Fields left unset are not
/// touched on the server.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomModelOptions {
    /// Model to update (required, non-empty)
    pub customization_id: Option<String>,
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// Words to add or overwrite
    pub words: Option<Vec<Word>>,
    pub call: CallOptions,
}

#[derive(Serialize)]
struct UpdateCustomModelBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    words: Option<&'a [Word]>,
}

impl UpdateCustomModelOptions {
    pub fn new(customization_id: impl Into<String>) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = Some(words);
        self
    }
}

impl Operation for UpdateCustomModelOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;
        let body = UpdateCustomModelBody {
            name: self.name.as_deref(),
            description: self.description.as_deref(),
            words: self.words.as_deref(),
        };

        RequestDescriptor::builder("UpdateCustomModel", Method::POST, "/v1/customizations/{customization_id}")
            .path_param("customization_id", customization_id)
            .accept_json()
            .json_body(&body)?
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Get a custom model, including its words
#[derive(Debug, Clone, Default)]
pub struct GetCustomModelOptions {
    /// Model to fetch (required, non-empty)
    pub customization_id: Option<String>,
    pub call: CallOptions,
}

impl GetCustomModelOptions {
    pub fn new(customization_id: impl Into<String>) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            ..Self::default()
        }
    }
}

impl Operation for GetCustomModelOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;

        RequestDescriptor::builder("GetCustomModel", Method::GET, "/v1/customizations/{customization_id}")
            .path_param("customization_id", customization_id)
            .accept_json()
            .response(ResponseKind::Structured)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Delete a custom model
#[derive(Debug, Clone, Default)]
pub struct DeleteCustomModelOptions {
    /// Model to delete (required, non-empty)
    pub customization_id: Option<String>,
    pub call: CallOptions,
}

impl DeleteCustomModelOptions {
    pub fn new(customization_id: impl Into<String>) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            ..Self::default()
        }
    }
}

impl Operation for DeleteCustomModelOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;

        RequestDescriptor::builder("DeleteCustomModel", Method::DELETE, "/v1/customizations/{customization_id}")
            .path_param("customization_id", customization_id)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

// -- Words --

/// Add or overwrite several words of a custom model
#[derive(Debug, Clone, Default)]
pub struct AddWordsOptions {
    /// Target model (required, non-empty)
    pub customization_id: Option<String>,
    /// Words to add (required)
    pub words: Option<Vec<Word>>,
    pub call: CallOptions,
}

#[derive(Serialize)]
struct AddWordsBody<'a> {
    words: &'a [Word],
}

impl AddWordsOptions {
    pub fn new(customization_id: impl Into<String>, words: Vec<Word>) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            words: Some(words),
            call: CallOptions::default(),
        }
    }
}

impl Operation for AddWordsOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;
        let words = required_list("words", self.words.as_deref())?;

        RequestDescriptor::builder("AddWords", Method::POST, "/v1/customizations/{customization_id}/words")
            .path_param("customization_id", customization_id)
            .accept_json()
            .json_body(&AddWordsBody { words })?
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// List the words of a custom model
#[derive(Debug, Clone, Default)]
pub struct ListWordsOptions {
    /// Model to list (required, non-empty)
    pub customization_id: Option<String>,
    pub call: CallOptions,
}

impl ListWordsOptions {
    pub fn new(customization_id: impl Into<String>) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            ..Self::default()
        }
    }
}

impl Operation for ListWordsOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;

        RequestDescriptor::builder("ListWords", Method::GET, "/v1/customizations/{customization_id}/words")
            .path_param("customization_id", customization_id)
            .accept_json()
            .response(ResponseKind::Structured)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Add or overwrite a single word of a custom model
#[derive(Debug, Clone, Default)]
pub struct AddWordOptions {
    /// Target model (required, non-empty)
    pub customization_id: Option<String>,
    /// Word to add (required, non-empty)
    pub word: Option<String>,
    /// Phonetic or sounds-like translation (required)
    pub translation: Option<String>,
    /// Japanese part of speech
    pub part_of_speech: Option<String>,
    pub call: CallOptions,
}

#[derive(Serialize)]
struct AddWordBody<'a> {
    translation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    part_of_speech: Option<&'a str>,
}

impl AddWordOptions {
    pub fn new(
        customization_id: impl Into<String>,
        word: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            word: Some(word.into()),
            translation: Some(translation.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_part_of_speech(mut self, part_of_speech: impl Into<String>) -> Self {
        self.part_of_speech = Some(part_of_speech.into());
        self
    }
}

impl Operation for AddWordOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;
        let word = required_non_empty("word", self.word.as_deref())?;
        let body = AddWordBody {
            translation: required("translation", self.translation.as_deref())?,
            part_of_speech: self.part_of_speech.as_deref(),
        };

        RequestDescriptor::builder("AddWord", Method::PUT, "/v1/customizations/{customization_id}/words/{word}")
            .path_param("customization_id", customization_id)
            .path_param("word", word)
            .json_body(&body)?
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Get the translation of one word of a custom model
#[derive(Debug, Clone, Default)]
pub struct GetWordOptions {
    /// Model to query (required, non-empty)
    pub customization_id: Option<String>,
    /// Word to fetch (required, non-empty)
    pub word: Option<String>,
    pub call: CallOptions,
}

impl GetWordOptions {
    pub fn new(customization_id: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            word: Some(word.into()),
            call: CallOptions::default(),
        }
    }
}

impl Operation for GetWordOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;
        let word = required_non_empty("word", self.word.as_deref())?;

        RequestDescriptor::builder("GetWord", Method::GET, "/v1/customizations/{customization_id}/words/{word}")
            .path_param("customization_id", customization_id)
            .path_param("word", word)
            .accept_json()
            .response(ResponseKind::Structured)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}

/// Delete one word of a custom model
#[derive(Debug, Clone, Default)]
pub struct DeleteWordOptions {
    /// Model to change (required, non-empty)
    pub customization_id: Option<String>,
    /// Word to delete (required, non-empty)
    pub word: Option<String>,
    pub call: CallOptions,
}

impl DeleteWordOptions {
    pub fn new(customization_id: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            customization_id: Some(customization_id.into()),
            word: Some(word.into()),
            call: CallOptions::default(),
        }
    }
}

impl Operation for DeleteWordOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customization_id = required_non_empty("customization_id", self.customization_id.as_deref())?;
        let word = required_non_empty("word", self.word.as_deref())?;

        RequestDescriptor::builder(
            "DeleteWord",
            Method::DELETE,
            "/v1/customizations/{customization_id}/words/{word}",
        )
        .path_param("customization_id", customization_id)
        .path_param("word", word)
        .call_options(&self.call)
        .build()
    }

    call_options!();
}

// -- User data --

/// Delete all data associated with a customer ID
#[derive(Debug, Clone, Default)]
pub struct DeleteUserDataOptions {
    /// Customer ID the data was tagged with (required)
    pub customer_id: Option<String>,
    pub call: CallOptions,
}

impl DeleteUserDataOptions {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            call: CallOptions::default(),
        }
    }
}

impl Operation for DeleteUserDataOptions {
    fn descriptor(&self) -> Result<RequestDescriptor> {
        let customer_id = required("customer_id", self.customer_id.as_deref())?;

        RequestDescriptor::builder("DeleteUserData", Method::DELETE, "/v1/user_data")
            .query("customer_id", customer_id)
            .call_options(&self.call)
            .build()
    }

    call_options!();
}
