use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest word the service accepts in a custom model
pub const MAX_WORD_CHARS: usize = 49;

/// Longest translation the service accepts in a custom model
pub const MAX_TRANSLATION_CHARS: usize = 499;

// -- Voices --

/// All voices available to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voices {
    /// Voices, in the order the service returned them
    pub voices: Vec<Voice>,
}

/// A named, language-specific synthesis profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// URI of the voice
    pub url: String,
    /// Gender of the voice
    pub gender: String,
    /// Name of the voice, used as the handle in later calls
    pub name: String,
    /// Language and region of the voice (e.g. `en-US`)
    pub language: String,
    /// Textual description of the voice
    pub description: String,
    /// Whether custom models can be used with the voice
    pub customizable: bool,
    /// Additional service features the voice supports
    pub supported_features: SupportedFeatures,
    /// Custom model summary, present when the voice was fetched with a customization ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<CustomModel>,
}

/// Additional service features a voice supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFeatures {
    /// Voice can be customized with a custom model
    pub custom_pronunciation: bool,
    /// Voice can be transformed with SSML
    pub voice_transformation: bool,
}

// -- Custom models --

/// Custom models owned by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomModels {
    /// Custom models, empty when the caller owns none
    pub customizations: Vec<CustomModel>,
}

/// Server-side dictionary of word to pronunciation overrides
///
/// Creating a model returns only the `customization_id`; every other field is
/// absent until the model is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomModel {
    /// Server-assigned identifier, required by every mutating call
    pub customization_id: String,
    /// Name of the custom model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Language of the custom model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// GUID of the service credentials that own the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// ISO-8601 creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// ISO-8601 timestamp of the last change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Description of the custom model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Words of the model, present only when a single model is fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

// -- Words --

/// Words of a custom model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Words {
    /// Words in the service's ordering: alphabetical, uppercase before lowercase
    pub words: Vec<Word>,
}

/// A word and its pronunciation override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// The word as written
    pub word: String,
    /// Phonetic or sounds-like translation
    pub translation: String,
    /// Japanese part of speech, see [`crate::constants::PARTS_OF_SPEECH`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
}

impl Word {
    /// Create a word entry, checking the service's length limits
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if either value is empty or too long
    pub fn new(word: impl Into<String>, translation: impl Into<String>) -> Result<Self, ValidationError> {
        let word = word.into();
        let translation = translation.into();

        check_length("word", &word, MAX_WORD_CHARS)?;
        check_length("translation", &translation, MAX_TRANSLATION_CHARS)?;

        Ok(Self {
            word,
            translation,
            part_of_speech: None,
        })
    }

    /// Set the Japanese part of speech
    #[must_use]
    pub fn with_part_of_speech(mut self, part_of_speech: impl Into<String>) -> Self {
        self.part_of_speech = Some(part_of_speech.into());
        self
    }
}

/// Translation of a single word, as returned when fetching one word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Phonetic or sounds-like translation
    pub translation: String,
    /// Japanese part of speech
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
}

impl Translation {
    /// Create a translation
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the translation is empty or too long
    pub fn new(translation: impl Into<String>) -> Result<Self, ValidationError> {
        let translation = translation.into();
        check_length("translation", &translation, MAX_TRANSLATION_CHARS)?;

        Ok(Self {
            translation,
            part_of_speech: None,
        })
    }
}

/// Pronunciation of a word in the requested phoneme format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pronunciation {
    /// The pronunciation
    pub pronunciation: String,
}

// -- Audio --

/// Synthesized audio, exactly as the service sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStream {
    /// `Content-Type` of the response, e.g. `audio/ogg;codecs=opus`
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl AudioStream {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for AudioStream {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyRequiredField(field));
    }

    let chars = value.chars().count();
    if chars > max {
        return Err(ValidationError::InvalidValue {
            field,
            reason: format!("{chars} characters exceeds the limit of {max}"),
        });
    }

    Ok(())
}
