//! Enumerated values the service understands
//!
//! These are plain data tables. Nothing in the client dispatches on them;
//! they exist so callers and the CLI can list or check accepted values.

use crate::error::ValidationError;

/// Audio format the service returns when a request names none
pub const DEFAULT_AUDIO_FORMAT: &str = "audio/ogg;codecs=opus";

/// Voices served by the service
pub const VOICES: &[&str] = &[
    "ar-AR_OmarVoice",
    "de-DE_BirgitV3Voice",
    "de-DE_BirgitVoice",
    "de-DE_DieterV3Voice",
    "de-DE_DieterVoice",
    "de-DE_ErikaV3Voice",
    "en-GB_CharlotteV3Voice",
    "en-GB_JamesV3Voice",
    "en-GB_KateV3Voice",
    "en-GB_KateVoice",
    "en-US_AllisonV3Voice",
    "en-US_AllisonVoice",
    "en-US_EmilyV3Voice",
    "en-US_HenryV3Voice",
    "en-US_KevinV3Voice",
    "en-US_LisaV3Voice",
    "en-US_LisaVoice",
    "en-US_MichaelV3Voice",
    "en-US_MichaelVoice",
    "en-US_OliviaV3Voice",
    "es-ES_EnriqueV3Voice",
    "es-ES_EnriqueVoice",
    "es-ES_LauraV3Voice",
    "es-ES_LauraVoice",
    "es-LA_SofiaV3Voice",
    "es-LA_SofiaVoice",
    "es-US_SofiaV3Voice",
    "es-US_SofiaVoice",
    "fr-FR_NicolasV3Voice",
    "fr-FR_ReneeV3Voice",
    "fr-FR_ReneeVoice",
    "it-IT_FrancescaV3Voice",
    "it-IT_FrancescaVoice",
    "ja-JP_EmiV3Voice",
    "ja-JP_EmiVoice",
    "ko-KR_YoungmiVoice",
    "ko-KR_YunaVoice",
    "nl-NL_EmmaVoice",
    "nl-NL_LiamVoice",
    "pt-BR_IsabelaV3Voice",
    "pt-BR_IsabelaVoice",
    "zh-CN_LiNaVoice",
    "zh-CN_WangWeiVoice",
    "zh-CN_ZhangJingVoice",
];

/// Languages a custom model can be created for
pub const LANGUAGES: &[&str] = &[
    "ar-AR", "de-DE", "en-GB", "en-US", "es-ES", "es-LA", "es-US", "fr-FR", "it-IT", "ja-JP", "ko-KR", "nl-NL",
    "pt-BR", "zh-CN",
];

/// Language a custom model gets when none is given
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Japanese parts of speech accepted for custom words
pub const PARTS_OF_SPEECH: &[&str] = &[
    "Dosi", "Fuku", "Gobi", "Hoka", "Jodo", "Josi", "Kato", "Kedo", "Keyo", "Kigo", "Koyu", "Mesi", "Reta", "Stbi",
    "Stto", "Stzo", "Suji",
];

/// Phoneme formats for pronunciations
pub const PHONEME_FORMATS: &[&str] = &["ibm", "ipa"];

/// Lowest sampling rate the service accepts
pub const MIN_SAMPLING_RATE: u32 = 8_000;

/// Highest sampling rate the service accepts
pub const MAX_SAMPLING_RATE: u32 = 192_000;

const OPUS_RATES: &[u32] = &[48_000, 24_000, 16_000, 12_000, 8_000];

/// How a format treats the `rate` modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingRate {
    /// The service always uses this rate
    Fixed(u32),
    /// A rate may be given; this is the default
    Optional(u32),
    /// A rate may be given from this set; the first entry is the default
    OneOf(&'static [u32]),
    /// A rate must be given
    Required,
}

/// Byte order for `audio/l16`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// `big-endian`
    BigEndian,
    /// `little-endian`, the service default
    LittleEndian,
}

impl Endianness {
    /// Wire value of the modifier
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BigEndian => "big-endian",
            Self::LittleEndian => "little-endian",
        }
    }
}

impl std::str::FromStr for Endianness {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "big-endian" => Ok(Self::BigEndian),
            "little-endian" => Ok(Self::LittleEndian),
            other => Err(ValidationError::InvalidValue {
                field: "endianness",
                reason: format!("expected `big-endian` or `little-endian`, got `{other}`"),
            }),
        }
    }
}

/// An audio format the service can synthesize into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// MIME type sent in the `Accept` header
    pub mime: &'static str,
    /// Sampling rate behaviour
    pub rate: SamplingRate,
    /// Whether the `endianness` modifier applies
    pub endianness: bool,
}

/// Audio formats the service can return
pub const AUDIO_FORMATS: &[AudioFormat] = &[
    format("audio/basic", SamplingRate::Fixed(8_000)),
    format("audio/flac", SamplingRate::Optional(22_050)),
    AudioFormat {
        mime: "audio/l16",
        rate: SamplingRate::Required,
        endianness: true,
    },
    format("audio/mp3", SamplingRate::Optional(22_050)),
    format("audio/mpeg", SamplingRate::Optional(22_050)),
    format("audio/mulaw", SamplingRate::Required),
    format("audio/ogg", SamplingRate::Optional(22_050)),
    format("audio/ogg;codecs=opus", SamplingRate::OneOf(OPUS_RATES)),
    format("audio/ogg;codecs=vorbis", SamplingRate::Optional(22_050)),
    format("audio/wav", SamplingRate::Optional(22_050)),
    format("audio/webm", SamplingRate::Fixed(48_000)),
    format("audio/webm;codecs=opus", SamplingRate::Fixed(48_000)),
    format("audio/webm;codecs=vorbis", SamplingRate::Optional(22_050)),
];

const fn format(mime: &'static str, rate: SamplingRate) -> AudioFormat {
    AudioFormat {
        mime,
        rate,
        endianness: false,
    }
}

/// Look up an audio format by MIME type
pub fn audio_format(mime: &str) -> Option<&'static AudioFormat> {
    AUDIO_FORMATS.iter().find(|f| f.mime.eq_ignore_ascii_case(mime))
}

impl AudioFormat {
    /// Compose an `Accept` value with optional `rate` and `endianness` modifiers
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the rate or endianness is not allowed
    /// for this format, or a required rate is missing
    pub fn accept_value(&self, rate: Option<u32>, endianness: Option<Endianness>) -> Result<String, ValidationError> {
        let invalid_rate = |reason: String| ValidationError::InvalidValue { field: "rate", reason };

        match (self.rate, rate) {
            (SamplingRate::Required, None) => {
                return Err(invalid_rate(format!("{} requires a sampling rate", self.mime)));
            }
            (SamplingRate::Fixed(fixed), Some(r)) if r != fixed => {
                return Err(invalid_rate(format!("{} always uses {fixed} Hz", self.mime)));
            }
            (SamplingRate::OneOf(allowed), Some(r)) if !allowed.contains(&r) => {
                return Err(invalid_rate(format!("{} supports only {allowed:?} Hz", self.mime)));
            }
            (_, Some(r)) if !(MIN_SAMPLING_RATE..=MAX_SAMPLING_RATE).contains(&r) => {
                return Err(invalid_rate(format!(
                    "{r} Hz is outside {MIN_SAMPLING_RATE}..={MAX_SAMPLING_RATE} Hz"
                )));
            }
            _ => {}
        }

        if endianness.is_some() && !self.endianness {
            return Err(ValidationError::InvalidValue {
                field: "endianness",
                reason: format!("{} does not take an endianness", self.mime),
            });
        }

        let mut value = self.mime.to_owned();
        if let Some(rate) = rate
            && !matches!(self.rate, SamplingRate::Fixed(_))
        {
            value.push_str(&format!(";rate={rate}"));
        }
        if let Some(endianness) = endianness {
            value.push_str(";endianness=");
            value.push_str(endianness.as_str());
        }

        Ok(value)
    }

    /// Sampling rate used when none is requested, if the format has one
    pub const fn default_rate(&self) -> Option<u32> {
        match self.rate {
            SamplingRate::Fixed(rate) | SamplingRate::Optional(rate) => Some(rate),
            SamplingRate::OneOf(rates) => match rates.first() {
                Some(rate) => Some(*rate),
                None => None,
            },
            SamplingRate::Required => None,
        }
    }
}
