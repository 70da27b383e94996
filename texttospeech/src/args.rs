use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Text to Speech command line client
#[derive(Debug, Parser)]
#[command(name = "texttospeech", version, about = "Synthesize speech and manage custom models")]
pub struct Args {
    /// Path to configuration file; `TEXT_TO_SPEECH_*` variables are used when absent
    #[arg(short, long, env = "TEXT_TO_SPEECH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `texttospeech_client=debug`
    #[arg(long, default_value = "warn", env = "TEXT_TO_SPEECH_LOG")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available voices
    Voices,

    /// Show one voice
    Voice {
        /// Voice name, e.g. `en-US_AllisonV3Voice`
        name: String,
        /// Include information about this custom model
        #[arg(long)]
        customization_id: Option<String>,
    },

    /// Synthesize text to an audio file
    Synthesize {
        /// Plain text or SSML
        text: String,
        #[arg(long)]
        voice: Option<String>,
        /// Audio format, e.g. `audio/wav` or `audio/l16;rate=22050`
        #[arg(long)]
        accept: Option<String>,
        #[arg(long)]
        customization_id: Option<String>,
        /// File to write the audio to
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show the pronunciation of a word
    Pronunciation {
        text: String,
        #[arg(long)]
        voice: Option<String>,
        /// Phoneme set
        #[arg(long, value_parser = ["ibm", "ipa"])]
        format: Option<String>,
        #[arg(long)]
        customization_id: Option<String>,
    },

    /// Manage custom models
    #[command(subcommand)]
    Models(ModelsCommand),

    /// Manage the words of a custom model
    #[command(subcommand)]
    Words(WordsCommand),

    /// Manage data stored for a customer ID
    #[command(subcommand)]
    UserData(UserDataCommand),
}

#[derive(Debug, Subcommand)]
pub enum ModelsCommand {
    /// List custom models
    List {
        #[arg(long)]
        language: Option<String>,
    },
    /// Create a custom model
    Create {
        name: String,
        /// Defaults to `en-US` on the service
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a custom model and its words
    Get { customization_id: String },
    /// Rename or describe a custom model
    Update {
        customization_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a custom model
    Delete { customization_id: String },
}

#[derive(Debug, Subcommand)]
pub enum WordsCommand {
    /// List the words of a custom model
    List { customization_id: String },
    /// Add or replace a word
    Add {
        customization_id: String,
        word: String,
        /// Phonetic or sounds-like translation
        translation: String,
        /// Japanese part of speech
        #[arg(long)]
        part_of_speech: Option<String>,
    },
    /// Show the translation of a word
    Get { customization_id: String, word: String },
    /// Remove a word
    Delete { customization_id: String, word: String },
}

#[derive(Debug, Subcommand)]
pub enum UserDataCommand {
    /// Delete everything stored for a customer ID
    Delete { customer_id: String },
}
