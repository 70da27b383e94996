#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use args::{Args, Command, ModelsCommand, UserDataCommand, WordsCommand};
use clap::Parser;
use serde::Serialize;
use texttospeech_client::{
    AddWordOptions, CreateCustomModelOptions, DeleteCustomModelOptions, DeleteUserDataOptions, DeleteWordOptions,
    DetailedResponse, Error, GetCustomModelOptions, GetPronunciationOptions, GetVoiceOptions, GetWordOptions,
    ListCustomModelsOptions, ListVoicesOptions, ListWordsOptions, Operation, SynthesizeOptions, TextToSpeech,
    UpdateCustomModelOptions,
};
use texttospeech_config::{Config, DEFAULT_SERVICE_NAME};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::from_env(DEFAULT_SERVICE_NAME)?,
    };

    let _telemetry_guard = texttospeech_telemetry::init(config.telemetry.as_ref(), &args.log)?;

    tracing::debug!(
        config_path = args.config.as_ref().map(|p| p.display().to_string()),
        url = %config.service.url,
        auth = config.auth.kind(),
        "configuration loaded"
    );

    let client = TextToSpeech::from_config(&config)?;

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        interrupted().await;
        cancel_clone.cancel();
    });

    if let Err(e) = run(&client, args.command, &cancel).await {
        if matches!(e.downcast_ref::<Error>(), Some(Error::Cancelled)) {
            anyhow::bail!("interrupted");
        }
        return Err(e);
    }

    Ok(())
}

async fn run(client: &TextToSpeech, command: Command, cancel: &CancellationToken) -> anyhow::Result<()> {
    let token = cancel.clone();

    match command {
        Command::Voices => {
            let options = ListVoicesOptions::new().with_cancellation(token);
            print_json(&client.list_voices(&options).await?)
        }
        Command::Voice { name, customization_id } => {
            let mut options = GetVoiceOptions::new(name).with_cancellation(token);
            options.customization_id = customization_id;
            print_json(&client.get_voice(&options).await?)
        }
        Command::Synthesize {
            text,
            voice,
            accept,
            customization_id,
            output,
        } => {
            let mut options = SynthesizeOptions::new(text).with_cancellation(token);
            options.voice = voice;
            options.accept = accept;
            options.customization_id = customization_id;

            let response = client.synthesize(&options).await?;
            report_warnings(&response);

            let audio = &response.result;
            tokio::fs::write(&output, &audio.data)
                .await
                .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", output.display()))?;

            tracing::info!(
                path = %output.display(),
                bytes = audio.len(),
                content_type = audio.content_type.as_deref(),
                "audio written"
            );
            Ok(())
        }
        Command::Pronunciation {
            text,
            voice,
            format,
            customization_id,
        } => {
            let mut options = GetPronunciationOptions::new(text).with_cancellation(token);
            options.voice = voice;
            options.format = format;
            options.customization_id = customization_id;
            print_json(&client.get_pronunciation(&options).await?)
        }
        Command::Models(command) => run_models(client, command, token).await,
        Command::Words(command) => run_words(client, command, token).await,
        Command::UserData(UserDataCommand::Delete { customer_id }) => {
            let options = DeleteUserDataOptions::new(customer_id).with_cancellation(token);
            print_done(&client.delete_user_data(&options).await?);
            Ok(())
        }
    }
}

async fn run_models(client: &TextToSpeech, command: ModelsCommand, token: CancellationToken) -> anyhow::Result<()> {
    match command {
        ModelsCommand::List { language } => {
            let mut options = ListCustomModelsOptions::new().with_cancellation(token);
            options.language = language;
            print_json(&client.list_custom_models(&options).await?)
        }
        ModelsCommand::Create {
            name,
            language,
            description,
        } => {
            let mut options = CreateCustomModelOptions::new(name).with_cancellation(token);
            options.language = language;
            options.description = description;
            print_json(&client.create_custom_model(&options).await?)
        }
        ModelsCommand::Get { customization_id } => {
            let options = GetCustomModelOptions::new(customization_id).with_cancellation(token);
            print_json(&client.get_custom_model(&options).await?)
        }
        ModelsCommand::Update {
            customization_id,
            name,
            description,
        } => {
            let mut options = UpdateCustomModelOptions::new(customization_id).with_cancellation(token);
            options.name = name;
            options.description = description;
            print_done(&client.update_custom_model(&options).await?);
            Ok(())
        }
        ModelsCommand::Delete { customization_id } => {
            let options = DeleteCustomModelOptions::new(customization_id).with_cancellation(token);
            print_done(&client.delete_custom_model(&options).await?);
            Ok(())
        }
    }
}

async fn run_words(client: &TextToSpeech, command: WordsCommand, token: CancellationToken) -> anyhow::Result<()> {
    match command {
        WordsCommand::List { customization_id } => {
            let options = ListWordsOptions::new(customization_id).with_cancellation(token);
            print_json(&client.list_words(&options).await?)
        }
        WordsCommand::Add {
            customization_id,
            word,
            translation,
            part_of_speech,
        } => {
            let mut options = AddWordOptions::new(customization_id, word, translation).with_cancellation(token);
            options.part_of_speech = part_of_speech;
            print_done(&client.add_word(&options).await?);
            Ok(())
        }
        WordsCommand::Get { customization_id, word } => {
            let options = GetWordOptions::new(customization_id, word).with_cancellation(token);
            print_json(&client.get_word(&options).await?)
        }
        WordsCommand::Delete { customization_id, word } => {
            let options = DeleteWordOptions::new(customization_id, word).with_cancellation(token);
            print_done(&client.delete_word(&options).await?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(response: &DetailedResponse<T>) -> anyhow::Result<()> {
    report_warnings(response);

    println!("{}", serde_json::to_string_pretty(&response.result)?);

    Ok(())
}

fn print_done<T>(response: &DetailedResponse<T>) {
    report_warnings(response);
    tracing::info!(status = response.status.as_u16(), "done");
}

fn report_warnings<T>(response: &DetailedResponse<T>) {
    if let Some(warnings) = response.warnings() {
        tracing::warn!("service warning: {warnings}");
    }
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }

    tracing::info!("interrupt received, cancelling");
}
