//! Custom model lifecycle against the mock service

mod harness;

use axum::http::StatusCode;
use harness::config::ConfigBuilder;
use harness::mock_service::MockTextToSpeech;
use texttospeech_client::{
    AddWordOptions, AddWordsOptions, CreateCustomModelOptions, DeleteCustomModelOptions, DeleteUserDataOptions,
    DeleteWordOptions, Error, GetCustomModelOptions, GetPronunciationOptions, GetVoiceOptions, GetWordOptions,
    ListCustomModelsOptions, ListWordsOptions, UpdateCustomModelOptions, Word,
};

#[tokio::test]
async fn custom_model_lifecycle() {
    let mock = MockTextToSpeech::start().await.unwrap();
    let client = ConfigBuilder::new(&mock.url()).client();

    // Create with only a name; the service picks the language
    let created = client
        .create_custom_model(&CreateCustomModelOptions::new("Test"))
        .await
        .unwrap();
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.result.customization_id;
    assert!(created.result.name.is_none());

    let model = client
        .get_custom_model(&GetCustomModelOptions::new(&id))
        .await
        .unwrap()
        .result;
    assert_eq!(model.name.as_deref(), Some("Test"));
    assert_eq!(model.language.as_deref(), Some("en-US"));
    assert!(model.description.is_none());
    assert_eq!(model.words, Some(Vec::new()));

    // Bulk add, then a single word whose text contains a slash
    let words = vec![
        Word::new("tomato", "/tə.ˈmɑ.toʊ/").unwrap(),
        Word::new("IEEE", "I triple E").unwrap(),
    ];
    client.add_words(&AddWordsOptions::new(&id, words)).await.unwrap();
    client
        .add_word(&AddWordOptions::new(&id, "AC/DC", "A C D C"))
        .await
        .unwrap();

    let listed = client.list_words(&ListWordsOptions::new(&id)).await.unwrap().result;
    let order: Vec<_> = listed.words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(order, ["AC/DC", "IEEE", "tomato"]);
    assert_eq!(listed.words[2], Word::new("tomato", "/tə.ˈmɑ.toʊ/").unwrap());

    let translation = client
        .get_word(&GetWordOptions::new(&id, "AC/DC"))
        .await
        .unwrap()
        .result;
    assert_eq!(translation.translation, "A C D C");
    assert!(translation.part_of_speech.is_none());

    // Adding an existing word overwrites it
    client
        .update_custom_model(
            &UpdateCustomModelOptions::new(&id)
                .with_name("Renamed")
                .with_words(vec![Word::new("IEEE", "eye triple E").unwrap()]),
        )
        .await
        .unwrap();

    let model = client
        .get_custom_model(&GetCustomModelOptions::new(&id))
        .await
        .unwrap()
        .result;
    assert_eq!(model.name.as_deref(), Some("Renamed"));
    let words = model.words.unwrap();
    assert_eq!(words.len(), 3);
    assert_eq!(words[1].translation, "eye triple E");

    // The custom pronunciation is used when the model is applied
    let pronunciation = client
        .get_pronunciation(&GetPronunciationOptions::new("tomato").with_customization_id(&id))
        .await
        .unwrap()
        .result;
    assert_eq!(pronunciation.pronunciation, "/tə.ˈmɑ.toʊ/");

    let voice = client
        .get_voice(&GetVoiceOptions::new("en-US_AllisonV3Voice").with_customization_id(&id))
        .await
        .unwrap()
        .result;
    assert_eq!(voice.customization.unwrap().customization_id, id);

    client
        .delete_word(&DeleteWordOptions::new(&id, "AC/DC"))
        .await
        .unwrap();
    let err = client
        .get_word(&GetWordOptions::new(&id, "AC/DC"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    let deleted = client
        .delete_custom_model(&DeleteCustomModelOptions::new(&id))
        .await
        .unwrap();
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let err = client
        .get_custom_model(&GetCustomModelOptions::new(&id))
        .await
        .unwrap_err();
    let Error::HttpStatus(ref status) = err else {
        panic!("expected an HTTP status error, got {err}");
    };
    assert_eq!(status.status, StatusCode::NOT_FOUND);
    assert_eq!(status.message, format!("Customization {id} not found"));
    assert_eq!(status.body.as_ref().unwrap()["code"], 404);
}

#[tokio::test]
async fn list_custom_models_filters_by_language() {
    let mock = MockTextToSpeech::start().await.unwrap();
    let client = ConfigBuilder::new(&mock.url()).client();

    for (name, language) in [("Namen", "de-DE"), ("Names", "en-US"), ("Nomi", "it-IT")] {
        client
            .create_custom_model(
                &CreateCustomModelOptions::new(name)
                    .with_language(language)
                    .with_description(format!("{language} names")),
            )
            .await
            .unwrap();
    }

    let all = client
        .list_custom_models(&ListCustomModelsOptions::new())
        .await
        .unwrap()
        .result;
    assert_eq!(all.customizations.len(), 3);
    assert!(all.customizations.iter().all(|m| m.words.is_none()));

    let german = client
        .list_custom_models(&ListCustomModelsOptions::new().with_language("de-DE"))
        .await
        .unwrap()
        .result;
    assert_eq!(german.customizations.len(), 1);
    assert_eq!(german.customizations[0].name.as_deref(), Some("Namen"));
    assert_eq!(german.customizations[0].description.as_deref(), Some("de-DE names"));
}

#[tokio::test]
async fn japanese_word_keeps_part_of_speech() {
    let mock = MockTextToSpeech::start().await.unwrap();
    let client = ConfigBuilder::new(&mock.url()).client();

    let id = client
        .create_custom_model(&CreateCustomModelOptions::new("ja").with_language("ja-JP"))
        .await
        .unwrap()
        .result
        .customization_id;

    client
        .add_word(&AddWordOptions::new(&id, "NCAA", "エヌシーエーエー").with_part_of_speech("Mesi"))
        .await
        .unwrap();

    let translation = client
        .get_word(&GetWordOptions::new(&id, "NCAA"))
        .await
        .unwrap()
        .result;
    assert_eq!(translation.part_of_speech.as_deref(), Some("Mesi"));
}

#[tokio::test]
async fn operations_on_missing_model_fail_with_404() {
    let mock = MockTextToSpeech::start().await.unwrap();
    let client = ConfigBuilder::new(&mock.url()).client();

    let errors = [
        client
            .update_custom_model(&UpdateCustomModelOptions::new("nope").with_name("x"))
            .await
            .unwrap_err(),
        client.list_words(&ListWordsOptions::new("nope")).await.unwrap_err(),
        client
            .delete_custom_model(&DeleteCustomModelOptions::new("nope"))
            .await
            .unwrap_err(),
    ];

    for err in errors {
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND), "{err}");
        assert!(!err.is_retryable());
    }
}

#[tokio::test]
async fn delete_user_data_is_idempotent() {
    let mock = MockTextToSpeech::start().await.unwrap();
    let client = ConfigBuilder::new(&mock.url()).client();

    for _ in 0..2 {
        let response = client
            .delete_user_data(&DeleteUserDataOptions::new("customer 42"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }
    assert_eq!(mock.request_count(), 2);
}
