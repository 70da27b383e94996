//! Mock Text to Speech service for integration tests
//!
//! Keeps custom models in memory and answers like the real service closely
//! enough to drive every client operation.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Form, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Access token handed out by the mock IAM endpoint
pub const IAM_ACCESS_TOKEN: &str = "mock-iam-access-token";

/// API key the mock IAM endpoint accepts
pub const IAM_API_KEY: &str = "mock-api-key";

/// Text that makes `/v1/synthesize` stall for several seconds
pub const SLOW_TEXT: &str = "this will take a while";

const INSTANCE_PATH: &str = "/instances/mock";

const DEFAULT_ACCEPT: &str = "audio/ogg;codecs=opus";

const VOICES: &[(&str, &str, &str)] = &[
    ("de-DE_BirgitV3Voice", "de-DE", "female"),
    ("en-US_AllisonV3Voice", "en-US", "female"),
    ("en-US_AllisonVoice", "en-US", "female"),
    ("en-US_MichaelV3Voice", "en-US", "male"),
];

/// In-memory Text to Speech service on a random local port
pub struct MockTextToSpeech {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    request_count: AtomicU32,
    token_count: AtomicU32,
    gzip_count: AtomicU32,
    /// Requests still to be answered with 503
    fail_count: AtomicU32,
    /// Bearer token every `/v1` request must carry
    required_token: Option<String>,
    store: Mutex<Store>,
    last_headers: Mutex<HeaderMap>,
}

#[derive(Default)]
struct Store {
    next_id: u32,
    models: IndexMap<String, StoredModel>,
}

struct StoredModel {
    name: String,
    language: String,
    description: Option<String>,
    created: String,
    last_modified: String,
    words: BTreeMap<String, StoredWord>,
}

#[derive(Clone, Deserialize)]
struct StoredWord {
    translation: String,
    #[serde(default)]
    part_of_speech: Option<String>,
}

impl MockTextToSpeech {
    /// Start an open service
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, None).await
    }

    /// Start a service that requires `Authorization: Bearer <token>`
    pub async fn start_with_token(token: &str) -> anyhow::Result<Self> {
        Self::start_inner(0, Some(token.to_owned())).await
    }

    /// Start a service that answers the first `n` requests with 503
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, None).await
    }

    async fn start_inner(fail_count: u32, required_token: Option<String>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            token_count: AtomicU32::new(0),
            gzip_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            required_token,
            store: Mutex::new(Store::default()),
            last_headers: Mutex::new(HeaderMap::new()),
        });

        let api = Router::new()
            .route("/v1/voices", routing::get(list_voices))
            .route("/v1/voices/{voice}", routing::get(get_voice))
            .route("/v1/synthesize", routing::post(synthesize))
            .route("/v1/pronunciation", routing::get(pronunciation))
            .route(
                "/v1/customizations",
                routing::get(list_models).post(create_model),
            )
            .route(
                "/v1/customizations/{id}",
                routing::get(get_model).post(update_model).delete(delete_model),
            )
            .route(
                "/v1/customizations/{id}/words",
                routing::get(list_words).post(add_words),
            )
            .route(
                "/v1/customizations/{id}/words/{word}",
                routing::get(get_word).put(add_word).delete(delete_word),
            )
            .route("/v1/user_data", routing::delete(delete_user_data))
            .route_layer(middleware::from_fn_with_state(Arc::clone(&state), gate));

        let app = Router::new()
            .route("/identity/token", routing::post(issue_token))
            .nest(INSTANCE_PATH, api)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Service URL, with an instance path prefix like the real service
    pub fn url(&self) -> String {
        format!("http://{}{INSTANCE_PATH}", self.addr)
    }

    /// Base URL of the mock IAM token service
    pub fn iam_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// API requests received, including rejected ones
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// IAM token requests received
    pub fn token_count(&self) -> u32 {
        self.state.token_count.load(Ordering::Relaxed)
    }

    /// Requests that arrived with a gzip-encoded body
    pub fn gzip_count(&self) -> u32 {
        self.state.gzip_count.load(Ordering::Relaxed)
    }

    /// Headers of the most recent API request
    pub fn last_headers(&self) -> HeaderMap {
        self.state.last_headers.lock().unwrap().clone()
    }
}

impl Drop for MockTextToSpeech {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Middleware --

/// Count, fail, authenticate and un-gzip API requests
async fn gate(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    *state.last_headers.lock().unwrap() = request.headers().clone();

    if state
        .fail_count
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "0")],
            Json(serde_json::json!({ "error": "Service temporarily unavailable", "code": 503 })),
        )
            .into_response();
    }

    if let Some(ref token) = state.required_token {
        let expected = format!("Bearer {token}");
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .is_some_and(|v| v.as_bytes() == expected.as_bytes());
        if !authorized {
            return error(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    let gzipped = request
        .headers()
        .get(header::CONTENT_ENCODING)
        .is_some_and(|v| v == "gzip");
    if !gzipped {
        return next.run(request).await;
    }

    state.gzip_count.fetch_add(1, Ordering::Relaxed);
    let (mut parts, body) = request.into_parts();
    let Ok(compressed) = axum::body::to_bytes(body, 1 << 20).await else {
        return error(StatusCode::BAD_REQUEST, "Unreadable body");
    };
    let mut decoded = Vec::new();
    if GzDecoder::new(compressed.as_ref()).read_to_end(&mut decoded).is_err() {
        return error(StatusCode::BAD_REQUEST, "Invalid gzip body");
    }
    parts.headers.remove(header::CONTENT_ENCODING);
    parts.headers.remove(header::CONTENT_LENGTH);

    next.run(Request::from_parts(parts, Body::from(decoded))).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message, "code": status.as_u16() })),
    )
        .into_response()
}

// -- IAM --

async fn issue_token(State(state): State<Arc<MockState>>, Form(form): Form<HashMap<String, String>>) -> Response {
    state.token_count.fetch_add(1, Ordering::Relaxed);

    let grant_ok = form.get("grant_type").map(String::as_str) == Some("urn:ibm:params:oauth:grant-type:apikey");
    if !grant_ok || form.get("apikey").map(String::as_str) != Some(IAM_API_KEY) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "errorCode": "BXNIM0415E",
                "errorMessage": "Provided API key could not be found."
            })),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "access_token": IAM_ACCESS_TOKEN,
        "refresh_token": "not_supported",
        "token_type": "Bearer",
        "expires_in": 3600,
        "expiration": 4_102_444_800_u64
    }))
    .into_response()
}

// -- Voices --

fn voice_json(name: &str, language: &str, gender: &str) -> serde_json::Value {
    serde_json::json!({
        "url": format!("https://mock.test/v1/voices/{name}"),
        "name": name,
        "language": language,
        "gender": gender,
        "description": format!("{name} mock voice"),
        "customizable": true,
        "supported_features": {
            "custom_pronunciation": true,
            "voice_transformation": false
        }
    })
}

async fn list_voices() -> Json<serde_json::Value> {
    let voices: Vec<_> = VOICES
        .iter()
        .map(|(name, language, gender)| voice_json(name, language, gender))
        .collect();
    Json(serde_json::json!({ "voices": voices }))
}

#[derive(Deserialize)]
struct CustomizationQuery {
    customization_id: Option<String>,
}

async fn get_voice(
    State(state): State<Arc<MockState>>,
    Path(voice): Path<String>,
    Query(query): Query<CustomizationQuery>,
) -> Response {
    let Some((name, language, gender)) = VOICES.iter().find(|(name, ..)| *name == voice) else {
        return error(StatusCode::NOT_FOUND, &format!("Model {voice} not found"));
    };
    let mut json = voice_json(name, language, gender);

    if let Some(id) = query.customization_id {
        let store = state.store.lock().unwrap();
        let Some(model) = store.models.get(&id) else {
            return error(StatusCode::BAD_REQUEST, &format!("Invalid customization_id {id}"));
        };
        json["customization"] = model_json(&id, model, false);
    }

    Json(json).into_response()
}

// -- Synthesis --

#[derive(Deserialize)]
struct SynthesizeQuery {
    voice: Option<String>,
    customization_id: Option<String>,
}

#[derive(Deserialize)]
struct SynthesizeBody {
    text: String,
}

async fn synthesize(
    State(state): State<Arc<MockState>>,
    Query(query): Query<SynthesizeQuery>,
    headers: HeaderMap,
    Json(body): Json<SynthesizeBody>,
) -> Response {
    if body.text == SLOW_TEXT {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_ACCEPT)
        .to_owned();
    if !accept.starts_with("audio/") {
        return error(StatusCode::NOT_ACCEPTABLE, &format!("Unsupported accept type {accept}"));
    }

    let voice = query.voice.as_deref().unwrap_or("en-US_MichaelV3Voice");
    if !VOICES.iter().any(|(name, ..)| *name == voice) {
        return error(StatusCode::NOT_FOUND, &format!("Model {voice} not found"));
    }

    if let Some(ref id) = query.customization_id
        && !state.store.lock().unwrap().models.contains_key(id)
    {
        return error(StatusCode::BAD_REQUEST, &format!("Invalid customization_id {id}"));
    }

    let mut response = (
        [(header::CONTENT_TYPE, accept)],
        Bytes::from(format!("MOCKAUDIO:{voice}:{}", body.text)),
    )
        .into_response();

    if !voice.contains("V3") {
        let warning = format!("The voice {voice} is deprecated; use {} instead.", voice.replace("Voice", "V3Voice"));
        if let Ok(value) = warning.parse() {
            response.headers_mut().insert("warnings", value);
        }
    }

    response
}

#[derive(Deserialize)]
struct PronunciationQuery {
    text: Option<String>,
    format: Option<String>,
    customization_id: Option<String>,
}

async fn pronunciation(State(state): State<Arc<MockState>>, Query(query): Query<PronunciationQuery>) -> Response {
    let Some(text) = query.text else {
        return error(StatusCode::BAD_REQUEST, "Required parameter 'text' is missing");
    };

    let custom = query.customization_id.and_then(|id| {
        let store = state.store.lock().unwrap();
        store
            .models
            .get(&id)
            .and_then(|model| model.words.get(&text))
            .map(|word| word.translation.clone())
    });

    let pronunciation = custom.unwrap_or_else(|| {
        let format = query.format.as_deref().unwrap_or("ipa");
        format!("{format}:{}", text.to_lowercase())
    });

    Json(serde_json::json!({ "pronunciation": pronunciation })).into_response()
}

// -- Custom models --

#[derive(Serialize)]
struct WordJson<'a> {
    word: &'a str,
    translation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    part_of_speech: Option<&'a str>,
}

fn words_json(model: &StoredModel) -> serde_json::Value {
    let words: Vec<_> = model
        .words
        .iter()
        .map(|(word, entry)| WordJson {
            word,
            translation: &entry.translation,
            part_of_speech: entry.part_of_speech.as_deref(),
        })
        .collect();
    serde_json::json!(words)
}

fn model_json(id: &str, model: &StoredModel, with_words: bool) -> serde_json::Value {
    let mut json = serde_json::json!({
        "customization_id": id,
        "name": model.name,
        "language": model.language,
        "owner": "mock-owner",
        "created": model.created,
        "last_modified": model.last_modified,
    });
    if let Some(ref description) = model.description {
        json["description"] = serde_json::json!(description);
    }
    if with_words {
        json["words"] = words_json(model);
    }
    json
}

fn timestamp(n: u32) -> String {
    format!("2026-01-01T00:00:{:02}.000Z", n % 60)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateBody {
    name: Option<String>,
    language: Option<String>,
    description: Option<String>,
}

async fn create_model(State(state): State<Arc<MockState>>, Json(body): Json<CreateBody>) -> Response {
    let Some(name) = body.name else {
        return error(StatusCode::BAD_REQUEST, "Required parameter 'name' is missing");
    };

    let mut store = state.store.lock().unwrap();
    store.next_id += 1;
    let n = store.next_id;
    let id = format!("mock-{n:04}");

    store.models.insert(
        id.clone(),
        StoredModel {
            name,
            language: body.language.unwrap_or_else(|| "en-US".to_owned()),
            description: body.description,
            created: timestamp(n),
            last_modified: timestamp(n),
            words: BTreeMap::new(),
        },
    );

    (StatusCode::CREATED, Json(serde_json::json!({ "customization_id": id }))).into_response()
}

#[derive(Deserialize)]
struct LanguageQuery {
    language: Option<String>,
}

async fn list_models(State(state): State<Arc<MockState>>, Query(query): Query<LanguageQuery>) -> Json<serde_json::Value> {
    let store = state.store.lock().unwrap();
    let models: Vec<_> = store
        .models
        .iter()
        .filter(|(_, model)| query.language.as_ref().is_none_or(|l| *l == model.language))
        .map(|(id, model)| model_json(id, model, false))
        .collect();

    Json(serde_json::json!({ "customizations": models }))
}

async fn get_model(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    let store = state.store.lock().unwrap();
    match store.models.get(&id) {
        Some(model) => Json(model_json(&id, model, true)).into_response(),
        None => error(StatusCode::NOT_FOUND, &format!("Customization {id} not found")),
    }
}

#[derive(Deserialize)]
struct NewWord {
    word: String,
    translation: String,
    #[serde(default)]
    part_of_speech: Option<String>,
}

impl NewWord {
    fn into_entry(self) -> (String, StoredWord) {
        (
            self.word,
            StoredWord {
                translation: self.translation,
                part_of_speech: self.part_of_speech,
            },
        )
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateBody {
    name: Option<String>,
    description: Option<String>,
    words: Option<Vec<NewWord>>,
}

async fn update_model(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBody>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    let next = store.next_id + 1;
    let Some(model) = store.models.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, &format!("Customization {id} not found"));
    };

    if let Some(name) = body.name {
        model.name = name;
    }
    if let Some(description) = body.description {
        model.description = Some(description);
    }
    model.words.extend(body.words.unwrap_or_default().into_iter().map(NewWord::into_entry));
    model.last_modified = timestamp(next);

    StatusCode::OK.into_response()
}

async fn delete_model(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    match state.store.lock().unwrap().models.shift_remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, &format!("Customization {id} not found")),
    }
}

// -- Words --

#[derive(Deserialize)]
struct WordsBody {
    words: Vec<NewWord>,
}

async fn list_words(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    let store = state.store.lock().unwrap();
    match store.models.get(&id) {
        Some(model) => Json(serde_json::json!({ "words": words_json(model) })).into_response(),
        None => error(StatusCode::NOT_FOUND, &format!("Customization {id} not found")),
    }
}

async fn add_words(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(body): Json<WordsBody>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    let Some(model) = store.models.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, &format!("Customization {id} not found"));
    };

    model.words.extend(body.words.into_iter().map(NewWord::into_entry));
    StatusCode::OK.into_response()
}

async fn add_word(
    State(state): State<Arc<MockState>>,
    Path((id, word)): Path<(String, String)>,
    Json(body): Json<StoredWord>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    let Some(model) = store.models.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, &format!("Customization {id} not found"));
    };

    model.words.insert(word, body);
    StatusCode::OK.into_response()
}

async fn get_word(State(state): State<Arc<MockState>>, Path((id, word)): Path<(String, String)>) -> Response {
    let store = state.store.lock().unwrap();
    let Some(model) = store.models.get(&id) else {
        return error(StatusCode::NOT_FOUND, &format!("Customization {id} not found"));
    };

    match model.words.get(&word) {
        Some(entry) => {
            let mut json = serde_json::json!({ "translation": entry.translation });
            if let Some(ref pos) = entry.part_of_speech {
                json["part_of_speech"] = serde_json::json!(pos);
            }
            Json(json).into_response()
        }
        None => error(StatusCode::NOT_FOUND, &format!("Word {word} not found")),
    }
}

async fn delete_word(State(state): State<Arc<MockState>>, Path((id, word)): Path<(String, String)>) -> Response {
    let mut store = state.store.lock().unwrap();
    let Some(model) = store.models.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, &format!("Customization {id} not found"));
    };

    match model.words.remove(&word) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, &format!("Word {word} not found")),
    }
}

// -- User data --

#[derive(Deserialize)]
struct UserDataQuery {
    customer_id: Option<String>,
}

async fn delete_user_data(Query(query): Query<UserDataQuery>) -> Response {
    match query.customer_id {
        Some(id) if !id.is_empty() => StatusCode::OK.into_response(),
        _ => error(StatusCode::BAD_REQUEST, "Required parameter 'customer_id' is missing"),
    }
}
