//! HTTP endpoints
//!
//! REST API for the practice server. See the wire contract in the request
//! and response types below; errors always render as `{"error": "..."}`.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use lingua_tutor_core::{Feature, Language, Message, PronunciationFeedback, UtterancePair};
use lingua_tutor_dialogue::{AttemptOutcome, DialogueState, DialogueTurn, Scenario};
use lingua_tutor_llm::ResponseTemplates;
use lingua_tutor_persistence::{AttemptRecord, LearnerProfile, Plan};

use crate::session::DialogueSession;
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state);

    let mut router = Router::new()
        // Sentence scoring
        .route("/api/score", post(score))
        // Scenarios
        .route("/api/scenarios", get(list_scenarios))
        .route("/api/scenarios/:id", get(get_scenario))
        // Dialogue sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id", delete(delete_session))
        .route("/api/sessions/:id/attempt", post(submit_attempt))
        .route("/api/sessions/:id/retry", post(retry_turn))
        .route("/api/sessions/:id/skip", post(skip_turn))
        .route("/api/sessions/:id/advance", post(advance_scripted))
        .route("/api/sessions/:id/converse", post(converse))
        // Learner profiles
        .route("/api/learners/:id", get(get_learner).put(upsert_learner))
        // Progress
        .route("/api/progress/:learner_id/:scenario_id", get(list_progress))
        // Speech proxying
        .route("/api/speech/transcribe", post(transcribe))
        .route("/api/speech/synthesize", post(synthesize))
        // Health and metrics
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    router.with_state(state)
}

fn build_cors(state: &AppState) -> Option<CorsLayer> {
    if !state.config.server.cors_enabled {
        return None;
    }

    let origins = &state.config.server.cors_origins;
    let layer = if origins.is_empty() {
        tracing::warn!("cors_origins is empty, allowing any origin");
        CorsLayer::new().allow_origin(Any)
    } else {
        let parsed: Vec<axum::http::HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(parsed))
    };

    Some(layer.allow_methods(Any).allow_headers(Any))
}

/// API-key check for non-public paths
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth = &state.config.server.auth;
    if !auth.enabled {
        return next.run(request).await;
    }

    let path = request.uri().path();
    if auth.public_paths.iter().any(|public| public == path) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    match (&auth.api_key, provided) {
        (Some(expected), Some(given)) if expected == given => next.run(request).await,
        _ => ServerError::Auth("missing or invalid API key".to_string()).into_response(),
    }
}

fn parse_language(raw: &str) -> Result<Language, ServerError> {
    Language::from_code(raw)
        .ok_or_else(|| ServerError::InvalidRequest(format!("unsupported language: {}", raw)))
}

// ---------------------------------------------------------------------------
// Sentence scoring
// ---------------------------------------------------------------------------

/// Scoring request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRequest {
    expected_text: String,
    transcribed_text: String,
    language: String,
}

/// Score a single utterance pair
async fn score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<PronunciationFeedback>, ServerError> {
    state
        .global_limiter
        .lock()
        .check_request()
        .map_err(|_| ServerError::RateLimit)?;

    let language = parse_language(&request.language)?;
    let pair = UtterancePair::new(request.expected_text, request.transcribed_text, language);

    let started = Instant::now();
    let feedback = state.scorer.score(&pair).await?;
    crate::metrics::record_score_latency(started.elapsed().as_secs_f64());

    Ok(Json(feedback))
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioSummary {
    id: String,
    title: String,
    language: Language,
    level: String,
    turn_count: usize,
}

impl From<&Scenario> for ScenarioSummary {
    fn from(scenario: &Scenario) -> Self {
        Self {
            id: scenario.id.clone(),
            title: scenario.title.clone(),
            language: scenario.language,
            level: scenario.level.clone(),
            turn_count: scenario.turns.len(),
        }
    }
}

async fn list_scenarios(State(state): State<AppState>) -> Json<serde_json::Value> {
    let scenarios: Vec<ScenarioSummary> =
        state.scenarios.list().iter().map(ScenarioSummary::from).collect();

    Json(serde_json::json!({
        "scenarios": scenarios,
        "count": scenarios.len(),
    }))
}

async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Scenario>, ServerError> {
    state
        .scenarios
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ServerError::ScenarioNotFound(id))
}

// ---------------------------------------------------------------------------
// Dialogue sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    scenario_id: String,
    learner_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    session_id: String,
    learner_id: String,
    scenario_id: String,
    state: DialogueState,
    current_turn: Option<DialogueTurn>,
    completed: bool,
}

async fn session_response(state: &AppState, session: &DialogueSession) -> SessionResponse {
    let dialogue = session.state.lock().await.clone();
    let current_turn = state.orchestrator.current_turn(&dialogue).ok().cloned();
    let completed = dialogue.is_complete();

    SessionResponse {
        session_id: session.id.clone(),
        learner_id: session.learner_id.clone(),
        scenario_id: session.scenario_id.clone(),
        state: dialogue,
        current_turn,
        completed,
    }
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ServerError> {
    if !state.config.features.dialogue {
        return Err(ServerError::InvalidRequest(
            "dialogue feature is disabled".to_string(),
        ));
    }

    let allowed = state
        .entitlements
        .has_access(&request.learner_id, Feature::Dialogue)
        .await?;
    if !allowed {
        return Err(ServerError::Entitlement(
            "dialogue requires a premium plan".to_string(),
        ));
    }

    let scenario = state
        .scenarios
        .get(&request.scenario_id)
        .ok_or_else(|| ServerError::ScenarioNotFound(request.scenario_id.clone()))?;

    let session = state
        .sessions
        .create(&request.learner_id, scenario.start())?;
    crate::metrics::record_active_sessions(state.sessions.count());

    Ok((
        StatusCode::CREATED,
        Json(session_response(&state, &session).await),
    ))
}

fn lookup_session(
    state: &AppState,
    session_id: &str,
) -> Result<std::sync::Arc<DialogueSession>, ServerError> {
    state
        .sessions
        .get(session_id)
        .ok_or_else(|| ServerError::Session(format!("unknown session: {}", session_id)))
}

async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = lookup_session(&state, &id)?;
    Ok(Json(session_response(&state, &session).await))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.sessions.remove(&id);
    crate::metrics::record_active_sessions(state.sessions.count());
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttemptRequest {
    transcribed_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttemptResponse {
    feedback: PronunciationFeedback,
    outcome: AttemptOutcome,
    /// Short localized coaching line matching the outcome
    coach: &'static str,
    current_turn: Option<DialogueTurn>,
}

async fn submit_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AttemptRequest>,
) -> Result<Json<AttemptResponse>, ServerError> {
    let session = lookup_session(&state, &id)?;
    session.touch();
    session
        .limiter
        .lock()
        .check_request()
        .map_err(|_| ServerError::RateLimit)?;

    // Hold the state lock across scoring so concurrent submissions against
    // this session apply in a single-writer order.
    let mut dialogue = session.state.lock().await;
    let attempted_index = dialogue.index;
    let language = dialogue.language;

    let (feedback, outcome, next) = state
        .orchestrator
        .submit_attempt(&state.scorer, dialogue.clone(), &request.transcribed_text)
        .await?;
    *dialogue = next;
    let current_turn = state.orchestrator.current_turn(&dialogue).ok().cloned();
    drop(dialogue);

    let coach = if outcome.advanced {
        ResponseTemplates::encouragement(language)
    } else {
        ResponseTemplates::try_again(language)
    };

    crate::metrics::record_attempt(outcome.advanced);

    // Persist only after a complete feedback object exists
    if state.config.features.record_attempts {
        match AttemptRecord::new(
            &session.learner_id,
            &session.scenario_id,
            attempted_index as u32,
            outcome.advanced,
            &feedback,
        ) {
            Ok(record) => {
                if let Err(e) = state.progress.record_attempt(&record).await {
                    tracing::warn!(error = %e, session_id = %session.id, "failed to record attempt");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, session_id = %session.id, "failed to build attempt record");
            }
        }
    }

    Ok(Json(AttemptResponse {
        feedback,
        outcome,
        coach,
        current_turn,
    }))
}

async fn retry_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = lookup_session(&state, &id)?;
    session.touch();

    let mut dialogue = session.state.lock().await;
    *dialogue = state.orchestrator.retry(dialogue.clone())?;
    drop(dialogue);

    Ok(Json(session_response(&state, &session).await))
}

async fn skip_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = lookup_session(&state, &id)?;
    session.touch();

    let mut dialogue = session.state.lock().await;
    *dialogue = state.orchestrator.skip(dialogue.clone())?;
    drop(dialogue);

    Ok(Json(session_response(&state, &session).await))
}

async fn advance_scripted(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = lookup_session(&state, &id)?;
    session.touch();

    let mut dialogue = session.state.lock().await;
    *dialogue = state.orchestrator.advance_scripted(dialogue.clone())?;
    drop(dialogue);

    Ok(Json(session_response(&state, &session).await))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest {
    message: String,
}

async fn converse(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ConverseRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if !state.config.features.conversation_replies {
        return Err(ServerError::InvalidRequest(
            "conversation feature is disabled".to_string(),
        ));
    }

    let session = lookup_session(&state, &id)?;
    session.touch();
    session
        .limiter
        .lock()
        .check_request()
        .map_err(|_| ServerError::RateLimit)?;

    let allowed = state
        .entitlements
        .has_access(&session.learner_id, Feature::Conversation)
        .await?;
    if !allowed {
        return Err(ServerError::Entitlement(
            "conversation requires a premium plan".to_string(),
        ));
    }

    let replier = state
        .replier
        .as_ref()
        .ok_or_else(|| ServerError::Unavailable("no model backend configured".to_string()))?;

    let scenario_title = state
        .scenarios
        .get(&session.scenario_id)
        .map(|s| s.title.clone());
    let language = session.state.lock().await.language;
    let level = state
        .learners
        .get(&session.learner_id)
        .await
        .map_err(lingua_tutor_core::Error::from)?
        .map(|profile| profile.level)
        .unwrap_or_else(|| "A1".to_string());

    let mut history = session.history.lock().await;
    let reply = replier
        .reply(
            language,
            &level,
            scenario_title.as_deref(),
            &history,
            &request.message,
        )
        .await?;

    history.push(Message::user(&request.message));
    history.push(Message::assistant(&reply));

    Ok(Json(serde_json::json!({ "reply": reply })))
}

// ---------------------------------------------------------------------------
// Learner profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertLearnerRequest {
    display_name: Option<String>,
    learning_language: String,
    level: Option<String>,
    plan: Option<Plan>,
}

async fn get_learner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LearnerProfile>, ServerError> {
    state
        .learners
        .get(&id)
        .await
        .map_err(lingua_tutor_core::Error::from)?
        .map(Json)
        .ok_or(ServerError::LearnerNotFound(id))
}

async fn upsert_learner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpsertLearnerRequest>,
) -> Result<Json<LearnerProfile>, ServerError> {
    let language = parse_language(&request.learning_language)?;

    let mut profile = state
        .learners
        .get(&id)
        .await
        .map_err(lingua_tutor_core::Error::from)?
        .unwrap_or_else(|| LearnerProfile::new(&id, language));

    profile.learning_language = language;
    profile.display_name = request.display_name;
    if let Some(level) = request.level {
        profile.level = level;
    }
    if let Some(plan) = request.plan {
        profile.plan = plan;
    }

    state
        .learners
        .upsert(&profile)
        .await
        .map_err(lingua_tutor_core::Error::from)?;

    Ok(Json(profile))
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProgressParams {
    limit: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttemptSummary {
    turn_index: u32,
    overall_score: u8,
    passed: bool,
    attempted_at: String,
}

async fn list_progress(
    State(state): State<AppState>,
    Path((learner_id, scenario_id)): Path<(String, String)>,
    Query(params): Query<ProgressParams>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 200);

    let attempts = state
        .progress
        .list_attempts(&learner_id, &scenario_id, limit)
        .await
        .map_err(lingua_tutor_core::Error::from)?;

    let summaries: Vec<AttemptSummary> = attempts
        .iter()
        .map(|a| AttemptSummary {
            turn_index: a.turn_index,
            overall_score: a.overall_score,
            passed: a.passed,
            attempted_at: a.attempted_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(serde_json::json!({
        "attempts": summaries,
        "count": summaries.len(),
    })))
}

// ---------------------------------------------------------------------------
// Speech proxying
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeParams {
    language: Option<String>,
    learner_id: Option<String>,
}

async fn transcribe(
    State(state): State<AppState>,
    Query(params): Query<TranscribeParams>,
    audio: Bytes,
) -> Result<Json<serde_json::Value>, ServerError> {
    if !state.config.features.speech_proxy {
        return Err(ServerError::InvalidRequest(
            "speech proxy is disabled".to_string(),
        ));
    }

    state
        .global_limiter
        .lock()
        .check_audio(audio.len())
        .map_err(|_| ServerError::RateLimit)?;

    if let Some(learner_id) = &params.learner_id {
        check_speech_entitlement(&state, learner_id).await?;
    }

    let language = match (&params.language, &params.learner_id) {
        (Some(raw), _) => parse_language(raw)?,
        // Fall back to the learner's configured language
        (None, Some(learner_id)) => state
            .learners
            .get(learner_id)
            .await
            .map_err(lingua_tutor_core::Error::from)?
            .map(|profile| profile.learning_language)
            .unwrap_or_default(),
        (None, None) => Language::default(),
    };

    let started = Instant::now();
    let text = state.stt.transcribe(audio.to_vec(), language).await?;
    crate::metrics::record_stt_latency(started.elapsed().as_secs_f64());

    Ok(Json(serde_json::json!({
        "text": text,
        "language": language,
    })))
}

async fn check_speech_entitlement(state: &AppState, learner_id: &str) -> Result<(), ServerError> {
    let allowed = state
        .entitlements
        .has_access(learner_id, Feature::Speech)
        .await?;
    if allowed {
        Ok(())
    } else {
        Err(ServerError::Entitlement(
            "speech requires an active plan".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest {
    text: String,
    language: String,
}

async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, ServerError> {
    if !state.config.features.speech_proxy {
        return Err(ServerError::InvalidRequest(
            "speech proxy is disabled".to_string(),
        ));
    }

    let language = parse_language(&request.language)?;

    let started = Instant::now();
    let audio = state.tts.synthesize(&request.text, language).await?;
    crate::metrics::record_tts_latency(started.elapsed().as_secs_f64());

    Ok((
        [(header::CONTENT_TYPE, state.tts.content_type())],
        audio,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Health and metrics
// ---------------------------------------------------------------------------

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "sessions": state.sessions.count(),
        "modelBackend": state.scorer.has_model(),
    }))
}

async fn metrics_endpoint() -> Response {
    match crate::metrics::get_metrics_handle() {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_tutor_config::Settings;

    #[tokio::test]
    async fn test_router_creation() {
        let state = AppState::build(Settings::default()).await.unwrap();
        let _ = create_router(state);
    }

    #[test]
    fn test_parse_language_accepts_codes_and_names() {
        assert_eq!(parse_language("es").unwrap(), Language::Spanish);
        assert_eq!(parse_language("german").unwrap(), Language::German);
        assert!(parse_language("klingon").is_err());
    }
}
