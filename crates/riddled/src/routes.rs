//! API routes for riddled
//!
//! Game routes spend the per-session budget, feedback routes append to the
//! learned stores, info routes are read-only.

use crate::server::AppState;
use crate::session::{HintError, SessionBook, TokenError, SESSION_HEADER};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use riddle_common::{
    char_len, normalize, AnswerFeedback, CacheStats, Evidence, Outcome, Override, RiddleError,
    Verdict, MAX_INPUT_CHARS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: i32,
}

/// Error status plus JSON body; every handler failure goes through this.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                code,
            },
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, -32602, message)
    }
}

impl From<RiddleError> for ApiError {
    fn from(e: RiddleError) -> Self {
        if e.is_user_error() {
            Self::new(StatusCode::BAD_REQUEST, e.code(), e.to_string())
        } else {
            error!("  Request failed: {}", e);
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.to_string())
        }
    }
}

/// Run store IO off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> riddle_common::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            error!("  Blocking task failed: {}", e);
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                -32603,
                "internal error",
            ))
        }
    }
}

fn too_long(text: &str) -> bool {
    char_len(&normalize(text)) > MAX_INPUT_CHARS
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn session_id(headers: &HeaderMap) -> Uuid {
    SessionBook::resolve(headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()))
}

/// JSON body with the session id echoed back.
fn with_session<T: Serialize>(id: Uuid, body: T) -> Response {
    ([(SESSION_HEADER, id.to_string())], Json(body)).into_response()
}

// ============================================================================
// Game Routes
// ============================================================================

pub fn game_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/ask", post(ask))
        .route("/guess", post(guess))
        .route("/hint", post(hint))
        .route("/state", get(session_state))
        .route("/reset", post(reset))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub result: Outcome,
    /// Outcome-level reply
    pub answer_text: String,
    /// Kebab-case rule tag. Unspecified body questions report
    /// `physical-unspecified`; organ questions report `scenario-unrelated`.
    pub evidence: Evidence,
    /// Rule-specific reply
    pub nl: String,
    pub negated: bool,
    pub tokens_left: u32,
}

async fn ask(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<Response, ApiError> {
    let id = session_id(&headers);
    if normalize(&req.question).is_empty() {
        warn!("  Empty question received");
        state.metrics.record_rejection("empty_question");
        return Err(ApiError::bad_request("질문을 입력해주세요."));
    }
    if too_long(&req.question) {
        state.metrics.record_rejection("question_too_long");
        return Err(ApiError::bad_request(format!(
            "질문은 {}자 이내로 입력해주세요.",
            MAX_INPUT_CHARS
        )));
    }

    let tokens_left = state.sessions.take_token(id).await.map_err(|TokenError::Exhausted| {
        state.metrics.record_rejection("tokens_exhausted");
        ApiError::new(
            StatusCode::FORBIDDEN,
            -32020,
            "질문 횟수를 모두 사용했습니다.",
        )
    })?;

    info!("[Q]  {}", req.question.chars().take(50).collect::<String>());
    let verdict = classify_or_degrade(&state, &req.question)?;
    state.metrics.record_verdict(&verdict);

    let replies = &state.judge.catalog().replies;
    Ok(with_session(
        id,
        AskResponse {
            result: verdict.outcome,
            answer_text: replies.for_outcome(verdict.outcome).to_string(),
            evidence: verdict.evidence,
            nl: verdict.answer,
            negated: verdict.negated,
            tokens_left,
        },
    ))
}

/// Internal faults answer with the system-error verdict instead of failing.
fn classify_or_degrade(state: &AppState, question: &str) -> Result<Verdict, ApiError> {
    match state.judge.classify(question) {
        Ok(verdict) => Ok(verdict),
        Err(e) if e.is_user_error() => Err(e.into()),
        Err(e) => {
            warn!("  Degrading to system-error verdict: {}", e);
            state.metrics.degraded_total.inc();
            Ok(state.judge.system_error_verdict())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    #[serde(default)]
    pub guess: String,
}

async fn guess(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<GuessRequest>,
) -> Result<Response, ApiError> {
    let id = session_id(&headers);
    if normalize(&req.guess).is_empty() {
        state.metrics.record_rejection("empty_guess");
        return Err(ApiError::bad_request("정답을 입력해주세요."));
    }
    if too_long(&req.guess) {
        state.metrics.record_rejection("guess_too_long");
        return Err(ApiError::bad_request(format!(
            "정답은 {}자 이내로 입력해주세요.",
            MAX_INPUT_CHARS
        )));
    }

    let evaluation = state.judge.evaluate_guess(&req.guess)?;
    state.metrics.record_guess(evaluation.is_correct);
    info!(
        "[G]  score {}% correct={}",
        evaluation.score_percent, evaluation.is_correct
    );
    Ok(with_session(id, evaluation))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintResponse {
    pub hint: String,
    pub hints_left: usize,
    pub tokens_left: u32,
}

async fn hint(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = session_id(&headers);
    let (hint, view) = state.sessions.next_hint(id).await.map_err(|HintError::NoneLeft| {
        ApiError::bad_request("더 이상 힌트가 없습니다.")
    })?;
    Ok(with_session(
        id,
        HintResponse {
            hint,
            hints_left: view.hints_left,
            tokens_left: view.tokens_left,
        },
    ))
}

async fn session_state(State(state): State<AppStateArc>, headers: HeaderMap) -> Response {
    let id = session_id(&headers);
    let view = state.sessions.state(id).await;
    with_session(id, view)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub tokens_left: u32,
    pub hints_left: usize,
    pub message: String,
}

async fn reset(State(state): State<AppStateArc>, headers: HeaderMap) -> Response {
    let id = session_id(&headers);
    let view = state.sessions.reset(id).await;
    with_session(
        id,
        ResetResponse {
            tokens_left: view.tokens_left,
            hints_left: view.hints_left,
            message: "게임이 초기화되었습니다.".to_string(),
        },
    )
}

// ============================================================================
// Feedback Routes
// ============================================================================

pub fn feedback_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/feedback", post(feedback))
        .route("/answer_feedback", post(answer_feedback))
}

/// A player's correction: `verdict` is the outcome the question deserved.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub verdict: String,
    /// Reply text to give from now on; the outcome's default when empty
    #[serde(default)]
    pub nl: String,
    /// What the judge said before the correction
    #[serde(default)]
    pub original_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
    pub overrides: usize,
}

async fn feedback(
    State(state): State<AppStateArc>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    if req.question.trim().is_empty() || req.verdict.trim().is_empty() {
        return Err(ApiError::bad_request("질문과 판정을 입력해주세요."));
    }
    let outcome: Outcome = req.verdict.parse()?;

    let mut record = Override::new(req.question.trim(), outcome, req.nl.trim());
    if let Some(original) = req.original_answer.filter(|o| !o.trim().is_empty()) {
        record = record.with_original_answer(original);
    }
    let judge = Arc::clone(&state.judge);
    let overrides = blocking(move || judge.learn(record)).await?;
    state.metrics.overrides_learned_total.inc();

    Ok(Json(FeedbackResponse {
        success: true,
        message: "피드백이 저장되었습니다.".to_string(),
        overrides,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnswerFeedbackRequest {
    #[serde(default)]
    pub guess: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

async fn answer_feedback(
    State(state): State<AppStateArc>,
    Json(req): Json<AnswerFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    if req.guess.trim().is_empty() {
        return Err(ApiError::bad_request("정답을 입력해주세요."));
    }

    let mut record = AnswerFeedback::new(req.guess.trim(), req.is_correct);
    if let Some(comment) = req.comment {
        record = record.with_comment(comment);
    }
    let store = Arc::clone(&state.feedback);
    blocking(move || store.append(&record)).await?;
    state.metrics.answer_feedback_total.inc();

    Ok(Json(FeedbackResponse {
        success: true,
        message: "정답 피드백이 저장되었습니다.".to_string(),
        overrides: state.judge.override_count(),
    }))
}

// ============================================================================
// Info Routes
// ============================================================================

pub fn info_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/reveal", get(reveal))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))
        .route("/health", get(health_check))
}

async fn reveal(State(state): State<AppStateArc>) -> Json<riddle_common::scenario::Reveal> {
    Json(state.scenario.reveal.clone())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    /// Percentage of lookups answered from the cache
    pub hit_rate: f64,
    pub overrides: usize,
    pub sessions: usize,
    pub catalog_version: String,
    pub uptime_seconds: u64,
}

async fn stats(State(state): State<AppStateArc>) -> Json<StatsResponse> {
    let cache = state.judge.cache_stats();
    Json(StatsResponse {
        hit_rate: cache.hit_rate(),
        cache,
        overrides: state.judge.override_count(),
        sessions: state.sessions.len().await,
        catalog_version: state.judge.catalog().version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

async fn metrics(State(state): State<AppStateArc>) -> Result<Response, ApiError> {
    state.metrics.observe_cache(&state.judge.cache_stats());
    let text = state.metrics.render().map_err(|e| {
        error!("  Metrics encoding failed: {}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, -32603, e.to_string())
    })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub catalog_version: String,
    pub scenario: String,
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: riddle_common::VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        catalog_version: state.judge.catalog().version.clone(),
        scenario: state.scenario.id.clone(),
    })
}
