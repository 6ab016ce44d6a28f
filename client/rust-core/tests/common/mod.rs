#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use quran_learn_core::config::{
    ApiConfig, Config, CurriculumConfig, PracticeConfig, ProgressConfig, SessionConfig,
};
use quran_learn_core::session::MemoryTokenStore;
use quran_learn_core::utils::time::TimeZonePolicy;
use quran_learn_core::{ApiClient, AuthSession};
use serde_json::{json, Value};

pub const LEARNER_EMAIL: &str = "yusuf@example.com";
pub const PARENT_EMAIL: &str = "maryam@example.com";
pub const PASSWORD: &str = "bismillah123";
pub const CHILD_ID: &str = "child-7";

const LEARNER_TOKEN: &str = "learner-token";
const PARENT_TOKEN: &str = "parent-token";

/// Fixed clock every fixture is laid out against.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

#[derive(Default)]
pub struct StubState {
    failing: HashSet<&'static str>,
    hits: Mutex<HashMap<&'static str, usize>>,
    pub survey_submissions: Mutex<Vec<Value>>,
    pub practice_keys: Mutex<Vec<String>>,
    pub child_requests: Mutex<Vec<String>>,
}

impl StubState {
    pub fn hits(&self, resource: &str) -> usize {
        self.hits.lock().unwrap().get(resource).copied().unwrap_or(0)
    }

    fn hit(&self, resource: &'static str) {
        *self.hits.lock().unwrap().entry(resource).or_insert(0) += 1;
    }
}

pub struct StubBackend {
    pub base_url: String,
    pub state: Arc<StubState>,
}

/// Starts the stub backend on an ephemeral port. Resources named in
/// `failing` answer 500.
pub async fn spawn_backend(failing: &[&'static str]) -> StubBackend {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let state = Arc::new(StubState {
        failing: failing.iter().copied().collect(),
        ..Default::default()
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubBackend {
        base_url: format!("http://{}/api", addr),
        state,
    }
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            retry_attempts: 2,
        },
        session: SessionConfig {
            token_path: ".session/test-token.json".into(),
        },
        progress: ProgressConfig {
            lookback_days: 7,
            timezone: TimeZonePolicy::Utc,
        },
        curriculum: CurriculumConfig {
            quran: 114,
            qaida: 29,
            dua: 40,
        },
        practice: PracticeConfig {
            min_accuracy: 60,
            max_accuracy: 100,
        },
    }
}

pub async fn signed_in(api: &ApiClient, email: &str) -> AuthSession {
    let mut session = AuthSession::new(Arc::new(MemoryTokenStore::default()));
    let tokens = api.login(email, PASSWORD).await.unwrap();
    session.sign_in(tokens).await.unwrap();
    session
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/me", get(me))
        .route("/api/progress", get(progress))
        .route("/api/progress/overview", get(overview))
        .route("/api/progress/practice", post(practice))
        .route("/api/mistakes", get(mistakes))
        .route("/api/mistakes/{id}/resolve", patch(resolve_mistake))
        .route("/api/quizzes/results", get(quizzes))
        .route("/api/achievements", get(achievements))
        .route("/api/onboarding/survey", get(survey).post(submit_survey))
        .route("/api/parent/children", get(children))
        .route("/api/parent/children/{id}/progress", get(child_progress))
        .route("/api/parent/children/{id}/progress/overview", get(child_overview))
        .route("/api/parent/children/{id}/mistakes", get(child_mistakes))
        .route("/api/parent/children/{id}/quizzes/results", get(child_quizzes))
        .route("/api/parent/children/{id}/achievements", get(child_achievements))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn respond(
    state: &StubState,
    headers: &HeaderMap,
    resource: &'static str,
    allowed: &[&str],
    body: impl FnOnce() -> Value,
) -> Response {
    state.hit(resource);
    match bearer(headers) {
        Some(token) if allowed.contains(&token) => {}
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid or missing token"),
    }
    if state.failing.contains(resource) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    (StatusCode::OK, Json(body())).into_response()
}

const ANY: &[&str] = &[LEARNER_TOKEN, PARENT_TOKEN];
const PARENT_ONLY: &[&str] = &[PARENT_TOKEN];

fn user(email: &str) -> Value {
    if email == PARENT_EMAIL {
        json!({ "id": "p1", "name": "Maryam", "email": PARENT_EMAIL, "role": "parent" })
    } else {
        json!({ "id": "u1", "name": "Yusuf", "email": LEARNER_EMAIL, "role": "learner", "coins": 120 })
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let token = match email {
        LEARNER_EMAIL => LEARNER_TOKEN,
        PARENT_EMAIL => PARENT_TOKEN,
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    };
    if password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    Json(json!({ "data": { "accessToken": token, "user": user(email) } })).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == LEARNER_EMAIL || email == PARENT_EMAIL {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let user = json!({
        "id": "u-new",
        "name": body["name"],
        "email": email,
        "role": body["role"]
    });
    (
        StatusCode::CREATED,
        Json(json!({ "accessToken": "fresh-token", "user": user })),
    )
        .into_response()
}

async fn me(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    respond(&state, &headers, "me", &[LEARNER_TOKEN], || user(LEARNER_EMAIL))
}

pub fn progress_fixture() -> Value {
    json!([
        {
            "module": "Quran",
            "levelId": "juz-30",
            "lessonId": "al-fatiha",
            "status": "completed",
            "completionPercentage": 100.0,
            "accuracy": 90.0,
            "timeSpent": 300,
            "lastAccessedAt": "2024-03-14T10:00:00Z",
            "completedAt": "2024-03-14T10:00:00Z"
        },
        {
            "module": "Qaida",
            "levelId": "level-1",
            "lessonId": "alif-ba",
            "status": "completed",
            "completionPercentage": 100.0,
            "accuracy": 80.0,
            "timeSpent": 240,
            "lastAccessedAt": "2024-03-15T09:00:00Z"
        },
        {
            "module": "Dua",
            "levelId": "daily",
            "lessonId": "morning",
            "status": "in_progress",
            "completionPercentage": 40.0,
            "accuracy": 50.0,
            "timeSpent": 60,
            "lastAccessedAt": "2024-03-15T11:00:00Z"
        }
    ])
}

fn overview_fixture() -> Value {
    // Mixed shapes on purpose: object for Quran, bare count for Qaida.
    json!({ "data": { "typeData": { "Quran": { "completed": 1, "total": 114 }, "Qaida": 1 } } })
}

fn mistake(id: &str, resolved: bool, timestamp: Option<&str>) -> Value {
    let mut value = json!({
        "id": id,
        "module": "Quran",
        "levelId": "juz-30",
        "lessonId": "al-fatiha",
        "mistakeType": "pronunciation",
        "severity": "moderate",
        "isResolved": resolved
    });
    if let Some(ts) = timestamp {
        value["timestamp"] = json!(ts);
    }
    value
}

fn mistakes_fixture() -> Value {
    json!({
        "data": [
            mistake("m1", false, Some("2024-03-14T08:00:00Z")),
            mistake("m2", true, Some("2024-03-05T08:00:00Z")),
            mistake("m3", false, None)
        ]
    })
}

fn quizzes_fixture() -> Value {
    json!([
        {
            "quizId": "qz1",
            "title": "Short Surahs",
            "score": 8,
            "totalQuestions": 10,
            "percentage": 80.0,
            "passed": true,
            "coinsEarned": 20,
            "completedAt": "2024-03-13T12:00:00Z"
        }
    ])
}

fn achievements_fixture() -> Value {
    json!({
        "data": [
            {
                "id": "a1",
                "type": "first_lesson",
                "title": "First Steps",
                "description": "Completed your first lesson",
                "earnedAt": "2024-03-15T10:00:00Z"
            }
        ]
    })
}

async fn progress(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    respond(&state, &headers, "progress", ANY, progress_fixture)
}

async fn overview(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    respond(&state, &headers, "overview", ANY, overview_fixture)
}

async fn mistakes(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    respond(&state, &headers, "mistakes", ANY, mistakes_fixture)
}

async fn quizzes(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    respond(&state, &headers, "quizzes", ANY, quizzes_fixture)
}

async fn achievements(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    respond(&state, &headers, "achievements", ANY, achievements_fixture)
}

async fn resolve_mistake(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !matches!(id.as_str(), "m1" | "m3") {
        state.hit("resolve");
        return error(StatusCode::NOT_FOUND, "Mistake not found");
    }
    respond(&state, &headers, "resolve", ANY, || {
        json!({ "data": mistake(&id, true, Some("2024-03-14T08:00:00Z")) })
    })
}

async fn practice(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(key) = body["idempotencyKey"].as_str() {
        state.practice_keys.lock().unwrap().push(key.to_string());
    }
    respond(&state, &headers, "practice", ANY, || {
        let accuracy = body["accuracy"].as_f64().unwrap_or_default();
        let progress = json!({
            "module": body["module"],
            "levelId": body["levelId"],
            "lessonId": body["lessonId"],
            "status": "completed",
            "completionPercentage": 100.0,
            "accuracy": accuracy,
            "timeSpent": body["timeSpent"],
            "lastAccessedAt": "2024-03-15T12:00:00Z",
            "completedAt": "2024-03-15T12:00:00Z"
        });
        if body["needsReview"].as_bool().unwrap_or(false) {
            let mut recorded = mistake("m9", false, Some("2024-03-15T12:00:00Z"));
            recorded["severity"] = body["suggestedSeverity"].clone();
            json!({ "progress": progress, "mistake": recorded, "coinsEarned": 0 })
        } else {
            json!({ "progress": progress, "autoResolved": ["m1"], "coinsEarned": 10 })
        }
    })
}

pub fn survey_fixture() -> Value {
    json!([
        {
            "id": "q1",
            "prompt": "How well do you know the Arabic alphabet?",
            "required": true,
            "options": [
                { "value": "none", "label": "Not at all", "score": 0 },
                { "value": "all_alphabets", "label": "All letters", "score": 3 }
            ]
        },
        {
            "id": "q2",
            "prompt": "Can you read Quranic text?",
            "required": true,
            "options": [
                { "value": "no", "label": "No", "score": 0 },
                { "value": "easily", "label": "Easily", "score": 4 }
            ]
        },
        {
            "id": "q7",
            "prompt": "How often do you recite?",
            "required": true,
            "options": [
                { "value": "rarely", "label": "Rarely", "score": 1 },
                { "value": "daily", "label": "Every day", "score": 5 }
            ]
        },
        {
            "id": "q8",
            "prompt": "What would you like to focus on?",
            "required": false,
            "options": [
                { "value": "tajweed", "label": "Tajweed" },
                { "value": "memorization", "label": "Memorization" }
            ]
        }
    ])
}

async fn survey(State(state): State<Arc<StubState>>) -> Response {
    state.hit("survey");
    if state.failing.contains("survey") {
        return error(StatusCode::SERVICE_UNAVAILABLE, "survey unavailable");
    }
    Json(json!({ "data": survey_fixture() })).into_response()
}

async fn submit_survey(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let response = respond(&state, &headers, "survey_submit", ANY, || json!({ "success": true }));
    if response.status().is_success() {
        state.survey_submissions.lock().unwrap().push(body);
    }
    response
}

async fn children(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    respond(&state, &headers, "children", PARENT_ONLY, || {
        json!([{ "id": CHILD_ID, "name": "Yusuf" }])
    })
}

fn record_child(state: &StubState, id: String) {
    state.child_requests.lock().unwrap().push(id);
}

async fn child_progress(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_child(&state, id);
    respond(&state, &headers, "progress", PARENT_ONLY, progress_fixture)
}

async fn child_overview(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_child(&state, id);
    respond(&state, &headers, "overview", PARENT_ONLY, overview_fixture)
}

async fn child_mistakes(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_child(&state, id);
    respond(&state, &headers, "mistakes", PARENT_ONLY, mistakes_fixture)
}

async fn child_quizzes(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_child(&state, id);
    respond(&state, &headers, "quizzes", PARENT_ONLY, quizzes_fixture)
}

async fn child_achievements(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_child(&state, id);
    respond(&state, &headers, "achievements", PARENT_ONLY, achievements_fixture)
}
