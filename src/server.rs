//!
//! benkyo HTTP server
//! ------------------
//! Axum front for the dashboard core. One process serves one client and holds
//! one session.
//!
//! Responsibilities:
//! - Login, registration and logout through the auth controller; the resulting
//!   events are applied to the navigator here, not inside the controller.
//! - Guarded view resolution for every non-API GET path.
//! - Session, navigation and notice endpoints for the front end.
//! - Staff-only recording upload and live capture (start, streamed chunks,
//!   stop) feeding the study-aid pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::identity::{
    check, AuthController, AuthEvent, FileSlot, GuardDecision, Identity, IdentityDirectory, InMemoryDirectory, LoginRequest,
    RegisterRequest, RoleSet, Session, SessionSlot, SessionStore,
};
use crate::nav::nav_items_for;
use crate::navigator::{Navigator, Visit};
use crate::notices::NoticeBoard;
use crate::routes::Page;
use crate::security::CredentialHasher;
use crate::shell::ViewShell;
use crate::studio::{CannedGenerator, LecturePipeline, SimulatedBoardCamera, SimulatedRecorder, StudyAidBundle, UploadMetadata};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthController>,
    pub sessions: Arc<SessionStore>,
    pub notices: Arc<NoticeBoard>,
    pub navigator: Arc<Mutex<Navigator>>,
    pub shell: Arc<Mutex<ViewShell>>,
    pub pipeline: Arc<LecturePipeline>,
}

impl AppState {
    /// Wire the components together. The navigator immediately applies the
    /// startup redirect for a rehydrated session.
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        slot: Box<dyn SessionSlot>,
        hasher: CredentialHasher,
        auth_latency: std::time::Duration,
        pipeline: LecturePipeline,
    ) -> Self {
        let sessions = Arc::new(SessionStore::open(slot));
        let notices = Arc::new(NoticeBoard::default());
        let auth = AuthController::new(directory, sessions.clone(), notices.clone(), hasher).with_latency(auth_latency);
        let mut navigator = Navigator::new();
        if let Some(to) = navigator.on_startup(&sessions.get()) {
            info!(target: "nav", %to, "restored session, redirecting to dashboard");
        }
        Self {
            auth: Arc::new(auth),
            sessions,
            notices,
            navigator: Arc::new(Mutex::new(navigator)),
            shell: Arc::new(Mutex::new(ViewShell::new())),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let hasher = CredentialHasher::default();
        let directory = InMemoryDirectory::new(hasher.clone(), cfg.email_match);
        if cfg.demo_mode {
            directory.seed_demo().context("While seeding demo identities")?;
            info!(target: "startup", "demo mode: seeded {} identities", directory.len());
        }
        let pipeline = LecturePipeline::new(
            Arc::new(SimulatedRecorder::new(cfg.upload_latency)),
            Arc::new(SimulatedBoardCamera::new(cfg.board_interval)),
            Arc::new(CannedGenerator::new(cfg.upload_latency)),
        );
        Ok(Self::new(
            Arc::new(directory),
            Box::new(FileSlot::new(cfg.session_file.clone())),
            hasher,
            cfg.auth_latency,
            pipeline,
        ))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({"status":"error","code": self.code_str(),"message": self.message()}))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "benkyo ok" }))
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/logout", post(logout))
        .route("/api/session", get(session))
        .route("/api/nav", get(nav))
        .route("/api/notices", get(notices))
        .route("/api/shell/menu", post(toggle_menu))
        .route("/api/staff/recordings", post(upload_recording))
        .route("/api/staff/recordings/start", post(start_recording))
        .route("/api/staff/recordings/chunk", post(push_chunk))
        .route("/api/staff/recordings/stop", post(stop_recording))
        .method_not_allowed_fallback(no_route)
        .fallback(view)
        .with_state(state)
}

/// Start the HTTP server on the configured port.
pub async fn run(cfg: Config) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "benkyo starting: http_port={}, session_file={:?}, demo_mode={}, email_match={:?}, auth_latency_ms={}",
        cfg.http_port, cfg.session_file, cfg.demo_mode, cfg.email_match, cfg.auth_latency.as_millis()
    );
    let state = AppState::from_config(&cfg)?;
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn event_response(state: &AppState, event: AuthEvent) -> Response {
    let location = state.navigator.lock().apply(&event).to_string();
    (StatusCode::OK, Json(json!({"status":"ok","event": event,"location": location}))).into_response()
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    match state.auth.login(&payload).await {
        Ok(event) => event_response(&state, event),
        Err(e) => e.into_response(),
    }
}

async fn register(State(state): State<AppState>, Json(payload): Json<RegisterRequest>) -> Response {
    match state.auth.register(&payload).await {
        Ok(event) => event_response(&state, event),
        Err(e) => e.into_response(),
    }
}

async fn logout(State(state): State<AppState>) -> Response {
    let event = state.auth.logout().await;
    event_response(&state, event)
}

async fn session(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.sessions.get();
    let location = state.navigator.lock().location().to_string();
    Json(json!({
        "authenticated": current.is_authenticated(),
        "state": state.auth.state(),
        "identity": current.identity,
        "location": location,
    }))
}

async fn nav(State(state): State<AppState>) -> impl IntoResponse {
    let role = state.sessions.get().identity.map(|i| i.role);
    Json(json!({"items": nav_items_for(role)}))
}

async fn notices(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"notices": state.notices.drain()}))
}

async fn toggle_menu(State(state): State<AppState>) -> impl IntoResponse {
    let collapsed = state.shell.lock().toggle_menu();
    Json(json!({"menu_collapsed": collapsed}))
}

/// Guard an API call. A refusal carries only the redirect target, the same
/// bounce a page visit would get.
fn require(session: &Session, allowed: RoleSet) -> Result<Identity, Response> {
    match check(session, allowed) {
        GuardDecision::Allow => session.identity.clone().ok_or_else(|| StatusCode::UNAUTHORIZED.into_response()),
        GuardDecision::Redirect(to) => {
            let status = if session.is_authenticated() { StatusCode::FORBIDDEN } else { StatusCode::UNAUTHORIZED };
            Err((status, Json(json!({"status":"redirect","location": to})))
                .into_response())
        }
    }
}

fn no_route_error() -> AppError { AppError::not_found("no_route", "no such endpoint") }

async fn no_route() -> AppError { no_route_error() }

fn decode_audio(b64: &str) -> Result<Vec<u8>, AppError> {
    base64::engine::general_purpose::STANDARD
        .decode(b64.as_bytes())
        .map_err(|e| AppError::user("bad_audio".to_string(), format!("audio is not valid base64: {}", e)))
}

fn bundle_response(state: &AppState, title: &str, result: Result<StudyAidBundle, AppError>) -> Response {
    match result {
        Ok(bundle) => {
            state.notices.success(format!("Study aids ready for '{}'", title));
            (StatusCode::OK, Json(json!({"status":"ok","bundle": bundle}))).into_response()
        }
        Err(e) => {
            if e.http_status() >= 500 { error!("recording processing failed: {e}"); }
            state.notices.error(e.message().to_string());
            e.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordingPayload {
    title: String,
    /// Base64 encoded audio.
    audio: String,
}

async fn upload_recording(State(state): State<AppState>, Json(payload): Json<RecordingPayload>) -> Response {
    let staff = match require(&state.sessions.get(), RoleSet::STAFF) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let audio = match decode_audio(&payload.audio) {
        Ok(a) => a,
        Err(e) => return e.into_response(),
    };
    let metadata = UploadMetadata { title: payload.title, staff_id: staff.id, capture_board: false };
    let result = state.pipeline.process(audio, &metadata).await;
    bundle_response(&state, &metadata.title, result)
}

#[derive(Debug, Deserialize)]
struct StartPayload {
    title: String,
    #[serde(default)]
    capture_board: bool,
}

async fn start_recording(State(state): State<AppState>, Json(payload): Json<StartPayload>) -> Response {
    let staff = match require(&state.sessions.get(), RoleSet::STAFF) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let metadata = UploadMetadata { title: payload.title, staff_id: staff.id, capture_board: payload.capture_board };
    match state.pipeline.start(&metadata).await {
        Ok(capture_id) => {
            state.notices.info(format!("Recording '{}' started", metadata.title));
            (StatusCode::OK, Json(json!({"status":"recording","capture_id": capture_id,"capture_board": metadata.capture_board})))
                .into_response()
        }
        Err(e) => {
            state.notices.error(e.message().to_string());
            e.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    /// Base64 encoded audio.
    audio: String,
}

async fn push_chunk(State(state): State<AppState>, Json(payload): Json<ChunkPayload>) -> Response {
    if let Err(resp) = require(&state.sessions.get(), RoleSet::STAFF) {
        return resp;
    }
    let result = decode_audio(&payload.audio).and_then(|chunk| state.pipeline.push_chunk(&chunk));
    match result {
        Ok(bytes) => (StatusCode::OK, Json(json!({"status":"recording","bytes": bytes}))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn stop_recording(State(state): State<AppState>) -> Response {
    if let Err(resp) = require(&state.sessions.get(), RoleSet::STAFF) {
        return resp;
    }
    let result = state.pipeline.finish().await;
    let title = result.as_ref().map(|b| b.note.title.clone()).unwrap_or_default();
    bundle_response(&state, &title, result)
}

fn render(state: &AppState, session: &Session, page: Page) -> serde_json::Value {
    if page.is_protected() {
        json!(state.shell.lock().render(session, page))
    } else {
        json!({"title": page.title(), "content": page})
    }
}

/// Every unmatched request lands here; GETs are resolved as dashboard views.
async fn view(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return no_route_error().into_response();
    }
    let session = state.sessions.get();
    let visit = state.navigator.lock().visit(uri.path(), &session);
    match visit {
        Visit::Render { location, page } => {
            let view = render(&state, &session, page);
            (StatusCode::OK, Json(json!({"status":"render","location": location,"view": view}))).into_response()
        }
        Visit::Redirect { requested, location, page } => {
            let view = render(&state, &session, page);
            (StatusCode::OK, Json(json!({"status":"redirect","requested": requested,"location": location,"view": view})))
                .into_response()
        }
        Visit::NotFound { location } => {
            (StatusCode::NOT_FOUND, Json(json!({"status":"not_found","location": location}))).into_response()
        }
    }
}
