//! Web front end: an embedded HTML form and the JSON API it calls.
//!
//! Each request is bound to a session through the `sid` cookie (or the
//! `x-session-id` header). On endpoints that change state, unknown or
//! missing ids start a new session and the response carries the cookie for
//! it. Read-only endpoints never register a session.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::alerts;
use crate::analyzer;
use crate::client::TextGenerator;
use crate::collectors::processes::{self, ProcessSource};
use crate::collectors::ResourceSampler;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{Alert, Metric, Sample, SortKey, Threshold};
use crate::monitor::{MonitorHandle, MonitorSettings};
use crate::renderer::chart;
use crate::report::{self, ReportKind};
use crate::session::{Session, SessionStore};
use crate::upload::UploadedImage;

const DASHBOARD_HTML: &str = include_str!("index.html");
const SESSION_COOKIE: &str = "sid";
const SESSION_HEADER: &str = "x-session-id";
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared handles every request needs.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generator: Arc<dyn TextGenerator>,
    pub sampler: Arc<dyn ResourceSampler>,
    pub processes: Arc<dyn ProcessSource>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        generator: Arc<dyn TextGenerator>,
        sampler: Arc<dyn ResourceSampler>,
        processes: Arc<dyn ProcessSource>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(config.clone()));
        Self {
            config,
            generator,
            sampler,
            processes,
            sessions,
        }
    }

    fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: self.config.monitor.interval(),
            iterations: self.config.monitor.iteration_limit(),
            channel_capacity: self.config.monitor.channel_capacity,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/analyze", post(analyze_handler))
        .route(
            "/api/suggestions",
            get(suggestions_handler).post(suggest_handler),
        )
        .route("/api/sample", get(sample_handler))
        .route("/api/monitor/start", post(monitor_start_handler))
        .route("/api/monitor/stop", post(monitor_stop_handler))
        .route("/api/monitor/latest", get(monitor_latest_handler))
        .route(
            "/api/thresholds",
            get(thresholds_handler).put(update_thresholds_handler),
        )
        .route("/api/processes", get(processes_handler))
        .route("/api/history/chart.png", get(chart_handler))
        .route("/api/report/{kind}", post(report_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// A session resolved for the current request.
struct SessionContext {
    id: Uuid,
    session: Arc<Mutex<Session>>,
    created: bool,
}

impl SessionContext {
    fn resolve(state: &AppState, headers: &HeaderMap) -> Self {
        let (id, session, created) = state.sessions.resolve(session_id(headers));
        Self {
            id,
            session,
            created,
        }
    }

    /// Looks up the caller's session without registering a new one. Callers
    /// without a known session get a default one that is dropped with the
    /// response.
    fn existing(state: &AppState, headers: &HeaderMap) -> Self {
        let known = session_id(headers).and_then(|id| Some((id, state.sessions.get(id)?)));
        match known {
            Some((id, session)) => Self {
                id,
                session,
                created: false,
            },
            None => Self {
                id: Uuid::nil(),
                session: Arc::new(Mutex::new(Session::new(&state.config))),
                created: false,
            },
        }
    }

    /// Attaches the session cookie when the session was created by this
    /// request.
    fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.created {
            let cookie = format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict",
                self.id
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }

    fn finish<T: IntoResponse>(&self, result: Result<T, AppError>) -> Response {
        match result {
            Ok(body) => self.respond(body),
            Err(e) => {
                error!("Session {}: {}", self.id, e);
                self.respond(e)
            }
        }
    }
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok());

    from_cookie.or_else(|| {
        headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
    })
}

async fn index_handler() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

async fn analyze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let ctx = SessionContext::resolve(&state, &headers);
    let result = async {
        let (upload, question) = read_analyze_form(multipart).await?;
        let image = UploadedImage::require(upload)?;
        analyzer::analyze_image(
            &ctx.session,
            state.generator.as_ref(),
            &image,
            question.as_deref(),
        )
        .await
        .map(Json)
    }
    .await;
    ctx.finish(result)
}

type UploadField = Option<(Option<String>, Vec<u8>)>;

async fn read_analyze_form(
    mut multipart: Multipart,
) -> Result<(UploadField, Option<String>), AppError> {
    let mut upload = None;
    let mut question = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed form data: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("failed to read upload: {e}")))?;
                if !bytes.is_empty() {
                    upload = Some((file_name, bytes.to_vec()));
                }
            }
            Some("question") => {
                question = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::InvalidInput(format!("failed to read question: {e}")))?,
                );
            }
            _ => {}
        }
    }

    Ok((upload, question))
}

async fn suggest_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::resolve(&state, &headers);
    let result = analyzer::suggest(
        &ctx.session,
        state.sampler.as_ref(),
        state.generator.as_ref(),
    )
    .await
    .map(Json);
    ctx.finish(result)
}

async fn suggestions_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::existing(&state, &headers);
    let history = ctx.session.lock().await.suggestions.to_vec();
    ctx.respond(Json(history))
}

#[derive(Serialize)]
struct SampleResponse {
    sample: Sample,
    alerts: Vec<Alert>,
}

async fn sample_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::resolve(&state, &headers);
    let result = analyzer::sample_once(&ctx.session, state.sampler.as_ref())
        .await
        .map(|(sample, alerts)| Json(SampleResponse { sample, alerts }));
    ctx.finish(result)
}

async fn monitor_start_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::resolve(&state, &headers);
    let settings = state.monitor_settings();
    let mut session = ctx.session.lock().await;

    // Keep what the previous run produced before replacing it.
    session.collect_monitor_samples();
    session.monitor = Some(MonitorHandle::spawn(state.sampler.clone(), settings));
    info!("Session {} started monitoring", ctx.id);
    drop(session);

    ctx.respond(Json(json!({
        "running": true,
        "interval_ms": settings.interval.as_millis() as u64,
        "iterations": settings.iterations,
    })))
}

async fn monitor_stop_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::resolve(&state, &headers);
    let mut session = ctx.session.lock().await;
    if let Some(monitor) = session.monitor.as_mut() {
        monitor.stop();
    }
    let collected = session.collect_monitor_samples();
    session.monitor = None;
    drop(session);
    ctx.respond(Json(json!({ "running": false, "collected": collected })))
}

#[derive(Serialize)]
struct MonitorStatus {
    running: bool,
    collected: usize,
    latest: Option<Sample>,
    alerts: Vec<Alert>,
}

async fn monitor_latest_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::existing(&state, &headers);
    let mut session = ctx.session.lock().await;
    let collected = session.collect_monitor_samples();
    let latest = session.samples.latest().copied();
    let alerts = latest
        .map(|sample| alerts::check(&sample, &session.thresholds.to_vec()))
        .unwrap_or_default();
    let status = MonitorStatus {
        running: session.monitor_running(),
        collected,
        latest,
        alerts,
    };
    drop(session);
    ctx.respond(Json(status))
}

#[derive(Debug, Deserialize)]
struct ThresholdUpdate {
    cpu: Option<f32>,
    mem: Option<f32>,
    disk: Option<f32>,
}

async fn thresholds_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::existing(&state, &headers);
    let thresholds = ctx.session.lock().await.thresholds.to_vec();
    ctx.respond(Json(thresholds))
}

async fn update_thresholds_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<ThresholdUpdate>,
) -> Response {
    let ctx = SessionContext::resolve(&state, &headers);
    let result = async {
        // Validate everything before touching the session.
        let changes = [
            (Metric::Cpu, update.cpu),
            (Metric::Mem, update.mem),
            (Metric::Disk, update.disk),
        ]
        .into_iter()
        .filter_map(|(metric, limit)| limit.map(|limit| Threshold::new(metric, limit)))
        .collect::<Result<Vec<_>, _>>()?;

        let mut session = ctx.session.lock().await;
        for threshold in changes {
            session.thresholds.set(threshold);
        }
        Ok::<_, AppError>(Json(session.thresholds.to_vec()))
    }
    .await;
    ctx.finish(result)
}

#[derive(Debug, Deserialize)]
struct ProcessQuery {
    #[serde(default)]
    by: SortKey,
    n: Option<usize>,
}

async fn processes_handler(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
) -> Response {
    let n = query.n.unwrap_or(5);
    match processes::top_n(state.processes.as_ref(), query.by, n).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            error!("Process listing failed: {}", e);
            e.into_response()
        }
    }
}

async fn chart_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = SessionContext::existing(&state, &headers);
    let mut session = ctx.session.lock().await;
    session.collect_monitor_samples();
    let samples = session.samples.to_vec();
    drop(session);

    let result = chart::encode_png(chart::history_chart(&samples, 640, 240))
        .map(|png| ([(CONTENT_TYPE, "image/png")], png));
    ctx.finish(result)
}

async fn report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(kind): Path<String>,
) -> Response {
    let ctx = SessionContext::resolve(&state, &headers);
    let result = async {
        let kind = match kind.as_str() {
            "image" => ReportKind::Image,
            "system" => ReportKind::System,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "unknown report kind '{other}'"
                )))
            }
        };

        let sections = {
            let session = ctx.session.lock().await;
            report::sections_for(kind, &session)?
        };
        let path = kind.path_in(&state.config.report.directory()?);
        report::save_report(&path, &sections)?;
        Ok::<_, AppError>(Json(json!({
            "path": path.display().to_string(),
            "message": format!("Report saved successfully to {}!", path.display()),
        })))
    }
    .await;
    ctx.finish(result)
}
