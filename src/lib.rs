pub mod alerts;
pub mod analyzer;
pub mod client;
pub mod collectors;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod models;
pub mod monitor;
pub mod prompt;
pub mod renderer;
pub mod report;
pub mod session;
pub mod upload;

use anyhow::Context;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;

use crate::client::GeminiClient;
use crate::collectors::processes::SystemProcesses;
use crate::collectors::SystemSampler;
use crate::config::AppConfig;
use crate::dashboard::AppState;
use crate::session::SessionStore;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting application");

    let api_key = crate::config::api_key_from_env()?;
    let config = Arc::new(config);
    let generator = GeminiClient::new(&config.gemini, api_key)?;
    info!(
        "Using model {} with a {:?} timeout",
        config.gemini.model,
        generator.timeout()
    );

    let state = AppState::new(
        config.clone(),
        Arc::new(generator),
        Arc::new(SystemSampler::new(config.monitor.mount_points.clone())),
        Arc::new(SystemProcesses),
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .context(format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on http://{}", config.server.bind);

    let app = dashboard::router(state.clone());

    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            match result {
                Ok(_) => info!("Server stopped"),
                Err(e) => {
                    error!("Server error: {e:#}");
                    return Err(e).context("Server failed to run");
                }
            }
        }
        _ = sweep_sessions(state.sessions.clone(), config.session.idle_timeout()) => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}

async fn sweep_sessions(sessions: Arc<SessionStore>, idle: Duration) {
    let period = (idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        sessions.sweep_idle(idle);
        debug!("{} active sessions", sessions.len());
    }
}
