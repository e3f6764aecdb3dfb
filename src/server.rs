use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

/// Shared presentation state fed by the collection run.
///
/// The server only ever sees the advisory progress fraction and, after the
/// join barrier, the finished report string. It has no access to individual
/// result slots.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<RwLock<PresenterState>>,
}

#[derive(Debug)]
struct PresenterState {
    progress: Progress,
    report: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Progress {
    pub fraction: f64,
    pub completed: u64,
    pub total: u64,
    pub state: String, // "collecting" | "done"
}

impl AppState {
    pub fn new(total: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PresenterState {
                progress: Progress {
                    fraction: 0.0,
                    completed: 0,
                    total,
                    state: "collecting".into(),
                },
                report: None,
            })),
        }
    }

    /// Update the advisory progress fraction shown by the UI.
    pub async fn publish_progress(&self, fraction: f64, completed: u64) {
        let mut s = self.inner.write().await;
        s.progress.fraction = fraction.clamp(0.0, 1.0);
        s.progress.completed = completed;
    }

    /// Hand the finished report to the presentation layer. Called once, after
    /// the collection barrier.
    pub async fn publish_report(&self, report: String) {
        let mut s = self.inner.write().await;
        s.progress.fraction = 1.0;
        s.progress.completed = s.progress.total;
        s.progress.state = "done".into();
        s.report = Some(report);
    }
}

/// Serve the embedded UI: JSON progress/report endpoints plus static assets
/// from `ui/` when present.
pub async fn spawn_server(bind: &str, state: AppState) -> Result<()> {
    let api = Router::new()
        .route("/progress", get(get_progress))
        .route("/report", get(get_report))
        .with_state(state);

    let static_svc = ServeDir::new("ui").append_index_html_on_directories(true);

    let app = Router::new().nest("/api", api).fallback_service(static_svc);

    println!("Serving UI on http://{}", bind);
    axum::serve(tokio::net::TcpListener::bind(bind).await?, app).await?;
    Ok(())
}

async fn get_progress(State(app): State<AppState>) -> impl IntoResponse {
    let s = app.inner.read().await;
    (StatusCode::OK, Json(s.progress.clone()))
}

async fn get_report(State(app): State<AppState>) -> impl IntoResponse {
    let s = app.inner.read().await;
    match s.report.as_ref() {
        Some(report) => (StatusCode::OK, report.clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
