//! Liveness endpoint, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// How confirmation and update e-mails leave the service.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MailMode {
    /// Delivered through the configured SMTP relay.
    Smtp,
    /// SMTP is not configured; links are written to the log instead.
    LogOnly,
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub mail: MailMode,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match openletter_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };
    let mail = if state.mailer.is_some() {
        MailMode::Smtp
    } else {
        MailMode::LogOnly
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        mail,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
