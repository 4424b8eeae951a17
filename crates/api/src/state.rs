use std::sync::Arc;

use crate::config::ServerConfig;
use crate::notifications::email::EmailDelivery;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: openletter_db::DbPool,
    /// Server configuration, including the token secret.
    pub config: Arc<ServerConfig>,
    /// SMTP delivery for confirmation emails; `None` when SMTP is not configured.
    pub mailer: Option<Arc<EmailDelivery>>,
}
