use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use openletter_core::error::CoreError;
use serde_json::json;

/// Constraint guarding one signature per signer and locale row.
const SIGNER_CONSTRAINT: &str = "uq_signatures_letter_email";

/// Message shown for every 500; details only go to the log.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Error type returned by every handler.
///
/// Every variant renders as `{"error": <message>, "code": <CODE>}`, including
/// bodies and query strings axum could not decode (see [`crate::extract`]).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Status, machine-readable code and client-facing message.
type ErrorParts = (StatusCode, &'static str, String);

fn internal(detail: &dyn std::fmt::Display) -> ErrorParts {
    tracing::error!(error = %detail, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn core_parts(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { entity, key } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} '{key}' not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => internal(msg),
    }
}

/// Unique violations (SQLSTATE 23505) on `uq_*` constraints become 409.
/// Repositories look rows up with `fetch_optional`, so anything else is a 500.
fn database_parts(err: &sqlx::Error) -> ErrorParts {
    let Some(db_err) = err.as_database_error() else {
        return internal(err);
    };
    let constraint = db_err.constraint().unwrap_or_default();
    if db_err.code().as_deref() != Some("23505") || !constraint.starts_with("uq_") {
        return internal(db_err);
    }

    let message = if constraint == SIGNER_CONSTRAINT {
        "This email address has already signed this letter".to_string()
    } else {
        format!("Duplicate value violates unique constraint: {constraint}")
    };
    (StatusCode::CONFLICT, "CONFLICT", message)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => core_parts(core),
            AppError::Database(err) => database_parts(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}
