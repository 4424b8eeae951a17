//! Handlers for signing letters and confirming signatures.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use openletter_core::error::CoreError;
use openletter_core::letter::TYPE_LETTER;
use openletter_core::token::signature_token;
use openletter_db::models::signature::{CreateSignature, PublicSignature};
use openletter_db::repositories::{LetterRepo, SignatureRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::query::ConfirmParams;
use crate::state::AppState;

/// Body of `POST /letters/{slug}/{locale}/sign`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(
        required(message = "Email is required"),
        email(message = "A valid email address is required")
    )]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub occupation: Option<String>,
    #[validate(length(max = 255))]
    pub city: Option<String>,
    #[validate(length(max = 255))]
    pub organization: Option<String>,
    #[serde(default)]
    pub share_email: bool,
}

/// Where a confirmed signature belongs, so the client can redirect.
#[derive(Debug, Serialize)]
pub struct ConfirmedSignature {
    pub slug: String,
    pub locale: String,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/v1/letters/{slug}/{locale}/sign
///
/// Records an unverified signature and sends the signer a confirmation link.
/// Mail goes out in the background; without SMTP the link is only logged.
pub async fn sign(
    State(state): State<AppState>,
    Path((slug, locale)): Path<(String, String)>,
    ApiJson(input): ApiJson<SignRequest>,
) -> AppResult<(StatusCode, Json<PublicSignature>)> {
    input.validate()?;
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation("Name is required".into())));
    }

    let letter = LetterRepo::find_by_slug_and_locale(&state.pool, &slug, &locale)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Letter", format!("{slug}/{locale}"))))?;

    if letter.letter_type != TYPE_LETTER {
        return Err(AppError::BadRequest(format!(
            "A letter of type '{}' cannot be signed",
            letter.letter_type
        )));
    }

    let create = CreateSignature {
        name,
        occupation: blank_to_none(input.occupation),
        city: blank_to_none(input.city),
        organization: blank_to_none(input.organization),
        email: input.email.as_deref().map(|e| e.trim().to_string()),
        share_email: input.share_email,
    };
    let token = signature_token();
    let signature = SignatureRepo::create(&state.pool, letter.id, &create, &token).await?;
    tracing::info!(slug = %slug, locale = %locale, signature_id = signature.id, "Signature recorded");

    let url = state.config.confirmation_url(&token);
    match state.mailer.clone() {
        Some(mailer) => {
            let to = create.email.clone().unwrap_or_default();
            let signer = create.name.clone();
            let title = letter.title.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer
                    .send_signature_confirmation(&to, &signer, &title, &url)
                    .await
                {
                    tracing::error!(error = %e, "Failed to send signature confirmation");
                }
            });
        }
        None => {
            tracing::debug!(confirmation_url = %url, "SMTP not configured, confirmation email skipped");
        }
    }

    Ok((StatusCode::CREATED, Json(PublicSignature::from(&signature))))
}

/// GET /api/v1/signatures/confirm?token=
pub async fn confirm(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ConfirmParams>,
) -> AppResult<Json<ConfirmedSignature>> {
    let signature = SignatureRepo::confirm(&state.pool, &params.token)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Signature token", &params.token)))?;

    let letter = LetterRepo::find_by_id(&state.pool, signature.letter_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Letter", signature.letter_id)))?;

    tracing::info!(slug = %letter.slug, signature_id = signature.id, "Signature confirmed");
    Ok(Json(ConfirmedSignature {
        slug: letter.slug,
        locale: letter.locale,
    }))
}
