//! Handlers for the `/letters` resource.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use openletter_core::error::CoreError;
use openletter_core::letter::{prepare_locales, LetterDefaults, LetterDraft};
use openletter_core::locale::{from_accept_language, resolve_locale};
use openletter_core::pagination::DEFAULT_SIGNATURE_LIMIT;
use openletter_core::sanitize::sanitize_html;
use openletter_core::token::tokens_match;
use openletter_core::types::DbId;
use openletter_db::models::letter::{
    Letter, LetterPage, LetterResponse, LetterSummary, LetterUpdate, LetterUpdateResponse,
    ListFilter, UpdateLetter,
};
use openletter_db::models::signature::PublicSignature;
use openletter_db::repositories::{LetterRepo, SignatureRepo};
use serde::{Deserialize, Serialize};

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::query::LetterPageParams;
use crate::state::AppState;

/// Cache policy for letter pages: shared caches may serve a stale copy
/// while revalidating.
const LETTER_CACHE_CONTROL: &str = "s-maxage=1, stale-while-revalidate";

/* --------------------------------------------------------------------------
Request bodies
-------------------------------------------------------------------------- */

/// Body of `POST /letters`.
#[derive(Debug, Deserialize)]
pub struct CreateLettersRequest {
    pub letters: Vec<LetterDraft>,
    #[serde(rename = "type")]
    pub letter_type: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
    pub user_id: Option<DbId>,
}

/// Proof of authorship: the letter token, or the password set at creation.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /letters/{slug}/updates`.
#[derive(Debug, Deserialize)]
pub struct CreateUpdateRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub letters: Vec<LetterDraft>,
}

/// Body of `PUT /letters/{slug}`. Absent fields are left as they are.
#[derive(Debug, Deserialize)]
pub struct EditLetterRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub locale: String,
    pub title: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
}

/// Body of `PUT /letters/{slug}/owner`. A null `user_id` detaches the owner.
#[derive(Debug, Deserialize)]
pub struct AssignOwnerRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub user_id: Option<DbId>,
}

/// Response of `POST /letters`.
///
/// `token` is shown to the author once; it authorizes posting updates.
#[derive(Debug, Serialize)]
pub struct CreatedLetters {
    pub token: String,
    pub letters: Vec<LetterResponse>,
}

/// Response of `POST /letters/{slug}/updates`.
///
/// `subscribers` counts, per updated locale, the verified signers the
/// update is mailed to.
#[derive(Debug, Serialize)]
pub struct CreatedUpdates {
    pub updates: Vec<LetterUpdateResponse>,
    pub subscribers: BTreeMap<String, usize>,
}

/// Response of `PUT /letters/{slug}/owner`: the token replacing the old one.
#[derive(Debug, Serialize)]
pub struct OwnerAssigned {
    pub token: String,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

/// All locale rows of `slug`, or 404 when there are none.
async fn ensure_locales(pool: &sqlx::PgPool, slug: &str) -> AppResult<Vec<Letter>> {
    let locales = LetterRepo::find_locales(pool, slug).await?;
    if locales.is_empty() {
        return Err(AppError::Core(CoreError::not_found("Letter", slug)));
    }
    Ok(locales)
}

/// Pick the row to display: `?locale`, then `Accept-Language`, then the
/// default-locale fallback of [`resolve_locale`].
fn pick_locale(
    locales: Vec<Letter>,
    requested: Option<&str>,
    headers: &HeaderMap,
) -> Option<Letter> {
    let header_locale = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(from_accept_language);
    let requested = requested
        .filter(|l| !l.is_empty())
        .or(header_locale.as_deref());

    let codes: Vec<String> = locales.iter().map(|l| l.locale.clone()).collect();
    let chosen = resolve_locale(requested, &codes)?.to_string();
    locales.into_iter().find(|l| l.locale == chosen)
}

/// Check author credentials against a locale row of the letter.
///
/// A matching token wins; otherwise a given password is verified. 401 when
/// neither is supplied, 403 when nothing matches.
fn authorize(parent: &Letter, credentials: &Credentials) -> AppResult<()> {
    let token = credentials.token.as_deref();
    let password = credentials.password.as_deref();
    if token.is_none() && password.is_none() {
        return Err(AppError::Core(CoreError::Unauthorized(
            "A token or password is required".into(),
        )));
    }

    if token.is_some_and(|t| tokens_match(&parent.token, t)) {
        return Ok(());
    }
    if let (Some(password), Some(hash)) = (password, parent.password.as_deref()) {
        let ok = verify_password(password, hash)
            .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
        if ok {
            return Ok(());
        }
    }

    Err(AppError::Core(CoreError::Forbidden(
        "Invalid token or password".into(),
    )))
}

/// The row an author acts on: the default locale of `slug`.
async fn authorized_parent(
    pool: &sqlx::PgPool,
    slug: &str,
    credentials: &Credentials,
) -> AppResult<Letter> {
    let locales = ensure_locales(pool, slug).await?;
    let parent = pick_locale(locales, None, &HeaderMap::new())
        .ok_or_else(|| AppError::Core(CoreError::not_found("Letter", slug)))?;
    authorize(&parent, credentials)?;
    Ok(parent)
}

/// Mail each created update to the verified subscribers of its locale row.
///
/// Sends run in the background; without SMTP the recipient counts are only
/// logged. Returns the per-locale counts either way.
async fn notify_subscribers(
    state: &AppState,
    slug: &str,
    created: &[LetterUpdate],
) -> AppResult<BTreeMap<String, usize>> {
    let mut subscribers = LetterRepo::subscribers_by_locale(&state.pool, slug).await?;
    let mut counts = BTreeMap::new();

    for item in created {
        let locale = item.parent.locale.clone();
        let recipients = subscribers.by_locale.remove(&locale).unwrap_or_default();
        counts.insert(locale.clone(), recipients.len());
        if recipients.is_empty() {
            continue;
        }

        let url = state.config.letter_url(slug, &locale);
        match state.mailer.clone() {
            Some(mailer) => {
                let title = item.update.title.clone();
                let text = item.update.text.clone().unwrap_or_default();
                tokio::spawn(async move {
                    match mailer.send_letter_update(&recipients, &title, &text, &url).await {
                        Ok(sent) => tracing::info!(locale = %locale, sent, "Letter update mailed"),
                        Err(e) => tracing::error!(error = %e, "Failed to mail letter update"),
                    }
                });
            }
            None => {
                tracing::info!(
                    locale = %locale,
                    recipients = recipients.len(),
                    letter_url = %url,
                    "SMTP not configured, update email skipped"
                );
            }
        }
    }

    Ok(counts)
}

fn public(signatures: &[openletter_db::models::signature::Signature]) -> Vec<PublicSignature> {
    signatures.iter().map(PublicSignature::from).collect()
}

/* --------------------------------------------------------------------------
Handlers
-------------------------------------------------------------------------- */

/// GET /api/v1/letters
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ListFilter>,
) -> AppResult<Json<Vec<LetterSummary>>> {
    let letters = LetterRepo::list(&state.pool, &filter).await?;
    Ok(Json(letters))
}

/// POST /api/v1/letters
///
/// Creates one row per locale under a new shared slug. Locales whose text is
/// empty after sanitizing are dropped; if none remain the request fails.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateLettersRequest>,
) -> AppResult<(StatusCode, Json<CreatedLetters>)> {
    let password_hash = match input.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password_strength(password, MIN_PASSWORD_LENGTH)
                .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
            Some(
                hash_password(password)
                    .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?,
            )
        }
        None => None,
    };

    let defaults = LetterDefaults {
        user_id: input.user_id,
        letter_type: input.letter_type,
        image: input.image,
        password_hash,
    };
    let prepared = prepare_locales(&input.letters, &defaults)?;
    if prepared.is_empty() {
        return Err(AppError::BadRequest(
            "No locale has any text left after sanitizing".into(),
        ));
    }

    let letters =
        LetterRepo::create_with_locales(&state.pool, &prepared, &state.config.app_key).await?;
    let token = letters.first().map(|l| l.token.clone()).unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(CreatedLetters {
            token,
            letters: letters.iter().map(LetterResponse::from).collect(),
        }),
    ))
}

/// GET /api/v1/letters/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiQuery(params): ApiQuery<LetterPageParams>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let locales = ensure_locales(&state.pool, &slug).await?;
    let locale_codes: Vec<String> = locales.iter().map(|l| l.locale.clone()).collect();
    let letter = pick_locale(locales, params.locale.as_deref(), &headers)
        .ok_or_else(|| AppError::Core(CoreError::not_found("Letter", &slug)))?;

    let updates = LetterRepo::find_updates(&state.pool, letter.id).await?;
    let stats = SignatureRepo::stats_for_slug(&state.pool, &slug).await?;

    let limit = params.limit.unwrap_or(DEFAULT_SIGNATURE_LIMIT).max(0);
    let (signatures, first, latest) = if limit == 0 || stats.verified <= limit {
        let all = SignatureRepo::list_verified_for_slug(&state.pool, &slug, None).await?;
        (public(&all), None, None)
    } else {
        let first_count = limit - limit / 2;
        let first =
            SignatureRepo::list_verified_for_slug(&state.pool, &slug, Some(first_count)).await?;
        let latest =
            SignatureRepo::list_latest_verified_for_slug(&state.pool, &slug, limit / 2).await?;
        (Vec::new(), Some(public(&first)), Some(public(&latest)))
    };

    let page = LetterPage {
        letter: LetterResponse::from(&letter),
        locales: locale_codes,
        updates: updates.iter().map(LetterResponse::from).collect(),
        signatures_stats: stats,
        signatures,
        first_verified_signatures: first,
        latest_verified_signatures: latest,
    };

    Ok(([(header::CACHE_CONTROL, LETTER_CACHE_CONTROL)], Json(page)))
}

/// GET /api/v1/letters/{slug}/locales
pub async fn list_locales(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Vec<LetterResponse>>> {
    let locales = ensure_locales(&state.pool, &slug).await?;
    Ok(Json(locales.iter().map(LetterResponse::from).collect()))
}

/// POST /api/v1/letters/{slug}/updates
///
/// Posts an update to every locale of the letter that the body provides a
/// translation for; other locales are skipped. Each update is mailed to the
/// verified signers of its locale.
pub async fn create_update(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiJson(input): ApiJson<CreateUpdateRequest>,
) -> AppResult<(StatusCode, Json<CreatedUpdates>)> {
    let parent = authorized_parent(&state.pool, &slug, &input.credentials).await?;

    let defaults = LetterDefaults {
        user_id: parent.user_id,
        letter_type: Some(parent.letter_type.clone()),
        ..Default::default()
    };
    let prepared = prepare_locales(&input.letters, &defaults)?;
    if prepared.is_empty() {
        return Err(AppError::BadRequest(
            "No locale has any text left after sanitizing".into(),
        ));
    }

    let created =
        LetterRepo::create_update(&state.pool, &parent, &prepared, &state.config.app_key).await?;
    tracing::info!(slug = %slug, updates = created.len(), "Letter update posted");

    let subscribers = notify_subscribers(&state, &slug, &created).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedUpdates {
            updates: created.iter().map(LetterUpdateResponse::from).collect(),
            subscribers,
        }),
    ))
}

/// PUT /api/v1/letters/{slug}
///
/// Edits one locale row. Text is sanitized like on creation and may not end
/// up empty. The letter token is left unchanged.
pub async fn edit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiJson(input): ApiJson<EditLetterRequest>,
) -> AppResult<Json<LetterResponse>> {
    authorized_parent(&state.pool, &slug, &input.credentials).await?;

    let target = LetterRepo::find_by_slug_and_locale(&state.pool, &slug, &input.locale)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::not_found("Letter", format!("{slug}/{}", input.locale)))
        })?;

    let title = input.title.map(|t| t.trim().to_string());
    if title.as_deref() == Some("") {
        return Err(AppError::Core(CoreError::Validation("Title cannot be empty".into())));
    }
    let text = input.text.as_deref().map(sanitize_html);
    if text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation(
            "Text is empty after sanitizing".into(),
        )));
    }

    let changes = UpdateLetter {
        title,
        text,
        image: input.image,
        featured_at: None,
    };
    let letter = LetterRepo::update(&state.pool, target.id, &changes)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Letter", target.id)))?;

    tracing::info!(slug = %slug, locale = %letter.locale, "Letter edited");
    Ok(Json(LetterResponse::from(&letter)))
}

/// PUT /api/v1/letters/{slug}/owner
///
/// Moves every locale row to a new owner and derives a new letter token,
/// which is returned once. The previous token stops working.
pub async fn assign_owner(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiJson(input): ApiJson<AssignOwnerRequest>,
) -> AppResult<Json<OwnerAssigned>> {
    authorized_parent(&state.pool, &slug, &input.credentials).await?;

    let rows =
        LetterRepo::assign_owner(&state.pool, &slug, input.user_id, &state.config.app_key).await?;
    let token = LetterRepo::find_locales(&state.pool, &slug)
        .await?
        .into_iter()
        .next()
        .map(|l| l.token)
        .ok_or_else(|| AppError::Core(CoreError::not_found("Letter", &slug)))?;

    tracing::info!(slug = %slug, rows, user_id = ?input.user_id, "Letter owner assigned");
    Ok(Json(OwnerAssigned { token }))
}
