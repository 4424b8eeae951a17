//! Letter entity model and DTOs.

use std::collections::BTreeMap;

use openletter_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::signature::{PublicSignature, SignatureStats};

/// A row from the `letters` table: one letter in one locale.
///
/// Carries the derived token and the password hash -- NEVER serialize this
/// to API responses directly. Use [`LetterResponse`] for external output.
#[derive(Debug, Clone, FromRow)]
pub struct Letter {
    pub id: DbId,
    pub slug: String,
    pub locale: String,
    pub title: String,
    pub text: Option<String>,
    pub image: Option<String>,
    #[sqlx(rename = "type")]
    pub letter_type: String,
    pub token: String,
    pub password: Option<String>,
    pub user_id: Option<DbId>,
    pub parent_letter_id: Option<DbId>,
    pub featured_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Public letter representation (no token, password or `updated_at`).
#[derive(Debug, Clone, Serialize)]
pub struct LetterResponse {
    pub id: DbId,
    pub slug: String,
    pub locale: String,
    pub title: String,
    pub text: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub letter_type: String,
    pub user_id: Option<DbId>,
    pub parent_letter_id: Option<DbId>,
    pub featured_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<&Letter> for LetterResponse {
    fn from(letter: &Letter) -> Self {
        Self {
            id: letter.id,
            slug: letter.slug.clone(),
            locale: letter.locale.clone(),
            title: letter.title.clone(),
            text: letter.text.clone(),
            image: letter.image.clone(),
            letter_type: letter.letter_type.clone(),
            user_id: letter.user_id,
            parent_letter_id: letter.parent_letter_id,
            featured_at: letter.featured_at,
            created_at: letter.created_at,
        }
    }
}

/// DTO for editing an existing locale row. All fields are optional.
///
/// Slug and owner are not editable here: changing either means deriving a
/// new token, see `LetterRepo::assign_owner`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLetter {
    pub title: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub featured_at: Option<Timestamp>,
}

/// A freshly inserted update together with the locale row it belongs to.
#[derive(Debug, Clone)]
pub struct LetterUpdate {
    pub update: Letter,
    pub parent: Letter,
}

/// Public view of a created update, annotated with the row it updates.
#[derive(Debug, Clone, Serialize)]
pub struct LetterUpdateResponse {
    #[serde(flatten)]
    pub update: LetterResponse,
    pub parent_letter: LetterResponse,
}

impl From<&LetterUpdate> for LetterUpdateResponse {
    fn from(item: &LetterUpdate) -> Self {
        Self {
            update: LetterResponse::from(&item.update),
            parent_letter: LetterResponse::from(&item.parent),
        }
    }
}

/// Everything a letter page needs in one payload.
///
/// When the letter has more verified signatures than requested, the full
/// list is replaced by the oldest and the newest samples.
#[derive(Debug, Clone, Serialize)]
pub struct LetterPage {
    #[serde(flatten)]
    pub letter: LetterResponse,
    /// Locale codes the letter is available in.
    pub locales: Vec<String>,
    pub updates: Vec<LetterResponse>,
    pub signatures_stats: SignatureStats,
    pub signatures: Vec<PublicSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_verified_signatures: Option<Vec<PublicSignature>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_verified_signatures: Option<Vec<PublicSignature>>,
}

/// Filter for the recent/featured letter listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    pub locale: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub limit: Option<i64>,
    pub min_signatures: Option<i64>,
}

/// One letter (all locales of a slug folded together) in a listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LetterSummary {
    pub slug: String,
    /// Earliest creation time among the slug's locale rows.
    pub created_at: Timestamp,
    pub title: Option<String>,
    /// Teaser, not the full body.
    pub text: Option<String>,
    /// Comma-joined distinct locale codes.
    pub locales: String,
    /// Joined signature rows, verified or not.
    pub total_signatures: i64,
    pub image: Option<String>,
    pub featured_at: Option<Timestamp>,
}

/// Verified subscriber addresses grouped by locale.
///
/// The total lives beside the map, never inside it, so no locale code can
/// collide with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubscribersByLocale {
    pub by_locale: BTreeMap<String, Vec<String>>,
    pub total: usize,
}
