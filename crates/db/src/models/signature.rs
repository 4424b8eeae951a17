//! Signature entity model and DTOs.

use openletter_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `signatures` table.
///
/// Contains the confirmation token and the signer's email -- use
/// [`PublicSignature`] for anything shown to visitors.
#[derive(Debug, Clone, FromRow)]
pub struct Signature {
    pub id: DbId,
    pub letter_id: DbId,
    pub name: String,
    pub occupation: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
    pub share_email: bool,
    pub is_verified: bool,
    pub token: String,
    pub verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What visitors see of a signature. The email is withheld unless the signer
/// opted in with `share_email`.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSignature {
    pub id: DbId,
    pub name: String,
    pub occupation: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: Timestamp,
}

impl From<&Signature> for PublicSignature {
    fn from(sig: &Signature) -> Self {
        Self {
            id: sig.id,
            name: sig.name.clone(),
            occupation: sig.occupation.clone(),
            city: sig.city.clone(),
            organization: sig.organization.clone(),
            email: if sig.share_email { sig.email.clone() } else { None },
            created_at: sig.created_at,
        }
    }
}

/// DTO for inserting a new (unverified) signature.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSignature {
    pub name: String,
    pub occupation: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub share_email: bool,
}

/// Signature counts for one letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow, Serialize)]
pub struct SignatureStats {
    pub total: i64,
    pub verified: i64,
}
