//! Repository for the `signatures` table.

use openletter_core::types::DbId;
use sqlx::PgPool;

use crate::models::signature::{CreateSignature, Signature, SignatureStats};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, letter_id, name, occupation, city, organization, email, \
                       share_email, is_verified, token, verified_at, created_at, updated_at";

/// Same columns qualified with the `s.` alias for joins.
const S_COLUMNS: &str = "s.id, s.letter_id, s.name, s.occupation, s.city, s.organization, \
                         s.email, s.share_email, s.is_verified, s.token, s.verified_at, \
                         s.created_at, s.updated_at";

/// Provides signature persistence, verification and per-letter aggregates.
pub struct SignatureRepo;

impl SignatureRepo {
    /// Insert a new, unverified signature on a locale row.
    pub async fn create(
        pool: &PgPool,
        letter_id: DbId,
        input: &CreateSignature,
        token: &str,
    ) -> Result<Signature, sqlx::Error> {
        let query = format!(
            "INSERT INTO signatures
                (letter_id, name, occupation, city, organization, email, share_email, token)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Signature>(&query)
            .bind(letter_id)
            .bind(&input.name)
            .bind(&input.occupation)
            .bind(&input.city)
            .bind(&input.organization)
            .bind(&input.email)
            .bind(input.share_email)
            .bind(token)
            .fetch_one(pool)
            .await
    }

    /// Mark the signature holding `token` as verified.
    ///
    /// Returns `None` for unknown tokens and for signatures that were
    /// already verified, so a confirmation link works exactly once.
    pub async fn confirm(pool: &PgPool, token: &str) -> Result<Option<Signature>, sqlx::Error> {
        let query = format!(
            "UPDATE signatures SET is_verified = TRUE, verified_at = NOW()
             WHERE token = $1 AND NOT is_verified
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Signature>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Verified, non-null emails signed on exactly this locale row.
    pub async fn subscribers(pool: &PgPool, letter_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT email FROM signatures
             WHERE letter_id = $1 AND is_verified AND email IS NOT NULL
             ORDER BY id",
        )
        .bind(letter_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    /// Total and verified signature counts across every locale of `slug`.
    pub async fn stats_for_slug(pool: &PgPool, slug: &str) -> Result<SignatureStats, sqlx::Error> {
        sqlx::query_as::<_, SignatureStats>(
            "SELECT COUNT(s.id) AS total,
                    COUNT(s.id) FILTER (WHERE s.is_verified) AS verified
             FROM letters l
             JOIN signatures s ON s.letter_id = l.id
             WHERE l.slug = $1",
        )
        .bind(slug)
        .fetch_one(pool)
        .await
    }

    /// Oldest verified signatures across every locale of `slug`.
    ///
    /// `limit = None` returns all of them.
    pub async fn list_verified_for_slug(
        pool: &PgPool,
        slug: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Signature>, sqlx::Error> {
        let query = format!(
            "SELECT {S_COLUMNS}
             FROM signatures s
             JOIN letters l ON l.id = s.letter_id
             WHERE l.slug = $1 AND s.is_verified
             ORDER BY s.id
             LIMIT $2"
        );
        sqlx::query_as::<_, Signature>(&query)
            .bind(slug)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// The `limit` most recent verified signatures of `slug`, in signing order.
    pub async fn list_latest_verified_for_slug(
        pool: &PgPool,
        slug: &str,
        limit: i64,
    ) -> Result<Vec<Signature>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM (
                SELECT {S_COLUMNS}
                FROM signatures s
                JOIN letters l ON l.id = s.letter_id
                WHERE l.slug = $1 AND s.is_verified
                ORDER BY s.id DESC
                LIMIT $2
             ) latest
             ORDER BY id"
        );
        sqlx::query_as::<_, Signature>(&query)
            .bind(slug)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
