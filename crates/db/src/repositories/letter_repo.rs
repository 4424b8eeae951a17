//! Repository for the `letters` table.

use std::collections::BTreeMap;

use futures::future::join_all;
use openletter_core::letter::PreparedLetter;
use openletter_core::locale::DEFAULT_LOCALE;
use openletter_core::pagination::{clamp_limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use openletter_core::teaser::teaser;
use openletter_core::token::letter_token;
use openletter_core::types::DbId;
use sqlx::PgPool;

use crate::models::letter::{
    Letter, LetterSummary, LetterUpdate, ListFilter, SubscribersByLocale, UpdateLetter,
};
use crate::repositories::SignatureRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, locale, title, text, image, type, token, password, \
                       user_id, parent_letter_id, featured_at, created_at, updated_at";

/// Listings longer than this look back further in time.
const WIDE_WINDOW_THRESHOLD: i64 = 10;

/// Look-back window (days) for listings of at most [`WIDE_WINDOW_THRESHOLD`].
const NARROW_WINDOW_DAYS: i32 = 30;

/// Look-back window (days) for longer listings.
const WIDE_WINDOW_DAYS: i32 = 90;

/// Default minimum number of joined signature rows for a listed letter.
pub const DEFAULT_MIN_SIGNATURES: i64 = 10;

/// Provides letter persistence and the read-side aggregations over it.
pub struct LetterRepo;

impl LetterRepo {
    /// Insert all prepared locale rows of a new letter in one statement.
    ///
    /// Each row's token is derived from its slug, owner and `secret`.
    /// An empty input is a no-op returning an empty list.
    pub async fn create_with_locales(
        pool: &PgPool,
        letters: &[PreparedLetter],
        secret: &str,
    ) -> Result<Vec<Letter>, sqlx::Error> {
        if letters.is_empty() {
            return Ok(vec![]);
        }

        let slugs: Vec<String> = letters.iter().map(|l| l.slug.clone()).collect();
        let locales: Vec<String> = letters.iter().map(|l| l.locale.clone()).collect();
        let titles: Vec<String> = letters.iter().map(|l| l.title.clone()).collect();
        let texts: Vec<String> = letters.iter().map(|l| l.text.clone()).collect();
        let images: Vec<Option<String>> = letters.iter().map(|l| l.image.clone()).collect();
        let types: Vec<String> = letters.iter().map(|l| l.letter_type.clone()).collect();
        let tokens: Vec<String> = letters
            .iter()
            .map(|l| letter_token(&l.slug, l.user_id, secret))
            .collect();
        let passwords: Vec<Option<String>> =
            letters.iter().map(|l| l.password_hash.clone()).collect();
        let user_ids: Vec<Option<DbId>> = letters.iter().map(|l| l.user_id).collect();

        let query = format!(
            "INSERT INTO letters \
                (slug, locale, title, text, image, type, token, password, user_id) \
             SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::text[], \
                                  $6::text[], $7::text[], $8::text[], $9::bigint[]) \
             RETURNING {COLUMNS}"
        );
        let rows = sqlx::query_as::<_, Letter>(&query)
            .bind(&slugs)
            .bind(&locales)
            .bind(&titles)
            .bind(&texts)
            .bind(&images)
            .bind(&types)
            .bind(&tokens)
            .bind(&passwords)
            .bind(&user_ids)
            .fetch_all(pool)
            .await?;

        tracing::info!(slug = %slugs[0], locales = rows.len(), "Letter created");
        Ok(rows)
    }

    /// Attach an update to every locale row of `parent`'s letter.
    ///
    /// Each locale row of the parent receives the update written in the same
    /// locale, owned by the parent's owner. Locales without a matching update
    /// are skipped. Inserts run concurrently and independently: if one
    /// fails, the others are still committed and the first error is
    /// returned once all have settled.
    pub async fn create_update(
        pool: &PgPool,
        parent: &Letter,
        updates: &[PreparedLetter],
        secret: &str,
    ) -> Result<Vec<LetterUpdate>, sqlx::Error> {
        let siblings = Self::find_locales(pool, &parent.slug).await?;

        let inserts = siblings.into_iter().filter_map(|sibling| {
            let Some(update) = updates.iter().find(|u| u.locale == sibling.locale) else {
                tracing::info!(
                    slug = %parent.slug,
                    locale = %sibling.locale,
                    "No update found for locale, skipping"
                );
                return None;
            };
            let row = PreparedLetter {
                user_id: parent.user_id,
                ..update.clone()
            };
            Some(async move {
                let inserted = Self::insert_one(pool, &row, Some(sibling.id), secret).await;
                inserted.map(|update| LetterUpdate {
                    update,
                    parent: sibling,
                })
            })
        });

        let mut created = Vec::new();
        let mut first_error = None;
        for result in join_all(inserts).await {
            match result {
                Ok(update) => created.push(update),
                Err(e) => {
                    tracing::error!(slug = %parent.slug, error = %e, "Failed to insert letter update");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(created),
        }
    }

    /// Insert a single locale row.
    async fn insert_one(
        pool: &PgPool,
        letter: &PreparedLetter,
        parent_letter_id: Option<DbId>,
        secret: &str,
    ) -> Result<Letter, sqlx::Error> {
        let query = format!(
            "INSERT INTO letters \
                (slug, locale, title, text, image, type, token, password, user_id, parent_letter_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Letter>(&query)
            .bind(&letter.slug)
            .bind(&letter.locale)
            .bind(&letter.title)
            .bind(&letter.text)
            .bind(&letter.image)
            .bind(&letter.letter_type)
            .bind(letter_token(&letter.slug, letter.user_id, secret))
            .bind(&letter.password_hash)
            .bind(letter.user_id)
            .bind(parent_letter_id)
            .fetch_one(pool)
            .await
    }

    /// Find a locale row by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Letter>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM letters WHERE id = $1");
        sqlx::query_as::<_, Letter>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the row of `slug` written in `locale`.
    pub async fn find_by_slug_and_locale(
        pool: &PgPool,
        slug: &str,
        locale: &str,
    ) -> Result<Option<Letter>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM letters WHERE slug = $1 AND locale = $2");
        sqlx::query_as::<_, Letter>(&query)
            .bind(slug)
            .bind(locale)
            .fetch_optional(pool)
            .await
    }

    /// All locale rows sharing `slug`, oldest first.
    pub async fn find_locales(pool: &PgPool, slug: &str) -> Result<Vec<Letter>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM letters WHERE slug = $1 ORDER BY id");
        sqlx::query_as::<_, Letter>(&query)
            .bind(slug)
            .fetch_all(pool)
            .await
    }

    /// Updates posted to a locale row, oldest first.
    pub async fn find_updates(
        pool: &PgPool,
        parent_letter_id: DbId,
    ) -> Result<Vec<Letter>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM letters WHERE parent_letter_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Letter>(&query)
            .bind(parent_letter_id)
            .fetch_all(pool)
            .await
    }

    /// List recent (or featured) letters, one entry per slug.
    ///
    /// Title and text come from the requested locale when that row has them,
    /// otherwise from the English row. Without `featured`, only rows created
    /// in the last 30 days (90 when more than 10 letters are requested) are
    /// considered. Slugs with fewer than `min_signatures` joined rows are
    /// left out. Text is reduced to a teaser.
    pub async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<LetterSummary>, sqlx::Error> {
        // Zero means "not given" for both numeric filters.
        let limit = clamp_limit(
            filter.limit.filter(|&l| l != 0),
            DEFAULT_LIST_LIMIT,
            MAX_LIST_LIMIT,
        );
        let days = if limit > WIDE_WINDOW_THRESHOLD {
            WIDE_WINDOW_DAYS
        } else {
            NARROW_WINDOW_DAYS
        };
        let locale = filter
            .locale
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCALE);
        let min_signatures = filter
            .min_signatures
            .filter(|&m| m != 0)
            .unwrap_or(DEFAULT_MIN_SIGNATURES);

        let mut rows = sqlx::query_as::<_, LetterSummary>(
            "SELECT
                l.slug,
                MIN(l.created_at) AS created_at,
                COALESCE(MIN(l.title) FILTER (WHERE l.locale = $1),
                         MIN(l.title) FILTER (WHERE l.locale = $6)) AS title,
                COALESCE(MIN(l.text) FILTER (WHERE l.locale = $1),
                         MIN(l.text) FILTER (WHERE l.locale = $6)) AS text,
                STRING_AGG(DISTINCT l.locale, ',') AS locales,
                COUNT(*) AS total_signatures,
                (ARRAY_AGG(l.image ORDER BY l.created_at, l.id)
                    FILTER (WHERE l.image IS NOT NULL))[1] AS image,
                MIN(l.featured_at) AS featured_at
             FROM letters l
             LEFT JOIN signatures s ON l.id = s.letter_id
             WHERE CASE WHEN $2 THEN l.featured_at IS NOT NULL
                        ELSE l.created_at >= NOW() - make_interval(days => $3) END
             GROUP BY l.slug
             HAVING COUNT(*) >= $4
             ORDER BY CASE WHEN $2 THEN MIN(l.featured_at) ELSE MIN(l.created_at) END DESC
             LIMIT $5",
        )
        .bind(locale)
        .bind(filter.featured)
        .bind(days)
        .bind(min_signatures)
        .bind(limit)
        .bind(DEFAULT_LOCALE)
        .fetch_all(pool)
        .await?;

        for row in &mut rows {
            row.text = row.text.as_deref().map(teaser);
        }
        Ok(rows)
    }

    /// Verified, non-null subscriber emails for every locale of `slug`.
    ///
    /// Every locale row gets an entry, even when it has no subscribers.
    /// Rows are queried concurrently.
    pub async fn subscribers_by_locale(
        pool: &PgPool,
        slug: &str,
    ) -> Result<SubscribersByLocale, sqlx::Error> {
        let locales = Self::find_locales(pool, slug).await?;
        let lookups = locales.iter().map(|letter| async move {
            SignatureRepo::subscribers(pool, letter.id)
                .await
                .map(|emails| (letter.locale.clone(), emails))
        });

        let mut by_locale = BTreeMap::new();
        let mut total = 0;
        for result in join_all(lookups).await {
            let (locale, emails) = result?;
            total += emails.len();
            by_locale.insert(locale, emails);
        }

        Ok(SubscribersByLocale { by_locale, total })
    }

    /// Hand every locale row of `slug` to a new owner and derive the token
    /// again. Returns the number of rows changed.
    pub async fn assign_owner(
        pool: &PgPool,
        slug: &str,
        user_id: Option<DbId>,
        secret: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE letters SET user_id = $2, token = $3 WHERE slug = $1")
            .bind(slug)
            .bind(user_id)
            .bind(letter_token(slug, user_id, secret))
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Edit a locale row. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLetter,
    ) -> Result<Option<Letter>, sqlx::Error> {
        let query = format!(
            "UPDATE letters SET
                title = COALESCE($2, title),
                text = COALESCE($3, text),
                image = COALESCE($4, image),
                featured_at = COALESCE($5, featured_at)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Letter>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.text)
            .bind(&input.image)
            .bind(input.featured_at)
            .fetch_optional(pool)
            .await
    }
}
