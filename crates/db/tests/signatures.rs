//! Integration tests for signature verification and per-letter aggregates.

use openletter_core::letter::{prepare_locales, LetterDefaults, LetterDraft};
use openletter_db::models::letter::Letter;
use openletter_db::models::signature::{CreateSignature, SignatureStats};
use openletter_db::repositories::{LetterRepo, SignatureRepo};
use sqlx::PgPool;

async fn create_en_fr(pool: &PgPool) -> Vec<Letter> {
    let drafts = [("Count me", "en"), ("Comptez-moi", "fr")].map(|(title, locale)| LetterDraft {
        title: Some(title.to_string()),
        text: Some("<p>body</p>".to_string()),
        locale: locale.to_string(),
        image: None,
    });
    let prepared = prepare_locales(&drafts, &LetterDefaults::default()).unwrap();
    LetterRepo::create_with_locales(pool, &prepared, "secret").await.unwrap()
}

fn signer(name: &str, share_email: bool) -> CreateSignature {
    CreateSignature {
        name: name.to_string(),
        occupation: Some("Teacher".to_string()),
        city: Some("Brussels".to_string()),
        organization: None,
        email: Some(format!("{name}@example.com")),
        share_email,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_signature_is_unverified(pool: PgPool) {
    let letters = create_en_fr(&pool).await;
    let sig = SignatureRepo::create(&pool, letters[0].id, &signer("ada", false), "tok-ada")
        .await
        .unwrap();

    assert!(!sig.is_verified);
    assert!(sig.verified_at.is_none());
    assert_eq!(sig.letter_id, letters[0].id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_confirm_works_once(pool: PgPool) {
    let letters = create_en_fr(&pool).await;
    SignatureRepo::create(&pool, letters[0].id, &signer("ada", false), "tok-ada")
        .await
        .unwrap();

    let confirmed = SignatureRepo::confirm(&pool, "tok-ada").await.unwrap().unwrap();
    assert!(confirmed.is_verified);
    assert!(confirmed.verified_at.is_some());

    assert!(SignatureRepo::confirm(&pool, "tok-ada").await.unwrap().is_none());
    assert!(SignatureRepo::confirm(&pool, "unknown").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_token_violates_unique_constraint(pool: PgPool) {
    let letters = create_en_fr(&pool).await;
    SignatureRepo::create(&pool, letters[0].id, &signer("ada", false), "same")
        .await
        .unwrap();
    let err = SignatureRepo::create(&pool, letters[0].id, &signer("bob", false), "same")
        .await
        .unwrap_err();

    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_signatures_token"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_email_signs_each_locale_row_once(pool: PgPool) {
    let letters = create_en_fr(&pool).await;
    SignatureRepo::create(&pool, letters[0].id, &signer("ada", false), "tok-1")
        .await
        .unwrap();

    let mut shouting = signer("ada", true);
    shouting.email = Some("ADA@EXAMPLE.COM".to_string());
    let err = SignatureRepo::create(&pool, letters[0].id, &shouting, "tok-2")
        .await
        .unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_signatures_letter_email"));

    // The other locale row and e-mail-less signers are unaffected.
    SignatureRepo::create(&pool, letters[1].id, &signer("ada", false), "tok-3")
        .await
        .unwrap();
    for token in ["tok-4", "tok-5"] {
        let mut anonymous = signer("anon", false);
        anonymous.email = None;
        SignatureRepo::create(&pool, letters[0].id, &anonymous, token)
            .await
            .unwrap();
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stats_and_samples_span_all_locales(pool: PgPool) {
    let letters = create_en_fr(&pool).await;
    let slug = letters[0].slug.clone();

    for (i, letter) in [&letters[0], &letters[1], &letters[0], &letters[1], &letters[0]]
        .into_iter()
        .enumerate()
    {
        let token = format!("tok-{i}");
        SignatureRepo::create(&pool, letter.id, &signer(&format!("s{i}"), false), &token)
            .await
            .unwrap();
        if i != 2 {
            SignatureRepo::confirm(&pool, &token).await.unwrap().unwrap();
        }
    }

    let stats = SignatureRepo::stats_for_slug(&pool, &slug).await.unwrap();
    assert_eq!(stats, SignatureStats { total: 5, verified: 4 });

    let all: Vec<String> = SignatureRepo::list_verified_for_slug(&pool, &slug, None)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(all, vec!["s0", "s1", "s3", "s4"]);

    let first: Vec<String> = SignatureRepo::list_verified_for_slug(&pool, &slug, Some(2))
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(first, vec!["s0", "s1"]);

    let latest: Vec<String> = SignatureRepo::list_latest_verified_for_slug(&pool, &slug, 2)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(latest, vec!["s3", "s4"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stats_for_unsigned_letter_are_zero(pool: PgPool) {
    let letters = create_en_fr(&pool).await;
    let stats = SignatureRepo::stats_for_slug(&pool, &letters[0].slug).await.unwrap();
    assert_eq!(stats, SignatureStats::default());
}
