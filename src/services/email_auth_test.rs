use super::*;

#[test]
fn normalize_email_accepts_basic_address() {
    assert_eq!(normalize_email("  USER@Example.com "), Some("user@example.com".to_owned()));
}

#[test]
fn normalize_email_rejects_invalid_values() {
    assert_eq!(normalize_email(""), None);
    assert_eq!(normalize_email("user"), None);
    assert_eq!(normalize_email("@example.com"), None);
    assert_eq!(normalize_email("user@"), None);
    assert_eq!(normalize_email("a@b@c"), None);
}

#[test]
fn normalize_email_rejects_markup_and_whitespace() {
    assert_eq!(normalize_email("<script>@example.com"), None);
    assert_eq!(normalize_email("\"quoted\"@example.com"), None);
    assert_eq!(normalize_email("o'neil@Example.com"), Some("o'neil@example.com".to_owned()));
    assert_eq!(normalize_email("first last@example.com"), None);
    assert_eq!(normalize_email("user@exa\tmple.com"), None);
}

#[test]
fn normalize_code_uppercases_and_trims() {
    let code = generate_access_code();
    assert_eq!(normalize_code(&code), Some(code.clone()));
    assert_eq!(normalize_code(" abc234 "), Some("ABC234".to_owned()));
}

#[test]
fn normalize_code_rejects_ambiguous_and_wrong_length() {
    assert_eq!(normalize_code("abc23"), None);
    assert_eq!(normalize_code("abc2345"), None);
    // 0, 1, I and O are excluded from the alphabet.
    assert_eq!(normalize_code("ABC1I0"), None);
    assert_eq!(normalize_code("ABC23!"), None);
}

#[test]
fn generated_codes_use_the_alphabet() {
    for _ in 0..20 {
        let code = generate_access_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }
}

#[test]
fn hash_access_code_is_stable_sha256_hex() {
    let a = hash_access_code("ABC234");
    assert_eq!(a, hash_access_code("ABC234"));
    assert_ne!(a, hash_access_code("ABC235"));
    assert_eq!(a.len(), 64);
}

#[test]
fn name_from_email_uses_local_part() {
    assert_eq!(name_from_email("ada@example.com"), "ada");
}

#[test]
fn render_template_injects_email_and_code() {
    let html = render_email_code_template("user@example.com", "ABC234");
    assert!(html.contains("user@example.com"));
    assert!(html.contains("ABC234"));
    assert!(!html.contains("{{EMAIL}}"));
    assert!(!html.contains("{{CODE}}"));
}

#[test]
fn render_template_escapes_markup() {
    let html = render_email_code_template("a&b'<i>@example.com", "ABC234");
    assert!(html.contains("a&amp;b&#39;&lt;i&gt;@example.com"));
    assert!(!html.contains("<i>"));
}

#[tokio::test]
async fn delivery_without_config_succeeds() {
    assert!(deliver_access_code(None, "user@example.com", "ABC234").await.is_ok());
}

// =============================================================================
// Live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
fn wrong_code(code: &str) -> &'static str {
    if code == "AAAAAA" { "BBBBBB" } else { "AAAAAA" }
}

#[cfg(feature = "live-db-tests")]
fn unique_email() -> String {
    format!("verify-{}@example.com", Uuid::new_v4().simple())
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn code_survives_four_failed_attempts() {
    let pool = crate::db::test_helpers::integration_pool().await;
    let (email, code) = request_access_code(&pool, &unique_email()).await.expect("request should succeed");

    for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
        assert!(matches!(
            verify_access_code(&pool, &email, wrong_code(&code)).await,
            Err(EmailAuthError::VerificationFailed)
        ));
    }

    let user_id = verify_access_code(&pool, &email, &code).await.expect("correct code should still verify");
    let owner: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .expect("user lookup should succeed");
    assert_eq!(owner.as_deref(), Some(email.as_str()));

    assert!(matches!(
        verify_access_code(&pool, &email, &code).await,
        Err(EmailAuthError::VerificationFailed)
    ));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn code_is_burned_after_five_failed_attempts() {
    let pool = crate::db::test_helpers::integration_pool().await;
    let (email, code) = request_access_code(&pool, &unique_email()).await.expect("request should succeed");

    for _ in 0..MAX_FAILED_ATTEMPTS {
        assert!(verify_access_code(&pool, &email, wrong_code(&code)).await.is_err());
    }

    assert!(matches!(
        verify_access_code(&pool, &email, &code).await,
        Err(EmailAuthError::VerificationFailed)
    ));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn new_request_replaces_pending_code() {
    let pool = crate::db::test_helpers::integration_pool().await;
    let address = unique_email();
    let (email, first) = request_access_code(&pool, &address).await.expect("first request should succeed");
    let (_, second) = request_access_code(&pool, &address).await.expect("second request should succeed");

    if first != second {
        assert!(verify_access_code(&pool, &email, &first).await.is_err());
    }
    assert!(verify_access_code(&pool, &email, &second).await.is_ok());
}
