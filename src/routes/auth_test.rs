use super::*;
use axum::http::HeaderValue;

fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(*name, HeaderValue::from_str(value).unwrap());
    }
    map
}

// =============================================================================
// parse_bool / env_bool: unique env var names avoid races with parallel tests.
// =============================================================================

#[test]
fn parse_bool_true_and_false_variants() {
    for val in ["1", "true", "yes", "on", "TRUE", " On "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
    for val in ["0", "false", "no", "off", "False"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
}

#[test]
fn parse_bool_invalid_returns_none() {
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}

#[test]
fn env_bool_reads_variable() {
    let key = "__TEST_PB_ENV_BOOL_4411__";
    unsafe { std::env::set_var(key, "yes") };
    assert_eq!(env_bool(key), Some(true));
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool(key), None);
}

// =============================================================================
// bearer_token
// =============================================================================

#[test]
fn bearer_token_extracts_value() {
    let h = headers(&[("authorization", "Bearer abc123")]);
    assert_eq!(bearer_token(&h), Some("abc123"));
}

#[test]
fn bearer_token_ignores_other_schemes_and_blanks() {
    assert_eq!(bearer_token(&headers(&[("authorization", "Basic Zm9v")])), None);
    assert_eq!(bearer_token(&headers(&[("authorization", "Bearer   ")])), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
}

// =============================================================================
// client_meta
// =============================================================================

#[test]
fn client_meta_uses_first_forwarded_hop() {
    let h = headers(&[("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"), ("user-agent", "Mozilla/5.0")]);
    let meta = client_meta(&h);
    assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
}

#[test]
fn client_meta_falls_back_to_real_ip() {
    let meta = client_meta(&headers(&[("x-real-ip", "198.51.100.2")]));
    assert_eq!(meta.ip_address.as_deref(), Some("198.51.100.2"));
    assert!(meta.user_agent.is_none());
}

#[test]
fn client_meta_empty_headers() {
    assert_eq!(client_meta(&HeaderMap::new()), ClientMeta::default());
}

// =============================================================================
// Cookies
// =============================================================================

#[test]
fn session_cookie_is_http_only_and_long_lived() {
    let cookie = session_cookie("tok".into());
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::days(30)));
}

#[test]
fn expired_cookie_has_zero_max_age() {
    let cookie = expired_cookie(COOKIE_NAME);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
}

// =============================================================================
// Error mapping
// =============================================================================

#[test]
fn email_auth_errors_map_to_status() {
    assert_eq!(email_auth_error_to_status(&EmailAuthError::InvalidEmail), StatusCode::BAD_REQUEST);
    assert_eq!(email_auth_error_to_status(&EmailAuthError::InvalidCode), StatusCode::BAD_REQUEST);
    assert_eq!(email_auth_error_to_status(&EmailAuthError::VerificationFailed), StatusCode::UNAUTHORIZED);
    assert_eq!(
        email_auth_error_to_status(&EmailAuthError::EmailDelivery("down".into())),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        email_auth_error_to_status(&EmailAuthError::Db(sqlx::Error::RowNotFound)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
