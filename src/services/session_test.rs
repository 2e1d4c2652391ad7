use super::*;

#[test]
fn bytes_to_hex_pads_and_concatenates() {
    assert_eq!(bytes_to_hex(&[]), "");
    assert_eq!(bytes_to_hex(&[0x0a, 0xde, 0xad]), "0adead");
}

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// session_duration_secs
// =============================================================================

#[test]
fn session_duration_counts_whole_seconds() {
    let start = OffsetDateTime::UNIX_EPOCH;
    let end = start + time::Duration::milliseconds(90_500);
    assert_eq!(session_duration_secs(start, end), 90);
}

#[test]
fn session_duration_never_negative() {
    let start = OffsetDateTime::UNIX_EPOCH + time::Duration::hours(1);
    assert_eq!(session_duration_secs(start, OffsetDateTime::UNIX_EPOCH), 0);
}

// =============================================================================
// SessionUser
// =============================================================================

#[test]
fn session_user_serializes_optional_fields_as_null() {
    let user = SessionUser {
        id: Uuid::nil(),
        name: "dave".into(),
        email: None,
        avatar_url: None,
        theme: "dark".into(),
        auth_method: auth_method(false),
    };
    let json = serde_json::to_value(&user).unwrap();
    assert!(json["avatar_url"].is_null());
    assert!(json["email"].is_null());
    assert_eq!(json["theme"], "dark");
    assert_eq!(json["auth_method"], "email");
}

#[test]
fn auth_method_prefers_google_link() {
    assert_eq!(auth_method(true), "google");
    assert_eq!(auth_method(false), "email");
}

#[test]
fn session_ttl_is_thirty_days() {
    assert_eq!(SESSION_TTL.whole_days(), 30);
}
