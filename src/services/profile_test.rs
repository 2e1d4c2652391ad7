use super::*;

fn patch(name: Option<&str>, theme: Option<&str>) -> ProfilePatch {
    ProfilePatch { name: name.map(str::to_owned), theme: theme.map(str::to_owned) }
}

#[test]
fn theme_parse_is_case_insensitive() {
    assert_eq!(Theme::parse("Light"), Some(Theme::Light));
    assert_eq!(Theme::parse(" dark "), Some(Theme::Dark));
    assert_eq!(Theme::parse("solarized"), None);
}

#[test]
fn validate_trims_name_and_parses_theme() {
    let valid = patch(Some("  Ada Lovelace "), Some("light")).validate().unwrap();
    assert_eq!(valid.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(valid.theme, Some(Theme::Light));
}

#[test]
fn validate_rejects_empty_patch() {
    assert!(matches!(patch(None, None).validate(), Err(ProfileError::EmptyPatch)));
}

#[test]
fn validate_rejects_blank_and_long_names() {
    assert!(matches!(patch(Some("   "), None).validate(), Err(ProfileError::EmptyName)));
    let long = "x".repeat(MAX_NAME_CHARS + 1);
    assert!(matches!(patch(Some(&long), None).validate(), Err(ProfileError::NameTooLong)));
    let exact = "é".repeat(MAX_NAME_CHARS);
    assert!(patch(Some(&exact), None).validate().is_ok());
}

#[test]
fn validate_rejects_unknown_theme() {
    let err = patch(None, Some("neon")).validate().unwrap_err();
    assert!(matches!(err, ProfileError::InvalidTheme(ref t) if t == "neon"));
}

#[test]
fn updated_fields_lists_present_fields() {
    assert_eq!(patch(Some("a"), Some("dark")).updated_fields(), vec!["name", "theme"]);
    assert_eq!(patch(None, Some("dark")).updated_fields(), vec!["theme"]);
}

#[test]
fn profile_serializes_flat_with_member_since() {
    let profile = Profile {
        user: UserRecord {
            id: Uuid::nil(),
            name: "Ada".into(),
            email: Some("ada@example.com".into()),
            avatar_url: None,
            theme: "dark".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        },
        stats: Summary {
            total_income_cents: 10_000,
            total_expenses_cents: 2_550,
            balance_cents: 7_450,
            transaction_count: 3,
            income_count: 1,
            expense_count: 2,
            average_transaction_cents: 4_183,
        },
    };
    let json = serde_json::to_value(profile).unwrap();
    assert_eq!(json["name"], "Ada");
    assert_eq!(json["member_since"], "1970-01-01T00:00:00Z");
    assert_eq!(json["total_income"], 100.0);
    assert_eq!(json["total_expenses"], 25.5);
    assert_eq!(json["balance"], 74.5);
    assert_eq!(json["transaction_count"], 3);
    assert!(json.get("created_at").is_none());
}
