use super::*;
use time::OffsetDateTime;
use uuid::Uuid;

#[test]
fn category_filter_accepts_all_and_known() {
    assert_eq!(parse_category_filter(None), Ok(None));
    assert_eq!(parse_category_filter(Some("all")), Ok(None));
    assert_eq!(parse_category_filter(Some("note")), Ok(Some(ActivityCategory::Note)));
}

#[test]
fn category_filter_rejects_unknown() {
    assert_eq!(parse_category_filter(Some("billing")), Err(StatusCode::BAD_REQUEST));
}

#[test]
fn client_events_allow_navigation_actions() {
    assert_eq!(accept_client_event("navigation", "page_view"), Some((ActivityCategory::Navigation, "page_view")));
    assert_eq!(accept_client_event("navigation", "modal_close"), Some((ActivityCategory::Navigation, "modal_close")));
    assert_eq!(accept_client_event("system", "performance_metric"), Some((ActivityCategory::System, "performance_metric")));
}

#[test]
fn client_events_reject_server_owned_actions() {
    assert_eq!(accept_client_event("auth", "login"), None);
    assert_eq!(accept_client_event("transaction", "create_transaction"), None);
    assert_eq!(accept_client_event("system", "error"), None);
    assert_eq!(accept_client_event("navigation", "login"), None);
    assert_eq!(accept_client_event("unknown", "page_view"), None);
}

#[test]
fn activity_entry_flattens_log_and_adds_description() {
    let log = ActivityLog {
        id: Uuid::nil(),
        user_id: Some(Uuid::nil()),
        category: "navigation".into(),
        action: "page_view".into(),
        details: serde_json::json!({ "page": "notes" }),
        user_agent: None,
        ip_address: Some("203.0.113.7".into()),
        timestamp: OffsetDateTime::UNIX_EPOCH,
    };
    let json = serde_json::to_value(ActivityEntry::from(log)).unwrap();
    assert_eq!(json["description"], "Visited notes");
    assert_eq!(json["action"], "page_view");
    assert_eq!(json["ip_address"], "203.0.113.7");
}
