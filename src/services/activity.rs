//! Activity log service: audit records of user-initiated actions.
//!
//! DESIGN
//! ======
//! Every service that mutates or reads user data records what happened here.
//! Writing a log entry is best effort: a failed insert is traced and
//! swallowed so auditing never breaks the action being audited. Reading logs
//! is not best effort and surfaces database errors to the caller.
//!
//! Entries carry a free-form JSON `details` object. `describe` turns the
//! well-known category/action pairs into a sentence for display.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_USER_LOG_LIMIT: i64 = 50;
pub const DEFAULT_SYSTEM_LOG_LIMIT: i64 = 100;
pub const MAX_LOG_LIMIT: i64 = 500;

// =============================================================================
// CATEGORIES & ACTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Auth,
    Transaction,
    Note,
    Profile,
    Navigation,
    Settings,
    System,
}

impl ActivityCategory {
    pub const ALL: [Self; 7] =
        [Self::Auth, Self::Transaction, Self::Note, Self::Profile, Self::Navigation, Self::Settings, Self::System];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Transaction => "transaction",
            Self::Note => "note",
            Self::Profile => "profile",
            Self::Navigation => "navigation",
            Self::Settings => "settings",
            Self::System => "system",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw.trim())
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "Authentication",
            Self::Transaction => "Transactions",
            Self::Note => "Notes",
            Self::Profile => "Profile",
            Self::Navigation => "Navigation",
            Self::Settings => "Settings",
            Self::System => "System",
        }
    }
}

/// Action names, grouped by category.
pub mod actions {
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const SESSION_RESTORED: &str = "session_restored";

    pub const CREATE_TRANSACTION: &str = "create_transaction";
    pub const UPDATE_TRANSACTION: &str = "update_transaction";
    pub const DELETE_TRANSACTION: &str = "delete_transaction";
    pub const VIEW_TRANSACTIONS: &str = "view_transactions";
    pub const EXPORT_TRANSACTIONS: &str = "export_transactions";

    pub const CREATE_NOTE: &str = "create_note";
    pub const UPDATE_NOTE: &str = "update_note";
    pub const DELETE_NOTE: &str = "delete_note";
    pub const VIEW_NOTES: &str = "view_notes";

    pub const VIEW_PROFILE: &str = "view_profile";
    pub const UPDATE_PROFILE: &str = "update_profile";
    pub const CHANGE_THEME: &str = "change_theme";

    pub const PAGE_VIEW: &str = "page_view";
    pub const MODAL_OPEN: &str = "modal_open";
    pub const MODAL_CLOSE: &str = "modal_close";

    pub const DATA_EXPORT: &str = "data_export";
    pub const DATA_IMPORT: &str = "data_import";
    pub const DATA_DELETE: &str = "data_delete";

    pub const ERROR: &str = "error";
    pub const PERFORMANCE: &str = "performance_metric";

    /// Navigation actions clients may record directly.
    pub const CLIENT_NAVIGATION: [&str; 3] = [PAGE_VIEW, MODAL_OPEN, MODAL_CLOSE];
}

// =============================================================================
// ACTOR
// =============================================================================

/// Request metadata stored alongside a log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// The authenticated user performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub client: ClientMeta,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: Uuid, client: ClientMeta) -> Self {
        Self { user_id, client }
    }

    /// Actor without request metadata, for background work and tests.
    #[must_use]
    pub fn system(user_id: Uuid) -> Self {
        Self { user_id, client: ClientMeta::default() }
    }
}

// =============================================================================
// LOG ROWS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub category: String,
    pub action: String,
    pub details: Value,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

type LogTuple = (Uuid, Option<Uuid>, String, String, Value, Option<String>, Option<String>, OffsetDateTime);

fn from_tuple(row: LogTuple) -> ActivityLog {
    let (id, user_id, category, action, details, user_agent, ip_address, timestamp) = row;
    ActivityLog { id, user_id, category, action, details, user_agent, ip_address, timestamp }
}

/// Record an action. Never fails the caller.
pub async fn log_user_action(pool: &PgPool, actor: &Actor, category: ActivityCategory, action: &str, details: Value) {
    insert_log(pool, Some(actor.user_id), &actor.client, category, action, details).await;
}

/// Record an action with no known user, such as a failed sign-in.
pub async fn log_anonymous_action(
    pool: &PgPool,
    client: &ClientMeta,
    category: ActivityCategory,
    action: &str,
    details: Value,
) {
    insert_log(pool, None, client, category, action, details).await;
}

async fn insert_log(
    pool: &PgPool,
    user_id: Option<Uuid>,
    client: &ClientMeta,
    category: ActivityCategory,
    action: &str,
    details: Value,
) {
    let details = if details.is_object() { details } else { serde_json::json!({ "value": details }) };

    let result = sqlx::query(
        r"INSERT INTO activity_logs (user_id, category, action, details, user_agent, ip_address)
          VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user_id)
    .bind(category.as_str())
    .bind(action)
    .bind(&details)
    .bind(&client.user_agent)
    .bind(&client.ip_address)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(error = %e, category = category.as_str(), action, "activity log insert failed");
    }
}

/// Record a failed operation as a `system/error` entry.
pub async fn log_error(pool: &PgPool, actor: &Actor, operation: &str, error: &(dyn std::fmt::Display + Sync), extra: Value) {
    let mut details = serde_json::json!({ "action": operation, "error": error.to_string() });
    if let (Some(target), Value::Object(extra)) = (details.as_object_mut(), extra) {
        target.extend(extra);
    }
    log_user_action(pool, actor, ActivityCategory::System, actions::ERROR, details).await;
}

/// Clamp a requested page size into `1..=MAX_LOG_LIMIT`.
#[must_use]
pub fn clamp_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_LOG_LIMIT)
}

/// Most recent entries for one user, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get_user_activity_logs(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    category: Option<ActivityCategory>,
) -> Result<Vec<ActivityLog>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LogTuple>(
        r"SELECT id, user_id, category, action, details, user_agent, ip_address, created_at
          FROM activity_logs
          WHERE user_id = $1 AND ($2::text IS NULL OR category = $2)
          ORDER BY created_at DESC
          LIMIT $3",
    )
    .bind(user_id)
    .bind(category.map(ActivityCategory::as_str))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(from_tuple).collect())
}

/// Most recent entries across all users, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get_system_activity_logs(pool: &PgPool, limit: i64) -> Result<Vec<ActivityLog>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LogTuple>(
        r"SELECT id, user_id, category, action, details, user_agent, ip_address, created_at
          FROM activity_logs
          ORDER BY created_at DESC
          LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(from_tuple).collect())
}

// =============================================================================
// SUMMARIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub value: &'static str,
    pub label: &'static str,
    pub count: usize,
}

/// Per-category counts, led by an `all` entry. Every known category is listed.
#[must_use]
pub fn category_counts(logs: &[ActivityLog]) -> Vec<CategoryCount> {
    let mut out = Vec::with_capacity(ActivityCategory::ALL.len() + 1);
    out.push(CategoryCount { value: "all", label: "All Activities", count: logs.len() });
    for category in ActivityCategory::ALL {
        let count = logs.iter().filter(|l| l.category == category.as_str()).count();
        out.push(CategoryCount { value: category.as_str(), label: category.label(), count });
    }
    out
}

fn detail(details: &Value, key: &str) -> String {
    match details.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_owned(),
        Some(other) => other.to_string(),
    }
}

/// Human-readable sentence for a log entry.
#[must_use]
pub fn describe(log: &ActivityLog) -> String {
    let d = &log.details;
    let described = match (log.category.as_str(), log.action.as_str()) {
        ("auth", actions::LOGIN) => Some(format!("Signed in via {}", detail(d, "method"))),
        ("auth", actions::LOGOUT) => Some("Signed out".to_owned()),
        ("auth", actions::LOGIN_FAILED) => Some(format!("Failed to sign in: {}", detail(d, "error"))),
        ("auth", actions::SESSION_RESTORED) => Some("Session restored".to_owned()),
        ("transaction", actions::CREATE_TRANSACTION) => Some(format!(
            "Added {}: {} (${})",
            detail(d, "type"),
            detail(d, "description"),
            detail(d, "amount")
        )),
        ("transaction", actions::UPDATE_TRANSACTION) => Some("Updated transaction".to_owned()),
        ("transaction", actions::DELETE_TRANSACTION) => Some("Deleted transaction".to_owned()),
        ("transaction", actions::VIEW_TRANSACTIONS) => {
            Some(format!("Viewed {} transactions", detail(d, "transaction_count")))
        }
        ("transaction", actions::EXPORT_TRANSACTIONS) => {
            Some(format!("Exported {} transactions", detail(d, "transaction_count")))
        }
        ("note", actions::CREATE_NOTE) => Some(format!("Created note: {}", detail(d, "title"))),
        ("note", actions::UPDATE_NOTE) => Some("Updated note".to_owned()),
        ("note", actions::DELETE_NOTE) => Some("Deleted note".to_owned()),
        ("note", actions::VIEW_NOTES) => Some(format!("Viewed {} notes", detail(d, "note_count"))),
        ("profile", actions::VIEW_PROFILE) => Some("Viewed profile".to_owned()),
        ("profile", actions::UPDATE_PROFILE) => Some("Updated profile".to_owned()),
        ("profile", actions::CHANGE_THEME) => Some(format!("Changed theme to {}", detail(d, "new_theme"))),
        ("navigation", actions::PAGE_VIEW) => Some(format!("Visited {}", detail(d, "page"))),
        ("navigation", actions::MODAL_OPEN) => Some(format!("Opened {} modal", detail(d, "modal"))),
        ("navigation", actions::MODAL_CLOSE) => Some(format!("Closed {} modal", detail(d, "modal"))),
        ("settings", actions::DATA_EXPORT) => {
            Some(format!("Exported {} transactions", detail(d, "transaction_count")))
        }
        ("settings", actions::DATA_IMPORT) => {
            Some(format!("Imported {} transactions", detail(d, "transaction_count")))
        }
        ("settings", actions::DATA_DELETE) => Some("Deleted all data".to_owned()),
        ("system", actions::ERROR) => Some(format!("Error in {}: {}", detail(d, "action"), detail(d, "error"))),
        ("system", actions::PERFORMANCE) => Some(format!("Measured {}", detail(d, "metric"))),
        _ => None,
    };

    described.unwrap_or_else(|| log.action.replace('_', " "))
}

#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;
