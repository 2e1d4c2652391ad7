//! Activity log routes. The system feed is limited to admin emails.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routes::auth::AuthUser;
use crate::services::activity::{
    self, ActivityCategory, ActivityLog, CategoryCount, DEFAULT_SYSTEM_LOG_LIMIT, DEFAULT_USER_LOG_LIMIT, actions,
};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ActivityEntry {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub description: String,
}

impl From<ActivityLog> for ActivityEntry {
    fn from(log: ActivityLog) -> Self {
        let description = activity::describe(&log);
        Self { log, description }
    }
}

#[derive(Serialize)]
pub struct ActivityResponse {
    pub logs: Vec<ActivityEntry>,
    pub counts: Vec<CategoryCount>,
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    limit: Option<i64>,
    category: Option<String>,
}

/// `None` for absent or `all`; 400 for an unknown category.
pub(crate) fn parse_category_filter(raw: Option<&str>) -> Result<Option<ActivityCategory>, StatusCode> {
    match raw.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(value) => ActivityCategory::parse(value).map(Some).ok_or(StatusCode::BAD_REQUEST),
    }
}

fn read_failed(e: &sqlx::Error) -> StatusCode {
    tracing::error!(error = %e, "activity log query failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// `GET /api/activity?limit=&category=`: newest first, with per-category counts.
pub async fn list_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityResponse>, StatusCode> {
    let category = parse_category_filter(query.category.as_deref())?;
    let limit = activity::clamp_limit(query.limit, DEFAULT_USER_LOG_LIMIT);

    let all = activity::get_user_activity_logs(&state.pool, auth.user.id, limit, None)
        .await
        .map_err(|e| read_failed(&e))?;
    let counts = activity::category_counts(&all);

    let logs = match category {
        None => all,
        Some(category) => activity::get_user_activity_logs(&state.pool, auth.user.id, limit, Some(category))
            .await
            .map_err(|e| read_failed(&e))?,
    };

    Ok(Json(ActivityResponse { logs: logs.into_iter().map(ActivityEntry::from).collect(), counts }))
}

#[derive(Deserialize)]
pub struct ClientEventBody {
    category: String,
    action: String,
    #[serde(default)]
    details: Value,
}

/// Events clients may record directly: navigation plus performance metrics.
pub(crate) fn accept_client_event(category: &str, action: &str) -> Option<(ActivityCategory, &'static str)> {
    match ActivityCategory::parse(category)? {
        ActivityCategory::Navigation => actions::CLIENT_NAVIGATION
            .into_iter()
            .find(|a| *a == action.trim())
            .map(|a| (ActivityCategory::Navigation, a)),
        ActivityCategory::System if action.trim() == actions::PERFORMANCE => {
            Some((ActivityCategory::System, actions::PERFORMANCE))
        }
        _ => None,
    }
}

/// `POST /api/activity`: record a client-side event.
pub async fn record_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ClientEventBody>,
) -> Result<StatusCode, StatusCode> {
    let (category, action) = accept_client_event(&body.category, &body.action).ok_or(StatusCode::BAD_REQUEST)?;
    let details = if body.details.is_null() { serde_json::json!({}) } else { body.details };
    activity::log_user_action(&state.pool, &auth.actor(), category, action, details).await;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SystemQuery {
    limit: Option<i64>,
}

/// `GET /api/activity/system?limit=`: all users' entries; admins only.
pub async fn system_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SystemQuery>,
) -> Result<Json<Vec<ActivityEntry>>, StatusCode> {
    if !state.is_admin(auth.user.email.as_deref()) {
        return Err(StatusCode::FORBIDDEN);
    }
    let limit = activity::clamp_limit(query.limit, DEFAULT_SYSTEM_LOG_LIMIT);
    let logs = activity::get_system_activity_logs(&state.pool, limit)
        .await
        .map_err(|e| read_failed(&e))?;
    Ok(Json(logs.into_iter().map(ActivityEntry::from).collect()))
}

#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;
