//! Analytics and dashboard routes.
//!
//! Each handler loads the caller's full transaction list once and reduces it
//! in memory through `services::analytics`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::routes::auth::AuthUser;
use crate::routes::transactions::transaction_error_to_status;
use crate::services::analytics::{self, AnalyticsReport, Dashboard, MonthlyPoint};
use crate::services::transaction::{self, TransactionFilter, TransactionRow};
use crate::state::AppState;

async fn load_transactions(state: &AppState, auth: &AuthUser) -> Result<Vec<TransactionRow>, StatusCode> {
    transaction::get_user_transactions(&state.pool, &auth.actor(), &TransactionFilter::default())
        .await
        .map_err(|e| transaction_error_to_status(&e))
}

/// `GET /api/analytics`: summary plus income and expense breakdowns.
pub async fn analytics_report(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AnalyticsReport>, StatusCode> {
    let txs = load_transactions(&state, &auth).await?;
    Ok(Json(analytics::report(&txs)))
}

#[derive(Deserialize)]
pub struct TrendQuery {
    months: Option<u32>,
}

#[derive(Serialize)]
pub struct TrendResponse {
    pub months: u32,
    pub is_empty: bool,
    pub points: Vec<MonthlyPoint>,
}

/// Accept only the offered trend windows; default to six months.
pub(crate) fn parse_trend_months(months: Option<u32>) -> Result<u32, StatusCode> {
    let months = months.unwrap_or(analytics::DEFAULT_TREND_MONTHS);
    if analytics::TREND_PERIODS.contains(&months) { Ok(months) } else { Err(StatusCode::BAD_REQUEST) }
}

/// `GET /api/analytics/trend?months=`: monthly income/expense totals.
pub async fn trend(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TrendQuery>,
) -> Result<Json<TrendResponse>, StatusCode> {
    let months = parse_trend_months(query.months)?;
    let txs = load_transactions(&state, &auth).await?;
    let points = analytics::monthly_trend(&txs, OffsetDateTime::now_utc().date(), months);
    Ok(Json(TrendResponse { months, is_empty: analytics::trend_is_empty(&points), points }))
}

/// `GET /api/dashboard`: summary, expense breakdown, six-month trend, recent activity.
pub async fn dashboard(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Dashboard>, StatusCode> {
    let txs = load_transactions(&state, &auth).await?;
    Ok(Json(analytics::dashboard(&txs, OffsetDateTime::now_utc().date())))
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
