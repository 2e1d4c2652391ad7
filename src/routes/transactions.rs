//! Transaction and category routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::catalog::{self, Category, TransactionKind};
use crate::routes::auth::AuthUser;
use crate::services::analytics::{self, Summary};
use crate::services::transaction::{
    self, NewTransaction, TransactionError, TransactionFilter, TransactionPatch, TransactionRow,
};
use crate::state::AppState;

pub(crate) fn transaction_error_to_status(err: &TransactionError) -> StatusCode {
    match err {
        TransactionError::InvalidAmount
        | TransactionError::EmptyDescription
        | TransactionError::UnknownCategory(_)
        | TransactionError::CategoryKindMismatch { .. }
        | TransactionError::EmptyPatch
        | TransactionError::UnknownTypeFilter(_) => StatusCode::BAD_REQUEST,
        TransactionError::NotFound(_) => StatusCode::NOT_FOUND,
        TransactionError::Database(e) => {
            tracing::error!(error = %e, "transaction query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /api/transactions?type=&search=`: the caller's transactions, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<TransactionRow>>, StatusCode> {
    transaction::get_user_transactions(&state.pool, &auth.actor(), &filter)
        .await
        .map(Json)
        .map_err(|e| transaction_error_to_status(&e))
}

/// `POST /api/transactions`: create a transaction.
pub async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewTransaction>,
) -> Result<(StatusCode, Json<TransactionRow>), StatusCode> {
    let row = transaction::add_transaction(&state.pool, &auth.actor(), &body)
        .await
        .map_err(|e| transaction_error_to_status(&e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/transactions/{id}`
pub async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionRow>, StatusCode> {
    transaction::get_transaction(&state.pool, auth.user.id, id)
        .await
        .map(Json)
        .map_err(|e| transaction_error_to_status(&e))
}

/// `PATCH /api/transactions/{id}`: partial update.
pub async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<TransactionPatch>,
) -> Result<Json<TransactionRow>, StatusCode> {
    transaction::update_transaction(&state.pool, &auth.actor(), id, &body)
        .await
        .map(Json)
        .map_err(|e| transaction_error_to_status(&e))
}

/// `DELETE /api/transactions/{id}`
pub async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    transaction::delete_transaction(&state.pool, &auth.actor(), id)
        .await
        .map_err(|e| transaction_error_to_status(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/transactions/stats`: lifetime totals.
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Summary>, StatusCode> {
    analytics::get_user_stats(&state.pool, auth.user.id)
        .await
        .map(Json)
        .map_err(|e| transaction_error_to_status(&e))
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Categories for `type`, or all of them when absent or `all`.
pub(crate) fn select_categories(kind: Option<&str>) -> Result<Vec<Category>, StatusCode> {
    match kind.map(str::trim) {
        None | Some("" | "all") => Ok(catalog::all_categories().copied().collect()),
        Some(raw) => TransactionKind::parse(raw)
            .map(|k| catalog::categories_for(k).to_vec())
            .ok_or(StatusCode::BAD_REQUEST),
    }
}

/// `GET /api/categories?type=`: the category catalog.
pub async fn list_categories(Query(query): Query<CategoryQuery>) -> Result<Json<Vec<Category>>, StatusCode> {
    select_categories(query.kind.as_deref()).map(Json)
}

#[cfg(test)]
#[path = "transactions_test.rs"]
mod tests;
