//! Settings routes: export, import, and bulk deletion of a user's data.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;
use time::OffsetDateTime;

use crate::routes::auth::AuthUser;
use crate::routes::notes::note_error_to_status;
use crate::routes::profile::profile_error_to_status;
use crate::routes::transactions::transaction_error_to_status;
use crate::services::transfer::{self, DeleteSummary, ImportSummary, TransferError};
use crate::state::AppState;

pub(crate) fn transfer_error_to_status(err: &TransferError) -> StatusCode {
    match err {
        TransferError::MissingTransactions => StatusCode::BAD_REQUEST,
        TransferError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        TransferError::Profile(e) => profile_error_to_status(e),
        TransferError::Transactions(e) => transaction_error_to_status(e),
        TransferError::Notes(e) => note_error_to_status(e),
    }
}

/// `GET /api/settings/export`: the full data document as a download.
pub async fn export_data(State(state): State<AppState>, auth: AuthUser) -> Result<Response, StatusCode> {
    let doc = transfer::export_user_data(&state.pool, &auth.actor())
        .await
        .map_err(|e| transfer_error_to_status(&e))?;
    let body = serde_json::to_string_pretty(&doc).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let filename = transfer::export_filename(OffsetDateTime::now_utc().date());

    Ok((
        [
            (CONTENT_TYPE, "application/json; charset=utf-8"),
            (CONTENT_DISPOSITION, &format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response())
}

/// `POST /api/settings/import`: add records from a previously exported document.
pub async fn import_data(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(doc): Json<Value>,
) -> Result<Json<ImportSummary>, StatusCode> {
    transfer::import_user_data(&state.pool, &auth.actor(), &doc)
        .await
        .map(Json)
        .map_err(|e| transfer_error_to_status(&e))
}

/// `DELETE /api/settings/data`: remove every transaction and note.
pub async fn delete_data(State(state): State<AppState>, auth: AuthUser) -> Result<Json<DeleteSummary>, StatusCode> {
    transfer::delete_user_data(&state.pool, &auth.actor())
        .await
        .map(Json)
        .map_err(|e| transfer_error_to_status(&e))
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
