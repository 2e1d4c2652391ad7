//! Profile routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use crate::routes::auth::AuthUser;
use crate::routes::transactions::transaction_error_to_status;
use crate::services::profile::{self, Profile, ProfileError, ProfilePatch, UserRecord};
use crate::state::AppState;

pub(crate) fn profile_error_to_status(err: &ProfileError) -> StatusCode {
    match err {
        ProfileError::EmptyName
        | ProfileError::NameTooLong
        | ProfileError::InvalidTheme(_)
        | ProfileError::EmptyPatch => StatusCode::BAD_REQUEST,
        ProfileError::NotFound(_) => StatusCode::NOT_FOUND,
        ProfileError::Transactions(e) => transaction_error_to_status(e),
        ProfileError::Database(e) => {
            tracing::error!(error = %e, "profile query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /api/profile`: user record plus lifetime stats.
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Profile>, StatusCode> {
    profile::get_profile(&state.pool, &auth.actor())
        .await
        .map(Json)
        .map_err(|e| profile_error_to_status(&e))
}

/// `PATCH /api/profile`: change name and/or theme.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfilePatch>,
) -> Result<Json<UserRecord>, StatusCode> {
    profile::update_profile(&state.pool, &auth.actor(), &body)
        .await
        .map(Json)
        .map_err(|e| profile_error_to_status(&e))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
