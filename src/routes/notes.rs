//! Note routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::catalog::{self, NoteCategoryInfo};
use crate::routes::auth::AuthUser;
use crate::services::note::{self, NewNote, NoteError, NoteFilter, NotePatch, NoteRow};
use crate::state::AppState;

pub(crate) fn note_error_to_status(err: &NoteError) -> StatusCode {
    match err {
        NoteError::EmptyTitle
        | NoteError::EmptyContent
        | NoteError::EmptyPatch
        | NoteError::UnknownCategoryFilter(_) => StatusCode::BAD_REQUEST,
        NoteError::NotFound(_) => StatusCode::NOT_FOUND,
        NoteError::Database(e) => {
            tracing::error!(error = %e, "note query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /api/notes?category=&search=`: most recently updated first.
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<NoteFilter>,
) -> Result<Json<Vec<NoteRow>>, StatusCode> {
    note::get_user_notes(&state.pool, &auth.actor(), &filter)
        .await
        .map(Json)
        .map_err(|e| note_error_to_status(&e))
}

/// `POST /api/notes`
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewNote>,
) -> Result<(StatusCode, Json<NoteRow>), StatusCode> {
    let row = note::add_note(&state.pool, &auth.actor(), &body)
        .await
        .map_err(|e| note_error_to_status(&e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/notes/{id}`
pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteRow>, StatusCode> {
    note::get_note(&state.pool, auth.user.id, id)
        .await
        .map(Json)
        .map_err(|e| note_error_to_status(&e))
}

/// `PATCH /api/notes/{id}`
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NotePatch>,
) -> Result<Json<NoteRow>, StatusCode> {
    note::update_note(&state.pool, &auth.actor(), id, &body)
        .await
        .map(Json)
        .map_err(|e| note_error_to_status(&e))
}

/// `DELETE /api/notes/{id}`
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    note::delete_note(&state.pool, &auth.actor(), id)
        .await
        .map_err(|e| note_error_to_status(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/notes/categories`
pub async fn list_note_categories() -> Json<Vec<NoteCategoryInfo>> {
    Json(catalog::note_categories())
}

#[cfg(test)]
#[path = "notes_test.rs"]
mod tests;
