//! Note service: free-form financial notes scoped to the owner.
//!
//! DESIGN
//! ======
//! Same shape as the transaction service: owner-scoped SQL, validation
//! before persistence, and activity logging of each outcome. Tags are
//! stored as a Postgres `TEXT[]` after normalization.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::NoteCategory;
use crate::services::activity::{self, ActivityCategory, Actor, actions};

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("content must not be empty")]
    EmptyContent,
    #[error("no fields to update")]
    EmptyPatch,
    #[error("unknown category filter: {0}")]
    UnknownCategoryFilter(String),
    #[error("note not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Tags as clients send them: a JSON list or a single comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl TagsInput {
    #[must_use]
    pub fn normalize(&self) -> Vec<String> {
        match self {
            Self::List(items) => normalize_tags(items.iter().map(String::as_str)),
            Self::Text(text) => normalize_tags(text.split(',')),
        }
    }
}

/// Trim, drop empties, and dedupe keeping the first occurrence.
#[must_use]
pub fn normalize_tags<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in raw.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|existing| existing == tag) {
            out.push(tag.to_owned());
        }
    }
    out
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: NoteCategory,
    #[serde(default)]
    pub tags: Option<TagsInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<NoteCategory>,
    pub tags: Option<TagsInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNote {
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub tags: Vec<String>,
}

fn validate_fields(title: &str, content: &str, category: NoteCategory, tags: Vec<String>) -> Result<ValidNote, NoteError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(NoteError::EmptyTitle);
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(NoteError::EmptyContent);
    }
    Ok(ValidNote { title: title.to_owned(), content: content.to_owned(), category, tags })
}

impl NewNote {
    /// # Errors
    ///
    /// Returns `EmptyTitle` or `EmptyContent`.
    pub fn validate(&self) -> Result<ValidNote, NoteError> {
        let tags = self.tags.as_ref().map(TagsInput::normalize).unwrap_or_default();
        validate_fields(&self.title, &self.content, self.category, tags)
    }
}

impl NotePatch {
    #[must_use]
    pub fn updated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.content.is_some() {
            fields.push("content");
        }
        if self.category.is_some() {
            fields.push("category");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        fields
    }

    /// Merge over `current` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPatch` when nothing is set, otherwise a validation error.
    pub fn apply(&self, current: &NoteRow) -> Result<ValidNote, NoteError> {
        if self.updated_fields().is_empty() {
            return Err(NoteError::EmptyPatch);
        }
        let tags = self.tags.as_ref().map_or_else(|| current.tags.clone(), TagsInput::normalize);
        validate_fields(
            self.title.as_deref().unwrap_or(&current.title),
            self.content.as_deref().unwrap_or(&current.content),
            self.category.unwrap_or(current.category),
            tags,
        )
    }
}

/// Notes page filter: category chip plus free-text search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteFilter {
    /// A note category id, or absent/`all`.
    pub category: Option<String>,
    pub search: Option<String>,
}

impl NoteFilter {
    /// The requested category; `None` for absent, blank, or `all`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategoryFilter` for any other value.
    pub fn category(&self) -> Result<Option<NoteCategory>, NoteError> {
        match self.category.as_deref().map(str::trim) {
            None | Some("" | "all") => Ok(None),
            Some(raw) => NoteCategory::parse(raw)
                .map(Some)
                .ok_or_else(|| NoteError::UnknownCategoryFilter(raw.to_owned())),
        }
    }

    #[must_use]
    pub fn matches(&self, note: &NoteRow) -> bool {
        if let Ok(Some(category)) = self.category() {
            if note.category != category {
                return false;
            }
        }

        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        note.title.to_lowercase().contains(&needle)
            || note.content.to_lowercase().contains(&needle)
            || note.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    #[must_use]
    pub fn apply(&self, notes: Vec<NoteRow>) -> Vec<NoteRow> {
        notes.into_iter().filter(|n| self.matches(n)).collect()
    }
}

// =============================================================================
// QUERIES
// =============================================================================

type NoteTuple = (Uuid, Uuid, String, String, String, Vec<String>, OffsetDateTime, OffsetDateTime);

const SELECT_COLUMNS: &str = "id, user_id, title, content, category, tags, created_at, updated_at";

fn from_tuple(row: NoteTuple) -> Result<NoteRow, NoteError> {
    let (id, user_id, title, content, category, tags, created_at, updated_at) = row;
    let category = NoteCategory::parse(&category)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid note category: {category}").into()))?;
    Ok(NoteRow { id, user_id, title, content, category, tags, created_at, updated_at })
}

/// Insert a validated note for `user_id` without activity logging.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn insert_note(executor: impl PgExecutor<'_>, user_id: Uuid, note: &ValidNote) -> Result<NoteRow, NoteError> {
    let row = sqlx::query_as::<_, NoteTuple>(&format!(
        "INSERT INTO notes (id, user_id, title, content, category, tags)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&note.title)
    .bind(&note.content)
    .bind(note.category.as_str())
    .bind(&note.tags)
    .fetch_one(executor)
    .await?;

    from_tuple(row)
}

/// All of a user's notes, most recently updated first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_notes(pool: &PgPool, user_id: Uuid) -> Result<Vec<NoteRow>, NoteError> {
    let rows = sqlx::query_as::<_, NoteTuple>(&format!(
        "SELECT {SELECT_COLUMNS} FROM notes WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(from_tuple).collect()
}

/// # Errors
///
/// Returns `NotFound` if the note does not exist or is not owned by `user_id`.
pub async fn get_note(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<NoteRow, NoteError> {
    let row = sqlx::query_as::<_, NoteTuple>(&format!(
        "SELECT {SELECT_COLUMNS} FROM notes WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(NoteError::NotFound(id))?;

    from_tuple(row)
}

/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_all_notes(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<u64, NoteError> {
    let result = sqlx::query("DELETE FROM notes WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// LOGGED OPERATIONS
// =============================================================================

async fn report_failure(pool: &PgPool, actor: &Actor, operation: &str, err: &NoteError, id: Option<Uuid>) {
    let extra = id.map_or_else(|| json!({}), |id| json!({ "note_id": id }));
    activity::log_error(pool, actor, operation, err, extra).await;
}

/// # Errors
///
/// Returns a validation or database error.
pub async fn add_note(pool: &PgPool, actor: &Actor, new: &NewNote) -> Result<NoteRow, NoteError> {
    let result = async {
        let valid = new.validate()?;
        insert_note(pool, actor.user_id, &valid).await
    }
    .await;

    match result {
        Ok(note) => {
            activity::log_user_action(
                pool,
                actor,
                ActivityCategory::Note,
                actions::CREATE_NOTE,
                json!({ "note_id": note.id, "title": note.title, "category": note.category }),
            )
            .await;
            Ok(note)
        }
        Err(e) => {
            report_failure(pool, actor, "add_note", &e, None).await;
            Err(e)
        }
    }
}

/// # Errors
///
/// Returns `UnknownCategoryFilter` or a database error.
pub async fn get_user_notes(pool: &PgPool, actor: &Actor, filter: &NoteFilter) -> Result<Vec<NoteRow>, NoteError> {
    let result = async {
        filter.category()?;
        list_notes(pool, actor.user_id).await
    }
    .await;

    match result {
        Ok(notes) => {
            let notes = filter.apply(notes);
            activity::log_user_action(
                pool,
                actor,
                ActivityCategory::Note,
                actions::VIEW_NOTES,
                json!({ "note_count": notes.len() }),
            )
            .await;
            Ok(notes)
        }
        Err(e) => {
            report_failure(pool, actor, "get_notes", &e, None).await;
            Err(e)
        }
    }
}

/// # Errors
///
/// Returns `NotFound`, `EmptyPatch`, a validation error, or a database error.
pub async fn update_note(pool: &PgPool, actor: &Actor, id: Uuid, patch: &NotePatch) -> Result<NoteRow, NoteError> {
    let result = async {
        let current = get_note(pool, actor.user_id, id).await?;
        let merged = patch.apply(&current)?;
        let row = sqlx::query_as::<_, NoteTuple>(&format!(
            "UPDATE notes
             SET title = $3, content = $4, category = $5, tags = $6, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .bind(actor.user_id)
        .bind(&merged.title)
        .bind(&merged.content)
        .bind(merged.category.as_str())
        .bind(&merged.tags)
        .fetch_optional(pool)
        .await?
        .ok_or(NoteError::NotFound(id))?;
        from_tuple(row)
    }
    .await;

    match result {
        Ok(note) => {
            activity::log_user_action(
                pool,
                actor,
                ActivityCategory::Note,
                actions::UPDATE_NOTE,
                json!({ "note_id": id, "updated_fields": patch.updated_fields() }),
            )
            .await;
            Ok(note)
        }
        Err(e) => {
            report_failure(pool, actor, "update_note", &e, Some(id)).await;
            Err(e)
        }
    }
}

/// # Errors
///
/// Returns `NotFound` if nothing was deleted, or a database error.
pub async fn delete_note(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), NoteError> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(actor.user_id)
        .execute(pool)
        .await
        .map_err(NoteError::from)
        .and_then(|r| if r.rows_affected() == 0 { Err(NoteError::NotFound(id)) } else { Ok(()) });

    match result {
        Ok(()) => {
            activity::log_user_action(pool, actor, ActivityCategory::Note, actions::DELETE_NOTE, json!({ "note_id": id }))
                .await;
            Ok(())
        }
        Err(e) => {
            report_failure(pool, actor, "delete_note", &e, Some(id)).await;
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "note_test.rs"]
mod tests;
