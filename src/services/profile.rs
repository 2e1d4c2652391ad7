//! Profile service: account details and preferences.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::activity::{self, ActivityCategory, Actor, actions};
use crate::services::analytics::{self, Summary};
use crate::services::transaction::{self, TransactionError};

pub const MAX_NAME_CHARS: usize = 80;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {} characters", MAX_NAME_CHARS)]
    NameTooLong,
    #[error("unknown theme: {0}")]
    InvalidTheme(String),
    #[error("no fields to update")]
    EmptyPatch,
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Transactions(#[from] TransactionError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// A user row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub theme: String,
    #[serde(rename = "member_since", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Profile page payload.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserRecord,
    #[serde(flatten)]
    pub stats: Summary,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfilePatch {
    pub name: Option<String>,
    pub theme: Option<Theme>,
}

impl ProfilePatch {
    /// # Errors
    ///
    /// Returns `EmptyPatch`, `EmptyName`, `NameTooLong`, or `InvalidTheme`.
    pub fn validate(&self) -> Result<ValidProfilePatch, ProfileError> {
        if self.name.is_none() && self.theme.is_none() {
            return Err(ProfileError::EmptyPatch);
        }

        let name = match self.name.as_deref().map(str::trim) {
            Some("") => return Err(ProfileError::EmptyName),
            Some(n) if n.chars().count() > MAX_NAME_CHARS => return Err(ProfileError::NameTooLong),
            other => other.map(str::to_owned),
        };

        let theme = match self.theme.as_deref() {
            Some(raw) => Some(Theme::parse(raw).ok_or_else(|| ProfileError::InvalidTheme(raw.to_owned()))?),
            None => None,
        };

        Ok(ValidProfilePatch { name, theme })
    }

    #[must_use]
    pub fn updated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.theme.is_some() {
            fields.push("theme");
        }
        fields
    }
}

// =============================================================================
// QUERIES
// =============================================================================

fn from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        avatar_url: row.get("avatar_url"),
        theme: row.get("theme"),
        created_at: row.get("created_at"),
    }
}

/// # Errors
///
/// Returns `NotFound` when the user row is missing.
pub async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<UserRecord, ProfileError> {
    let row = sqlx::query("SELECT id, name, email, avatar_url, theme, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ProfileError::NotFound(user_id))?;
    Ok(from_row(&row))
}

/// Account details plus lifetime totals.
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn get_profile(pool: &PgPool, actor: &Actor) -> Result<Profile, ProfileError> {
    let user = fetch_user(pool, actor.user_id).await?;
    let txs = transaction::list_transactions(pool, actor.user_id).await?;
    let stats = analytics::summarize(&txs);

    activity::log_user_action(pool, actor, ActivityCategory::Profile, actions::VIEW_PROFILE, json!({})).await;
    Ok(Profile { user, stats })
}

/// Update display name and/or theme.
///
/// # Errors
///
/// Returns a validation error, `NotFound`, or a database error.
pub async fn update_profile(pool: &PgPool, actor: &Actor, patch: &ProfilePatch) -> Result<UserRecord, ProfileError> {
    let valid = patch.validate()?;
    let previous = fetch_user(pool, actor.user_id).await?;

    let row = sqlx::query(
        r"UPDATE users
          SET name = COALESCE($2, name), theme = COALESCE($3, theme)
          WHERE id = $1
          RETURNING id, name, email, avatar_url, theme, created_at",
    )
    .bind(actor.user_id)
    .bind(&valid.name)
    .bind(valid.theme.map(Theme::as_str))
    .fetch_optional(pool)
    .await?
    .ok_or(ProfileError::NotFound(actor.user_id))?;
    let updated = from_row(&row);

    activity::log_user_action(
        pool,
        actor,
        ActivityCategory::Profile,
        actions::UPDATE_PROFILE,
        json!({ "updated_fields": patch.updated_fields() }),
    )
    .await;

    if let Some(theme) = valid.theme.filter(|t| t.as_str() != previous.theme) {
        activity::log_user_action(
            pool,
            actor,
            ActivityCategory::Profile,
            actions::CHANGE_THEME,
            json!({ "previous_theme": previous.theme, "new_theme": theme }),
        )
        .await;
    }

    Ok(updated)
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
