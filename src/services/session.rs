//! Server-side sessions.
//!
//! ARCHITECTURE
//! ============
//! A session is an opaque random token mapped to a user row. Browsers carry
//! it as an HttpOnly cookie and scripts as a bearer token; both resolve
//! through [`validate_session`]. Expiry is checked in the lookup query, and a
//! user's expired rows are pruned whenever they sign in again.

use std::fmt::Write;

use rand::Rng;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Lifetime of a session row and of the cookie that carries it.
pub const SESSION_TTL: Duration = Duration::days(30);

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// 32 random bytes as 64 lowercase hex characters.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// The signed-in user as returned by `GET /api/auth/me`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    /// `"dark"` or `"light"`.
    pub theme: String,
    /// `"google"` when a Google identity is linked, otherwise `"email"`.
    pub auth_method: &'static str,
}

#[must_use]
pub fn auth_method(google_linked: bool) -> &'static str {
    if google_linked { "google" } else { "email" }
}

type SessionUserTuple = (Uuid, String, Option<String>, Option<String>, String, bool);

/// Start a session for `user_id`, returning its token.
///
/// # Errors
///
/// Returns a database error if the prune or insert fails.
pub async fn create_session(pool: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= now()")
        .bind(user_id)
        .execute(pool)
        .await?;

    let token = generate_token();
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(user_id)
        .bind(OffsetDateTime::now_utc() + SESSION_TTL)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Resolve an unexpired session token to its user.
///
/// # Errors
///
/// Returns a database error if the lookup fails.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<SessionUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, SessionUserTuple>(
        r"SELECT u.id, u.name, u.email, u.avatar_url, u.theme, u.google_id IS NOT NULL
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, email, avatar_url, theme, google_linked)| SessionUser {
        id,
        name,
        email,
        avatar_url,
        theme,
        auth_method: auth_method(google_linked),
    }))
}

/// End a session. Returns when it started, or `None` if the token was unknown.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<Option<OffsetDateTime>, sqlx::Error> {
    sqlx::query_scalar("DELETE FROM sessions WHERE token = $1 RETURNING created_at")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Whole seconds between `started_at` and `now`, clamped at zero.
#[must_use]
pub fn session_duration_secs(started_at: OffsetDateTime, now: OffsetDateTime) -> i64 {
    (now - started_at).whole_seconds().max(0)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
