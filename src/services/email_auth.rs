//! Email sign-in codes.
//!
//! A request replaces any pending code for the address with a fresh
//! six-character code. Only its SHA-256 is stored. Verification consumes the
//! newest pending code on a match and counts a failed attempt otherwise; the
//! fifth failure burns the code.

use rand::Rng;
use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::session::bytes_to_hex;

const CODE_LEN: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_FAILED_ATTEMPTS: i32 = 5;
const EMAIL_CODE_TEMPLATE: &str = include_str!("../../templates/email_code.html");
const EMAIL_SUBJECT: &str = "Your Pocketbook sign-in code";

/// The code a verification attempt is checked against; `$1` is the email.
const NEWEST_PENDING_CODE: &str = "SELECT id FROM email_login_codes
     WHERE email = $1 AND consumed_at IS NULL AND expires_at > now()
     ORDER BY created_at DESC
     LIMIT 1";

#[derive(Debug, thiserror::Error)]
pub enum EmailAuthError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid code")]
    InvalidCode,
    #[error("expired or incorrect code")]
    VerificationFailed,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("email delivery failed: {0}")]
    EmailDelivery(String),
}

// =============================================================================
// DELIVERY CONFIG
// =============================================================================

/// Resend credentials. Absent config means codes are only traced.
#[derive(Debug, Clone)]
pub struct EmailDelivery {
    pub api_key: String,
    pub from: String,
}

impl EmailDelivery {
    /// Load from `RESEND_API_KEY` and `RESEND_FROM`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RESEND_API_KEY").ok().filter(|v| !v.trim().is_empty())?;
        let from = std::env::var("RESEND_FROM").ok().filter(|v| !v.trim().is_empty())?;
        Some(Self { api_key, from })
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    if normalized.chars().any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '"')) {
        return None;
    }
    Some(normalized)
}

#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let normalized = code.trim().to_ascii_uppercase();
    let valid = normalized.len() == CODE_LEN && normalized.bytes().all(|b| CODE_ALPHABET.contains(&b));
    valid.then_some(normalized)
}

#[must_use]
pub fn generate_access_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[must_use]
pub fn hash_access_code(code: &str) -> String {
    bytes_to_hex(&Sha256::digest(code.as_bytes()))
}

fn name_from_email(email: &str) -> &str {
    email.split('@').next().filter(|v| !v.trim().is_empty()).unwrap_or("User")
}

// =============================================================================
// REQUEST / VERIFY
// =============================================================================

/// Ensure a user exists for `email` and issue a new code. Returns the
/// normalized address and the plaintext code for delivery.
///
/// # Errors
///
/// Returns `InvalidEmail` or a database error.
pub async fn request_access_code(pool: &PgPool, email: &str) -> Result<(String, String), EmailAuthError> {
    let normalized = normalize_email(email).ok_or(EmailAuthError::InvalidEmail)?;

    sqlx::query(
        r"INSERT INTO users (email, name)
          VALUES ($1, $2)
          ON CONFLICT (email) DO NOTHING",
    )
    .bind(&normalized)
    .bind(name_from_email(&normalized))
    .execute(pool)
    .await?;

    sqlx::query("DELETE FROM email_login_codes WHERE email = $1 AND consumed_at IS NULL")
        .bind(&normalized)
        .execute(pool)
        .await?;

    let code = generate_access_code();
    sqlx::query("INSERT INTO email_login_codes (email, code_hash) VALUES ($1, $2)")
        .bind(&normalized)
        .bind(hash_access_code(&code))
        .execute(pool)
        .await?;

    Ok((normalized, code))
}

/// Consume a matching code and return the user it signs in.
///
/// # Errors
///
/// Returns `InvalidEmail`/`InvalidCode` for malformed input,
/// `VerificationFailed` for a wrong, expired, or burned code.
pub async fn verify_access_code(pool: &PgPool, email: &str, code: &str) -> Result<Uuid, EmailAuthError> {
    let normalized_email = normalize_email(email).ok_or(EmailAuthError::InvalidEmail)?;
    let normalized_code = normalize_code(code).ok_or(EmailAuthError::InvalidCode)?;

    let consumed = sqlx::query(&format!(
        "UPDATE email_login_codes SET consumed_at = now()
         WHERE id = ({NEWEST_PENDING_CODE}) AND code_hash = $2
         RETURNING id"
    ))
    .bind(&normalized_email)
    .bind(hash_access_code(&normalized_code))
    .fetch_optional(pool)
    .await?;

    if consumed.is_none() {
        sqlx::query(&format!(
            "UPDATE email_login_codes
             SET attempts = attempts + 1,
                 consumed_at = CASE WHEN attempts + 1 >= $2 THEN now() ELSE consumed_at END
             WHERE id = ({NEWEST_PENDING_CODE})"
        ))
        .bind(&normalized_email)
        .bind(MAX_FAILED_ATTEMPTS)
        .execute(pool)
        .await?;
        return Err(EmailAuthError::VerificationFailed);
    }

    sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&normalized_email)
        .fetch_optional(pool)
        .await?
        .ok_or(EmailAuthError::VerificationFailed)
}

// =============================================================================
// DELIVERY
// =============================================================================

/// Send the code, or trace it at `debug` when delivery is not configured.
///
/// # Errors
///
/// Returns `EmailDelivery` when Resend rejects the message.
pub async fn deliver_access_code(
    delivery: Option<&EmailDelivery>,
    to_email: &str,
    code: &str,
) -> Result<(), EmailAuthError> {
    let Some(delivery) = delivery else {
        tracing::debug!(email = %to_email, %code, "email delivery not configured; sign-in code");
        return Ok(());
    };

    let resend = Resend::new(&delivery.api_key);
    let html = render_email_code_template(to_email, code);
    let message = CreateEmailBaseOptions::new(&delivery.from, [to_email], EMAIL_SUBJECT).with_html(&html);
    resend
        .emails
        .send(message)
        .await
        .map_err(|e| EmailAuthError::EmailDelivery(e.to_string()))?;
    Ok(())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn render_email_code_template(email: &str, code: &str) -> String {
    EMAIL_CODE_TEMPLATE
        .replace("{{EMAIL}}", &escape_html(email))
        .replace("{{CODE}}", &escape_html(code))
}

#[cfg(test)]
#[path = "email_auth_test.rs"]
mod tests;
