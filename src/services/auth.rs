//! Google OAuth service: code exchange and user upsert.

use reqwest::Url;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";

/// Google OAuth configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl GoogleConfig {
    /// Load from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`.
    /// Returns `None` if any are missing (Google sign-in will be disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GoogleConfig::from_env`] over an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            client_id: non_empty("GOOGLE_CLIENT_ID")?,
            client_secret: non_empty("GOOGLE_CLIENT_SECRET")?,
            redirect_uri: non_empty("GOOGLE_REDIRECT_URI")?,
        })
    }

    /// Build the Google consent URL carrying the CSRF `state`.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SCOPES),
            ("state", state),
            ("prompt", "select_account"),
        ];
        match Url::parse_with_params(AUTHORIZE_ENDPOINT, params) {
            Ok(url) => url.into(),
            Err(_) => AUTHORIZE_ENDPOINT.to_owned(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Subset of the OpenID Connect userinfo document.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GoogleUser {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleUser {
    /// Email only when Google vouches for it.
    #[must_use]
    pub fn verified_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .filter(|_| self.email_verified)
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
            .to_owned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("google token exchange failed: {0}")]
    TokenExchange(String),
    #[error("google api error: {0}")]
    GoogleApi(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Result of signing a Google user in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertedUser {
    pub id: Uuid,
    pub is_new: bool,
}

/// Exchange an OAuth code for an access token.
///
/// # Errors
///
/// Returns `TokenExchange` on transport failure or an unexpected response.
pub async fn exchange_code(config: &GoogleConfig, code: &str) -> Result<String, AuthError> {
    let client = reqwest::Client::new();
    let resp = client
        .post(TOKEN_ENDPOINT)
        .header("Accept", "application/json")
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let body = resp
        .text()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
    let token_resp: TokenResponse =
        serde_json::from_str(&body).map_err(|_| AuthError::TokenExchange(format!("unexpected response: {body}")))?;
    Ok(token_resp.access_token)
}

/// Fetch the signed-in Google user's profile.
///
/// # Errors
///
/// Returns `GoogleApi` on transport failure or a non-success status.
pub async fn fetch_google_user(access_token: &str) -> Result<GoogleUser, AuthError> {
    let client = reqwest::Client::new();
    let resp = client
        .get(USERINFO_ENDPOINT)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AuthError::GoogleApi(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(AuthError::GoogleApi(format!("{status}: {body}")));
    }

    resp.json::<GoogleUser>()
        .await
        .map_err(|e| AuthError::GoogleApi(e.to_string()))
}

/// Upsert a user from their Google profile.
///
/// An existing email-only account with the same verified address is linked
/// to the Google identity instead of creating a second user.
///
/// # Errors
///
/// Returns a database error if either statement fails.
pub async fn upsert_user(pool: &PgPool, google: &GoogleUser) -> Result<UpsertedUser, AuthError> {
    let email = google.verified_email();

    if let Some(email) = &email {
        sqlx::query("UPDATE users SET google_id = $1 WHERE email = $2 AND google_id IS NULL")
            .bind(&google.sub)
            .bind(email)
            .execute(pool)
            .await?;
    }

    let row = sqlx::query(
        r"INSERT INTO users (google_id, email, name, avatar_url)
          VALUES ($1, $2, $3, $4)
          ON CONFLICT (google_id) DO UPDATE
              SET avatar_url = EXCLUDED.avatar_url,
                  email = COALESCE(users.email, EXCLUDED.email)
          RETURNING id, (xmax = 0) AS inserted",
    )
    .bind(&google.sub)
    .bind(&email)
    .bind(google.display_name())
    .bind(&google.picture)
    .fetch_one(pool)
    .await?;

    Ok(UpsertedUser { id: row.get("id"), is_new: row.get("inserted") })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
