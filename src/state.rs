//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool plus optional integrations loaded from the
//! environment at startup. Missing integrations disable their routes
//! (503) instead of failing boot.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::PgPool;

use crate::rate_limit::RateLimiter;
use crate::services::auth::GoogleConfig;
use crate::services::email_auth::EmailDelivery;

/// Shared application state. Clone is required by Axum; inner fields are
/// cheap to clone or Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when Google sign-in is not configured.
    pub google: Option<GoogleConfig>,
    /// `None` when sign-in codes are only traced, not mailed.
    pub email: Option<EmailDelivery>,
    /// Limits sign-in code requests.
    pub rate_limiter: RateLimiter,
    /// Lowercased addresses allowed to read system-wide activity.
    pub admin_emails: Arc<HashSet<String>>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, google: Option<GoogleConfig>, email: Option<EmailDelivery>) -> Self {
        let admin_emails = std::env::var("ADMIN_EMAILS").map(|raw| parse_admin_emails(&raw)).unwrap_or_default();
        Self { pool, google, email, rate_limiter: RateLimiter::new(), admin_emails: Arc::new(admin_emails) }
    }

    #[must_use]
    pub fn is_admin(&self, email: Option<&str>) -> bool {
        email.is_some_and(|e| self.admin_emails.contains(&e.trim().to_ascii_lowercase()))
    }
}

/// Parse a comma-separated address list, lowercased, blanks dropped.
#[must_use]
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|e| e.trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
