//! Auth routes for Google OAuth, email codes, and sessions.

use axum::extract::{FromRef, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::services::activity::{self, ActivityCategory, Actor, ClientMeta, actions};
use crate::services::email_auth::{self, EmailAuthError};
use crate::services::{auth as auth_svc, session};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|raw| parse_bool(&raw))
}

pub(crate) fn cookie_secure() -> bool {
    if let Some(value) = env_bool("COOKIE_SECURE") {
        return value;
    }

    std::env::var("GOOGLE_REDIRECT_URI")
        .map(|uri| uri.starts_with("https://"))
        .unwrap_or(false)
}

fn build_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .max_age(max_age)
        .build()
}

pub(crate) fn session_cookie(token: String) -> Cookie<'static> {
    build_cookie(COOKIE_NAME, token, session::SESSION_TTL)
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    build_cookie(name, String::new(), Duration::ZERO)
}

// =============================================================================
// REQUEST METADATA
// =============================================================================

/// Token from an `Authorization: Bearer` header, if present.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// User agent and client IP (first `X-Forwarded-For` hop, then `X-Real-IP`).
pub(crate) fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);

    let ip_address = header_str("x-forwarded-for")
        .and_then(|raw| raw.split(',').next())
        .map(str::trim)
        .or_else(|| header_str("x-real-ip"))
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned);

    ClientMeta {
        user_agent: header_str(header::USER_AGENT.as_str()).filter(|ua| !ua.is_empty()).map(str::to_owned),
        ip_address,
    }
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie or bearer token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
    pub client: ClientMeta,
}

impl AuthUser {
    /// The acting user for activity logging.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::new(self.user.id, self.client.clone())
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(COOKIE_NAME)
            .map(Cookie::value)
            .filter(|t| !t.is_empty())
            .or_else(|| bearer_token(&parts.headers))
            .ok_or(StatusCode::UNAUTHORIZED)?
            .to_owned();

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user, token, client: client_meta(&parts.headers) })
    }
}

// =============================================================================
// GOOGLE OAUTH
// =============================================================================

/// `GET /auth/google`: redirect to Google's consent page.
pub async fn google_redirect(State(state): State<AppState>) -> Response {
    let Some(config) = &state.google else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Google sign-in not configured").into_response();
    };

    let oauth_state = session::generate_token();
    let jar = CookieJar::new().add(build_cookie(OAUTH_STATE_COOKIE_NAME, oauth_state.clone(), Duration::minutes(10)));
    (jar, Redirect::temporary(&config.authorize_url(&oauth_state))).into_response()
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn google_login_failed(state: &AppState, client: &ClientMeta, status: StatusCode, error: &str) -> Response {
    activity::log_anonymous_action(
        &state.pool,
        client,
        ActivityCategory::Auth,
        actions::LOGIN_FAILED,
        json!({ "method": "google", "error": error }),
    )
    .await;
    (status, error.to_owned()).into_response()
}

/// `GET /auth/google/callback`: exchange code, upsert user, set cookie, redirect to `/`.
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(config) = state.google.clone() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Google sign-in not configured").into_response();
    };
    let client = client_meta(&headers);

    if let Some(error) = params.error.as_deref() {
        return google_login_failed(&state, &client, StatusCode::UNAUTHORIZED, &format!("consent denied: {error}"))
            .await;
    }
    let Some(code) = params.code.as_deref() else {
        return google_login_failed(&state, &client, StatusCode::BAD_REQUEST, "missing authorization code").await;
    };

    // Verify OAuth CSRF state from cookie.
    let Some(callback_state) = params.state.as_deref() else {
        return google_login_failed(&state, &client, StatusCode::BAD_REQUEST, "missing oauth state").await;
    };
    let expected_state = jar.get(OAUTH_STATE_COOKIE_NAME).map(Cookie::value).unwrap_or_default();
    if expected_state.is_empty() || expected_state != callback_state {
        return google_login_failed(&state, &client, StatusCode::UNAUTHORIZED, "invalid oauth state").await;
    }

    let access_token = match auth_svc::exchange_code(&config, code).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "oauth code exchange failed");
            return google_login_failed(&state, &client, StatusCode::BAD_GATEWAY, "OAuth code exchange failed").await;
        }
    };

    let google_user = match auth_svc::fetch_google_user(&access_token).await {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(error = %e, "google profile fetch failed");
            return google_login_failed(&state, &client, StatusCode::BAD_GATEWAY, "Failed to fetch Google profile")
                .await;
        }
    };

    let upserted = match auth_svc::upsert_user(&state.pool, &google_user).await {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(error = %e, "user upsert failed");
            return google_login_failed(&state, &client, StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
                .await;
        }
    };

    let token = match session::create_session(&state.pool, upserted.id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response();
        }
    };

    activity::log_user_action(
        &state.pool,
        &Actor::new(upserted.id, client),
        ActivityCategory::Auth,
        actions::LOGIN,
        json!({
            "method": "google",
            "email": google_user.email,
            "name": google_user.display_name(),
            "is_new_user": upserted.is_new,
        }),
    )
    .await;
    tracing::info!(user_id = %upserted.id, is_new = upserted.is_new, "google sign-in");

    let jar = jar.add(session_cookie(token)).add(expired_cookie(OAUTH_STATE_COOKIE_NAME));
    (jar, Redirect::temporary("/")).into_response()
}

// =============================================================================
// SESSION
// =============================================================================

/// `GET /api/auth/me`: return current user.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Json<session::SessionUser> {
    activity::log_user_action(
        &state.pool,
        &auth.actor(),
        ActivityCategory::Auth,
        actions::SESSION_RESTORED,
        json!({ "auth_method": auth.user.auth_method }),
    )
    .await;
    Json(auth.user)
}

/// `POST /api/auth/logout`: delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let started_at = match session::delete_session(&state.pool, &auth.token).await {
        Ok(started_at) => started_at,
        Err(e) => {
            tracing::warn!(error = %e, "session delete failed");
            None
        }
    };
    let duration = started_at.map(|start| session::session_duration_secs(start, OffsetDateTime::now_utc()));

    activity::log_user_action(
        &state.pool,
        &auth.actor(),
        ActivityCategory::Auth,
        actions::LOGOUT,
        json!({ "email": auth.user.email, "session_duration_secs": duration }),
    )
    .await;

    let jar = CookieJar::new().add(expired_cookie(COOKIE_NAME));
    (jar, StatusCode::NO_CONTENT)
}

// =============================================================================
// EMAIL CODES
// =============================================================================

pub(crate) fn email_auth_error_to_status(err: &EmailAuthError) -> StatusCode {
    match err {
        EmailAuthError::InvalidEmail | EmailAuthError::InvalidCode => StatusCode::BAD_REQUEST,
        EmailAuthError::VerificationFailed => StatusCode::UNAUTHORIZED,
        EmailAuthError::EmailDelivery(_) => StatusCode::BAD_GATEWAY,
        EmailAuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Deserialize)]
pub struct RequestCodeBody {
    email: String,
}

/// `POST /api/auth/email/request-code`: issue and deliver a sign-in code.
pub async fn request_email_code(
    State(state): State<AppState>,
    Json(body): Json<RequestCodeBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let email = email_auth::normalize_email(&body.email).ok_or(StatusCode::BAD_REQUEST)?;

    if let Err(e) = state.rate_limiter.check_and_record(&email) {
        tracing::warn!(error = %e, "sign-in code rate limited");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    let (email, code) = email_auth::request_access_code(&state.pool, &email).await.map_err(|e| {
        tracing::error!(error = %e, "sign-in code request failed");
        email_auth_error_to_status(&e)
    })?;

    email_auth::deliver_access_code(state.email.as_ref(), &email, &code)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sign-in code delivery failed");
            email_auth_error_to_status(&e)
        })?;

    Ok(Json(json!({ "sent": true })))
}

#[derive(Deserialize)]
pub struct VerifyCodeBody {
    email: String,
    code: String,
}

/// `POST /api/auth/email/verify-code`: consume a code, set the session cookie.
pub async fn verify_email_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<VerifyCodeBody>,
) -> Response {
    let client = client_meta(&headers);

    let user_id = match email_auth::verify_access_code(&state.pool, &body.email, &body.code).await {
        Ok(id) => id,
        Err(e) => {
            activity::log_anonymous_action(
                &state.pool,
                &client,
                ActivityCategory::Auth,
                actions::LOGIN_FAILED,
                json!({ "method": "email", "email": body.email.trim(), "error": e.to_string() }),
            )
            .await;
            return email_auth_error_to_status(&e).into_response();
        }
    };

    let (token, user) = match session::create_session(&state.pool, user_id).await {
        Ok(token) => match session::validate_session(&state.pool, &token).await {
            Ok(Some(user)) => (token, user),
            Ok(None) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            Err(e) => {
                tracing::error!(error = %e, "session lookup failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    activity::log_user_action(
        &state.pool,
        &Actor::new(user_id, client),
        ActivityCategory::Auth,
        actions::LOGIN,
        json!({ "method": "email", "email": user.email, "name": user.name }),
    )
    .await;

    (jar.add(session_cookie(token)), Json(user)).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
