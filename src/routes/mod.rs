//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every endpoint is a JSON API route under `/api`, except the Google OAuth
//! redirect pair under `/auth` and the `/healthz` health check. Authenticated
//! handlers take an [`auth::AuthUser`], which reads the session cookie or a
//! bearer token.

pub mod activity;
pub mod analytics;
pub mod auth;
pub mod notes;
pub mod profile;
pub mod settings;
pub mod transactions;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/google", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/email/request-code", post(auth::request_email_code))
        .route("/api/auth/email/verify-code", post(auth::verify_email_code))
        .route(
            "/api/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/api/transactions/stats", get(transactions::stats))
        .route(
            "/api/transactions/{id}",
            get(transactions::get_transaction)
                .patch(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route("/api/categories", get(transactions::list_categories))
        .route("/api/analytics", get(analytics::analytics_report))
        .route("/api/analytics/trend", get(analytics::trend))
        .route("/api/dashboard", get(analytics::dashboard))
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route("/api/notes/categories", get(notes::list_note_categories))
        .route(
            "/api/notes/{id}",
            get(notes::get_note).patch(notes::update_note).delete(notes::delete_note),
        )
        .route("/api/activity", get(activity::list_activity).post(activity::record_event))
        .route("/api/activity/system", get(activity::system_activity))
        .route("/api/profile", get(profile::get_profile).patch(profile::update_profile))
        .route("/api/settings/export", get(settings::export_data))
        .route("/api/settings/import", post(settings::import_data))
        .route("/api/settings/data", delete(settings::delete_data))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
