//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and SQL so route handlers can stay
//! focused on protocol translation and auth plumbing. Every user-facing
//! operation records its outcome through `activity`.

pub mod activity;
pub mod analytics;
pub mod auth;
pub mod email_auth;
pub mod note;
pub mod profile;
pub mod session;
pub mod transaction;
pub mod transfer;
