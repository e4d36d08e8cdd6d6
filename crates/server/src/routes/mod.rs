//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//!
//! # Auth
//! GET    /auth/login              - Provider login link (303, no state change)
//! POST   /auth/login              - Start login (303)
//! POST   /auth/logout             - Logout (303)
//!
//! # Session
//! GET    /api/session             - Session status + capabilities
//! POST   /api/session/refresh     - Re-validate identity
//! GET    /api/mock-users          - Mock directory (mock strategy only)
//! PUT    /api/mock-user           - Select mock user (mock strategy only)
//!
//! # Admin overlays
//! GET    /api/flags               - Flags + capabilities
//! PUT    /api/flags/{flag}        - Update one flag (admins only)
//! POST   /api/admin-view/toggle   - Flip "view as user" (admins only)
//!
//! # Welcome
//! GET    /api/welcome             - First-visit check (read-only)
//! POST   /api/welcome             - First-visit check (marks seen)
//! DELETE /api/welcome             - Reset the marker (requires auth)
//! ```

pub mod api;
pub mod auth;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(api::session::show))
        .route("/session/refresh", post(api::session::refresh))
        .route("/mock-users", get(api::session::mock_users))
        .route("/mock-user", put(api::session::select_mock_user))
        .route("/flags", get(api::flags::show))
        .route("/flags/{flag}", put(api::flags::update))
        .route("/admin-view/toggle", post(api::flags::toggle_admin_view))
        .route(
            "/welcome",
            get(api::welcome::show)
                .post(api::welcome::check)
                .delete(api::welcome::reset),
        )
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
