//! Login and logout.
//!
//! All answer with `303 See Other`: back to the portal root when the browser
//! only needs to reload, or to the identity provider. Only `POST` changes
//! session state.

use axum::{extract::State, response::Redirect};

use crate::error::{Result, clear_sentry_user};
use crate::middleware::PortalSession;
use crate::services::{AuthBackend, AuthStrategy, Navigation};
use crate::state::AppState;

fn navigate(navigation: &Navigation) -> Redirect {
    match navigation {
        Navigation::Reload => Redirect::to("/"),
        Navigation::Redirect(url) => Redirect::to(url.as_str()),
    }
}

/// Login link target.
///
/// Sends the browser to the identity provider. The demo login needs a
/// `POST`, so under the mock strategy this only goes back to the root.
pub async fn login_page(State(state): State<AppState>) -> Redirect {
    match state.auth().as_ref() {
        AuthStrategy::Provider(provider) => Redirect::to(provider.authorization_url().as_str()),
        AuthStrategy::Mock(_) => Redirect::to("/"),
    }
}

/// Start a login.
///
/// # Errors
///
/// Returns `AppError` if the login cannot be recorded.
pub async fn login(PortalSession(mut pipeline): PortalSession) -> Result<Redirect> {
    let navigation = pipeline.resolver.login().await?;
    tracing::info!(backend = pipeline.resolver.backend().name(), "Login started");
    Ok(navigate(&navigation))
}

/// End the session.
///
/// # Errors
///
/// Returns `AppError` if the session cannot be cleared.
pub async fn logout(PortalSession(mut pipeline): PortalSession) -> Result<Redirect> {
    let user_id = pipeline.status().identity().map(|i| i.id.clone());
    let navigation = pipeline.resolver.logout().await?;
    clear_sentry_user();
    tracing::info!(user_id = user_id.as_ref().map(tracing::field::display), "Logged out");
    Ok(navigate(&navigation))
}
