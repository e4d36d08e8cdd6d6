//! HTTP tests of the portal API.
//!
//! Each test starts its own portal on an ephemeral port and drives it with a
//! cookie-keeping client that does not follow redirects, like a browser tab
//! whose navigations are inspected by hand.

use axum::http::StatusCode;
use reqwest::header::LOCATION;
use serde_json::{Value, json};

use ai_portal_integration_tests::{FakeProvider, TestPortal, claims, portal_config};

async fn mock_portal() -> TestPortal {
    let config = portal_config(&[]).expect("Valid configuration");
    TestPortal::start(config).await.expect("Portal should start")
}

async fn get_json(portal: &TestPortal, path: &str) -> Value {
    let resp = portal
        .client
        .get(portal.url(path))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK, "GET {path}");
    resp.json().await.expect("JSON body")
}

async fn post_json(portal: &TestPortal, path: &str) -> Value {
    let resp = portal
        .client
        .post(portal.url(path))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK, "POST {path}");
    resp.json().await.expect("JSON body")
}

/// Log the portal's client in through the demo flow.
async fn login(portal: &TestPortal) {
    let resp = portal
        .client
        .post(portal.url("/auth/login"))
        .send()
        .await
        .expect("Login request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/")
    );
}

async fn select_user(portal: &TestPortal, user_id: &str) -> reqwest::Response {
    portal
        .client
        .put(portal.url("/api/mock-user"))
        .json(&json!({ "userId": user_id }))
        .send()
        .await
        .expect("Select request failed")
}

async fn put_flag(portal: &TestPortal, flag: &str, value: bool) -> reqwest::Response {
    portal
        .client
        .put(portal.url(&format!("/api/flags/{flag}")))
        .json(&json!({ "value": value }))
        .send()
        .await
        .expect("Flag request failed")
}

// ============================================================================
// Basics
// ============================================================================

#[tokio::test]
async fn test_health_and_request_id() {
    let portal = mock_portal().await;

    let resp = portal
        .client
        .get(portal.url("/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .expect("Health request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-42")
    );
    assert_eq!(resp.text().await.expect("Body"), "ok");

    let resp = portal
        .client
        .get(portal.url("/health"))
        .send()
        .await
        .expect("Health request failed");
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_anonymous_session() {
    let portal = mock_portal().await;
    let body = get_json(&portal, "/api/session").await;

    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(body["isLoading"], false);
    assert!(body.get("user").is_none());
    assert!(body.get("error").is_none());
    assert_eq!(body["capabilities"]["adminViewToggle"], false);
}

// ============================================================================
// Mock login flow
// ============================================================================

#[tokio::test]
async fn test_mock_login_and_logout() {
    let portal = mock_portal().await;
    login(&portal).await;

    let body = get_json(&portal, "/api/session").await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["user"]["id"], "user-1");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("accessToken").is_none());

    let resp = portal
        .client
        .post(portal.url("/auth/logout"))
        .send()
        .await
        .expect("Logout request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = get_json(&portal, "/api/session").await;
    assert_eq!(body["isAuthenticated"], false);
}

#[tokio::test]
async fn test_selected_user_survives_logout() {
    let portal = mock_portal().await;

    let resp = select_user(&portal, "user-2").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.expect("JSON body");
    assert_eq!(user["username"], "jmartin");

    login(&portal).await;
    let body = get_json(&portal, "/api/session").await;
    assert_eq!(body["user"]["id"], "user-2");
    assert_eq!(body["user"]["role"], "contributor");

    portal
        .client
        .post(portal.url("/auth/logout"))
        .send()
        .await
        .expect("Logout request failed");
    login(&portal).await;

    let body = get_json(&portal, "/api/session").await;
    assert_eq!(body["user"]["id"], "user-2");
}

#[tokio::test]
async fn test_unknown_mock_user_is_rejected() {
    let portal = mock_portal().await;
    let resp = select_user(&portal, "user-404").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mock_directory_listing() {
    let portal = mock_portal().await;
    let body = get_json(&portal, "/api/mock-users").await;
    let users = body.as_array().expect("Array of users");
    assert!(users.len() >= 3);
    assert_eq!(users[0]["id"], "user-1");
}

#[tokio::test]
async fn test_browsers_are_isolated() {
    let portal = mock_portal().await;
    login(&portal).await;

    let (other, _jar) = TestPortal::browser().expect("Client");
    let body: Value = other
        .get(portal.url("/api/session"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(body["isAuthenticated"], false);
}

// ============================================================================
// Admin overlays
// ============================================================================

#[tokio::test]
async fn test_admin_flag_update_persists() {
    let portal = mock_portal().await;
    login(&portal).await;

    let resp = put_flag(&portal, "show-admin-dashboard", true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["applied"], true);
    assert_eq!(body["flags"]["showAdminDashboard"], true);
    assert_eq!(body["capabilities"]["adminDashboard"], true);

    let body = get_json(&portal, "/api/flags").await;
    assert_eq!(body["isAdmin"], true);
    assert_eq!(body["flags"]["showAdminDashboard"], true);
    assert_eq!(body["flags"]["showUserActivityPanel"], false);
}

#[tokio::test]
async fn test_non_admin_mutations_are_refused_silently() {
    let portal = mock_portal().await;
    select_user(&portal, "user-3").await;
    login(&portal).await;

    let resp = put_flag(&portal, "show-activity-panel", true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["applied"], false);
    assert_eq!(body["flags"]["showUserActivityPanel"], false);

    let resp = portal
        .client
        .post(portal.url("/api/admin-view/toggle"))
        .send()
        .await
        .expect("Toggle request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["applied"], false);
    assert_eq!(body["viewingAsUser"], false);
}

#[tokio::test]
async fn test_admin_flags_hidden_after_switching_user() {
    let portal = mock_portal().await;
    login(&portal).await;
    put_flag(&portal, "show-activity-panel", true).await;

    select_user(&portal, "user-2").await;
    let body = get_json(&portal, "/api/flags").await;
    assert_eq!(body["isAdmin"], false);
    assert_eq!(body["flags"]["showUserActivityPanel"], false);
    assert_eq!(body["capabilities"]["activityPanel"], false);
}

#[tokio::test]
async fn test_view_as_user_toggle() {
    let portal = mock_portal().await;
    login(&portal).await;
    put_flag(&portal, "show-admin-dashboard", true).await;
    put_flag(&portal, "show-admin-view-toggle", true).await;

    let toggle = || async {
        let resp = portal
            .client
            .post(portal.url("/api/admin-view/toggle"))
            .send()
            .await
            .expect("Toggle request failed");
        resp.json::<Value>().await.expect("JSON body")
    };

    let body = toggle().await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["viewingAsUser"], true);
    assert_eq!(body["capabilities"]["effectiveRole"], "user");
    assert_eq!(body["capabilities"]["adminDashboard"], false);
    assert_eq!(body["capabilities"]["adminViewToggle"], true);
    assert_eq!(body["flags"]["showAdminDashboard"], true);

    let session = get_json(&portal, "/api/session").await;
    assert_eq!(session["user"]["role"], "admin");

    let body = toggle().await;
    assert_eq!(body["viewingAsUser"], false);
    assert_eq!(body["capabilities"]["adminDashboard"], true);
}

#[tokio::test]
async fn test_unknown_flag_is_bad_request() {
    let portal = mock_portal().await;
    login(&portal).await;
    let resp = put_flag(&portal, "show-user-selector", true).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Welcome marker
// ============================================================================

#[tokio::test]
async fn test_welcome_shown_once() {
    let portal = mock_portal().await;

    let body = post_json(&portal, "/api/welcome").await;
    assert_eq!(body["showWelcome"], false);

    login(&portal).await;
    assert_eq!(get_json(&portal, "/api/welcome").await["showWelcome"], true);
    assert_eq!(get_json(&portal, "/api/welcome").await["showWelcome"], true);
    assert_eq!(post_json(&portal, "/api/welcome").await["showWelcome"], true);
    assert_eq!(post_json(&portal, "/api/welcome").await["showWelcome"], false);
    assert_eq!(get_json(&portal, "/api/welcome").await["showWelcome"], false);

    let resp = portal
        .client
        .delete(portal.url("/api/welcome"))
        .send()
        .await
        .expect("Reset request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(post_json(&portal, "/api/welcome").await["showWelcome"], true);
}

#[tokio::test]
async fn test_welcome_reset_requires_session() {
    let portal = mock_portal().await;
    let resp = portal
        .client
        .delete(portal.url("/api/welcome"))
        .send()
        .await
        .expect("Reset request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("JSON body");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_link_does_not_log_in() {
    let portal = mock_portal().await;
    let resp = portal
        .client
        .get(portal.url("/auth/login"))
        .send()
        .await
        .expect("Login link request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(get_json(&portal, "/api/session").await["isAuthenticated"], false);
}

#[tokio::test]
async fn test_logout_shows_welcome_again() {
    let portal = mock_portal().await;
    login(&portal).await;
    post_json(&portal, "/api/welcome").await;

    portal
        .client
        .post(portal.url("/auth/logout"))
        .send()
        .await
        .expect("Logout request failed");
    login(&portal).await;
    assert_eq!(post_json(&portal, "/api/welcome").await["showWelcome"], true);
}

// ============================================================================
// Identity provider strategy
// ============================================================================

async fn provider_portal(provider: &FakeProvider) -> TestPortal {
    let config = portal_config(&[
        ("PORTAL_USE_KEYCLOAK_AUTH", "true"),
        ("KEYCLOAK_URL", "https://sso.example.com"),
        ("KEYCLOAK_REALM", "ai-portal"),
        ("KEYCLOAK_CLIENT_ID", "portal-web"),
        ("AUTH_VALIDATION_URL", provider.validation_url.as_str()),
    ])
    .expect("Valid configuration");
    TestPortal::start(config).await.expect("Portal should start")
}

#[tokio::test]
async fn test_provider_login_redirects_to_authorization_endpoint() {
    let provider = FakeProvider::start(StatusCode::UNAUTHORIZED, json!({}))
        .await
        .expect("Fake provider");
    let portal = provider_portal(&provider).await;

    let resp = portal
        .client
        .get(portal.url("/auth/login"))
        .send()
        .await
        .expect("Login request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header");
    assert!(location.starts_with(
        "https://sso.example.com/realms/ai-portal/protocol/openid-connect/auth?client_id=portal-web"
    ));
    assert!(location.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("scope=openid"));
}

#[tokio::test]
async fn test_provider_session_cookie_is_validated() {
    let provider = FakeProvider::start(
        StatusCode::OK,
        claims("alice", "super_admin", &["contributor"]),
    )
    .await
    .expect("Fake provider");
    let portal = provider_portal(&provider).await;

    let body = get_json(&portal, "/api/session").await;
    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(provider.calls(), 0);

    portal.set_provider_cookie("abc123");
    let body = get_json(&portal, "/api/session").await;
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "super_admin");
    assert!(
        provider
            .last_cookie()
            .is_some_and(|c| c.contains("KEYCLOAK_SESSION=abc123"))
    );

    let flags = get_json(&portal, "/api/flags").await;
    assert_eq!(flags["isAdmin"], true);
}

#[tokio::test]
async fn test_provider_failure_surfaces_error() {
    let provider = FakeProvider::start(StatusCode::INTERNAL_SERVER_ERROR, json!({}))
        .await
        .expect("Fake provider");
    let portal = provider_portal(&provider).await;
    portal.set_provider_cookie("abc123");

    let body = get_json(&portal, "/api/session").await;
    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(body["error"], "Authentication failed");
}

#[tokio::test]
async fn test_provider_refresh_and_logout() {
    let provider = FakeProvider::start(StatusCode::OK, claims("alice", "user", &[]))
        .await
        .expect("Fake provider");
    let portal = provider_portal(&provider).await;
    portal.set_provider_cookie("abc123");

    assert_eq!(get_json(&portal, "/api/session").await["user"]["role"], "user");

    provider.respond_with(StatusCode::OK, claims("alice", "admin", &[]));
    // Cached until refreshed.
    assert_eq!(get_json(&portal, "/api/session").await["user"]["role"], "user");

    let body: Value = portal
        .client
        .post(portal.url("/api/session/refresh"))
        .send()
        .await
        .expect("Refresh request failed")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["capabilities"]["flagManagement"], true);

    let resp = portal
        .client
        .post(portal.url("/auth/logout"))
        .send()
        .await
        .expect("Logout request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header");
    assert!(location.contains("/protocol/openid-connect/logout?redirect_uri="));
}

#[tokio::test]
async fn test_provider_refresh_failure_ends_session() {
    let provider = FakeProvider::start(StatusCode::OK, claims("dana", "admin", &[]))
        .await
        .expect("Fake provider");
    let portal = provider_portal(&provider).await;
    portal.set_provider_cookie("abc123");
    assert_eq!(get_json(&portal, "/api/flags").await["isAdmin"], true);

    provider.respond_with(StatusCode::INTERNAL_SERVER_ERROR, json!({}));
    let body = post_json(&portal, "/api/session/refresh").await;
    assert_eq!(body["isAuthenticated"], false);
    assert_eq!(body["error"], "Authentication failed");
    assert_eq!(body["capabilities"]["flagManagement"], false);

    // No stale cache entry keeps the admin in.
    assert_eq!(get_json(&portal, "/api/flags").await["isAdmin"], false);
}

#[tokio::test]
async fn test_mock_only_routes_under_provider() {
    let provider = FakeProvider::start(StatusCode::UNAUTHORIZED, json!({}))
        .await
        .expect("Fake provider");
    let portal = provider_portal(&provider).await;

    let resp = portal
        .client
        .get(portal.url("/api/mock-users"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = select_user(&portal, "user-1").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
