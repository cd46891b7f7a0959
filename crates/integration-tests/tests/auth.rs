//! Sign-up, sign-in and sign-out through the HTTP surface.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use family_wishlist_core::Username;
use family_wishlist_integration_tests::{TestApp, location};

#[tokio::test]
async fn test_sign_up_creates_profile_and_session() {
    let app = TestApp::spawn().await;
    let alice = app.browser();

    let response = alice.sign_up("alice", "secret1").await;
    assert_eq!(location(&response), "/?success=account_created");

    let body = alice.page("/?success=account_created").await;
    assert!(body.contains("Account created successfully!"));

    let profile = app.store.profile(app.user_id("alice")).unwrap();
    assert_eq!(profile.username.as_str(), "alice");
    assert!(profile.avatar_url.is_none());
}

#[tokio::test]
async fn test_sign_up_rejects_username_with_space() {
    let app = TestApp::spawn().await;
    let browser = app.browser();

    let response = browser.sign_up("alice smith", "secret1").await;

    assert_eq!(response.status(), 422);
    let body = response.text().await.unwrap();
    assert!(body.contains("Username cannot contain spaces"));
    assert!(!app.store.has_identity(&Username::parse("alice").unwrap()));
}

#[tokio::test]
async fn test_sign_up_rejects_non_image_avatar() {
    let app = TestApp::spawn().await;
    let browser = app.browser();

    let response = browser
        .post(
            "/auth/register",
            &[
                ("username", "alice"),
                ("password", "secret1"),
                ("avatar_url", "https://example.com/me.gif"),
            ],
        )
        .await;

    assert_eq!(response.status(), 422);
    assert!(!app.store.has_identity(&Username::parse("alice").unwrap()));
}

#[tokio::test]
async fn test_sign_up_with_taken_username() {
    let app = TestApp::spawn().await;
    app.browser().sign_up("alice", "secret1").await;

    let response = app.browser().sign_up("alice", "another1").await;

    assert_eq!(response.status(), 409);
    let body = response.text().await.unwrap();
    assert!(body.contains("This username is already taken"));
}

#[tokio::test]
async fn test_profile_failure_is_reported() {
    let app = TestApp::spawn().await;
    app.store.fail_profile_insert(true);

    let response = app.browser().sign_up("alice", "secret1").await;

    assert_eq!(location(&response), "/auth/register?error=profile");
    let user_id = app.user_id("alice");
    assert!(app.store.profile(user_id).is_none());
}

#[tokio::test]
async fn test_sign_up_awaiting_confirmation_goes_to_sign_in() {
    let app = TestApp::spawn().await;
    app.store.require_confirmation(true);
    let browser = app.browser();

    let response = browser.sign_up("alice", "secret1").await;

    assert_eq!(location(&response), "/auth/login?success=account_pending");
    let response = browser.get("/").await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_sign_in_with_wrong_password() {
    let app = TestApp::spawn().await;
    app.browser().sign_up("alice", "secret1").await;

    let browser = app.browser();
    let response = browser.sign_in("alice", "wrong-password").await;
    assert_eq!(location(&response), "/auth/login?error=credentials");

    let response = browser.sign_in("nobody", "secret1").await;
    assert_eq!(location(&response), "/auth/login?error=credentials");
}

#[tokio::test]
async fn test_sign_in_then_sign_out() {
    let app = TestApp::spawn().await;
    app.browser().sign_up("alice", "secret1").await;
    let browser = app.browser();

    let response = browser.sign_in("alice", "secret1").await;
    assert_eq!(location(&response), "/");
    browser.page("/").await;

    let response = browser.post("/auth/logout", &[]).await;
    assert_eq!(location(&response), "/auth/login?success=signed_out");

    let response = browser.get("/").await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_protected_pages_require_sign_in() {
    let app = TestApp::spawn().await;
    let browser = app.browser();

    for path in ["/", "/wishlists", "/items/new"] {
        let response = browser.get(path).await;
        assert_eq!(location(&response), "/auth/login", "{path}");
    }
}

#[tokio::test]
async fn test_revoked_session_is_signed_out() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    app.store.revoke_all_sessions();

    let response = alice.get("/").await;
    assert_eq!(location(&response), "/auth/login?error=session_expired");
    let response = alice.get("/").await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed() {
    let app = TestApp::spawn().await;
    app.browser().sign_up("alice", "secret1").await;

    app.store.set_token_ttl(Duration::seconds(0));
    let alice = app.browser();
    alice.sign_in("alice", "secret1").await;
    app.store.set_token_ttl(Duration::hours(1));

    let body = alice.page("/").await;
    assert!(body.contains("My wishlist"));
}

#[tokio::test]
async fn test_signed_in_user_skips_login_page() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    let response = alice.get("/auth/login").await;
    assert_eq!(location(&response), "/");
}
