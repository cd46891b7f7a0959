//! Dashboard and wishlist filtering.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use family_wishlist_integration_tests::TestApp;

/// Byte offset of `needle` in `body`.
fn position(body: &str, needle: &str) -> usize {
    body.find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found"))
}

#[tokio::test]
async fn test_all_shows_everyones_items() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    alice.add_wish("Bike", "").await;
    let bob = app.browser();
    bob.sign_up("bob", "secret1").await;
    bob.add_wish("Drone", "").await;

    let body = alice.page("/wishlists").await;

    assert!(body.contains("All wishlists"));
    assert!(body.contains("Bike"));
    assert!(body.contains("Drone"));
    assert!(!body.contains("Add a wish"));
}

#[tokio::test]
async fn test_own_list_is_filtered_newest_first_and_editable() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    alice.add_wish("First wish", "").await;
    alice.add_wish("Second wish", "").await;
    let bob = app.browser();
    bob.sign_up("bob", "secret1").await;
    bob.add_wish("Drone", "").await;

    let body = alice
        .page(&format!("/wishlists?user={}", app.user_id("alice")))
        .await;

    assert!(body.contains("My wishlist"));
    assert!(body.contains("Add a wish"));
    assert!(!body.contains("Drone"));
    assert!(position(&body, "Second wish") < position(&body, "First wish"));
    assert_eq!(body.matches("/edit\"").count(), 2);
    assert_eq!(body.matches("/delete\"").count(), 2);
}

#[tokio::test]
async fn test_all_list_has_no_edit_buttons() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    alice.add_wish("Bike", "").await;

    let body = alice.page("/wishlists").await;

    assert!(body.contains("Bike"));
    assert!(!body.contains("/edit\""));
    assert!(!body.contains("/delete\""));
}

#[tokio::test]
async fn test_other_users_list_is_read_only() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    let bob = app.browser();
    bob.sign_up("bob", "secret1").await;
    bob.add_wish("Drone", "").await;

    let body = alice
        .page(&format!("/wishlists?user={}", app.user_id("bob")))
        .await;

    assert!(body.contains("Drone"));
    assert!(!body.contains("Add a wish"));
    assert!(!body.contains("/edit"));
}

#[tokio::test]
async fn test_empty_list_wording() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    let bob = app.browser();
    bob.sign_up("bob", "secret1").await;

    let own = alice
        .page(&format!("/wishlists?user={}", app.user_id("alice")))
        .await;
    let other = alice
        .page(&format!("/wishlists?user={}", app.user_id("bob")))
        .await;

    let all = alice.page("/wishlists").await;

    assert!(own.contains("You haven"));
    assert!(other.contains("This person hasn"));
    assert!(!other.contains("You haven"));
    assert!(all.contains("Nobody has added any wishes yet"));
    assert!(!all.contains("This person hasn"));
}

#[tokio::test]
async fn test_malformed_user_filter_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    let response = alice.get("/wishlists?user=nope").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_dashboard_lists_family_members() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    let bob = app.browser();
    bob.sign_up("bob", "secret1").await;

    let body = alice.page("/").await;

    assert!(body.contains("All wishlists"));
    assert!(body.contains("My wishlist"));
    assert!(body.contains(&format!("/wishlists?user={}", app.user_id("bob"))));
    // Avatar fallback.
    assert!(body.contains(">B<"));
}

#[tokio::test]
async fn test_tips_and_welcome_show_once() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    let first = alice.page("/").await;
    assert!(first.contains("How it works"));
    assert!(first.contains("Welcome"));

    let second = alice.page("/").await;
    assert!(!second.contains("How it works"));
    assert!(!second.contains("id=\"welcome\""));
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good_list() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    alice.add_wish("Bike", "").await;
    let my_list = format!("/wishlists?user={}", app.user_id("alice"));
    alice.page(&my_list).await;

    app.store.fail_reads(true);
    let body = alice.page(&my_list).await;

    assert!(body.contains("Bike"));
    assert!(body.contains("Something went wrong. Please try again."));
}
