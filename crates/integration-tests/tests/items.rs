//! Creating and editing wishes.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use family_wishlist_integration_tests::{TestApp, location};

#[tokio::test]
async fn test_create_without_price_shows_no_price_line() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    let my_list = format!("/wishlists?user={}", app.user_id("alice"));

    let response = alice.add_wish("Bike", "").await;
    assert_eq!(location(&response), format!("{my_list}&success=item_added"));

    let body = alice.page(&format!("{my_list}&success=item_added")).await;
    assert!(body.contains("Wish added successfully!"));
    assert!(body.contains("Bike"));
    assert!(!body.contains('€'));

    let items = app.store.all_items();
    assert_eq!(items.len(), 1);
    assert!(items[0].price.is_none());
}

#[tokio::test]
async fn test_price_renders_with_two_decimals() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    alice.add_wish("Book", "9").await;

    let body = alice
        .page(&format!("/wishlists?user={}", app.user_id("alice")))
        .await;
    assert!(body.contains("€9.00"));
}

#[tokio::test]
async fn test_invalid_form_keeps_values_and_skips_backend() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    let response = alice
        .post(
            "/items",
            &[("title", "  "), ("description", "Blue and fast"), ("price", "12")],
        )
        .await;

    assert_eq!(response.status(), 422);
    let body = response.text().await.unwrap();
    assert!(body.contains("Title is required"));
    assert!(body.contains("Blue and fast"));
    assert_eq!(app.store.item_mutations(), 0);
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    let response = alice.add_wish("Bike", "-5").await;

    assert_eq!(response.status(), 422);
    assert_eq!(app.store.item_mutations(), 0);
}

#[tokio::test]
async fn test_failed_write_reopens_form_with_values() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    app.store.fail_writes(true);

    let response = alice.add_wish("Bike", "120").await;

    assert_eq!(response.status(), 503);
    let body = response.text().await.unwrap();
    assert!(body.contains("Something went wrong. Please try again."));
    assert!(body.contains("value=\"Bike\""));
    assert!(body.contains("value=\"120\""));
    assert!(app.store.all_items().is_empty());
}

#[tokio::test]
async fn test_priority_checkbox() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;

    alice
        .post("/items", &[("title", "Puppy"), ("is_priority", "true")])
        .await;
    alice.add_wish("Socks", "").await;

    let mut items = app.store.all_items();
    items.sort_by(|a, b| a.title.cmp(&b.title));
    assert!(items[0].is_priority);
    assert!(!items[1].is_priority);
}

#[tokio::test]
async fn test_owner_edits_item() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    alice.add_wish("Bike", "").await;
    let id = app.store.all_items()[0].id;

    let body = alice.page(&format!("/items/{id}/edit")).await;
    assert!(body.contains("value=\"Bike\""));

    let response = alice
        .post(
            &format!("/items/{id}"),
            &[("title", "Red bike"), ("price", "99,5")],
        )
        .await;
    assert_eq!(
        location(&response),
        format!("/items/{id}?success=item_updated")
    );

    let body = alice.page(&format!("/items/{id}")).await;
    assert!(body.contains("Red bike"));
    assert!(body.contains("€99.50"));
}

#[tokio::test]
async fn test_non_owner_cannot_edit() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    alice.add_wish("Bike", "").await;
    let id = app.store.all_items()[0].id;

    let bob = app.browser();
    bob.sign_up("bob", "secret1").await;
    let mutations = app.store.item_mutations();

    let response = bob.get(&format!("/items/{id}/edit")).await;
    assert_eq!(
        location(&response),
        format!("/items/{id}?error=not_owner")
    );

    let response = bob
        .post(&format!("/items/{id}"), &[("title", "Mine now")])
        .await;
    assert_eq!(
        location(&response),
        format!("/items/{id}?error=not_owner")
    );

    assert_eq!(app.store.item_mutations(), mutations);
    assert_eq!(app.store.all_items()[0].title, "Bike");
}

#[tokio::test]
async fn test_detail_of_other_users_item_is_read_only() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    alice.add_wish("Bike", "").await;
    let id = app.store.all_items()[0].id;

    let bob = app.browser();
    bob.sign_up("bob", "secret1").await;

    let body = bob.page(&format!("/items/{id}")).await;
    assert!(body.contains("Bike"));
    assert!(!body.contains("/edit"));
    assert!(!body.contains("/delete"));
}

#[tokio::test]
async fn test_duplicate_submission_creates_one_item() {
    let app = TestApp::spawn().await;
    let alice = app.browser();
    alice.sign_up("alice", "secret1").await;
    app.store.set_latency(Duration::from_millis(200));

    let (first, second) = tokio::join!(alice.add_wish("Bike", ""), alice.add_wish("Bike", ""));

    let locations = [location(&first), location(&second)];
    assert!(locations.iter().any(|l| l.ends_with("success=item_added")));
    assert!(locations.iter().any(|l| l.ends_with("error=in_flight")));
    assert_eq!(app.store.item_mutations(), 1);
    assert_eq!(app.store.all_items().len(), 1);
}
