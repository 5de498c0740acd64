//! Rating submission behaviour: upsert-in-place semantics, withdrawal, and
//! aggregate recomputation.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use store_ratings_core::{Role, StoreId, UserId};

use store_ratings_api::db::{Gateway, MemoryGateway};
use store_ratings_api::models::{NewStore, NewUser};
use store_ratings_api::services::{PolicyError, RatingService};

async fn seed_user(gateway: &MemoryGateway, name: &str, email: &str, role: Role) -> UserId {
    let user = gateway
        .insert_user(&NewUser {
            name: name.to_owned(),
            email: email.parse().unwrap(),
            address: "1 Test Lane".to_owned(),
            role,
            password_hash: "hash".to_owned(),
        })
        .await
        .unwrap();
    user.id
}

async fn seed_store(gateway: &MemoryGateway, name: &str, email: &str) -> StoreId {
    let owner = seed_user(
        gateway,
        &format!("Owner of the store {name}"),
        &format!("owner.{email}"),
        Role::StoreOwner,
    )
    .await;
    let store = gateway
        .insert_store(&NewStore {
            name: name.to_owned(),
            email: email.parse().unwrap(),
            address: "2 Shop Street".to_owned(),
            owner_id: owner,
        })
        .await
        .unwrap();
    store.id
}

async fn setup() -> (Arc<MemoryGateway>, RatingService, UserId, StoreId) {
    let gateway = Arc::new(MemoryGateway::new());
    let user = seed_user(
        &gateway,
        "Rating Test User Account One",
        "rater@example.com",
        Role::User,
    )
    .await;
    let store = seed_store(&gateway, "The Rating Test Store", "store@example.com").await;
    let service = RatingService::new(Arc::clone(&gateway) as Arc<dyn Gateway>);
    (gateway, service, user, store)
}

#[tokio::test]
async fn first_submission_creates_a_rating() {
    let (_gateway, service, user, store) = setup().await;

    let submission = service.submit(user, store, 4).await.unwrap();
    assert!(submission.created);
    assert_eq!(submission.rating.rating.as_i32(), 4);
    assert_eq!(submission.summary.total_ratings, 1);
    assert!((submission.summary.average_rating - 4.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn resubmission_overwrites_in_place_and_keeps_id() {
    let (_gateway, service, user, store) = setup().await;

    let first = service.submit(user, store, 2).await.unwrap();
    let second = service.submit(user, store, 5).await.unwrap();

    assert!(!second.created);
    assert_eq!(second.rating.id, first.rating.id);
    assert_eq!(second.rating.rating.as_i32(), 5);
    // Still one row, not two
    assert_eq!(second.summary.total_ratings, 1);
    assert!((second.summary.average_rating - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn out_of_range_values_are_rejected() {
    let (_gateway, service, user, store) = setup().await;

    assert!(matches!(
        service.submit(user, store, 0).await,
        Err(PolicyError::Validation(_))
    ));
    assert!(matches!(
        service.submit(user, store, 6).await,
        Err(PolicyError::Validation(_))
    ));
}

#[tokio::test]
async fn rating_an_unknown_store_fails() {
    let (_gateway, service, user, _store) = setup().await;

    assert!(matches!(
        service.submit(user, StoreId::new(9999), 3).await,
        Err(PolicyError::NotFound("store"))
    ));
}

#[tokio::test]
async fn aggregate_is_the_mean_over_all_raters() {
    let (gateway, service, user, store) = setup().await;
    let second = seed_user(
        &gateway,
        "Rating Test User Account Two",
        "rater2@example.com",
        Role::User,
    )
    .await;
    let third = seed_user(
        &gateway,
        "Rating Test User Account Three",
        "rater3@example.com",
        Role::User,
    )
    .await;

    let fourth = seed_user(
        &gateway,
        "Rating Test User Account Four",
        "rater4@example.com",
        Role::User,
    )
    .await;

    service.submit(user, store, 3).await.unwrap();
    service.submit(second, store, 5).await.unwrap();
    let last = service.submit(third, store, 4).await.unwrap();

    assert_eq!(last.summary.total_ratings, 3);
    assert!((last.summary.average_rating - 4.0).abs() < f64::EPSILON);

    let with_low = service.submit(fourth, store, 2).await.unwrap();
    assert_eq!(with_low.summary.total_ratings, 4);
    assert!((with_low.summary.average_rating - 3.5).abs() < f64::EPSILON);

    // Resubmitting the same value changes nothing
    let repeated = service.submit(fourth, store, 2).await.unwrap();
    assert_eq!(repeated.summary.total_ratings, 4);
    assert!((repeated.summary.average_rating - 3.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn withdrawal_removes_the_rating_and_recomputes() {
    let (gateway, service, user, store) = setup().await;
    let second = seed_user(
        &gateway,
        "Rating Test User Account Two",
        "rater2@example.com",
        Role::User,
    )
    .await;

    service.submit(user, store, 2).await.unwrap();
    service.submit(second, store, 4).await.unwrap();

    let summary = service.withdraw(user, store).await.unwrap();
    assert_eq!(summary.total_ratings, 1);
    assert!((summary.average_rating - 4.0).abs() < f64::EPSILON);

    // The rating is gone; a second withdrawal finds nothing
    assert!(matches!(
        service.withdraw(user, store).await,
        Err(PolicyError::NotFound("rating"))
    ));
}

#[tokio::test]
async fn empty_store_reports_zero_average() {
    let (_gateway, service, user, store) = setup().await;

    service.submit(user, store, 5).await.unwrap();
    let summary = service.withdraw(user, store).await.unwrap();

    assert_eq!(summary.total_ratings, 0);
    assert!(summary.average_rating.abs() < f64::EPSILON);
}

#[tokio::test]
async fn user_rating_list_carries_store_details() {
    let (_gateway, service, user, store) = setup().await;

    service.submit(user, store, 4).await.unwrap();
    let ratings = service.ratings_for_user(user).await.unwrap();

    assert_eq!(ratings.len(), 1);
    let entry = ratings.first().unwrap();
    assert_eq!(entry.store_id, store);
    assert_eq!(entry.store_name, "The Rating Test Store");
    assert_eq!(entry.store_address, "2 Shop Street");
}
