//! Store update policy: role gating, diff computation, uniqueness checks,
//! and owner reassignment.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;

use store_ratings_core::{Email, RatingId, RatingValue, Role, StoreId, UserId};

use store_ratings_api::db::{
    Gateway, MemoryGateway, RepositoryError, StoreFilter, UserFilter,
};
use store_ratings_api::models::{
    CurrentUser, NewStore, NewUser, Rating, RatingSummary, RatingWithStore, RatingWithUser,
    Store, StoreChanges, StoreWithRating, User,
};
use store_ratings_api::services::stores::{CreateStoreInput, UpdateStoreInput};
use store_ratings_api::services::{PolicyError, StoreService};

async fn seed_user(gateway: &MemoryGateway, name: &str, email: &str, role: Role) -> User {
    gateway
        .insert_user(&NewUser {
            name: name.to_owned(),
            email: email.parse().unwrap(),
            address: "1 Test Lane".to_owned(),
            role,
            password_hash: "hash".to_owned(),
        })
        .await
        .unwrap()
}

async fn seed_store(
    gateway: &MemoryGateway,
    name: &str,
    email: &str,
    owner: UserId,
) -> StoreId {
    gateway
        .insert_store(&NewStore {
            name: name.to_owned(),
            email: email.parse().unwrap(),
            address: "2 Shop Street".to_owned(),
            owner_id: owner,
        })
        .await
        .unwrap()
        .id
}

struct Fixture {
    gateway: Arc<MemoryGateway>,
    service: StoreService,
    admin: CurrentUser,
    owner: CurrentUser,
    store: StoreId,
}

async fn setup() -> Fixture {
    let gateway = Arc::new(MemoryGateway::new());
    let admin = seed_user(
        &gateway,
        "Administrator Test Account",
        "admin@example.com",
        Role::Admin,
    )
    .await;
    let owner = seed_user(
        &gateway,
        "Store Owner Test Account One",
        "owner1@example.com",
        Role::StoreOwner,
    )
    .await;
    let store = seed_store(
        &gateway,
        "The Update Policy Test Store",
        "store1@example.com",
        owner.id,
    )
    .await;
    let service = StoreService::new(Arc::clone(&gateway) as Arc<dyn Gateway>);
    Fixture {
        gateway,
        service,
        admin: CurrentUser::from(&admin),
        owner: CurrentUser::from(&owner),
        store,
    }
}

fn changes() -> UpdateStoreInput {
    UpdateStoreInput::default()
}

#[tokio::test]
async fn admin_may_change_every_field() {
    let f = setup().await;

    let updated = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                name: Some("The Renamed Policy Test Store".to_owned()),
                email: Some("renamed@example.com".to_owned()),
                address: Some("3 New Street".to_owned()),
                ..changes()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "The Renamed Policy Test Store");
    assert_eq!(updated.email.as_str(), "renamed@example.com");
    assert_eq!(updated.address, "3 New Street");
}

#[tokio::test]
async fn identical_values_produce_no_change() {
    let f = setup().await;

    let result = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                name: Some("The Update Policy Test Store".to_owned()),
                address: Some("2 Shop Street".to_owned()),
                ..changes()
            },
        )
        .await;

    assert!(matches!(result, Err(PolicyError::NoChange)));
}

#[tokio::test]
async fn empty_request_produces_no_change() {
    let f = setup().await;

    let result = f.service.update(&f.admin, f.store, changes()).await;
    assert!(matches!(result, Err(PolicyError::NoChange)));
}

#[tokio::test]
async fn owner_may_change_email_and_address_of_own_store() {
    let f = setup().await;

    let updated = f
        .service
        .update(
            &f.owner,
            f.store,
            UpdateStoreInput {
                email: Some("new.contact@example.com".to_owned()),
                address: Some("4 Relocated Road".to_owned()),
                ..changes()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.email.as_str(), "new.contact@example.com");
    assert_eq!(updated.address, "4 Relocated Road");
}

#[tokio::test]
async fn owner_resubmitting_unchanged_name_may_change_address() {
    let f = setup().await;

    // The full record comes back from the form; the untouched name and
    // owner equal the current values and must not trip the role gate
    let updated = f
        .service
        .update(
            &f.owner,
            f.store,
            UpdateStoreInput {
                name: Some("The Update Policy Test Store".to_owned()),
                owner_id: Some(f.owner.id),
                address: Some("4 Relocated Road".to_owned()),
                ..changes()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "The Update Policy Test Store");
    assert_eq!(updated.owner_id, Some(f.owner.id));
    assert_eq!(updated.address, "4 Relocated Road");
}

#[tokio::test]
async fn owner_may_not_change_name_or_ownership() {
    let f = setup().await;

    let result = f
        .service
        .update(
            &f.owner,
            f.store,
            UpdateStoreInput {
                name: Some("A Differently Named Test Store".to_owned()),
                ..changes()
            },
        )
        .await;
    assert!(matches!(result, Err(PolicyError::Forbidden(_))));

    let result = f
        .service
        .update(
            &f.owner,
            f.store,
            UpdateStoreInput {
                owner_id: Some(f.admin.id),
                ..changes()
            },
        )
        .await;
    assert!(matches!(result, Err(PolicyError::Forbidden(_))));
}

#[tokio::test]
async fn owner_may_not_touch_someone_elses_store() {
    let f = setup().await;
    let other_owner = seed_user(
        &f.gateway,
        "Store Owner Test Account Two",
        "owner2@example.com",
        Role::StoreOwner,
    )
    .await;
    let other_store = seed_store(
        &f.gateway,
        "A Second Unrelated Test Store",
        "store2@example.com",
        other_owner.id,
    )
    .await;

    let result = f
        .service
        .update(
            &f.owner,
            other_store,
            UpdateStoreInput {
                address: Some("5 Intruder Avenue".to_owned()),
                ..changes()
            },
        )
        .await;

    assert!(matches!(result, Err(PolicyError::Forbidden(_))));
}

#[tokio::test]
async fn regular_users_may_not_update_stores() {
    let f = setup().await;
    let user = seed_user(
        &f.gateway,
        "Plain Regular User Account",
        "user@example.com",
        Role::User,
    )
    .await;

    let result = f
        .service
        .update(
            &CurrentUser::from(&user),
            f.store,
            UpdateStoreInput {
                address: Some("6 Hopeful Street".to_owned()),
                ..changes()
            },
        )
        .await;

    assert!(matches!(result, Err(PolicyError::Forbidden(_))));
}

#[tokio::test]
async fn updating_an_unknown_store_fails() {
    let f = setup().await;

    let result = f
        .service
        .update(
            &f.admin,
            StoreId::new(9999),
            UpdateStoreInput {
                address: Some("7 Nowhere Place".to_owned()),
                ..changes()
            },
        )
        .await;

    assert!(matches!(result, Err(PolicyError::NotFound("store"))));
}

#[tokio::test]
async fn renaming_onto_another_stores_name_conflicts() {
    let f = setup().await;
    let other_owner = seed_user(
        &f.gateway,
        "Store Owner Test Account Two",
        "owner2@example.com",
        Role::StoreOwner,
    )
    .await;
    seed_store(
        &f.gateway,
        "A Second Unrelated Test Store",
        "store2@example.com",
        other_owner.id,
    )
    .await;

    let result = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                name: Some("A Second Unrelated Test Store".to_owned()),
                ..changes()
            },
        )
        .await;

    assert!(matches!(result, Err(PolicyError::Conflict(_))));
}

#[tokio::test]
async fn keeping_the_own_name_does_not_conflict() {
    let f = setup().await;

    // Unchanged name is dropped from the diff, so only the address counts
    let updated = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                name: Some("The Update Policy Test Store".to_owned()),
                address: Some("8 Same Name Street".to_owned()),
                ..changes()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.address, "8 Same Name Street");
}

#[tokio::test]
async fn reassigning_to_an_occupied_owner_is_rejected() {
    let f = setup().await;
    let other_owner = seed_user(
        &f.gateway,
        "Store Owner Test Account Two",
        "owner2@example.com",
        Role::StoreOwner,
    )
    .await;
    seed_store(
        &f.gateway,
        "A Second Unrelated Test Store",
        "store2@example.com",
        other_owner.id,
    )
    .await;

    let result = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                owner_id: Some(other_owner.id),
                ..changes()
            },
        )
        .await;

    // A one-store-per-owner breach is an invalid assignment, not a
    // name/email collision
    assert!(matches!(result, Err(PolicyError::Validation(_))));
}

#[tokio::test]
async fn reassigning_to_a_free_store_owner_succeeds() {
    let f = setup().await;
    let free_owner = seed_user(
        &f.gateway,
        "Store Owner Without A Store",
        "owner3@example.com",
        Role::StoreOwner,
    )
    .await;

    let updated = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                owner_id: Some(free_owner.id),
                ..changes()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.owner_id, Some(free_owner.id));
}

#[tokio::test]
async fn reassigning_to_a_non_owner_role_is_rejected() {
    let f = setup().await;
    let user = seed_user(
        &f.gateway,
        "Plain Regular User Account",
        "user@example.com",
        Role::User,
    )
    .await;

    let result = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                owner_id: Some(user.id),
                ..changes()
            },
        )
        .await;

    assert!(matches!(result, Err(PolicyError::Validation(_))));
}

#[tokio::test]
async fn resubmitting_the_current_owner_is_a_no_change() {
    let f = setup().await;

    let result = f
        .service
        .update(
            &f.admin,
            f.store,
            UpdateStoreInput {
                owner_id: Some(f.owner.id),
                ..changes()
            },
        )
        .await;

    assert!(matches!(result, Err(PolicyError::NoChange)));
}

#[tokio::test]
async fn create_rejects_ineligible_owners() {
    let f = setup().await;
    let user = seed_user(
        &f.gateway,
        "Plain Regular User Account",
        "user@example.com",
        Role::User,
    )
    .await;

    let result = f
        .service
        .create(CreateStoreInput {
            name: "A Store For The Wrong Owner".to_owned(),
            email: "wrong.owner@example.com".to_owned(),
            address: "9 Misassigned Way".to_owned(),
            owner_id: user.id,
        })
        .await;
    assert!(matches!(result, Err(PolicyError::Validation(_))));

    // An owner with a store already cannot receive a second one
    let result = f
        .service
        .create(CreateStoreInput {
            name: "A Second Store For One Owner".to_owned(),
            email: "second.store@example.com".to_owned(),
            address: "10 Greedy Lane".to_owned(),
            owner_id: f.owner.id,
        })
        .await;
    assert!(matches!(result, Err(PolicyError::Validation(_))));
}

#[tokio::test]
async fn create_rejects_duplicate_names_and_emails() {
    let f = setup().await;
    let free_owner = seed_user(
        &f.gateway,
        "Store Owner Without A Store",
        "owner3@example.com",
        Role::StoreOwner,
    )
    .await;

    let result = f
        .service
        .create(CreateStoreInput {
            name: "The Update Policy Test Store".to_owned(),
            email: "unique@example.com".to_owned(),
            address: "11 Duplicate Drive".to_owned(),
            owner_id: free_owner.id,
        })
        .await;
    assert!(matches!(result, Err(PolicyError::Conflict(_))));
}

/// Delegates to a [`MemoryGateway`] but fails every store update with the
/// unique-index violation a concurrent writer would cause between the
/// duplicate check and the write.
struct ContestedWrites(MemoryGateway);

#[async_trait]
impl Gateway for ContestedWrites {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.0.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.0.find_user_by_email(email).await
    }

    async fn user_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        self.0.user_with_password_hash(email).await
    }

    async fn insert_user(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        self.0.insert_user(new_user).await
    }

    async fn update_user_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        self.0.update_user_password(id, password_hash).await
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        self.0.list_users(filter).await
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        self.0.count_users().await
    }

    async fn find_store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        self.0.find_store_by_id(id).await
    }

    async fn find_store_by_owner(
        &self,
        owner: UserId,
    ) -> Result<Option<Store>, RepositoryError> {
        self.0.find_store_by_owner(owner).await
    }

    async fn insert_store(&self, new_store: &NewStore) -> Result<Store, RepositoryError> {
        self.0.insert_store(new_store).await
    }

    async fn update_store_fields(
        &self,
        _id: StoreId,
        _changes: &StoreChanges,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Conflict(
            "a store with this name or email already exists".to_owned(),
        ))
    }

    async fn duplicate_store_exists(
        &self,
        name: Option<&str>,
        email: Option<&Email>,
        exclude: Option<StoreId>,
    ) -> Result<bool, RepositoryError> {
        self.0.duplicate_store_exists(name, email, exclude).await
    }

    async fn list_stores(
        &self,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreWithRating>, RepositoryError> {
        self.0.list_stores(filter).await
    }

    async fn count_stores(&self) -> Result<i64, RepositoryError> {
        self.0.count_stores().await
    }

    async fn find_rating(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        self.0.find_rating(user, store).await
    }

    async fn insert_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        self.0.insert_rating(user, store, value).await
    }

    async fn update_rating_value(
        &self,
        id: RatingId,
        value: RatingValue,
    ) -> Result<(), RepositoryError> {
        self.0.update_rating_value(id, value).await
    }

    async fn delete_rating(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<bool, RepositoryError> {
        self.0.delete_rating(user, store).await
    }

    async fn rating_summary(&self, store: StoreId) -> Result<RatingSummary, RepositoryError> {
        self.0.rating_summary(store).await
    }

    async fn ratings_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<RatingWithUser>, RepositoryError> {
        self.0.ratings_for_store(store).await
    }

    async fn ratings_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<RatingWithStore>, RepositoryError> {
        self.0.ratings_for_user(user).await
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        self.0.count_ratings().await
    }
}

#[tokio::test]
async fn losing_the_rename_race_degrades_to_a_conflict() {
    let inner = MemoryGateway::new();
    let admin = seed_user(
        &inner,
        "Administrator Test Account",
        "admin@example.com",
        Role::Admin,
    )
    .await;
    let owner = seed_user(
        &inner,
        "Store Owner Test Account One",
        "owner1@example.com",
        Role::StoreOwner,
    )
    .await;
    let store = seed_store(
        &inner,
        "The Update Policy Test Store",
        "store1@example.com",
        owner.id,
    )
    .await;
    let service =
        StoreService::new(Arc::new(ContestedWrites(inner)) as Arc<dyn Gateway>);

    let result = service
        .update(
            &CurrentUser::from(&admin),
            store,
            UpdateStoreInput {
                email: Some("contested@example.com".to_owned()),
                ..changes()
            },
        )
        .await;

    // The write-side unique violation surfaces as a conflict, not as an
    // internal error
    assert!(matches!(result, Err(PolicyError::Conflict(_))));
}
