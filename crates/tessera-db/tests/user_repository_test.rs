//! Integration tests for the user directory using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tessera_core::error::TesseraError;
use tessera_core::models::user::CreateUser;
use tessera_core::repository::UserRepository;
use tessera_db::repository::SurrealUserRepository;

/// Helper: spin up in-memory DB and apply the schema.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::init_schema(&db).await.unwrap();
    db
}

fn new_user(username: &str) -> CreateUser {
    CreateUser {
        username: username.into(),
        email: format!("{username}@example.com"),
        mobile: "9876543210".into(),
        first_name: "Alice".into(),
        middle_name: None,
        last_name: Some("Liddell".into()),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        profile_photo: Some("https://cdn.example.com/alice.png".into()),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(new_user("alice")).await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.middle_name, None);
    assert_eq!(user.last_name.as_deref(), Some("Liddell"));

    let fetched = repo.get_by_username("alice").await.unwrap().unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.password_hash, user.password_hash);
    assert_eq!(
        fetched.profile_photo.as_deref(),
        Some("https://cdn.example.com/alice.png")
    );
}

#[tokio::test]
async fn unknown_username_is_none() {
    let repo = SurrealUserRepository::new(setup().await);
    assert!(repo.get_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let repo = SurrealUserRepository::new(setup().await);
    repo.create(new_user("alice")).await.unwrap();

    let err = repo.create(new_user("alice")).await.unwrap_err();
    assert!(matches!(err, TesseraError::AlreadyExists { .. }), "got {err:?}");
}

#[tokio::test]
async fn external_identity_user_has_no_password() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo
        .create(CreateUser {
            mobile: String::new(),
            password_hash: String::new(),
            profile_photo: None,
            ..new_user("gwen")
        })
        .await
        .unwrap();

    assert!(user.password_hash.is_empty());
    assert!(user.mobile.is_empty());
    assert!(user.profile_photo.is_none());
}

#[tokio::test]
async fn schema_can_be_applied_twice() {
    let db = setup().await;
    tessera_db::init_schema(&db).await.unwrap();
}

#[tokio::test]
async fn username_length_is_not_bounded_by_the_store() {
    let repo = SurrealUserRepository::new(setup().await);

    let long = "g".repeat(25);
    let user = repo.create(new_user(&long)).await.unwrap();
    assert_eq!(user.username, long);

    let short = repo.create(new_user("g")).await.unwrap();
    assert_eq!(short.username, "g");
}
