//! Integration tests for `PetstoreApi` and `SessionManager` against a mock service.

mod common;

use common::{api_for, MockPetstore, PASSWORD, TOKEN, USERNAME};
use petstore_core::{
    KeyValueStore, MemoryStore, Pet, PetStatus, PetstoreError, SessionManager, SessionState,
    SignupRequest,
};
use serde_json::json;
use std::sync::Arc;

fn rex() -> serde_json::Value {
    json!({"id": 1, "name": "Rex", "status": "available", "photoUrls": [], "tags": []})
}

#[tokio::test]
async fn test_concurrent_list_reads_make_one_call() {
    let mock = MockPetstore::new().with_list("status=available", json!([rex()]));
    let (api, mock) = api_for(mock).await;

    let (a, b) = tokio::join!(
        api.find_pets_by_status(&[PetStatus::Available], None),
        api.find_pets_by_status(&[PetStatus::Available], None),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(mock.hits("GET /pet/findByStatus"), 1);
}

#[tokio::test]
async fn test_missing_pet_surfaces_message_field() {
    let (api, _mock) = api_for(MockPetstore::new()).await;

    let err = api.get_pet(42, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Pet not found");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_update_invalidates_pet_and_lists() {
    let mock = MockPetstore::new()
        .with_pet(rex())
        .with_pet(json!({"id": 2, "name": "Tom", "status": "sold"}))
        .with_list("status=available", json!([rex()]));
    let (api, mock) = api_for(mock).await;

    api.get_pet(1, Some("tok")).await.unwrap();
    api.get_pet(2, Some("tok")).await.unwrap();
    api.find_pets_by_status(&[PetStatus::Available], Some("tok"))
        .await
        .unwrap();

    let mut pet: Pet = serde_json::from_value(rex()).unwrap();
    pet.name = Some("Rex II".into());
    let updated = api.update_pet(&pet, Some("tok")).await.unwrap();
    assert_eq!(updated.name.as_deref(), Some("Rex II"));

    api.get_pet(1, Some("tok")).await.unwrap();
    api.get_pet(2, Some("tok")).await.unwrap();
    api.find_pets_by_status(&[PetStatus::Available], Some("tok"))
        .await
        .unwrap();

    // pet/1 and the list refetched; pet/2 came from cache.
    assert_eq!(mock.hits("GET /pet/{id}"), 3);
    assert_eq!(mock.hits("GET /pet/findByStatus"), 2);
    assert!(mock
        .auth_headers()
        .iter()
        .all(|h| h.as_deref() == Some("Bearer tok")));
}

#[tokio::test]
async fn test_remote_login_returns_token_and_headers() {
    let (api, mock) = api_for(MockPetstore::new()).await;

    let login = api.login(USERNAME, PASSWORD).await.unwrap();
    assert_eq!(login.token, TOKEN);
    assert_eq!(login.rate_limit.as_deref(), Some("5000"));
    assert!(login.expires_after.is_some());

    // Logins are never cached.
    api.login(USERNAME, PASSWORD).await.unwrap();
    assert_eq!(mock.hits("GET /user/login"), 2);
}

#[tokio::test]
async fn test_session_remote_login_and_failure() {
    let (api, _mock) = api_for(MockPetstore::new()).await;
    let store = Arc::new(MemoryStore::new());
    let mut session = SessionManager::new(None, api, store.clone());

    let err = session.login(USERNAME, "wrong").await.unwrap_err();
    assert!(matches!(err, PetstoreError::Api { status: 400, .. }));
    assert_eq!(err.to_string(), "Invalid username/password supplied");
    assert_eq!(session.state(), &SessionState::Unauthenticated);

    session.login(USERNAME, PASSWORD).await.unwrap();
    assert_eq!(session.token(), Some(TOKEN));
    assert_eq!(session.username(), Some(USERNAME));

    assert_eq!(store.get("token").unwrap().as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn test_signup_creates_user_then_logs_in() {
    let (api, mock) = api_for(MockPetstore::new()).await;
    let mut session = SessionManager::new(None, api, Arc::new(MemoryStore::new()));

    session
        .signup(&SignupRequest {
            username: USERNAME.into(),
            password: PASSWORD.into(),
            email: "jdoe@example.com".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: "555-0100".into(),
        })
        .await
        .unwrap();

    let users = mock.users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], USERNAME);
    assert_eq!(users[0]["userStatus"], 1);
    assert_eq!(mock.hits("GET /user/login"), 1);
    assert!(session.state().is_authenticated());
}

#[tokio::test]
async fn test_logout_drops_cached_reads() {
    let (api, mock) = api_for(MockPetstore::new().with_pet(rex())).await;
    let mut session = SessionManager::new(None, api, Arc::new(MemoryStore::new()));
    session.login(USERNAME, PASSWORD).await.unwrap();

    session.api().get_pet(1, session.token()).await.unwrap();
    assert_eq!(session.api().http().cache_len(), 1);

    session.logout();
    assert_eq!(session.api().http().cache_len(), 0);

    session.api().get_pet(1, None).await.unwrap();
    assert_eq!(mock.hits("GET /pet/{id}"), 2);
}
