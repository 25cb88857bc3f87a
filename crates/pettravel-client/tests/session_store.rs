//! Integration tests for persisted sessions.

use std::sync::Arc;

use pettravel_client::models::AuthTokens;
use pettravel_client::session::{ACCESS_TOKEN_KEY, USER_KEY};
use pettravel_client::{ClientConfig, FileStorage, PetTravelClient, SessionStorage, TokenStore};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "id": 4,
                "username": "cat_person",
                "email": "cats@example.com",
                "date_joined": "2024-05-01T00:00:00Z"
            },
            "tokens": {"access": "a1", "refresh": "r1"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new(&format!("{}/api", server.uri())).unwrap();

    {
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let client =
            PetTravelClient::new(config.clone(), Arc::new(TokenStore::load(storage))).unwrap();
        client.login("cats@example.com", "Secret!123").await.unwrap();
    }

    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let store = TokenStore::load(storage);
    assert!(store.is_authenticated());
    assert_eq!(
        store.tokens(),
        Some(AuthTokens {
            access: "a1".into(),
            refresh: "r1".into()
        })
    );
    assert_eq!(store.user().unwrap().username, "cat_person");
}

#[test]
fn test_logout_removes_persisted_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    storage.set(ACCESS_TOKEN_KEY, "a1").unwrap();
    storage
        .set(
            USER_KEY,
            r#"{"id":1,"username":"u","email":"u@example.com","date_joined":"2024-01-01"}"#,
        )
        .unwrap();

    let store = TokenStore::load(storage.clone());
    assert!(store.is_authenticated());

    store.clear_session();
    store.clear_session();

    assert!(!store.is_authenticated());
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[test]
fn test_corrupt_user_is_dropped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    storage.set(ACCESS_TOKEN_KEY, "a1").unwrap();
    storage.set(USER_KEY, "{not json").unwrap();

    let store = TokenStore::load(storage.clone());

    assert!(store.is_authenticated());
    assert_eq!(store.user(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}
