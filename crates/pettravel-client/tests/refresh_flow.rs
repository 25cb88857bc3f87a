//! Integration tests for login, token refresh and forced logout.
//!
//! Uses wiremock for HTTP mocking.

use std::sync::Arc;
use std::time::Duration;

use pettravel_client::models::{AuthTokens, Pet, User};
use pettravel_client::session::ACCESS_TOKEN_KEY;
use pettravel_client::{
    ApiError, ClientConfig, Endpoint, MemoryStorage, NetworkErrorKind, PetTravelClient,
    RefreshState, SessionEvent, SessionStorage, TokenStore,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// =============================================================================
// Helpers
// =============================================================================

fn user_json() -> Value {
    json!({
        "id": 1,
        "username": "rex_owner",
        "email": "owner@example.com",
        "date_joined": "2024-01-01T00:00:00Z"
    })
}

fn user() -> User {
    serde_json::from_value(user_json()).unwrap()
}

fn client_for(server: &MockServer, timeout: Duration) -> PetTravelClient {
    let config = ClientConfig::new(&format!("{}/api", server.uri()))
        .unwrap()
        .with_request_timeout(timeout);
    PetTravelClient::new(config, Arc::new(TokenStore::in_memory())).unwrap()
}

fn signed_in_client(server: &MockServer) -> PetTravelClient {
    let client = client_for(server, Duration::from_secs(5));
    client
        .store()
        .set_session(
            user(),
            AuthTokens {
                access: "a1".into(),
                refresh: "r1".into(),
            },
        )
        .unwrap();
    client
}

fn no_auth_header(req: &Request) -> bool {
    !req.headers.contains_key("authorization")
}

async fn mount_pets(server: &MockServer, token: &str, status: u16) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!([]))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({"detail": "Token is invalid or expired"}))
    };
    Mock::given(method("GET"))
        .and(path("/api/pets/"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(template)
        .mount(server)
        .await;
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"email": "owner@example.com", "password": "Secret!123"})))
        .and(no_auth_header)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json(),
            "tokens": {"access": "a1", "refresh": "r1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let mut events = client.store().subscribe();

    let logged_in = client.login("owner@example.com", "Secret!123").await.unwrap();

    assert_eq!(logged_in.id, 1);
    assert!(client.is_authenticated());
    assert_eq!(
        client.store().tokens(),
        Some(AuthTokens {
            access: "a1".into(),
            refresh: "r1".into()
        })
    );
    assert_eq!(client.store().user().unwrap().username, "rex_owner");
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn { user_id: 1 });
}

#[tokio::test]
async fn test_failed_login_is_not_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let err = client.login("owner@example.com", "wrong").await.unwrap_err();

    assert!(matches!(err, ApiError::Auth { login_required: false, .. }));
    // The existing session is untouched.
    assert_eq!(client.store().access_token().as_deref(), Some("a1"));
}

// =============================================================================
// Refresh and retry
// =============================================================================

#[tokio::test]
async fn test_401_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    mount_pets(&server, "a2", 200).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .and(no_auth_header)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let mut events = client.store().subscribe();

    let pets = client.pets().await.unwrap();

    assert!(pets.is_empty());
    assert_eq!(
        client.store().tokens(),
        Some(AuthTokens {
            access: "a2".into(),
            refresh: "r1".into()
        })
    );
    assert_eq!(client.refresh_calls(), 1);
    assert_eq!(client.refresh_state(), RefreshState::Idle);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::TokenRefreshed);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    mount_pets(&server, "a2", 200).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a2", "refresh": "r2"})),
        )
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    client.pets().await.unwrap();

    let snapshot = client.store().snapshot();
    assert_eq!(snapshot.refresh_token(), Some("r2"));
}

#[tokio::test]
async fn test_refresh_rejection_forces_logout() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let mut events = client.store().subscribe();

    let err = client.pets().await.unwrap_err();

    assert!(err.requires_login());
    assert!(!client.is_authenticated());
    assert_eq!(client.store().tokens(), None);
    assert_eq!(client.store().user(), None);
    assert_eq!(client.refresh_state(), RefreshState::Failed);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn test_retry_401_is_not_refreshed_again() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    Mock::given(method("GET"))
        .and(path("/api/pets/"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let err = client.pets().await.unwrap_err();

    assert!(matches!(err, ApiError::Auth { status: 401, login_required: false, .. }));
    assert_eq!(client.refresh_calls(), 1);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    mount_pets(&server, "a2", 200).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.refetch::<Vec<Pet>>(Endpoint::Pets).await })
        })
        .collect();

    for task in tasks {
        let pets = task.await.unwrap().unwrap();
        assert!(pets.is_empty());
    }
    assert_eq!(client.refresh_calls(), 1);
    assert_eq!(client.store().access_token().as_deref(), Some("a2"));
}

#[tokio::test]
async fn test_refresh_validation_error_forces_logout() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": ""})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"refresh": ["This field may not be blank."]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    client
        .store()
        .set_session(
            user(),
            AuthTokens {
                access: "a1".into(),
                refresh: String::new(),
            },
        )
        .unwrap();

    let err = client.pets().await.unwrap_err();
    assert!(err.requires_login());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_missing_refresh_token_forces_logout() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(0)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    storage.set(ACCESS_TOKEN_KEY, "a1").unwrap();
    let store = Arc::new(TokenStore::load(storage.clone()));
    assert!(store.is_authenticated());

    let config = ClientConfig::new(&format!("{}/api", server.uri())).unwrap();
    let client = PetTravelClient::new(config, store).unwrap();
    let mut events = client.store().subscribe();

    let err = client.pets().await.unwrap_err();

    assert!(err.requires_login());
    assert_eq!(client.refresh_calls(), 0);
    assert_eq!(client.refresh_state(), RefreshState::Failed);
    assert!(!client.is_authenticated());
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn test_abandoned_refresh_returns_to_idle() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let task = {
        let client = client.clone();
        tokio::spawn(async move { client.pets().await })
    };

    for _ in 0..100 {
        if client.refresh_state() == RefreshState::Refreshing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(client.refresh_state(), RefreshState::Refreshing);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(client.refresh_state(), RefreshState::Idle);
    assert!(client.is_authenticated());
    assert_eq!(client.store().access_token().as_deref(), Some("a1"));
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test]
async fn test_timeout_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/countries/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_millis(200));
    let err = client.countries().await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Network {
            kind: NetworkErrorKind::Timeout,
            ..
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_refresh_timeout_keeps_session() {
    let server = MockServer::start().await;
    mount_pets(&server, "a1", 401).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_millis(200));
    client
        .store()
        .set_session(
            user(),
            AuthTokens {
                access: "a1".into(),
                refresh: "r1".into(),
            },
        )
        .unwrap();

    let err = client.pets().await.unwrap_err();

    assert!(matches!(err, ApiError::Network { .. }));
    assert!(client.is_authenticated());
    assert_eq!(client.store().access_token().as_deref(), Some("a1"));
    assert_eq!(client.refresh_state(), RefreshState::Idle);
}
