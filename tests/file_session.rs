#![allow(clippy::unwrap_used, clippy::expect_used)]

use authfetch::{
    navigation::MemoryNavigator,
    session::{AuthUser, FileStore, Session, SessionStore},
    AuthenticatedClient, ClientConfig,
};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::{fs, net::TcpListener, path::PathBuf, sync::Arc};
use wiremock::matchers::{header, method, path as path_matcher};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FileGuard(PathBuf);

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn session_file() -> (PathBuf, FileGuard) {
    let path = std::env::temp_dir().join(format!("authfetch-it-{}.json", uuid::Uuid::new_v4()));
    (path.clone(), FileGuard(path))
}

fn user() -> AuthUser {
    serde_json::from_value(json!({
        "id": "42",
        "email": "ada@example.test",
        "role": "user"
    }))
    .unwrap()
}

#[tokio::test]
async fn refreshed_tokens_persist_across_store_instances() {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let (path, _guard) = session_file();

    Session::new(Arc::new(FileStore::new(&path)))
        .establish(
            &SecretString::from("old".to_string()),
            &SecretString::from("refresh-1".to_string()),
            Some(&user()),
        )
        .unwrap();

    Mock::given(method("GET"))
        .and(path_matcher("/v1/me"))
        .and(header("Authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_matcher("/v1/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_matcher("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "new",
            "refreshToken": "refresh-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AuthenticatedClient::new(
        ClientConfig::new(server.uri()),
        Arc::new(FileStore::new(&path)),
        Arc::new(MemoryNavigator::default()),
    )
    .unwrap();

    let response = client.get("/v1/me").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reopened = Session::new(Arc::new(FileStore::new(&path)));
    assert_eq!(
        reopened.access_token().unwrap().unwrap().expose_secret(),
        "new"
    );
    assert_eq!(
        reopened.refresh_token().unwrap().unwrap().expose_secret(),
        "refresh-2"
    );
    assert_eq!(reopened.user().unwrap(), Some(user()));
}

#[tokio::test]
async fn teardown_clears_session_file() {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let (path, _guard) = session_file();

    let store = Arc::new(FileStore::new(&path));
    store
        .set(&[("accessToken", "old"), ("refreshToken", "r"), ("theme", "dark")])
        .unwrap();

    Mock::given(method("GET"))
        .and(path_matcher("/v1/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_matcher("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let navigator = Arc::new(MemoryNavigator::default());
    let client = AuthenticatedClient::new(
        ClientConfig::new(server.uri()),
        store.clone(),
        navigator.clone(),
    )
    .unwrap();

    let response = client.get("/v1/me").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("accessToken").unwrap(), None);
    assert_eq!(reopened.get("refreshToken").unwrap(), None);
    assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(navigator.history(), vec!["/sign-in?reason=expired".to_string()]);
}
