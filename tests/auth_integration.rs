use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{Platform, Settings};
use chirpy::db::MemoryStore;
use chirpy::startup::run;
use chirpy::state::AppState;
use serde_json::{json, Value};

const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/api/users", &json!({"email": email, "password": password}))
            .await;
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/api/login", &json!({"email": email, "password": password}))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let mut settings = Settings::for_tests(Platform::Dev);
    settings.application.port = port;
    settings.auth.polka_key = POLKA_KEY.to_string();
    let state = AppState::new(&settings, Arc::new(MemoryStore::new()));
    let server = run(listener, state, settings.application.static_dir.clone())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

// --- Registration ---

#[tokio::test]
async fn register_returns_201_without_password_hash() {
    let app = spawn_app();

    let user = app.register("walt@breakingbad.com", "123456789").await;

    assert_eq!(user["email"], "walt@breakingbad.com");
    assert_eq!(user["is_chirpy_red"], false);
    assert!(user["id"].is_string());
    assert!(user["created_at"].is_string());
    assert!(user.get("hashed_password").is_none());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app();
    app.register("walt@breakingbad.com", "123456789").await;

    let response = app
        .post_json(
            "/api/users",
            &json!({"email": "walt@breakingbad.com", "password": "987654321"}),
        )
        .await;

    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app();
    let test_cases = vec![
        (json!({"email": "not-an-email", "password": "123456789"}), "invalid email"),
        (json!({"email": "walt@breakingbad.com", "password": "short"}), "short password"),
        (json!({"email": "walt@breakingbad.com"}), "missing password"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/api/users", &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
}

// --- Login ---

#[tokio::test]
async fn login_returns_user_and_both_tokens() {
    let app = spawn_app();
    let registered = app.register("walt@breakingbad.com", "123456789").await;

    let body = app.login("walt@breakingbad.com", "123456789").await;

    assert_eq!(body["id"], registered["id"]);
    assert_eq!(body["email"], "walt@breakingbad.com");
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
    let refresh_token = body["refresh_token"].as_str().unwrap();
    assert_eq!(refresh_token.len(), 64);
    assert!(refresh_token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();
    app.register("walt@breakingbad.com", "123456789").await;

    let wrong_password = app
        .post_json(
            "/api/login",
            &json!({"email": "walt@breakingbad.com", "password": "wrong-password"}),
        )
        .await;
    let unknown_email = app
        .post_json(
            "/api/login",
            &json!({"email": "jesse@breakingbad.com", "password": "123456789"}),
        )
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());
    let first: Value = wrong_password.json().await.unwrap();
    let second: Value = unknown_email.json().await.unwrap();
    assert_eq!(first["message"], second["message"]);
    assert_eq!(first["code"], second["code"]);
}

// --- Tokens ---

#[tokio::test]
async fn refresh_revoke_lifecycle() {
    let app = spawn_app();
    app.register("walt@breakingbad.com", "123456789").await;
    let login = app.login("walt@breakingbad.com", "123456789").await;
    let access_token = login["token"].as_str().unwrap();
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let refreshed = app.post_with_bearer("/api/refresh", refresh_token).await;
    assert_eq!(200, refreshed.status().as_u16());
    let refreshed: Value = refreshed.json().await.unwrap();
    assert!(refreshed["token"].is_string());

    let revoked = app.post_with_bearer("/api/revoke", refresh_token).await;
    assert_eq!(204, revoked.status().as_u16());

    let rejected = app.post_with_bearer("/api/refresh", refresh_token).await;
    assert_eq!(401, rejected.status().as_u16());

    // the access token from before the revocation still works
    let update = app
        .client
        .put(&format!("{}/api/users", app.address))
        .bearer_auth(access_token)
        .json(&json!({"email": "walt@breakingbad.com", "password": "123456789"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, update.status().as_u16());
}

#[tokio::test]
async fn refresh_and_revoke_require_a_known_token() {
    let app = spawn_app();

    for path in ["/api/refresh", "/api/revoke"] {
        let missing = app
            .client
            .post(&format!("{}{}", app.address, path))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(401, missing.status().as_u16(), "{} without a token", path);

        let unknown = app.post_with_bearer(path, "deadbeef").await;
        assert_eq!(401, unknown.status().as_u16(), "{} with an unknown token", path);
    }
}

#[tokio::test]
async fn access_token_cannot_be_used_as_refresh_token() {
    let app = spawn_app();
    app.register("walt@breakingbad.com", "123456789").await;
    let login = app.login("walt@breakingbad.com", "123456789").await;

    let response = app
        .post_with_bearer("/api/refresh", login["token"].as_str().unwrap())
        .await;

    assert_eq!(401, response.status().as_u16());
}

// --- Credential updates ---

#[tokio::test]
async fn update_user_changes_credentials() {
    let app = spawn_app();
    app.register("walt@breakingbad.com", "123456789").await;
    let login = app.login("walt@breakingbad.com", "123456789").await;

    let response = app
        .client
        .put(&format!("{}/api/users", app.address))
        .bearer_auth(login["token"].as_str().unwrap())
        .json(&json!({"email": "heisenberg@breakingbad.com", "password": "blue-sky-99"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["email"], "heisenberg@breakingbad.com");

    let old = app
        .post_json(
            "/api/login",
            &json!({"email": "walt@breakingbad.com", "password": "123456789"}),
        )
        .await;
    assert_eq!(401, old.status().as_u16());
    app.login("heisenberg@breakingbad.com", "blue-sky-99").await;
}

#[tokio::test]
async fn update_user_requires_a_valid_access_token() {
    let app = spawn_app();
    let body = json!({"email": "walt@breakingbad.com", "password": "123456789"});

    let missing = app
        .client
        .put(&format!("{}/api/users", app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    let garbage = app
        .client
        .put(&format!("{}/api/users", app.address))
        .bearer_auth("not.a.jwt")
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, missing.status().as_u16());
    assert_eq!(401, garbage.status().as_u16());
}

// --- Webhooks ---

#[tokio::test]
async fn webhook_upgrades_user_with_valid_key() {
    let app = spawn_app();
    let user = app.register("walt@breakingbad.com", "123456789").await;
    let event = json!({"event": "user.upgraded", "data": {"user_id": user["id"]}});

    let response = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .header("Authorization", format!("ApiKey {}", POLKA_KEY))
        .json(&event)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(204, response.status().as_u16());

    let login = app.login("walt@breakingbad.com", "123456789").await;
    assert_eq!(login["is_chirpy_red"], true);
}

#[tokio::test]
async fn webhook_rejects_bad_key_and_ignores_other_events() {
    let app = spawn_app();
    let user = app.register("walt@breakingbad.com", "123456789").await;
    let upgrade = json!({"event": "user.upgraded", "data": {"user_id": user["id"]}});

    let bad_key = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .header("Authorization", "ApiKey wrong-key")
        .json(&upgrade)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, bad_key.status().as_u16());

    let other_event = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .header("Authorization", format!("ApiKey {}", POLKA_KEY))
        .json(&json!({"event": "user.payment_failed", "data": {"user_id": user["id"]}}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(204, other_event.status().as_u16());

    let unknown_user = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .header("Authorization", format!("ApiKey {}", POLKA_KEY))
        .json(&json!({"event": "user.upgraded", "data": {"user_id": uuid::Uuid::new_v4()}}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, unknown_user.status().as_u16());

    let login = app.login("walt@breakingbad.com", "123456789").await;
    assert_eq!(login["is_chirpy_red"], false);
}

#[tokio::test]
async fn webhook_upgrade_without_user_id_is_not_found() {
    let app = spawn_app();

    for data in [json!({}), json!({"user_id": null})] {
        let response = app
            .client
            .post(&format!("{}/api/polka/webhooks", app.address))
            .header("Authorization", format!("ApiKey {}", POLKA_KEY))
            .json(&json!({"event": "user.upgraded", "data": data}))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(404, response.status().as_u16(), "data: {}", data);
    }

    let no_data = app
        .client
        .post(&format!("{}/api/polka/webhooks", app.address))
        .header("Authorization", format!("ApiKey {}", POLKA_KEY))
        .json(&json!({"event": "user.upgraded"}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, no_data.status().as_u16());
}
