use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{Platform, Settings};
use chirpy::db::MemoryStore;
use chirpy::startup::run;
use chirpy::state::AppState;
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

/// A registered and logged-in user
pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestApp {
    async fn signed_in_user(&self, email: &str) -> TestUser {
        let credentials = json!({"email": email, "password": "123456789"});
        let registered = self
            .client
            .post(&format!("{}/api/users", self.address))
            .json(&credentials)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(201, registered.status().as_u16());

        let login: Value = self
            .client
            .post(&format!("{}/api/login", self.address))
            .json(&credentials)
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .expect("Failed to parse response");

        TestUser {
            id: login["id"].as_str().unwrap().to_string(),
            token: login["token"].as_str().unwrap().to_string(),
        }
    }

    async fn post_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/chirps", self.address))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn delete_chirp(&self, token: &str, id: &str) -> reqwest::Response {
        self.client
            .delete(&format!("{}/api/chirps/{}", self.address, id))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let mut settings = Settings::for_tests(Platform::Dev);
    settings.application.port = port;
    let state = AppState::new(&settings, Arc::new(MemoryStore::new()));
    let server = run(listener, state, settings.application.static_dir.clone())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn create_chirp_returns_201_and_masks_profanity() {
    let app = spawn_app();
    let walt = app.signed_in_user("walt@breakingbad.com").await;

    let response = app
        .post_chirp(&walt.token, "I really need a kerfuffle to go to bed sooner, Fornax !")
        .await;

    assert_eq!(201, response.status().as_u16());
    let chirp: Value = response.json().await.unwrap();
    assert_eq!(chirp["body"], "I really need a **** to go to bed sooner, **** !");
    assert_eq!(chirp["user_id"].as_str().unwrap(), walt.id);
}

#[tokio::test]
async fn create_chirp_requires_a_valid_access_token() {
    let app = spawn_app();

    let missing = app
        .client
        .post(&format!("{}/api/chirps", app.address))
        .json(&json!({"body": "hello"}))
        .send()
        .await
        .expect("Failed to execute request.");
    let garbage = app.post_chirp("garbage", "hello").await;

    assert_eq!(401, missing.status().as_u16());
    assert_eq!(401, garbage.status().as_u16());
    assert_eq!(204, app.get("/api/chirps").await.status().as_u16());
}

#[tokio::test]
async fn create_chirp_rejects_long_bodies() {
    let app = spawn_app();
    let walt = app.signed_in_user("walt@breakingbad.com").await;

    let response = app.post_chirp(&walt.token, &"a".repeat(141)).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn list_chirps_filters_and_sorts() {
    let app = spawn_app();
    assert_eq!(204, app.get("/api/chirps").await.status().as_u16());

    let walt = app.signed_in_user("walt@breakingbad.com").await;
    let jesse = app.signed_in_user("jesse@breakingbad.com").await;
    app.post_chirp(&walt.token, "first").await;
    app.post_chirp(&jesse.token, "yo").await;
    app.post_chirp(&walt.token, "third").await;

    let all: Vec<Value> = app.get("/api/chirps").await.json().await.unwrap();
    let bodies: Vec<&str> = all.iter().map(|c| c["body"].as_str().unwrap()).collect();
    assert_eq!(bodies, vec!["first", "yo", "third"]);

    let walts: Vec<Value> = app
        .get(&format!("/api/chirps?author_id={}&sort=desc", walt.id))
        .await
        .json()
        .await
        .unwrap();
    let bodies: Vec<&str> = walts.iter().map(|c| c["body"].as_str().unwrap()).collect();
    assert_eq!(bodies, vec!["third", "first"]);

    let bad_query = app.get("/api/chirps?author_id=not-a-uuid").await;
    assert_eq!(400, bad_query.status().as_u16());
}

#[tokio::test]
async fn get_chirp_by_id() {
    let app = spawn_app();
    let walt = app.signed_in_user("walt@breakingbad.com").await;
    let chirp: Value = app.post_chirp(&walt.token, "Say my name").await.json().await.unwrap();
    let id = chirp["id"].as_str().unwrap();

    let found = app.get(&format!("/api/chirps/{}", id)).await;
    assert_eq!(200, found.status().as_u16());
    let found: Value = found.json().await.unwrap();
    assert_eq!(found["body"], "Say my name");

    let missing = app
        .get(&format!("/api/chirps/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(404, missing.status().as_u16());

    let malformed = app.get("/api/chirps/not-a-uuid").await;
    assert_eq!(400, malformed.status().as_u16());
}

#[tokio::test]
async fn only_the_author_can_delete_a_chirp() {
    let app = spawn_app();
    let walt = app.signed_in_user("walt@breakingbad.com").await;
    let jesse = app.signed_in_user("jesse@breakingbad.com").await;
    let chirp: Value = app.post_chirp(&walt.token, "Say my name").await.json().await.unwrap();
    let id = chirp["id"].as_str().unwrap();

    let forbidden = app.delete_chirp(&jesse.token, id).await;
    assert_eq!(403, forbidden.status().as_u16());
    assert_eq!(200, app.get(&format!("/api/chirps/{}", id)).await.status().as_u16());

    let deleted = app.delete_chirp(&walt.token, id).await;
    assert_eq!(204, deleted.status().as_u16());
    assert_eq!(404, app.get(&format!("/api/chirps/{}", id)).await.status().as_u16());

    let again = app.delete_chirp(&walt.token, id).await;
    assert_eq!(404, again.status().as_u16());
}
