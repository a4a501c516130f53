// tests/common/mod.rs
//
// Shared helpers: every test gets its own in-memory database and server on a random port.

#![allow(dead_code)]

use reqwest::{Client, Response};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tenderhub::{config::Config, db, routes, state::AppState};

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: Client,
    pub upload_dir: std::path::PathBuf,
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Spawns the app on a random port for testing.
pub async fn spawn_app() -> TestApp {
    // A single long-lived connection keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    spawn_app_with_pool(pool).await
}

/// Spawns the app on a file database opened like production (WAL, pooled connections).
pub async fn spawn_app_on_file() -> TestApp {
    let path = std::env::temp_dir().join(format!("tenderhub-test-{}.db", uuid::Uuid::new_v4()));
    let pool = db::connect(&format!("sqlite://{}", path.display()))
        .await
        .expect("Failed to open file database");
    spawn_app_with_pool(pool).await
}

async fn spawn_app_with_pool(pool: SqlitePool) -> TestApp {
    db::migrate(&pool).await.expect("Failed to migrate database");

    let upload_dir = std::env::temp_dir().join(format!("tenderhub-test-{}", uuid::Uuid::new_v4()));

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        upload_dir: upload_dir.to_string_lossy().to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        admin_username: None,
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: Client::new(),
        upload_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        let mut req = self.client.put(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response {
        let mut req = self.client.delete(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to execute request")
    }

    /// Registers a fresh user with a unique name.
    pub async fn register(&self, prefix: &str) -> TestUser {
        let username = format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8]);
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "password123"
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "registration failed");

        let body: Value = response.json().await.unwrap();
        TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            username,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Registers a user and grants admin rights directly in the database.
    pub async fn register_admin(&self) -> TestUser {
        let admin = self.register("admin").await;
        sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?")
            .bind(admin.id)
            .execute(&self.pool)
            .await
            .unwrap();
        admin
    }

    /// Creates a tender owned by `owner`; it starts pending moderation.
    pub async fn create_tender(&self, owner: &TestUser, title: &str) -> i64 {
        let response = self
            .post(
                "/api/tenders",
                Some(&owner.token),
                json!({
                    "title": title,
                    "description": "Full renovation of a two-room flat",
                    "category": "renovation",
                    "budget": 150000,
                    "location": "Almaty"
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn approve(&self, admin: &TestUser, kind: &str, id: i64) {
        let response = self
            .post(
                &format!("/api/admin/moderation/{}/{}/approve", kind, id),
                Some(&admin.token),
                json!({}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }

    /// Places a valid bid and returns its id.
    pub async fn create_bid(&self, bidder: &TestUser, tender_id: i64, amount: i64) -> i64 {
        let response = self
            .post(
                &format!("/api/tenders/{}/bids", tender_id),
                Some(&bidder.token),
                json!({
                    "amount": amount,
                    "description": "We can start next week",
                    "timeframe": 30,
                    "documents": ["/api/files/license.pdf"]
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn count_notifications(&self, user_id: i64, kind: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND type = ?")
            .bind(user_id)
            .bind(kind)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}
