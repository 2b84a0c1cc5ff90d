#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use project_service_api::app::{app, AppState};
use project_service_api::auth::AuthSettings;
use project_service_api::database::MemoryStoreProvider;

pub const TEST_SECRET: &str = "integration-test-secret";

/// In-process server over a fresh in-memory store, bound to a free port
pub struct TestServer {
    pub base_url: String,
    pub stores: MemoryStoreProvider,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let stores = MemoryStoreProvider::new();
        let state = AppState::new(Arc::new(stores.clone()), AuthSettings::new(TEST_SECRET, ""));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            base_url,
            stores,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        read(res).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        read(res).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await?;
        read(res).await
    }

    pub async fn delete_with_body(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        read(res).await
    }

    /// Create a project as `token` and return its id
    pub async fn create_project(&self, token: &str, description: &str) -> Result<String> {
        let (status, body) = self
            .post("/projects/", token, json!({ "description": description }))
            .await?;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body["project_id"]
            .as_str()
            .map(str::to_string)
            .context("missing project_id")
    }
}

async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

/// Signed HS256 token for a fresh caller
pub fn token() -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    (user_id, token_for(user_id))
}

pub fn token_for(user_id: Uuid) -> String {
    sign(json!({
        "sub": user_id,
        "role": "authenticated",
        "exp": chrono::Utc::now().timestamp() + 3600,
    }))
}

pub fn sign(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("sign test token")
}
