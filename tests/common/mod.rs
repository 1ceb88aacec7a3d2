#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use darshan_api::auth::{password, JwtKeys, Principal, Role};
use darshan_api::database::models::User;
use darshan_api::{routes, AppConfig, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Mint a token for an arbitrary principal with the server's keys
    pub fn token_for(&self, id: &str, role: Role) -> String {
        self.state
            .keys
            .issue(&Principal::new(id, role))
            .expect("failed to issue token")
    }

    /// Insert an account directly into the store and return it with a valid token
    pub async fn seed_user(&self, email: &str, plain_password: &str, role: Role) -> Result<(User, String)> {
        let hash = password::hash_password(plain_password, 4).await?;
        let user = self
            .state
            .users
            .insert(User::new("Seeded User", email, hash, role))
            .await?;
        let token = self.state.keys.issue(&user.principal())?;
        Ok((user, token))
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/api/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Configuration built from explicit variables, never from the process environment
pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: Vec<(String, String)> = vec![
        ("JWT_SECRET".to_string(), TEST_SECRET.to_string()),
        ("BCRYPT_COST".to_string(), "4".to_string()),
    ];
    for (key, value) in extra {
        vars.retain(|(k, _)| k != key);
        vars.push((key.to_string(), value.to_string()));
    }
    AppConfig::from_lookup(|key| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
        .expect("test configuration must be valid")
}

/// Serve `state` on a free local port for the duration of the calling test
pub async fn spawn_with(state: AppState) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let app = routes::build(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let server = TestServer { port, base_url, state };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

/// In-memory server with the default test configuration
pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(AppState::in_memory(test_config(&[]))).await
}

pub async fn register(server: &TestServer, name: &str, email: &str, password: &str) -> Result<reqwest::Response> {
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/register"))
        .json(&json!({ "name": name, "email": email, "password": password }))
        .send()
        .await?;
    Ok(res)
}

/// Assert the standard failure envelope and return its body
pub async fn expect_failure(res: reqwest::Response, status: StatusCode) -> Result<Value> {
    assert_eq!(res.status(), status, "unexpected status");
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false, "failure envelope expected: {}", body);
    assert!(body["message"].is_string(), "message expected: {}", body);
    Ok(body)
}

/// Keys sharing the test secret but with a lifetime already elapsed
pub fn expired_keys() -> JwtKeys {
    JwtKeys::with_lifetime_secs(TEST_SECRET, -60)
}
