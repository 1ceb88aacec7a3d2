mod common;

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use darshan_api::{AppState, StartupError};

#[tokio::test]
async fn degraded_server_stays_healthy_and_answers_503() -> Result<()> {
    let state = AppState::connect(common::test_config(&[])).await?;
    let server = common::spawn_with(state).await?;
    let client = reqwest::Client::new();

    let health = client.get(server.url("/api/health")).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.json::<Value>().await?["database"], "unavailable");

    let temples = client.get(server.url("/api/temples")).send().await?;
    common::expect_failure(temples, StatusCode::SERVICE_UNAVAILABLE).await?;

    let login = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "devotee@example.com", "password": "secret123" }))
        .send()
        .await?;
    common::expect_failure(login, StatusCode::SERVICE_UNAVAILABLE).await?;
    Ok(())
}

#[tokio::test]
async fn fail_fast_refuses_to_build_without_a_database() {
    let config = common::test_config(&[("DB_STARTUP_POLICY", "fail-fast")]);
    let result = AppState::connect(config).await;
    assert!(matches!(result, Err(StartupError::Database(_))));
}

#[test]
fn binary_exits_when_jwt_secret_is_missing() -> Result<()> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_darshan-api"))
        .env_remove("JWT_SECRET")
        .env_remove("MONGO_URI")
        .env("PORT", portpicker::pick_unused_port().unwrap_or(0).to_string())
        .current_dir(std::env::temp_dir())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(status) = child.try_wait()? {
            assert!(!status.success(), "startup without JWT_SECRET must fail");
            return Ok(());
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            anyhow::bail!("server kept running without JWT_SECRET");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
