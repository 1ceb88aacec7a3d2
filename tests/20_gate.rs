mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use darshan_api::auth::{JwtKeys, Principal, Role};

#[tokio::test]
async fn missing_token_is_rejected_before_the_handler() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::new().get(server.url("/api/users")).send().await?;
    let body = common::expect_failure(res, StatusCode::UNAUTHORIZED).await?;
    assert_eq!(body["message"], "Not authorized, no token");
    assert!(body.get("data").is_none());
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_counts_as_missing() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.token_for("u1", Role::Admin);

    let res = reqwest::Client::new()
        .get(server.url("/api/users"))
        .header("Authorization", format!("Basic {}", token))
        .send()
        .await?;
    let body = common::expect_failure(res, StatusCode::UNAUTHORIZED).await?;
    assert_eq!(body["message"], "Not authorized, no token");
    Ok(())
}

#[tokio::test]
async fn user_role_is_forbidden_from_admin_routes() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.seed_user("devotee@example.com", "secret123", Role::User).await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/users"))
        .bearer_auth(token)
        .send()
        .await?;
    let body = common::expect_failure(res, StatusCode::FORBIDDEN).await?;
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn admin_lists_users() -> Result<()> {
    let server = common::spawn_server().await?;
    server.seed_user("devotee@example.com", "secret123", Role::User).await?;
    let (_, token) = server.seed_user("priest@example.com", "secret123", Role::Admin).await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/users"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    for user in body["data"].as_array().expect("data array") {
        assert!(user.get("password").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::expired_keys().issue(&Principal::new("u1", Role::Admin))?;

    let res = reqwest::Client::new()
        .get(server.url("/api/users"))
        .bearer_auth(token)
        .send()
        .await?;
    let body = common::expect_failure(res, StatusCode::UNAUTHORIZED).await?;
    assert_eq!(body["code"], "TOKEN_EXPIRED");
    Ok(())
}

#[tokio::test]
async fn token_signed_with_another_secret_fails() -> Result<()> {
    let server = common::spawn_server().await?;
    let forged = JwtKeys::with_lifetime_secs("someone-elses-secret", 3600)
        .issue(&Principal::new("u1", Role::Admin))?;

    for token in [forged.as_str(), "not.a.jwt"] {
        let res = reqwest::Client::new()
            .get(server.url("/api/users"))
            .bearer_auth(token)
            .send()
            .await?;
        let body = common::expect_failure(res, StatusCode::UNAUTHORIZED).await?;
        assert_eq!(body["message"], "Not authorized, token failed");
    }
    Ok(())
}

#[tokio::test]
async fn me_for_a_deleted_account_is_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.token_for("ghost", Role::User);

    let res = reqwest::Client::new()
        .get(server.url("/api/auth/me"))
        .bearer_auth(token)
        .send()
        .await?;
    common::expect_failure(res, StatusCode::NOT_FOUND).await?;
    Ok(())
}

#[tokio::test]
async fn unknown_route_lists_available_routes() -> Result<()> {
    let server = common::spawn_server().await?;

    for method in [reqwest::Method::GET, reqwest::Method::POST] {
        let res = reqwest::Client::new()
            .request(method, server.url("/api/nowhere?x=1"))
            .send()
            .await?;
        let body = common::expect_failure(res, StatusCode::NOT_FOUND).await?;
        assert!(body["message"].as_str().unwrap_or_default().contains("/api/nowhere?x=1"));
        let routes = body["availableRoutes"].as_array().expect("availableRoutes");
        assert!(routes.iter().any(|r| r == "POST /api/auth/login"));
    }
    Ok(())
}

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let health = client.get(server.url("/api/health")).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    let health = health.json::<Value>().await?;
    assert_eq!(health["success"], true);
    assert_eq!(health["database"], "connected");
    let timestamp = health["timestamp"].as_str().expect("timestamp");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(), "bad timestamp {}", timestamp);

    let root = client.get(server.url("/")).send().await?;
    assert_eq!(root.status(), StatusCode::OK);
    Ok(())
}


#[tokio::test]
async fn unsupported_method_gets_the_error_envelope() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::new()
        .patch(server.url("/api/temples"))
        .send()
        .await?;
    let body = common::expect_failure(res, StatusCode::METHOD_NOT_ALLOWED).await?;
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    assert_eq!(body["message"], "Method PATCH not allowed on /api/temples");
    Ok(())
}

#[tokio::test]
async fn trailing_slash_reaches_the_same_endpoint() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let anonymous = client.get(server.url("/api/users/")).send().await?;
    common::expect_failure(anonymous, StatusCode::UNAUTHORIZED).await?;

    let (_, admin) = server.seed_user("priest@example.com", "secret123", Role::Admin).await?;
    let res = client.get(server.url("/api/users/")).bearer_auth(admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let health = client.get(server.url("/api/health/")).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}
