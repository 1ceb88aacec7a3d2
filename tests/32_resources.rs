mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use darshan_api::auth::Role;

#[tokio::test]
async fn catalogue_is_public_to_read_and_admin_to_write() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let (_, admin) = server.seed_user("priest@example.com", "secret123", Role::Admin).await?;
    let (_, user) = server.seed_user("devotee@example.com", "secret123", Role::User).await?;

    let denied = client
        .post(server.url("/api/temples"))
        .bearer_auth(&user)
        .json(&json!({ "name": "Meenakshi Amman" }))
        .send()
        .await?;
    common::expect_failure(denied, StatusCode::FORBIDDEN).await?;

    let created = client
        .post(server.url("/api/temples"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Meenakshi Amman", "city": "Madurai", "createdBy": "forged" }))
        .send()
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = created.json::<Value>().await?;
    let id = created["data"]["id"].as_str().expect("generated id").to_string();
    assert_ne!(created["data"]["createdBy"], "forged");

    let listed = client.get(server.url("/api/temples")).send().await?;
    assert_eq!(listed.status(), StatusCode::OK);
    let listed = listed.json::<Value>().await?;
    assert_eq!(listed["count"], 1);

    let one = client.get(server.url(&format!("/api/temples/{}", id))).send().await?;
    assert_eq!(one.status(), StatusCode::OK);
    assert_eq!(one.json::<Value>().await?["data"]["city"], "Madurai");

    Ok(())
}

#[tokio::test]
async fn admin_updates_and_deletes() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let (_, admin) = server.seed_user("priest@example.com", "secret123", Role::Admin).await?;

    let created = client
        .post(server.url("/api/services"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Abhishekam", "price": 501 }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let path = format!("/api/services/{}", created["data"]["id"].as_str().unwrap_or_default());

    let updated = client
        .put(server.url(&path))
        .bearer_auth(&admin)
        .json(&json!({ "price": 1001 }))
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = updated.json::<Value>().await?;
    assert_eq!(updated["data"]["price"], 1001);
    assert_eq!(updated["data"]["name"], "Abhishekam");

    let empty = client
        .put(server.url(&path))
        .bearer_auth(&admin)
        .json(&json!({ "id": "ignored" }))
        .send()
        .await?;
    common::expect_failure(empty, StatusCode::BAD_REQUEST).await?;

    let deleted = client.delete(server.url(&path)).bearer_auth(&admin).send().await?;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = client.get(server.url(&path)).send().await?;
    common::expect_failure(gone, StatusCode::NOT_FOUND).await?;
    Ok(())
}

#[tokio::test]
async fn bookings_need_a_signed_in_user() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let (user, token) = server.seed_user("devotee@example.com", "secret123", Role::User).await?;

    let anonymous = client.get(server.url("/api/bookings")).send().await?;
    common::expect_failure(anonymous, StatusCode::UNAUTHORIZED).await?;

    let booked = client
        .post(server.url("/api/bookings"))
        .bearer_auth(&token)
        .json(&json!({ "service": "darshan", "date": "2026-11-01" }))
        .send()
        .await?;
    assert_eq!(booked.status(), StatusCode::CREATED);
    let booked = booked.json::<Value>().await?;
    assert_eq!(booked["data"]["createdBy"], user.id.as_str());

    let cancel = client
        .delete(server.url(&format!("/api/bookings/{}", booked["data"]["id"].as_str().unwrap_or_default())))
        .bearer_auth(&token)
        .send()
        .await?;
    common::expect_failure(cancel, StatusCode::FORBIDDEN).await?;
    Ok(())
}

#[tokio::test]
async fn malformed_json_gets_the_error_envelope() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, admin) = server.seed_user("priest@example.com", "secret123", Role::Admin).await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/content"))
        .bearer_auth(&admin)
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    let body = common::expect_failure(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
