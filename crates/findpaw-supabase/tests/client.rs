//! Integration tests for `SupabaseClient` using wiremock HTTP mocks.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use findpaw_core::{LostPostStatus, NewSighting};
use findpaw_supabase::{
    handle_callback, AuthError, CallbackParams, SessionStore, SupabaseClient, SupabaseError,
};
use uuid::Uuid;
use wiremock::matchers::{
    body_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> SupabaseClient {
    SupabaseClient::with_base_url(base_url, "anon-key", 30)
        .expect("client construction should not fail")
}

fn session_json(user_id: Uuid) -> serde_json::Value {
    serde_json::json!({
        "access_token": "access",
        "refresh_token": "refresh",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": { "id": user_id, "email": "walker@example.com" }
    })
}

#[tokio::test]
async fn insert_sighting_posts_row_with_minimal_return() {
    let server = MockServer::start().await;
    let sighted_at = Utc.with_ymd_and_hms(2026, 10, 1, 3, 15, 0).unwrap();
    let row = NewSighting {
        image_url: "https://cdn/x.jpg".into(),
        latitude: 37.5,
        longitude: 127.0,
        breed: Some("Beagle".into()),
        color: None,
        features: Some(vec!["collar".into()]),
        description: None,
        sighted_at,
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/sightings"))
        .and(header("apikey", "anon-key"))
        .and(header("Prefer", "return=minimal"))
        .and(body_json(serde_json::json!({
            "image_url": "https://cdn/x.jpg",
            "latitude": 37.5,
            "longitude": 127.0,
            "breed": "Beagle",
            "color": null,
            "features": ["collar"],
            "description": null,
            "sighted_at": "2026-10-01T03:15:00Z"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .insert_sighting(&row)
        .await
        .expect("insert should succeed");
}

#[tokio::test]
async fn insert_sighting_surfaces_postgrest_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/sightings"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "23502",
            "message": "null value in column \"image_url\"",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let row = NewSighting {
        image_url: String::new(),
        latitude: 0.0,
        longitude: 0.0,
        breed: None,
        color: None,
        features: None,
        description: None,
        sighted_at: Utc::now(),
    };
    let err = test_client(&server.uri())
        .insert_sighting(&row)
        .await
        .expect_err("insert should fail");
    assert!(
        matches!(err, SupabaseError::Api { status: 400, ref code, .. } if code.as_deref() == Some("23502")),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn list_recent_sightings_filters_and_orders() {
    let server = MockServer::start().await;
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/sightings"))
        .and(query_param("sighted_at", "gte.2026-09-18T00:00:00.000Z"))
        .and(query_param("order", "sighted_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "6f1c1f64-3c52-4d2e-9a0e-6a9a0d2b8f10",
                "latitude": 37.51,
                "longitude": 127.02,
                "image_url": "https://cdn/a.jpg",
                "breed": "Poodle",
                "color": null,
                "features": null,
                "description": "near the park",
                "sighted_at": "2026-10-17T09:00:00+00:00"
            }
        ])))
        .mount(&server)
        .await;

    let sightings = test_client(&server.uri())
        .list_recent_sightings(30, now)
        .await
        .expect("list should succeed");
    assert_eq!(sightings.len(), 1);
    assert_eq!(sightings[0].breed.as_deref(), Some("Poodle"));
}

#[tokio::test]
async fn list_recent_sightings_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/sightings"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/sightings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let sightings = test_client(&server.uri())
        .with_retry_policy(2, 0)
        .list_recent_sightings(30, Utc::now())
        .await
        .expect("second attempt should succeed");
    assert!(sightings.is_empty());
}

#[tokio::test]
async fn fetch_or_create_profile_creates_missing_row() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{user_id}")))
        .respond_with(ResponseTemplate::new(406).set_body_json(serde_json::json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned",
            "details": "The result contains 0 rows",
            "hint": null
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": user_id,
            "nickname": "Choco123",
            "created_at": "2026-10-18T00:00:00+00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = test_client(&server.uri())
        .fetch_or_create_profile(user_id)
        .await
        .expect("profile should be created");
    assert_eq!(profile.id, user_id);
    assert_eq!(profile.nickname.as_deref(), Some("Choco123"));
}

#[tokio::test]
async fn fetch_or_create_profile_fills_blank_nickname() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": user_id,
            "nickname": null,
            "created_at": "2026-10-18T00:00:00+00:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let profile = test_client(&server.uri())
        .fetch_or_create_profile(user_id)
        .await
        .expect("profile should load");
    let nickname = profile.nickname.expect("nickname filled");
    assert!(!nickname.is_empty());
}

#[tokio::test]
async fn user_stats_counts_by_status_and_tolerates_partial_failure() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/lost_posts"))
        .and(query_param_is_missing("status"))
        .and(header("Prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "0-4/5"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/lost_posts"))
        .and(query_param("status", format!("eq.{}", LostPostStatus::Searching.as_str())))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "0-2/3"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/lost_posts"))
        .and(query_param("status", "eq.found"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "0-1/2"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/lost_posts"))
        .and(query_param("status", "eq.closed"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let stats = test_client(&server.uri())
        .user_stats(user_id)
        .await
        .expect("total count should succeed");
    assert_eq!(stats.lost_posts_count, 5);
    assert_eq!(stats.searching_count, 3);
    assert_eq!(stats.found_count, 2);
    assert_eq!(stats.closed_count, 0);
}

#[tokio::test]
async fn user_stats_fails_when_total_fails() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/lost_posts"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = test_client(&server.uri()).user_stats(Uuid::new_v4()).await;
    assert!(matches!(result, Err(SupabaseError::Api { status: 401, .. })));
}

#[tokio::test]
async fn upload_returns_bucket_relative_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/images/sightings/abc.jpg"))
        .and(header("x-upsert", "false"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "Key": "images/sightings/abc.jpg" })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let stored = client
        .upload("sightings/abc.jpg", vec![0xFF, 0xD8, 0xFF], "image/jpeg")
        .await
        .expect("upload should succeed");
    assert_eq!(stored, "sightings/abc.jpg");
    assert_eq!(
        client.public_url(&stored),
        format!("{}/storage/v1/object/public/images/sightings/abc.jpg", server.uri())
    );
}

#[tokio::test]
async fn upload_surfaces_duplicate_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/images/sightings/dup.jpg"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "statusCode": "409",
            "error": "Duplicate",
            "message": "The resource already exists"
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .upload("sightings/dup.jpg", vec![1, 2, 3], "image/jpeg")
        .await
        .expect_err("duplicate should fail");
    assert!(
        matches!(err, SupabaseError::Api { status: 409, ref code, .. } if code.as_deref() == Some("Duplicate")),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn exchange_code_records_session_via_callback() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "pkce"))
        .and(body_json(serde_json::json!({
            "auth_code": "the-code",
            "code_verifier": "the-verifier"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(user_id)))
        .mount(&server)
        .await;

    let sessions = SessionStore::new();
    let params = CallbackParams {
        code: Some("the-code".into()),
        ..CallbackParams::default()
    };
    let outcome = handle_callback(&test_client(&server.uri()), &sessions, &params, "the-verifier").await;

    assert_eq!(outcome.redirect_to, "/map");
    assert!(outcome.error.is_none());
    assert_eq!(sessions.get_session().map(|s| s.user.id), Some(user_id));
}

#[tokio::test]
async fn failed_exchange_redirects_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error_code": "bad_code_verifier",
            "msg": "code challenge does not match previously saved code verifier"
        })))
        .mount(&server)
        .await;

    let sessions = SessionStore::new();
    let params = CallbackParams {
        code: Some("stale".into()),
        ..CallbackParams::default()
    };
    let outcome = handle_callback(&test_client(&server.uri()), &sessions, &params, "v").await;

    assert!(outcome.redirect_to.starts_with("/map?error="));
    assert_eq!(outcome.delay, Duration::from_secs(2));
    assert!(sessions.get_session().is_none());
}

#[tokio::test]
async fn exchange_times_out_independently_of_http_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json(Uuid::new_v4()))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let result = test_client(&server.uri())
        .exchange_code_with_timeout("code", "verifier", Duration::from_millis(50))
        .await;
    assert!(matches!(result, Err(AuthError::LoginTimeout(_))), "got {result:?}");
}

#[tokio::test]
async fn get_user_returns_none_for_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": 401,
            "error_code": "bad_jwt",
            "msg": "invalid JWT"
        })))
        .mount(&server)
        .await;

    let user = test_client(&server.uri())
        .get_user("expired")
        .await
        .expect("401 maps to None");
    assert!(user.is_none());
}
