//! HTTP identity backend and profile store against a mock server.

use std::sync::Arc;

use resilink_common::{BackendConfig, Email, ErrorKind, IdentityId, Password};
use resilink_identity::{
    HttpIdentityBackend, HttpProfileStore, IdentityBackend, IdentityReconciler, Intent,
    ProfileStore, ProfileUpsert, ReconciliationResult,
};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, header_exists, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn config(server: &MockServer) -> BackendConfig {
    BackendConfig::new(server.uri(), "anon-key").unwrap()
}

#[tokio::test]
async fn test_signup_with_session_is_usable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(header("apikey", "anon-key"))
        .and(body_partial_json(json!({ "email": "a@b.c" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "user": { "id": "user-1", "email": "a@b.c" }
        })))
        .mount(&server)
        .await;

    let backend = HttpIdentityBackend::new(config(&server)).unwrap();
    let response = backend
        .create_identity(&Email::new("a@b.c").unwrap(), &Password::new("pw").unwrap())
        .await
        .unwrap();

    assert!(!response.requires_confirmation());
    assert_eq!(response.identity_id().unwrap().as_str(), "user-1");
}

#[tokio::test]
async fn test_signup_without_session_awaits_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-2",
            "email": "a@b.c",
            "confirmation_sent_at": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let backend = HttpIdentityBackend::new(config(&server)).unwrap();
    let response = backend
        .create_identity(&Email::new("a@b.c").unwrap(), &Password::new("pw").unwrap())
        .await
        .unwrap();

    assert!(response.requires_confirmation());
}

#[tokio::test]
async fn test_error_message_surfaces_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let backend = HttpIdentityBackend::new(config(&server)).unwrap();
    let err = backend
        .verify_identity(&Email::new("a@b.c").unwrap(), &Password::new("pw").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.detail(), "Invalid login credentials");
}

#[tokio::test]
async fn test_profile_upsert_merges_on_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("on_conflict", "id"))
        .and(header_exists("Prefer"))
        .and(body_partial_json(json!([{ "id": "user-1", "email": "a@b.c" }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpProfileStore::new(config(&server)).unwrap();
    store
        .upsert_profile(&ProfileUpsert {
            id: IdentityId::new("user-1").unwrap(),
            email: Email::new("a@b.c").unwrap(),
            full_name: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_profile_reads_first_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "user-1",
            "email": "a@b.c",
            "full_name": null,
            "created_at": "2024-01-01T00:00:00+00:00"
        }])))
        .mount(&server)
        .await;

    let store = HttpProfileStore::new(config(&server)).unwrap();
    let profile = store
        .get_profile(&IdentityId::new("user-1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.email, "a@b.c");
    assert!(profile.full_name.is_none());
}

#[tokio::test]
async fn test_duplicate_signup_then_missing_relation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "msg": "User already registered"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "user": { "id": "user-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "42P01",
            "message": "relation \"public.profiles\" does not exist"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = IdentityReconciler::new(
        Arc::new(HttpIdentityBackend::new(config(&server)).unwrap()),
        Arc::new(HttpProfileStore::new(config(&server)).unwrap()),
    );
    let result = reconciler
        .reconcile(Intent::Register, "a@b.c", "pw", None)
        .await;

    assert_eq!(
        result,
        ReconciliationResult::Failed(ErrorKind::SchemaNotReady, "profile store not initialized".into())
    );
}
