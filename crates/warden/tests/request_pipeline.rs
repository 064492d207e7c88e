//! Integration tests for the request pipeline: credential attachment,
//! exclusions, rejection, and body normalization.

mod common;

use std::sync::Arc;

use common::*;
use serde_json::json;
use warden::prelude::*;
use warden_session::{EXPIRY_KEY, TOKEN_KEY, USER_KEY};

// =========================================================================
// Credential attachment
// =========================================================================

#[tokio::test]
async fn test_send_attaches_bearer_and_json_headers() {
    let h = signed_in().await;

    h.manager
        .send(HttpRequest::get("/orders"))
        .await
        .unwrap();

    let request = h.transport.last_request();
    let expected = format!("Bearer {}", token());
    assert_eq!(request.headers.get("authorization"), Some(expected.as_str()));
    assert_eq!(request.headers.get("Accept"), Some("application/json"));
    assert_eq!(request.headers.get("Content-Type"), Some("application/json"));
}

#[tokio::test]
async fn test_send_multipart_leaves_content_type_to_transport() {
    let h = signed_in().await;
    let parts = vec![
        FormPart {
            name: "name".into(),
            value: FormValue::Text("Alice".into()),
        },
        FormPart {
            name: "avatar".into(),
            value: FormValue::File {
                file_name: "me.png".into(),
                content_type: Some("image/png".into()),
                bytes: vec![0x89, b'P', b'N', b'G'],
            },
        },
    ];

    h.manager
        .send(HttpRequest::post("/user/avatar").multipart(parts))
        .await
        .unwrap();

    let request = h.transport.last_request();
    assert!(request.headers.contains("Authorization"));
    assert!(request.headers.contains("Accept"));
    assert!(!request.headers.contains("Content-Type"));
}

// =========================================================================
// Excluded endpoints
// =========================================================================

#[tokio::test]
async fn test_excluded_endpoint_without_session_goes_out_bare() {
    let mut h = harness();

    h.manager
        .send(HttpRequest::post("/password/reset").json(&json!({ "token": "t" })).unwrap())
        .await
        .unwrap();

    let request = h.transport.last_request();
    assert!(request.headers.is_empty());
    assert!(h.drain_routes().is_empty(), "excluded calls never force a logout");
}

#[tokio::test]
async fn test_excluded_endpoint_with_session_carries_no_token() {
    let h = signed_in().await;

    h.manager.send(HttpRequest::get("/status")).await.unwrap();

    assert!(!h.transport.last_request().headers.contains("Authorization"));
    assert!(h.manager.is_authenticated());
}

#[tokio::test]
async fn test_excluded_endpoint_matches_despite_query_and_prefix() {
    let mut h = harness();

    h.manager
        .send(HttpRequest::get("/api/v1/password/reset?lang=fr"))
        .await
        .unwrap();

    assert!(h.transport.last_request().headers.is_empty());
    assert!(h.drain_routes().is_empty());
}

#[tokio::test]
async fn test_excluded_endpoint_failure_passes_through() {
    let mut h = signed_in().await;
    h.transport.reply(401, json!({ "message": "bad reset token" }));

    let err = h
        .manager
        .send(HttpRequest::post("/password/reset"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unclassified(_)));
    assert_eq!(err.status(), 401);
    assert_eq!(err.server_message(), Some("bad reset token"));
    assert!(h.manager.is_authenticated(), "session untouched");
    assert!(h.drain_routes().is_empty());
}

// =========================================================================
// Rejected credentials
// =========================================================================

#[tokio::test]
async fn test_protected_call_without_session_forces_logout_and_still_sends() {
    let mut h = harness();

    let response = h.manager.send(HttpRequest::get("/orders")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(h.transport.request_count(), 1);
    assert!(h.transport.last_request().headers.is_empty());
    assert_eq!(h.drain_routes(), vec![Route::Login]);
    assert_eq!(h.manager.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_expired_session_forces_logout_on_next_request() {
    let mut h = signed_in().await;
    h.clock.advance(DAY_MS);

    h.manager.send(HttpRequest::get("/orders")).await.unwrap();

    assert!(!h.transport.last_request().headers.contains("Authorization"));
    assert!(!h.manager.is_authenticated());
    assert!(h.storage.is_empty());
    assert_eq!(h.drain_routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_malformed_token_forces_logout() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_many(&[
            (USER_KEY, r#"{"id":1,"name":"alice"}"#),
            (TOKEN_KEY, "not-a-token"),
            (EXPIRY_KEY, &(T0 + DAY_MS).to_string()),
        ])
        .unwrap();
    let mut h = harness_with_storage(storage);
    assert!(h.manager.is_authenticated());

    h.manager.send(HttpRequest::get("/orders")).await.unwrap();

    assert!(!h.transport.last_request().headers.contains("Authorization"));
    assert!(!h.manager.is_authenticated());
    assert_eq!(h.persisted_token(), None);
    assert_eq!(h.drain_routes(), vec![Route::Login]);
}

// =========================================================================
// Normalization
// =========================================================================

#[tokio::test]
async fn test_success_body_text_is_decoded() {
    let h = signed_in().await;
    h.transport.reply(
        200,
        json!({
            "message": "Profil mis &agrave; jour",
            "items": [{ "label": "Caf\\u00e9" }, { "label": "Cr%C3%A8me" }],
            "count": 2,
        }),
    );

    let response = h.manager.send(HttpRequest::get("/menu")).await.unwrap();

    assert_eq!(response.message(), Some("Profil mis à jour"));
    let body = response.body.unwrap();
    assert_eq!(body["items"][0]["label"], json!("Café"));
    assert_eq!(body["items"][1]["label"], json!("Crème"));
    assert_eq!(body["count"], json!(2));
}

#[tokio::test]
async fn test_error_body_text_is_decoded() {
    let h = signed_in().await;
    h.transport.reply(
        422,
        json!({ "message": "Donn&eacute;es invalides", "errors": { "email": ["d&#233;j&#224; pris"] } }),
    );

    let err = h
        .manager
        .send(HttpRequest::post("/orders"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), 422);
    assert_eq!(err.server_message(), Some("Données invalides"));
    assert_eq!(err.user_message(), "Some of the submitted information is invalid.");
    let ApiError::Unclassified(failure) = &err else {
        panic!("422 should pass through, got {err:?}");
    };
    assert_eq!(failure.body().unwrap()["errors"]["email"][0], json!("déjà pris"));
    assert!(h.manager.is_authenticated());
}

#[tokio::test]
async fn test_empty_success_body_stays_empty() {
    let h = signed_in().await;
    h.transport.reply_empty(204);

    let response = h.manager.send(HttpRequest::delete("/orders/9")).await.unwrap();

    assert_eq!(response.status, 204);
    assert!(response.body.is_none());
}

#[tokio::test]
async fn test_not_found_passes_through_untouched() {
    let mut h = signed_in().await;
    h.transport.reply(404, json!({ "message": "Not Found" }));

    let err = h
        .manager
        .send(HttpRequest::get("/missing"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Unclassified);
    assert_eq!(err.status(), 404);
    assert_eq!(err.user_message(), "Not Found");
    assert!(h.manager.is_authenticated());
    assert!(h.manager.notices().current().is_none());
    assert!(h.drain_routes().is_empty());
}
