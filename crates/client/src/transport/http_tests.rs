// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::error::GENERIC_ERROR;

fn client() -> AuthHttpClient {
    // reqwest's rustls-no-provider build needs a process-level provider.
    let _ = rustls::crypto::ring::default_provider().install_default();
    AuthHttpClient::new(
        "http://127.0.0.1:1".to_owned(),
        Arc::new(CredentialStore::new()),
        Duration::from_secs(1),
    )
}

#[test]
fn error_from_body_reads_the_error_field() {
    let err = error_from_body(StatusCode::UNAUTHORIZED, br#"{"error":"token expired"}"#);
    match err {
        ClientError::Unauthorized { message } => {
            assert_eq!(message.as_deref(), Some("token expired"));
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[test]
fn error_from_body_falls_back_to_detail() {
    let err = error_from_body(StatusCode::FORBIDDEN, br#"{"detail":"not allowed"}"#);
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message.as_deref(), Some("not allowed"));
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn error_from_body_tolerates_non_json() {
    let err = error_from_body(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
    match &err {
        ClientError::Status { status, message } => {
            assert_eq!(*status, 502);
            assert_eq!(*message, None);
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert_eq!(err.user_message(), GENERIC_ERROR);
}

#[test]
fn error_from_body_flattens_field_keyed_validation_errors() {
    let err = error_from_body(
        StatusCode::BAD_REQUEST,
        br#"{"email":["This email is already registered."]}"#,
    );
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message.as_deref(), Some("email: This email is already registered."));
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn harvest_tokens_stores_both_tokens() {
    let client = client();
    let body = serde_json::json!({ "access_token": "a1", "refresh_token": "r1" });
    client.harvest_tokens(&body);
    assert_eq!(client.store().access_token().as_deref(), Some("a1"));
    assert_eq!(client.store().refresh_token().as_deref(), Some("r1"));
}

#[test]
fn harvest_tokens_ignores_unrelated_bodies() {
    let client = client();
    client.harvest_tokens(&serde_json::json!({ "id": 1, "username": "ada" }));
    assert_eq!(client.store().access_token(), None);
    assert_eq!(client.store().refresh_token(), None);
}

#[test]
fn server_filter_builds_query_pairs() {
    let filter = ServerFilter { category: Some("gaming".to_owned()), by_serverid: None };
    assert_eq!(filter.query(), vec![("category", "gaming".to_owned())]);

    let filter = ServerFilter { category: None, by_serverid: Some(7) };
    assert_eq!(filter.query(), vec![("by_serverid", "7".to_owned())]);

    assert!(ServerFilter::default().query().is_empty());
}
