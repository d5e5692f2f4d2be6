// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn user_message_prefers_server_text() {
    let err = ClientError::Unauthorized { message: Some("Invalid credentials".to_owned()) };
    assert_eq!(err.user_message(), "Invalid credentials");

    let err = ClientError::Status { status: 400, message: Some("Email is taken".to_owned()) };
    assert_eq!(err.user_message(), "Email is taken");
}

#[test]
fn user_message_falls_back_to_generic() {
    let err = ClientError::Decode("bad json".to_owned());
    assert_eq!(err.user_message(), GENERIC_ERROR);

    let err = ClientError::Unauthorized { message: None };
    assert_eq!(err.user_message(), GENERIC_ERROR);
}

#[test]
fn display_includes_status_and_message() {
    let err = ClientError::Status { status: 502, message: Some("bad gateway".to_owned()) };
    assert_eq!(err.to_string(), "http 502: bad gateway");

    let err = ClientError::Unauthorized { message: None };
    assert_eq!(err.to_string(), "unauthorized");
}

#[test]
fn unauthorized_is_detectable() {
    assert!(ClientError::Unauthorized { message: None }.is_unauthorized());
    assert!(!ClientError::EmptyMessage.is_unauthorized());
}
