// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// User-facing fallback for failures without a server-provided message.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// Failure classes for client operations.
#[derive(Debug)]
pub enum ClientError {
    /// No usable response from the server (DNS, refused, timeout).
    Network(reqwest::Error),
    /// 401 that survived the one-shot refresh path.
    Unauthorized { message: Option<String> },
    /// Non-success HTTP status outside the 401 path.
    Status { status: u16, message: Option<String> },
    /// Response or frame body failed to decode.
    Decode(String),
    /// WebSocket transport failure (connection gone, send failed).
    Socket(String),
    /// Rejected before emission: message text was empty after trimming.
    EmptyMessage,
}

impl ClientError {
    /// Message suitable for direct display: the server-provided text when
    /// the server said something, the generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { message: Some(m) } | Self::Status { message: Some(m), .. } => {
                m.clone()
            }
            Self::EmptyMessage => "Message is empty.".to_owned(),
            _ => GENERIC_ERROR.to_owned(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network error: {e}"),
            Self::Unauthorized { message: Some(m) } => write!(f, "unauthorized: {m}"),
            Self::Unauthorized { message: None } => f.write_str("unauthorized"),
            Self::Status { status, message: Some(m) } => write!(f, "http {status}: {m}"),
            Self::Status { status, message: None } => write!(f, "http {status}"),
            Self::Decode(m) => write!(f, "decode error: {m}"),
            Self::Socket(m) => write!(f, "websocket error: {m}"),
            Self::EmptyMessage => f.write_str("empty message"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
