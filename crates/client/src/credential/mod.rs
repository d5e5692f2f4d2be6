// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential handling: the cookie-style token store, JWT expiry
//! inspection, and the proactive token lifecycle monitor.
//!
//! The store is the client-side stand-in for the browser cookie jar the
//! original relied on: four well-known keys with per-key expiry, written by
//! the transport's response harvest and read back into request headers.

pub mod jwt;
pub mod monitor;
pub mod store;

use std::time::Duration;

pub use monitor::{MonitorState, TokenMonitor};
pub use store::CredentialStore;

/// Short-lived bearer credential for authenticated API calls.
pub const ACCESS_TOKEN: &str = "access_token";
/// Long-lived credential used to mint new access tokens.
pub const REFRESH_TOKEN: &str = "refresh_token";
/// Anti-forgery token echoed by the server on state-changing requests.
pub const CSRF_TOKEN: &str = "csrftoken";
/// Server session cookie.
pub const SESSION_ID: &str = "sessionid";

/// The four keys that are always cleared together. Logout and
/// irrecoverable-auth paths never remove them individually.
pub const AUTH_KEYS: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, CSRF_TOKEN, SESSION_ID];

/// Documented access-token lifetime (~15 minutes).
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);
/// Documented refresh-token lifetime (~7 days).
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
