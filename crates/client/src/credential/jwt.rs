// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal JWT claim inspection.
//!
//! The client only reads the `exp` claim to schedule refreshes; it never
//! verifies signatures. The server re-validates every token it receives.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;

/// Decode the token's `exp` claim. `None` for opaque or malformed tokens.
pub fn expiry(token: &str) -> Option<SystemTime> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_u64()?;
    Some(UNIX_EPOCH + Duration::from_secs(exp))
}

/// Time until the proactive refresh should fire:
/// `max(0, expires_at - now - margin)`.
pub fn refresh_delay(expires_at: SystemTime, now: SystemTime, margin: Duration) -> Duration {
    match expires_at.duration_since(now) {
        Ok(remaining) => remaining.saturating_sub(margin),
        Err(_) => Duration::ZERO,
    }
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod jwt_tests;
