// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;

use super::*;

/// Unsigned token with the given `exp` claim; only the payload segment
/// matters to the decoder.
fn token_with_exp(exp: u64) -> String {
    let payload =
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
    format!("header.{payload}.signature")
}

#[test]
fn expiry_reads_the_exp_claim() {
    let token = token_with_exp(1_700_000_000);
    assert_eq!(expiry(&token), Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000)));
}

#[test]
fn expiry_rejects_opaque_tokens() {
    assert_eq!(expiry("not-a-jwt"), None);
    assert_eq!(expiry("a.!!!.c"), None);
    let no_exp = format!(
        "h.{}.s",
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("{\"sub\":\"u1\"}")
    );
    assert_eq!(expiry(&no_exp), None);
}

#[test]
fn refresh_fires_margin_before_expiry() {
    let now = SystemTime::now();
    let expires_at = now + Duration::from_secs(300);
    // 300s out with a 120s margin schedules the refresh at +180s.
    assert_eq!(refresh_delay(expires_at, now, Duration::from_secs(120)), Duration::from_secs(180));
}

#[test]
fn refresh_is_immediate_inside_the_margin() {
    let now = SystemTime::now();
    let margin = Duration::from_secs(120);
    assert_eq!(refresh_delay(now + Duration::from_secs(60), now, margin), Duration::ZERO);
    assert_eq!(refresh_delay(now + margin, now, margin), Duration::ZERO);
}

#[test]
fn refresh_is_immediate_for_expired_tokens() {
    let now = SystemTime::now();
    let expired = now - Duration::from_secs(10);
    assert_eq!(refresh_delay(expired, now, Duration::from_secs(120)), Duration::ZERO);
}
