// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[test]
fn set_then_get_roundtrips() {
    let store = CredentialStore::new();
    store.set(ACCESS_TOKEN, "tok".to_owned(), Some(Duration::from_secs(60)));
    assert_eq!(store.get(ACCESS_TOKEN).as_deref(), Some("tok"));
}

#[test]
fn expired_entry_reads_as_absent() {
    let store = CredentialStore::new();
    store.set(ACCESS_TOKEN, "tok".to_owned(), Some(Duration::ZERO));
    assert_eq!(store.get(ACCESS_TOKEN), None);
    assert_eq!(store.access_token(), None);
}

#[test]
fn session_scoped_entry_has_no_expiry() {
    let store = CredentialStore::new();
    store.set(CSRF_TOKEN, "csrf".to_owned(), None);
    assert_eq!(store.csrf_token().as_deref(), Some("csrf"));
}

#[test]
fn remove_drops_a_single_key() {
    let store = CredentialStore::new();
    store.set(SESSION_ID, "sid".to_owned(), None);
    store.remove(SESSION_ID);
    assert_eq!(store.session_id(), None);
}

#[test]
fn clear_auth_removes_the_group_and_nothing_else() {
    let store = CredentialStore::new();
    store.store_access_token("a".to_owned());
    store.store_refresh_token("r".to_owned());
    store.set(CSRF_TOKEN, "c".to_owned(), None);
    store.set(SESSION_ID, "s".to_owned(), None);
    store.set("color_mode", "dark".to_owned(), None);

    store.clear_auth();

    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(store.csrf_token(), None);
    assert_eq!(store.session_id(), None);
    assert_eq!(store.get("color_mode").as_deref(), Some("dark"));
}

#[test]
fn typed_setters_keep_tokens_readable() {
    let store = CredentialStore::new();
    store.store_access_token("a".to_owned());
    store.store_refresh_token("r".to_owned());
    assert_eq!(store.access_token().as_deref(), Some("a"));
    assert_eq!(store.refresh_token().as_deref(), Some("r"));
}

#[test]
fn cookie_header_renders_sorted_pairs() {
    let store = CredentialStore::new();
    store.set(CSRF_TOKEN, "c".to_owned(), None);
    store.set(ACCESS_TOKEN, "a".to_owned(), Some(Duration::from_secs(60)));
    assert_eq!(store.cookie_header().as_deref(), Some("access_token=a; csrftoken=c"));
}

#[test]
fn cookie_header_skips_expired_and_empty() {
    let store = CredentialStore::new();
    assert_eq!(store.cookie_header(), None);
    store.set(ACCESS_TOKEN, "a".to_owned(), Some(Duration::ZERO));
    assert_eq!(store.cookie_header(), None);
}
