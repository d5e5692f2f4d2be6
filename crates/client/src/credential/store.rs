// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value credential store with per-key expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::credential::{
    ACCESS_TOKEN, ACCESS_TOKEN_TTL, AUTH_KEYS, CSRF_TOKEN, REFRESH_TOKEN, REFRESH_TOKEN_TTL,
    SESSION_ID,
};

struct Entry {
    value: String,
    /// None = session-scoped (lives until removed).
    expires_at: Option<Instant>,
}

impl Entry {
    fn fresh(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now < deadline,
            None => true,
        }
    }
}

/// In-memory credential store, shared via `Arc` and injected wherever the
/// original code reached for the ambient cookie jar.
#[derive(Default)]
pub struct CredentialStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key. Expired entries read as absent and are pruned.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.fresh(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.entries.write().remove(key);
        None
    }

    /// Store a value. `ttl = None` means session-scoped.
    pub fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.write().insert(key.to_owned(), Entry { value, expires_at });
    }

    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Remove all four auth keys as a group, under one lock acquisition.
    pub fn clear_auth(&self) {
        let mut entries = self.entries.write();
        for key in AUTH_KEYS {
            entries.remove(key);
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN)
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.get(CSRF_TOKEN)
    }

    pub fn session_id(&self) -> Option<String> {
        self.get(SESSION_ID)
    }

    pub fn store_access_token(&self, token: String) {
        self.set(ACCESS_TOKEN, token, Some(ACCESS_TOKEN_TTL));
    }

    pub fn store_refresh_token(&self, token: String) {
        self.set(REFRESH_TOKEN, token, Some(REFRESH_TOKEN_TTL));
    }

    /// Render the live entries as a `Cookie` header value, the stand-in
    /// for the browser's `withCredentials` behavior. Keys are sorted so the
    /// header is deterministic.
    pub fn cookie_header(&self) -> Option<String> {
        let now = Instant::now();
        let entries = self.entries.read();
        let mut pairs: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.fresh(now))
            .map(|(key, entry)| format!("{key}={}", entry.value))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort();
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
