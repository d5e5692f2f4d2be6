// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token lifecycle monitor: proactive access-token refresh, independent of
//! request traffic.
//!
//! `Idle -> Scheduled -> Refreshing -> Scheduled | Idle`. One cancellable
//! timer at a time. Refresh failures are reported, never retried; the
//! next activation re-arms the monitor.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::credential::{jwt, CredentialStore};
use crate::events::ClientEvent;
use crate::transport::AuthHttpClient;

/// Observable monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Scheduled,
    Refreshing,
}

/// Handle to an active monitor. Dropping it cancels any scheduled timer;
/// a cancelled timer never runs its callback.
pub struct TokenMonitor {
    cancel: CancellationToken,
    state_rx: watch::Receiver<MonitorState>,
}

impl TokenMonitor {
    /// Activate the monitor.
    ///
    /// If the current access token is already inside the refresh margin
    /// (or expired), the refresh happens here, awaited by the caller, with
    /// no timer involved. Otherwise a one-shot timer is scheduled for
    /// `expiry - now - margin`.
    pub async fn activate(
        transport: Arc<AuthHttpClient>,
        store: Arc<CredentialStore>,
        margin: Duration,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(MonitorState::Idle);

        if next_delay(&store, margin).is_some_and(|delay| delay.is_zero()) {
            state_tx.send_replace(MonitorState::Refreshing);
            if let Err(e) = transport.token_refresh().await {
                tracing::warn!(err = %e, "immediate token refresh failed");
                state_tx.send_replace(MonitorState::Idle);
                let _ = events.send(ClientEvent::RefreshFailed { error: e.to_string() });
                return Self { cancel, state_rx };
            }
        }

        let task_cancel = cancel.clone();
        tokio::spawn(run(transport, store, margin, events, state_tx, task_cancel));
        Self { cancel, state_rx }
    }

    pub fn state(&self) -> MonitorState {
        *self.state_rx.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<MonitorState> {
        self.state_rx.clone()
    }

    pub fn deactivate(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TokenMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Delay until the next refresh, or `None` when there is nothing to
/// schedule (no token, or a token without a readable expiry).
fn next_delay(store: &CredentialStore, margin: Duration) -> Option<Duration> {
    let token = store.access_token()?;
    let expires_at = jwt::expiry(&token)?;
    Some(jwt::refresh_delay(expires_at, SystemTime::now(), margin))
}

async fn run(
    transport: Arc<AuthHttpClient>,
    store: Arc<CredentialStore>,
    margin: Duration,
    events: broadcast::Sender<ClientEvent>,
    state_tx: watch::Sender<MonitorState>,
    cancel: CancellationToken,
) {
    loop {
        let Some(delay) = next_delay(&store, margin) else {
            state_tx.send_replace(MonitorState::Idle);
            return;
        };
        if !delay.is_zero() {
            state_tx.send_replace(MonitorState::Scheduled);
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return;
        }
        state_tx.send_replace(MonitorState::Refreshing);
        match transport.token_refresh().await {
            // Reschedule from the new token's expiry.
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(err = %e, "scheduled token refresh failed");
                state_tx.send_replace(MonitorState::Idle);
                let _ = events.send(ClientEvent::RefreshFailed { error: e.to_string() });
                return;
            }
        }
    }
}
