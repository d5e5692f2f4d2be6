// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session state machine: login, logout, validation, and hydration.
//!
//! Replaces the original's reducer-dispatched auth context with an explicit
//! tagged union. The `Session` is constructed once at application root and
//! injected; frontends observe it through a `watch` snapshot plus the
//! [`ClientEvent`] stream, whose `LoggedIn`/`LoggedOut` events carry the
//! navigation duties (home view / login view).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};

use crate::credential::{CredentialStore, TokenMonitor};
use crate::error::ClientError;
use crate::events::ClientEvent;
use crate::model::UserProfile;
use crate::transport::AuthHttpClient;

/// Session lifecycle state. `LoggedIn` owning the user encodes the
/// invariant that a logged-in session always has one.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    LoggedOut,
    LoggingIn,
    LoggedIn(UserProfile),
    LoggingOut,
}

/// What the UI binds to: the state plus the orthogonal error text.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub error: Option<String>,
}

impl SessionSnapshot {
    fn logged_out() -> Self {
        Self { state: SessionState::LoggedOut, error: None }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn(_))
    }

    /// True during the transitional states (the original's loading flag).
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::LoggingIn | SessionState::LoggingOut)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::LoggedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// The session object. Lifecycle is tied to the application root; it is
/// torn down only at process exit.
pub struct Session {
    transport: Arc<AuthHttpClient>,
    store: Arc<CredentialStore>,
    state_tx: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<ClientEvent>,
    monitor: Mutex<Option<TokenMonitor>>,
    refresh_margin: Duration,
}

impl Session {
    pub fn new(
        transport: Arc<AuthHttpClient>,
        store: Arc<CredentialStore>,
        refresh_margin: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::logged_out());
        let (events, _) = broadcast::channel(64);
        Self { transport, store, state_tx, events, monitor: Mutex::new(None), refresh_margin }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// App-start hydration: with a persisted refresh token, validate the
    /// session (the transport's 401 path silently refreshes an expired
    /// access token) and arm the monitor.
    pub async fn start(&self) {
        if self.store.refresh_token().is_none() {
            return;
        }
        if self.validate_session().await {
            self.activate_monitor().await;
        }
    }

    /// Log in and fetch the user.
    ///
    /// Every exit path leaves a non-loading state: success lands in
    /// `LoggedIn`, any failure in `LoggedOut` with the error text set to
    /// the server-provided message or the generic fallback.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        self.set_state(SessionState::LoggingIn, None);

        let result = async {
            self.transport.login(email, password).await?;
            self.transport.validate_session().await
        }
        .await;

        match result {
            Ok(user) => {
                self.set_state(SessionState::LoggedIn(user.clone()), None);
                self.activate_monitor().await;
                let _ = self.events.send(ClientEvent::LoggedIn { user: user.clone() });
                Ok(user)
            }
            Err(e) => {
                tracing::debug!(err = %e, "login failed");
                self.set_state(SessionState::LoggedOut, Some(e.user_message()));
                Err(e)
            }
        }
    }

    /// Log out. Server-side failures are logged but never block the local
    /// transition; credentials are cleared either by the transport's logout
    /// harvest or directly here on error.
    pub async fn logout(&self) {
        self.set_state(SessionState::LoggingOut, None);
        self.deactivate_monitor();

        if let Err(e) = self.transport.logout().await {
            tracing::warn!(err = %e, "logout request failed");
            self.store.clear_auth();
        }

        self.set_state(SessionState::LoggedOut, None);
        let _ = self.events.send(ClientEvent::LoggedOut);
    }

    /// Validate the current session. Never errors to the caller and never
    /// retries: success lands in `LoggedIn`, failure in `LoggedOut`.
    pub async fn validate_session(&self) -> bool {
        match self.transport.validate_session().await {
            Ok(user) => {
                self.set_state(SessionState::LoggedIn(user), None);
                true
            }
            Err(e) => {
                tracing::debug!(err = %e, "session validation failed");
                self.set_state(SessionState::LoggedOut, None);
                false
            }
        }
    }

    async fn activate_monitor(&self) {
        let monitor = TokenMonitor::activate(
            Arc::clone(&self.transport),
            Arc::clone(&self.store),
            self.refresh_margin,
            self.events.clone(),
        )
        .await;
        // Replacing the slot drops (and thereby cancels) any previous monitor.
        *self.monitor.lock() = Some(monitor);
    }

    fn deactivate_monitor(&self) {
        self.monitor.lock().take();
    }

    fn set_state(&self, state: SessionState, error: Option<String>) {
        self.state_tx.send_replace(SessionSnapshot { state, error });
    }
}
