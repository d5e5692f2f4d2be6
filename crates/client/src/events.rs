// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event streams.
//!
//! The original UI wired these concerns through callback props and a
//! snackbar manager; here they are explicit `broadcast` payloads. A
//! [`crate::session::Session`] owns one [`ClientEvent`] bus for session
//! lifecycle and monitor reports; each
//! [`crate::channel::ChannelConnection`] owns its own [`ChannelEvent`] bus.

use crate::model::{Message, UserProfile};

/// Session-level events. `LoggedIn`/`LoggedOut` double as the navigation
/// signals (home view / login view) of the original client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Login completed; show the home view.
    LoggedIn { user: UserProfile },
    /// Session ended; show the login view.
    LoggedOut,
    /// A background token refresh failed. Non-fatal to the monitor; the
    /// subscriber decides whether to force a logout.
    RefreshFailed { error: String },
}

/// Per-connection channel events.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// Socket handshake completed.
    Open,
    /// The history fetch merged into the buffer; re-read the full buffer.
    History { count: usize },
    /// A live message was appended to the buffer.
    Message(Message),
    /// An abnormal closure was detected; a retry is scheduled.
    Reconnecting { attempt: u32, max_attempts: u32 },
    /// All reconnect attempts exhausted. Emitted once; no further attempts.
    ReconnectFailed { attempts: u32 },
    /// The server rejected the connection's credentials (close code 4001).
    /// The subscriber should prompt for a fresh login.
    AuthRejected,
    /// Clean close; the connection will not be re-established.
    Closed,
}
