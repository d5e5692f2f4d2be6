// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! murmur-client: the authenticated real-time session core of the murmur
//! chat service.
//!
//! The library covers everything between the UI layer and the wire:
//! credential storage with cookie-style expiries ([`credential`]), the
//! authenticated HTTP transport with its one-shot refresh-and-retry
//! ([`transport`]), the proactive token lifecycle monitor
//! ([`credential::monitor`]), the session state machine ([`session`]), and
//! the per-channel WebSocket connection with bounded reconnect
//! ([`channel`]). Frontends (the `murmur` CLI, tests) observe state through
//! `watch` snapshots and `broadcast` event streams instead of callbacks.

pub mod channel;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod model;
pub mod session;
pub mod transport;
