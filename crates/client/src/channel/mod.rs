// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel connection: one WebSocket per `(server, channel)` pair.
//!
//! The connection owns its message buffer and exposes a subscribe/send
//! surface instead of raw socket callbacks. Reconnect policy: abnormal
//! closures get up to `max_attempts` retries at a fixed delay, then one
//! terminal [`ChannelEvent::ReconnectFailed`]; an auth-rejection close
//! (code 4001) goes straight to `Idle` with no retries and no credential
//! clearing (expiring the credentials is the HTTP transport's job).
//!
//! History vs. live ordering: live frames that arrive before the history
//! fetch resolves are parked in a pending list, invisible to subscribers;
//! when history lands, the buffer becomes `history ++ pending` in receipt
//! order and one `History` event signals a full re-read. No live message
//! is ever lost to the history overwrite.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::credential::CredentialStore;
use crate::error::ClientError;
use crate::events::ChannelEvent;
use crate::model::Message;
use crate::transport::AuthHttpClient;

/// Application-defined close code: the server rejected the credentials.
pub const CLOSE_AUTH_REJECTED: u16 = 4001;
const CLOSE_NORMAL: u16 = 1000;
const CLOSE_GOING_AWAY: u16 = 1001;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

/// Reconnect and keepalive knobs.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub ping_interval: Duration,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_millis(5000),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl From<&ClientConfig> for ChannelSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.reconnect_attempts,
            retry_delay: config.reconnect_delay(),
            ping_interval: config.ping_interval(),
        }
    }
}

/// Why a served socket ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    Normal,
    Abnormal,
    AuthRejected,
    Cancelled,
}

/// Handle to an active channel connection.
///
/// Construction requires both ids; a route without a channel never gets a
/// connection (the frontend shows its placeholder instead). Dropping the
/// handle (or calling [`close`](Self::close)) cancels the socket and every
/// pending reconnect timer; a torn-down connection never mutates the
/// buffer again.
pub struct ChannelConnection {
    server_id: u64,
    channel_id: u64,
    buffer: Arc<Mutex<Vec<Message>>>,
    events: broadcast::Sender<ChannelEvent>,
    state_rx: watch::Receiver<SocketState>,
    outbound_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl ChannelConnection {
    /// Open a connection for `(server_id, channel_id)` and start its run
    /// loop. The access token is read from the store at each (re)connect,
    /// so reconnects pick up refreshed tokens.
    pub fn open(
        ws_base: String,
        transport: Arc<AuthHttpClient>,
        store: Arc<CredentialStore>,
        server_id: u64,
        channel_id: u64,
        settings: ChannelSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        let (state_tx, state_rx) = watch::channel(SocketState::Idle);
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let buffer = Arc::new(Mutex::new(Vec::new()));

        let ctx = ConnCtx {
            ws_base,
            server_id,
            channel_id,
            transport,
            store,
            settings,
            buffer: Arc::clone(&buffer),
            events: events.clone(),
            state_tx,
            outbound_rx,
            cancel: cancel.clone(),
        };
        tokio::spawn(run(ctx));

        Self { server_id, channel_id, buffer, events, state_rx, outbound_tx, cancel }
    }

    pub fn server_id(&self) -> u64 {
        self.server_id
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SocketState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SocketState> {
        self.state_rx.clone()
    }

    /// Snapshot of the message buffer in arrival order.
    pub fn messages(&self) -> Vec<Message> {
        self.buffer.lock().clone()
    }

    /// Queue a message frame. The text is trimmed first; empty input is
    /// rejected so the caller keeps it in the input box. `Ok` means the
    /// connection task accepted the frame for emission.
    pub async fn send(&self, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        self.outbound_tx
            .send(text.to_owned())
            .await
            .map_err(|_| ClientError::Socket("connection closed".to_owned()))
    }

    /// Close the socket and cancel any pending reconnect timer.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ChannelConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Everything the run loop owns.
struct ConnCtx {
    ws_base: String,
    server_id: u64,
    channel_id: u64,
    transport: Arc<AuthHttpClient>,
    store: Arc<CredentialStore>,
    settings: ChannelSettings,
    buffer: Arc<Mutex<Vec<Message>>>,
    events: broadcast::Sender<ChannelEvent>,
    state_tx: watch::Sender<SocketState>,
    outbound_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
}

async fn run(mut ctx: ConnCtx) {
    let mut attempts: u32 = 0;
    loop {
        if ctx.cancel.is_cancelled() {
            ctx.state_tx.send_replace(SocketState::Closed);
            return;
        }
        ctx.state_tx.send_replace(SocketState::Connecting);
        let url = connect_url(
            &ctx.ws_base,
            ctx.server_id,
            ctx.channel_id,
            ctx.store.access_token().as_deref(),
        );

        let disconnect = match tokio_tungstenite::connect_async(&url).await {
            Ok((stream, _)) => {
                ctx.state_tx.send_replace(SocketState::Open);
                let _ = ctx.events.send(ChannelEvent::Open);
                serve(stream, &mut ctx).await
            }
            Err(e) => {
                tracing::debug!(
                    server = ctx.server_id,
                    channel = ctx.channel_id,
                    err = %e,
                    "websocket connect failed"
                );
                Disconnect::Abnormal
            }
        };

        match disconnect {
            Disconnect::Cancelled => {
                ctx.state_tx.send_replace(SocketState::Closed);
                return;
            }
            Disconnect::Normal => {
                ctx.state_tx.send_replace(SocketState::Closed);
                let _ = ctx.events.send(ChannelEvent::Closed);
                return;
            }
            Disconnect::AuthRejected => {
                ctx.state_tx.send_replace(SocketState::Idle);
                let _ = ctx.events.send(ChannelEvent::AuthRejected);
                return;
            }
            Disconnect::Abnormal => {}
        }

        if attempts >= ctx.settings.max_attempts {
            tracing::warn!(
                server = ctx.server_id,
                channel = ctx.channel_id,
                attempts,
                "reconnect attempts exhausted"
            );
            ctx.state_tx.send_replace(SocketState::Closed);
            let _ = ctx.events.send(ChannelEvent::ReconnectFailed { attempts });
            return;
        }
        attempts += 1;
        ctx.state_tx.send_replace(SocketState::Reconnecting);
        let _ = ctx.events.send(ChannelEvent::Reconnecting {
            attempt: attempts,
            max_attempts: ctx.settings.max_attempts,
        });
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                ctx.state_tx.send_replace(SocketState::Closed);
                return;
            }
            _ = tokio::time::sleep(ctx.settings.retry_delay) => {}
        }
    }
}

/// Serve one open socket until it disconnects.
async fn serve(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ctx: &mut ConnCtx,
) -> Disconnect {
    let (mut sink, mut source) = stream.split();

    // History fetch runs concurrently with the live stream; frames that
    // beat it are parked in `pending` until the merge.
    let mut history = Box::pin(ctx.transport.channel_messages(ctx.channel_id));
    let mut history_done = false;
    let mut pending: Vec<Message> = Vec::new();

    let mut keepalive = tokio::time::interval(ctx.settings.ping_interval);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => return Disconnect::Cancelled,

            result = &mut history, if !history_done => {
                history_done = true;
                let fetched = match result {
                    Ok(messages) => messages,
                    Err(e) => {
                        tracing::warn!(channel = ctx.channel_id, err = %e, "history fetch failed");
                        Vec::new()
                    }
                };
                if ctx.cancel.is_cancelled() {
                    return Disconnect::Cancelled;
                }
                let count = {
                    let mut buffer = ctx.buffer.lock();
                    buffer.clear();
                    buffer.extend(fetched);
                    buffer.append(&mut pending);
                    buffer.len()
                };
                let _ = ctx.events.send(ChannelEvent::History { count });
            }

            frame = source.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match parse_frame(&text) {
                    Ok(message) => {
                        if ctx.cancel.is_cancelled() {
                            return Disconnect::Cancelled;
                        }
                        if history_done {
                            ctx.buffer.lock().push(message.clone());
                            let _ = ctx.events.send(ChannelEvent::Message(message));
                        } else {
                            pending.push(message);
                        }
                    }
                    Err(e) => {
                        // One bad frame must not drop the connection.
                        tracing::warn!(channel = ctx.channel_id, err = %e, "dropping malformed frame");
                    }
                },
                Some(Ok(WsMessage::Close(close))) => return classify_close(close.as_ref()),
                Some(Ok(_)) => {} // binary, ping, pong
                Some(Err(e)) => {
                    tracing::debug!(channel = ctx.channel_id, err = %e, "websocket read error");
                    return Disconnect::Abnormal;
                }
                None => return Disconnect::Abnormal,
            },

            outbound = ctx.outbound_rx.recv() => match outbound {
                Some(text) => {
                    let frame = serde_json::json!({ "type": "message", "message": text });
                    if sink.send(WsMessage::Text(frame.to_string().into())).await.is_err() {
                        return Disconnect::Abnormal;
                    }
                }
                // All senders gone means the handle was dropped.
                None => return Disconnect::Cancelled,
            },

            _ = keepalive.tick() => {
                if sink.send(WsMessage::Ping(Vec::new().into())).await.is_err() {
                    return Disconnect::Abnormal;
                }
            }
        }
    }
}

/// Parse one inbound frame as a [`Message`].
fn parse_frame(text: &str) -> Result<Message, serde_json::Error> {
    serde_json::from_str(text)
}

/// Map a close frame to a disconnect class. 1000/1001 are clean; 4001 is
/// the auth rejection; everything else (including a wire-level 1006 or a
/// missing frame) is abnormal and eligible for reconnect.
fn classify_close(close: Option<&CloseFrame>) -> Disconnect {
    let Some(frame) = close else {
        return Disconnect::Abnormal;
    };
    match u16::from(frame.code) {
        CLOSE_AUTH_REJECTED => Disconnect::AuthRejected,
        CLOSE_NORMAL | CLOSE_GOING_AWAY => Disconnect::Normal,
        _ => Disconnect::Abnormal,
    }
}

/// Handshake URL: `{base}/{server}/{channel}/?token={access}`.
fn connect_url(base: &str, server_id: u64, channel_id: u64, token: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    let mut url = format!("{base}/{server_id}/{channel_id}/");
    if let Some(token) = token {
        url.push_str("?token=");
        url.push_str(token);
    }
    url
}
