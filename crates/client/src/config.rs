// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Deployment environment. Production tightens cookie attributes
/// (`secure`, `sameSite`) on the server side; client behavior is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

/// Configuration for the murmur client core.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL for the REST/auth API.
    #[arg(long, default_value = "http://127.0.0.1:8000/api", env = "MURMUR_API_URL")]
    pub api_url: String,

    /// Base URL for WebSocket connections.
    #[arg(long, default_value = "ws://127.0.0.1:8000", env = "MURMUR_WS_URL")]
    pub ws_url: String,

    /// Base URL for media assets (server icons, banners).
    #[arg(long, env = "MURMUR_MEDIA_URL")]
    pub media_url: Option<String>,

    /// Deployment environment flag.
    #[arg(long, value_enum, default_value_t = Environment::Development, env = "MURMUR_ENV")]
    pub environment: Environment,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 10, env = "MURMUR_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: u64,

    /// Maximum reconnect attempts after an abnormal WebSocket closure.
    #[arg(long, default_value_t = 5, env = "MURMUR_RECONNECT_ATTEMPTS")]
    pub reconnect_attempts: u32,

    /// Delay between reconnect attempts in milliseconds.
    #[arg(long, default_value_t = 5000, env = "MURMUR_RECONNECT_DELAY_MS")]
    pub reconnect_delay_ms: u64,

    /// Seconds before access-token expiry at which the monitor refreshes.
    #[arg(long, default_value_t = 120, env = "MURMUR_REFRESH_MARGIN_SECS")]
    pub refresh_margin_secs: u64,

    /// WebSocket keepalive ping interval in seconds.
    #[arg(long, default_value_t = 30, env = "MURMUR_PING_INTERVAL_SECS")]
    pub ping_interval_secs: u64,
}

impl ClientConfig {
    /// Config with default knobs for the given base URLs (tests, embedding).
    pub fn for_urls(api_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ws_url: ws_url.into(),
            media_url: None,
            environment: Environment::Development,
            http_timeout_secs: 10,
            reconnect_attempts: 5,
            reconnect_delay_ms: 5000,
            refresh_margin_secs: 120,
            ping_interval_secs: 30,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Absolute URL for a media asset path, if a media base is configured.
    pub fn media_asset_url(&self, path: &str) -> Option<String> {
        let base = self.media_url.as_deref()?.trim_end_matches('/');
        Some(format!("{base}/{}", path.trim_start_matches('/')))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
