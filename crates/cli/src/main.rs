// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `murmur` — terminal client for the murmur chat service.
//!
//! The binary is the thin UI layer over `murmur-client`: it logs in, joins
//! a channel, prints incoming messages, and sends stdin lines. Snackbar-
//! style notices (reconnect exhaustion, auth rejection, refresh failure)
//! are printed to stderr.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use murmur_client::channel::{ChannelConnection, ChannelSettings};
use murmur_client::config::ClientConfig;
use murmur_client::credential::CredentialStore;
use murmur_client::events::{ChannelEvent, ClientEvent};
use murmur_client::session::Session;
use murmur_client::transport::{AuthHttpClient, ServerFilter};

#[derive(Debug, Parser)]
#[command(name = "murmur", about = "Terminal client for the murmur chat service.")]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and chat in a channel.
    Chat {
        /// Account email.
        #[arg(long, env = "MURMUR_EMAIL")]
        email: String,

        /// Account password.
        #[arg(long, env = "MURMUR_PASSWORD", hide_env_values = true)]
        password: String,

        /// Server to join.
        #[arg(long)]
        server: u64,

        /// Channel to join. Without one, nothing is connected.
        #[arg(long)]
        channel: Option<u64>,
    },
    /// Create a new account.
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        #[arg(long, env = "MURMUR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List servers, optionally filtered by category.
    Servers {
        #[arg(long)]
        category: Option<String>,
    },
    /// List server categories.
    Categories,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // reqwest's rustls-no-provider build needs a process-level provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = Arc::new(CredentialStore::new());
    let transport = Arc::new(AuthHttpClient::new(
        cli.config.api_url.clone(),
        Arc::clone(&store),
        cli.config.http_timeout(),
    ));

    match cli.command {
        Command::Chat { email, password, server, channel } => {
            chat(&cli.config, store, transport, &email, &password, server, channel).await
        }
        Command::Register { email, username, password } => {
            match transport.register(&email, &username, &password).await {
                Ok(_) => {
                    println!("account created for {email}");
                    Ok(())
                }
                Err(e) => anyhow::bail!(e.user_message()),
            }
        }
        Command::Servers { category } => {
            let filter = ServerFilter { category, by_serverid: None };
            let servers = transport.servers(&filter).await.map_err(|e| anyhow::anyhow!("{e}"))?;
            for server in servers {
                let description = server.description.unwrap_or_default();
                println!("{:>6}  {:<24} {}", server.id, server.name, description);
                if let Some(icon) = server.icon.as_deref() {
                    if let Some(url) = cli.config.media_asset_url(icon) {
                        println!("        icon: {url}");
                    }
                }
            }
            Ok(())
        }
        Command::Categories => {
            let categories =
                transport.server_categories().await.map_err(|e| anyhow::anyhow!("{e}"))?;
            for category in categories {
                println!("{:>6}  {}", category.id, category.name);
            }
            Ok(())
        }
    }
}

async fn chat(
    config: &ClientConfig,
    store: Arc<CredentialStore>,
    transport: Arc<AuthHttpClient>,
    email: &str,
    password: &str,
    server: u64,
    channel: Option<u64>,
) -> anyhow::Result<()> {
    let session = Session::new(Arc::clone(&transport), Arc::clone(&store), config.refresh_margin());
    let mut session_events = session.events();

    if let Err(e) = session.login(email, password).await {
        anyhow::bail!(e.user_message());
    }
    if let Some(user) = session.snapshot().user() {
        println!("logged in as {}", user.username);
    }

    let Some(channel_id) = channel else {
        println!("No channel selected. Pass --channel to join one.");
        session.logout().await;
        return Ok(());
    };

    let conn = ChannelConnection::open(
        config.ws_url.clone(),
        Arc::clone(&transport),
        Arc::clone(&store),
        server,
        channel_id,
        ChannelSettings::from(config),
    );
    let mut events = conn.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ChannelEvent::Open) => eprintln!("* connected to {server}/{channel_id}"),
                Ok(ChannelEvent::History { count }) => {
                    eprintln!("* {count} messages");
                    for message in conn.messages() {
                        println!("[{}] {}: {}", message.timestamp, message.sender, message.content);
                    }
                }
                Ok(ChannelEvent::Message(message)) => {
                    println!("[{}] {}: {}", message.timestamp, message.sender, message.content);
                }
                Ok(ChannelEvent::Reconnecting { attempt, max_attempts }) => {
                    eprintln!("* connection lost, reconnecting ({attempt}/{max_attempts})");
                }
                Ok(ChannelEvent::ReconnectFailed { attempts }) => {
                    eprintln!("* could not reconnect after {attempts} attempts");
                    break;
                }
                Ok(ChannelEvent::AuthRejected) => {
                    eprintln!("* authentication rejected, please log in again");
                    break;
                }
                Ok(ChannelEvent::Closed) => {
                    eprintln!("* connection closed");
                    break;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },

            event = session_events.recv() => {
                if let Ok(ClientEvent::RefreshFailed { error }) = event {
                    eprintln!("* session refresh failed: {error}");
                }
            }

            line = lines.next_line() => match line? {
                Some(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = conn.send(&text).await {
                        eprintln!("* {}", e.user_message());
                    }
                }
                None => break,
            },

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    conn.close();
    session.logout().await;
    Ok(())
}
