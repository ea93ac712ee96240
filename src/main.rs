//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration and Types
//! - Infrastructure: Matrix, Document Store
//! - Application: Router, Parser, Dispatcher, Seen Cache
//!

mod application;
mod domain;
mod infrastructure;
mod strings;

use anyhow::{Context, Result};
use clap::Parser;
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::RoomId,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::SyncRoomMessageEvent,
    },
};
use std::fs;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::router::MessageRouter;
use crate::application::state::SeenCache;
use crate::domain::config::AppConfig;
use crate::domain::traits::Messenger;
use crate::domain::types::Source;
use crate::infrastructure::matrix::{AdminChannel, MatrixService};
use crate::infrastructure::store::FileStore;

#[derive(Parser)]
#[command(name = "pingbot", about = "Relays group pings for a community room")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "data/config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Configuration
    let config_content = fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read {}", args.config))?;
    let config: AppConfig =
        serde_yaml::from_str(&config_content).context("Failed to parse configuration")?;

    // 2. Logging Setup
    if !std::path::Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    // Clear previous session log
    let log_path = std::path::Path::new("data/session.log");
    if log_path.exists() {
        let _ = fs::remove_file(log_path);
    }

    let file_appender = tracing_appender::rolling::never("data", "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn",
        )
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Starting pingbot...");

    // 3. Matrix Setup
    let client = Client::builder()
        .homeserver_url(&config.services.matrix.homeserver)
        .build()
        .await?;

    client
        .matrix_auth()
        .login_username(
            &config.services.matrix.username,
            &config.services.matrix.password,
        )
        .send()
        .await?;

    if let Some(name) = &config.services.matrix.display_name {
        let _ = client.account().set_display_name(Some(name)).await;
    }

    tracing::info!("Logged in as {}", config.services.matrix.username);

    // 4. Application Components
    let store = Arc::new(FileStore::new(&config.groups.document_path));
    let policy_store = Arc::new(FileStore::new(&config.groups.policy_path));
    let mut router = MessageRouter::new(config.clone(), store, policy_store);
    if let Some(admin_room) = &config.community.admin_room {
        let room_id = RoomId::parse(admin_room).context("Invalid admin room ID")?;
        router = router.with_admin(Arc::new(AdminChannel::new(client.clone(), room_id))
            as Arc<dyn Messenger>);
    }
    let router = Arc::new(router);
    let seen = Arc::new(Mutex::new(SeenCache::load()));

    // 5. Event Loop
    let start_time = std::time::SystemTime::now();
    let loop_config = config.clone();
    let loop_router = router.clone();
    let loop_seen = seen.clone();

    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let config = loop_config.clone();
        let router = loop_router.clone();
        let seen = loop_seen.clone();

        async move {
            let Some(original_msg) = ev.as_original() else {
                return;
            };

            // Ignore events older than start_time
            let ts = ev.origin_server_ts();
            let event_time =
                std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts.get().into());
            if event_time < start_time {
                return;
            }

            if original_msg.sender == room.own_user_id() {
                return;
            }

            // Skip anything already handled (survives restarts)
            {
                let mut cache = seen.lock().await;
                let event_id = ev.event_id().as_str();
                if cache.contains(event_id) {
                    return;
                }
                cache.insert(event_id);
                cache.save();
            }

            let matrix_sdk::ruma::events::room::message::MessageType::Text(text_content) =
                &original_msg.content.msgtype
            else {
                return;
            };
            let body = &text_content.body;
            tracing::info!("Received message from {}: {}", original_msg.sender, body);

            // The community room is scanned for pings; every other room the
            // bot is in acts as a direct-message command channel.
            let source = if room.room_id().as_str() == config.community.ping_room {
                Source::Room
            } else {
                Source::Direct
            };

            let chat = MatrixService::new(room);
            if let Err(e) = router
                .route(&chat, body, original_msg.sender.as_str(), source)
                .await
            {
                tracing::error!("Failed to route message: {}", e);
            }
        }
    });

    // Handle Invites (users open DM rooms to send commands)
    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            let _ = room.join().await;
        }
    });

    // 6. Sync Loop
    client.sync(SyncSettings::default()).await?;

    Ok(())
}
