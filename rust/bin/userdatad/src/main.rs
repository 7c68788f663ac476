//! `userdatad`: the game-progress webhook server.
//!
//! Usage:
//!   userdatad -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/c2s/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use c2s_core::{Module, SharedSecret};
use tracing::info;

use config::ServerConfig;
use userdata::UserDataModule;
use userdata::membership::DiscordClient;
use userdata::service::UserDataConfig;

/// UserData webhook server.
#[derive(Parser, Debug)]
#[command(name = "userdatad", about = "Game-progress webhook and Discord role grants")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:3000")]
    listen: String,

    /// Shared secret, overrides `auth.shared_secret`.
    #[arg(long = "shared-secret", env = "USERDATA_AUTH", hide_env_values = true)]
    shared_secret: Option<String>,

    /// Discord bot token, overrides `discord.token`.
    #[arg(long = "discord-token", env = "DISCORD_TOKEN", hide_env_values = true)]
    discord_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let mut server_config = ServerConfig::load(&config_path)?;
    server_config.apply_overrides(cli.shared_secret, cli.discord_token);

    bootstrap::verify_config(&server_config)?;
    let catalog = server_config.role_catalog()?;

    std::fs::create_dir_all(&server_config.storage.data_dir)?;
    let db_path = server_config.db_path();
    let kv: Arc<dyn c2s_kv::KVStore> = Arc::new(
        c2s_kv::RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("Record store opened at {}", db_path.display());

    let discord = DiscordClient::new(
        &server_config.discord.api_base,
        &server_config.discord.token,
        &server_config.discord.guild_id,
    );
    bootstrap::platform_login(&discord, &catalog).await?;

    let auth = Arc::new(SharedSecret::new(server_config.auth.shared_secret.clone()));
    let module = UserDataModule::new(
        kv,
        Arc::new(discord),
        auth.clone(),
        UserDataConfig {
            shared_secret: auth.secret().to_string(),
            roles: catalog,
            audit_webhook_url: server_config.audit.webhook_url.clone(),
        },
    );
    info!("UserData module initialized");

    let app = routes::build_router(vec![(module.name(), module.routes())]);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("UserData server listening on {}", cli.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("UserData server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
