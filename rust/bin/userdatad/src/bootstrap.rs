//! Bootstrap: first-start checks.
//!
//! When userdatad starts:
//! 1. Verify the config is complete. If not, refuse to start.
//! 2. Log in to Discord and check the configured roles exist in the guild.

use std::collections::BTreeSet;

use tracing::{info, warn};

use userdata::membership::DiscordClient;
use userdata::membership::discord::GuildRole;
use userdata::model::{RoleCatalog, RoleId};

use crate::config::ServerConfig;

/// Verify server configuration is ready for production use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.auth.shared_secret.is_empty() {
        anyhow::bail!(
            "Shared secret is empty.\n\
             Set auth.shared_secret in the config file or USERDATA_AUTH in the environment."
        );
    }
    if config.discord.token.is_empty() {
        anyhow::bail!(
            "Discord bot token is empty.\n\
             Set discord.token in the config file or DISCORD_TOKEN in the environment."
        );
    }
    if config.discord.guild_id.is_empty() {
        anyhow::bail!("Discord guild_id is empty in configuration.");
    }
    if let Err(e) = config.role_catalog() {
        anyhow::bail!("Invalid [roles] section: {}", e);
    }
    Ok(())
}

/// Configured role ids that the guild does not define.
pub fn unknown_role_ids<'a>(catalog: &'a RoleCatalog, guild_roles: &[GuildRole]) -> Vec<&'a RoleId> {
    let known: BTreeSet<&RoleId> = guild_roles.iter().map(|r| &r.id).collect();
    catalog.all_ids().filter(|id| !known.contains(id)).collect()
}

/// Log in with the bot token and load the guild's roles. Either failure
/// aborts startup.
pub async fn platform_login(discord: &DiscordClient, catalog: &RoleCatalog) -> anyhow::Result<()> {
    let me = discord
        .current_user()
        .await
        .map_err(|e| anyhow::anyhow!("Discord login failed: {}", e))?;
    info!("Logged in to Discord as {}", me.tag());

    let roles = discord
        .guild_roles()
        .await
        .map_err(|e| anyhow::anyhow!("failed to fetch roles of guild {}: {}", discord.guild_id(), e))?;
    for id in unknown_role_ids(catalog, &roles) {
        warn!("Configured role {} does not exist in guild {}", id, discord.guild_id());
    }
    info!("Guild {} has {} roles", discord.guild_id(), roles.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample;

    #[test]
    fn test_verify_config_ok() {
        assert!(verify_config(&sample()).is_ok());
    }

    #[test]
    fn test_verify_config_empty_values() {
        let mut config = sample();
        config.auth.shared_secret.clear();
        assert!(verify_config(&config).is_err());

        let mut config = sample();
        config.discord.token.clear();
        assert!(verify_config(&config).is_err());

        let mut config = sample();
        config.storage.data_dir.clear();
        assert!(verify_config(&config).is_err());
    }

    #[test]
    fn test_verify_config_duplicate_role_ids() {
        let mut config = sample();
        config.roles.preserved.push(RoleId::new("1001"));
        let err = verify_config(&config).unwrap_err();
        assert!(err.to_string().contains("1001"));
    }

    #[test]
    fn test_unknown_role_ids() {
        let catalog = sample().role_catalog().unwrap();
        let guild: Vec<GuildRole> = (1001..=1011)
            .chain([2001])
            .map(|i| GuildRole {
                id: RoleId::new(i.to_string()),
                name: format!("role {}", i),
            })
            .collect();
        assert_eq!(unknown_role_ids(&catalog, &guild), vec![&RoleId::new("2002")]);
    }
}
