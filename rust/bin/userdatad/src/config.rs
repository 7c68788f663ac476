//! Server-side configuration, loaded from `/etc/c2s/<name>.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use userdata::membership::discord::DEFAULT_API_BASE;
use userdata::model::{CatalogError, Role, RoleCatalog, RoleId};

/// Directory searched for bare context names.
const CONFIG_DIR: &str = "/etc/c2s";

/// File name of the record store inside `storage.data_dir`.
const DB_FILE: &str = "userdata.redb";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub discord: DiscordConfig,
    pub roles: RolesConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Expected `Authorization` header value, also the token HMAC key.
    #[serde(default)]
    pub shared_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    pub guild_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// `[roles]`: one id per managed role, keyed by the role's snake_case name,
/// plus the `preserved` list.
#[derive(Debug, Clone, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub preserved: Vec<RoleId>,
    #[serde(flatten)]
    pub managed: BTreeMap<Role, RoleId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    pub webhook_url: Option<String>,
}

impl ServerConfig {
    /// Resolve a context name or path. Anything containing `/` or `.` is
    /// used as given; a bare name maps to `/etc/c2s/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Secrets given on the command line or in the environment win over the
    /// file.
    pub fn apply_overrides(&mut self, shared_secret: Option<String>, discord_token: Option<String>) {
        if let Some(secret) = shared_secret {
            self.auth.shared_secret = secret;
        }
        if let Some(token) = discord_token {
            self.discord.token = token;
        }
    }

    pub fn db_path(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join(DB_FILE)
    }

    pub fn role_catalog(&self) -> Result<RoleCatalog, CatalogError> {
        RoleCatalog::new(
            self.roles.managed.clone(),
            self.roles.preserved.iter().cloned(),
        )
    }
}
