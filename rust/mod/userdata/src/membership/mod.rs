//! Community platform access: member lookup, role replacement, DMs, and the
//! optional audit channel.

pub mod audit;
pub mod discord;

use std::collections::BTreeSet;

use crate::model::RoleId;

pub use audit::WebhookAudit;
pub use discord::DiscordClient;

/// A guild member as seen by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub user_id: String,
    /// `username#discriminator`, or the bare username on migrated accounts.
    pub tag: String,
    pub roles: BTreeSet<RoleId>,
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("member {0} not found in guild")]
    MemberNotFound(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),
}

/// Operations the service needs from the membership platform.
#[async_trait::async_trait]
pub trait MembershipClient: Send + Sync + 'static {
    /// Fetch a member with a live role list, bypassing any cache.
    async fn fetch_member(&self, user_id: &str) -> Result<Member, MembershipError>;

    /// Replace the member's complete role list.
    async fn set_roles(&self, user_id: &str, roles: &BTreeSet<RoleId>)
    -> Result<(), MembershipError>;

    /// Send a direct message to the member.
    async fn send_direct_message(&self, user_id: &str, content: &str)
    -> Result<(), MembershipError>;
}
