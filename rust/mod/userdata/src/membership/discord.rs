use std::collections::BTreeSet;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{Member, MembershipClient, MembershipError};
use crate::model::RoleId;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl UserPayload {
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if !d.is_empty() && d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemberPayload {
    user: UserPayload,
    #[serde(default)]
    roles: Vec<RoleId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildRole {
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ChannelPayload {
    id: String,
}

/// Bot-authenticated client for one guild.
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    guild_id: String,
}

impl DiscordClient {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            guild_id: guild_id.into(),
        }
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn member_url(&self, user_id: &str) -> String {
        self.url(&format!("/guilds/{}/members/{}", self.guild_id, user_id))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(
            reqwest::header::AUTHORIZATION,
            format!("Bot {}", self.token),
        )
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, MembershipError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(MembershipError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, MembershipError> {
        Self::check(resp)
            .await?
            .json::<R>()
            .await
            .map_err(|e| MembershipError::Decode(format!("response body: {}", e)))
    }

    /// The bot's own account. Used at startup to verify the token.
    pub async fn current_user(&self) -> Result<UserPayload, MembershipError> {
        let resp = self.authed(self.http.get(self.url("/users/@me"))).send().await?;
        Self::parse(resp).await
    }

    /// Every role defined in the guild.
    pub async fn guild_roles(&self) -> Result<Vec<GuildRole>, MembershipError> {
        let url = self.url(&format!("/guilds/{}/roles", self.guild_id));
        let resp = self.authed(self.http.get(url)).send().await?;
        Self::parse(resp).await
    }
}

#[async_trait::async_trait]
impl MembershipClient for DiscordClient {
    async fn fetch_member(&self, user_id: &str) -> Result<Member, MembershipError> {
        let resp = self
            .authed(self.http.get(self.member_url(user_id)))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(MembershipError::MemberNotFound(user_id.to_string()));
        }
        let payload: MemberPayload = Self::parse(resp).await?;
        Ok(Member {
            tag: payload.user.tag(),
            user_id: payload.user.id,
            roles: payload.roles.into_iter().collect(),
        })
    }

    async fn set_roles(
        &self,
        user_id: &str,
        roles: &BTreeSet<RoleId>,
    ) -> Result<(), MembershipError> {
        let resp = self
            .authed(self.http.patch(self.member_url(user_id)))
            .json(&serde_json::json!({ "roles": roles }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: &str,
        content: &str,
    ) -> Result<(), MembershipError> {
        let resp = self
            .authed(self.http.post(self.url("/users/@me/channels")))
            .json(&serde_json::json!({ "recipient_id": user_id }))
            .send()
            .await?;
        let channel: ChannelPayload = Self::parse(resp).await?;

        let resp = self
            .authed(
                self.http
                    .post(self.url(&format!("/channels/{}/messages", channel.id))),
            )
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
