use std::sync::Arc;

use tokio::task::JoinHandle;

use c2s_core::now_millis;

use super::roles::{self, ProgressSnapshot, RoleGrant};
use super::{UserDataError, UserDataService};
use crate::membership::{Member, MembershipClient, MembershipError};
use crate::model::{PlayerRecord, ProgressUpdate, Role};

/// Result of a successful progress update.
#[derive(Debug)]
pub struct UpdateOutcome {
    /// The record as stored after the update.
    pub record: PlayerRecord,
    /// Roles granted by this update, in evaluation order.
    pub gained: Vec<Role>,
    /// The congratulation DM task, if one was started. Callers normally drop
    /// this; the send completes or fails on its own.
    pub notification: Option<JoinHandle<()>>,
}

pub fn congratulation_message(gained: &[Role]) -> String {
    let labels: Vec<&str> = gained.iter().map(|r| r.label()).collect();
    format!(
        "You have successfully received the following roles: {}\n **congrats on your accomplishment! :tada:**",
        labels.join(", ")
    )
}

impl UserDataService {
    /// Apply a progress report from a player.
    ///
    /// Returns `Ok(None)` when no record matches the derived token; a wrong
    /// player id and a wrong player token are indistinguishable here.
    pub async fn update_progress(
        &self,
        player_id: &str,
        player_token: &str,
        update: ProgressUpdate,
    ) -> Result<Option<UpdateOutcome>, UserDataError> {
        update.validate().map_err(UserDataError::Validation)?;

        let token = self.derive_token(player_id, player_token)?;

        let record = match self
            .records
            .find_one_and_update(&token, &update, now_millis())
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(player_id, "no record matches the derived token");
                return Ok(None);
            }
            Err(e) => {
                let err = UserDataError::from(e);
                tracing::error!(player_id, "record update failed: {}", err);
                self.audit_failure(&token, &err);
                return Err(err);
            }
        };

        let (member, grant) = match self.reconcile_roles(&record).await {
            Ok(v) => v,
            Err(e) => {
                let err = UserDataError::RoleReconciliation(e);
                tracing::error!(discord_id = %record.discord_id, "{}", err);
                self.audit_failure(&token, &err);
                return Err(err);
            }
        };

        let notification = if grant.gained.is_empty() {
            tracing::info!(member = %member.tag, "already holds every qualifying role");
            None
        } else {
            tracing::info!(
                member = %member.tag,
                roles = ?grant.labels(),
                "granted roles to member"
            );
            Some(spawn_notification(
                self.membership.clone(),
                member.user_id.clone(),
                congratulation_message(&grant.gained),
            ))
        };

        if let Some(audit) = &self.audit {
            audit.grants(&record.discord_id, &grant.gained);
        }

        Ok(Some(UpdateOutcome {
            record,
            gained: grant.gained,
            notification,
        }))
    }

    /// Fetch live roles, evaluate, and push the result if it differs.
    async fn reconcile_roles(
        &self,
        record: &PlayerRecord,
    ) -> Result<(Member, RoleGrant), MembershipError> {
        let member = self.membership.fetch_member(&record.discord_id).await?;
        let grant = roles::evaluate(
            &ProgressSnapshot::from(record),
            &member.roles,
            &self.catalog,
        );
        if grant.roles != member.roles {
            self.membership
                .set_roles(&member.user_id, &grant.roles)
                .await?;
        }
        Ok((member, grant))
    }
}

fn spawn_notification(
    membership: Arc<dyn MembershipClient>,
    user_id: String,
    content: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = membership.send_direct_message(&user_id, &content).await {
            tracing::warn!(user_id = %user_id, "could not notify member: {}", e);
        }
    })
}
