use c2s_core::now_millis;

use super::{UserDataError, UserDataService};
use crate::model::{PlayerRecord, ProvisionRecord};

impl UserDataService {
    /// Create a record for a member. The token is derived the same way the
    /// update path derives it, so the player can report progress right away.
    pub fn provision(&self, input: ProvisionRecord) -> Result<PlayerRecord, UserDataError> {
        if input.discord_id.trim().is_empty() {
            return Err(UserDataError::Validation("Missing discordId".into()));
        }
        if input.player_id.is_empty() {
            return Err(UserDataError::Validation("Missing playerId".into()));
        }
        if input.player_token.is_empty() {
            return Err(UserDataError::Validation("Missing playerToken".into()));
        }
        input.progress.validate().map_err(UserDataError::Validation)?;

        let token = self.derive_token(&input.player_id, &input.player_token)?;
        let mut record = PlayerRecord::new(input.discord_id, token);
        input.progress.apply_to(&mut record);
        record.touch(now_millis());

        self.records.insert(&record).map_err(|e| match UserDataError::from(e) {
            UserDataError::Conflict(_) => {
                UserDataError::Conflict("User Data already exists for this player".into())
            }
            other => other,
        })?;

        tracing::info!(discord_id = %record.discord_id, "provisioned player record");
        Ok(record)
    }

    pub fn lookup(&self, player_id: &str, player_token: &str) -> Result<PlayerRecord, UserDataError> {
        let token = self.derive_token(player_id, player_token)?;
        self.records
            .find_by_token(&token)?
            .ok_or_else(|| UserDataError::NotFound("No User Data found".into()))
    }

    /// Remove a record. Returns the member id it belonged to.
    pub fn delete(&self, player_id: &str, player_token: &str) -> Result<String, UserDataError> {
        let token = self.derive_token(player_id, player_token)?;
        let removed = self
            .records
            .delete_by_token(&token)?
            .ok_or_else(|| UserDataError::NotFound("No User Data found".into()))?;
        tracing::info!(discord_id = %removed.discord_id, "deleted player record");
        Ok(removed.discord_id)
    }

    pub fn list(&self) -> Result<Vec<PlayerRecord>, UserDataError> {
        Ok(self.records.list()?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::ProgressUpdate;
    use crate::service::testing::{FakeMembership, SECRET, make_service};
    use crate::service::token::derive_token;

    fn provision_input(discord_id: &str, player_id: &str) -> ProvisionRecord {
        ProvisionRecord {
            discord_id: discord_id.into(),
            player_id: player_id.into(),
            player_token: "pw".into(),
            progress: ProgressUpdate {
                dino_rank: Some(30),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_provision_then_lookup() {
        let (svc, _dir) = make_service(Arc::new(FakeMembership::default()));
        let record = svc.provision(provision_input("42", "p1")).unwrap();
        assert_eq!(record.token, derive_token(SECRET, "p1", "pw").unwrap());
        assert_eq!(record.dino_rank, 30);
        assert!(record.edited_timestamp.is_some());

        assert_eq!(svc.lookup("p1", "pw").unwrap(), record);
        assert!(matches!(
            svc.lookup("p1", "nope"),
            Err(UserDataError::NotFound(_))
        ));
    }

    #[test]
    fn test_provision_conflicts() {
        let (svc, _dir) = make_service(Arc::new(FakeMembership::default()));
        svc.provision(provision_input("42", "p1")).unwrap();

        assert!(matches!(
            svc.provision(provision_input("42", "p2")),
            Err(UserDataError::Conflict(_))
        ));
        assert!(matches!(
            svc.provision(provision_input("43", "p1")),
            Err(UserDataError::Conflict(_))
        ));
        assert_eq!(svc.list().unwrap().len(), 1);
    }

    #[test]
    fn test_provision_validates_input() {
        let (svc, _dir) = make_service(Arc::new(FakeMembership::default()));
        let mut input = provision_input("", "p1");
        assert!(matches!(
            svc.provision(input.clone()),
            Err(UserDataError::Validation(_))
        ));
        input.discord_id = "42".into();
        input.progress.metabits = Some(f64::INFINITY);
        assert!(matches!(
            svc.provision(input),
            Err(UserDataError::Validation(_))
        ));
    }

    #[test]
    fn test_delete() {
        let (svc, _dir) = make_service(Arc::new(FakeMembership::default()));
        svc.provision(provision_input("42", "p1")).unwrap();

        assert_eq!(svc.delete("p1", "pw").unwrap(), "42");
        assert!(matches!(
            svc.delete("p1", "pw"),
            Err(UserDataError::NotFound(_))
        ));
        assert!(svc.list().unwrap().is_empty());
    }
}
