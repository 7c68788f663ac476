pub mod admin;
pub mod roles;
pub mod token;
pub mod update;

use std::sync::Arc;

use thiserror::Error;

use c2s_kv::{KVError, KVStore};

use crate::membership::{MembershipClient, MembershipError, WebhookAudit};
use crate::model::RoleCatalog;
use crate::store::RecordStore;

pub use update::UpdateOutcome;

/// UserData service error type.
#[derive(Debug, Error)]
pub enum UserDataError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Storage(String),

    /// Live role fetch or role replacement failed after the record was
    /// written. The write stands.
    #[error("role reconciliation failed: {0}")]
    RoleReconciliation(#[from] MembershipError),

    #[error("{0}")]
    Internal(String),
}

impl From<KVError> for UserDataError {
    fn from(e: KVError) -> Self {
        match e {
            KVError::AlreadyExists(m) => UserDataError::Conflict(m),
            other => UserDataError::Storage(other.to_string()),
        }
    }
}

impl From<UserDataError> for c2s_core::ServiceError {
    fn from(e: UserDataError) -> Self {
        use c2s_core::ServiceError;
        match e {
            UserDataError::Validation(m) => ServiceError::Validation(m),
            UserDataError::NotFound(m) => ServiceError::NotFound(m),
            UserDataError::Conflict(m) => ServiceError::Conflict(m),
            UserDataError::Storage(m) => ServiceError::Storage(m),
            e @ UserDataError::RoleReconciliation(_) => ServiceError::Upstream(e.to_string()),
            UserDataError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

/// Configuration for the userdata service.
#[derive(Debug, Clone)]
pub struct UserDataConfig {
    /// HMAC key for token derivation. Same value as the Authorization secret.
    pub shared_secret: String,
    pub roles: RoleCatalog,
    /// Operator audit channel. `None` disables audit posts.
    pub audit_webhook_url: Option<String>,
}

/// The UserData service. Holds the record store, the membership client and
/// the role catalog.
pub struct UserDataService {
    pub(crate) records: RecordStore,
    pub(crate) membership: Arc<dyn MembershipClient>,
    pub(crate) catalog: RoleCatalog,
    pub(crate) secret: String,
    pub(crate) audit: Option<WebhookAudit>,
}

impl UserDataService {
    pub fn new(
        kv: Arc<dyn KVStore>,
        membership: Arc<dyn MembershipClient>,
        config: UserDataConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            records: RecordStore::new(kv),
            membership,
            catalog: config.roles,
            secret: config.shared_secret,
            audit: config.audit_webhook_url.map(WebhookAudit::new),
        })
    }

    pub(crate) fn derive_token(
        &self,
        player_id: &str,
        player_token: &str,
    ) -> Result<String, UserDataError> {
        token::derive_token(&self.secret, player_id, player_token)
            .map_err(|e| UserDataError::Internal(format!("token derivation failed: {}", e)))
    }

    pub(crate) fn audit_failure(&self, token: &str, error: &UserDataError) {
        if let Some(audit) = &self.audit {
            audit.failure(token, error);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use c2s_core::ServiceError;

    #[test]
    fn test_kv_error_mapping() {
        let e: UserDataError = KVError::AlreadyExists("k".into()).into();
        assert!(matches!(e, UserDataError::Conflict(_)));
        let e: UserDataError = KVError::Storage("disk full".into()).into();
        assert!(matches!(e, UserDataError::Storage(m) if m.contains("disk full")));
    }

    #[test]
    fn test_service_error_mapping() {
        let e: ServiceError = UserDataError::RoleReconciliation(MembershipError::Api {
            status: 403,
            message: "Missing Permissions".into(),
        })
        .into();
        assert_eq!(e.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(e.to_string().contains("Missing Permissions"));

        let e: ServiceError = UserDataError::Conflict("taken".into()).into();
        assert_eq!(e.status_code(), axum::http::StatusCode::CONFLICT);
    }
}
