//! UserData module: game-progress webhook and Discord role grants.
//!
//! A player's game client reports progress to `POST /userdata`. The record
//! is addressed by a token derived from the player id, the player's own
//! secret and the server secret, so no lookup ever happens by member id.
//! After each write the member's live roles are re-evaluated against the
//! progress thresholds and replaced on the guild when they differ.
//!
//! # Usage
//!
//! ```ignore
//! use userdata::{UserDataModule, service::UserDataConfig};
//!
//! let module = UserDataModule::new(kv, membership, auth, config);
//! let router = module.routes();
//! ```

pub mod api;
pub mod membership;
pub mod model;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;

use c2s_core::{Authenticator, Module};
use c2s_kv::KVStore;

use crate::membership::MembershipClient;
use crate::service::{UserDataConfig, UserDataService};

/// UserData module implementing the Module trait.
pub struct UserDataModule {
    service: Arc<UserDataService>,
    auth: Arc<dyn Authenticator>,
}

impl UserDataModule {
    pub fn new(
        kv: Arc<dyn KVStore>,
        membership: Arc<dyn MembershipClient>,
        auth: Arc<dyn Authenticator>,
        config: UserDataConfig,
    ) -> Self {
        Self {
            service: UserDataService::new(kv, membership, config),
            auth,
        }
    }
}

impl Module for UserDataModule {
    fn name(&self) -> &str {
        "userdata"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone(), self.auth.clone())
    }
}
