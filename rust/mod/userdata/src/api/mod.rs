pub mod gateway;

mod admin;
mod userdata;

use std::sync::Arc;

use axum::Router;

use c2s_core::Authenticator;

use crate::service::UserDataService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub svc: Arc<UserDataService>,
    pub auth: Arc<dyn Authenticator>,
}

/// Build the userdata router: the player webhook plus the admin routes.
pub fn build_router(svc: Arc<UserDataService>, auth: Arc<dyn Authenticator>) -> Router {
    Router::new()
        .merge(userdata::routes())
        .merge(admin::routes())
        .with_state(AppState { svc, auth })
}
