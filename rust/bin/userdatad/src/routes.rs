//! Route registration: module routes plus the public liveness endpoint.

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;
use tracing::info;

/// Build the complete router. Module routes carry absolute paths and are
/// merged as-is.
pub fn build_router(module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new().route("/", get(index));
    for (name, router) in module_routes {
        info!("Mounted {} routes", name);
        app = app.merge(router);
    }
    app
}

async fn index() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "success": true }))
}
