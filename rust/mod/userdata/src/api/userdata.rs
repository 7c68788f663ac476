use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use c2s_core::ServiceError;

use crate::api::AppState;
use crate::api::gateway::{self, PlayerQuery, RawPlayerQuery};

pub fn routes() -> Router<AppState> {
    Router::new().route("/userdata", post(update_userdata))
}

/// `POST /userdata?playerId=…`: report progress and receive any earned roles.
///
/// An unknown player answers 200 with `{"data": null}`.
async fn update_userdata(
    State(state): State<AppState>,
    query: RawPlayerQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let req = gateway::check_progress_request(
        state.auth.as_ref(),
        &headers,
        &PlayerQuery::from_raw(query),
        &body,
    )?;
    let outcome = state
        .svc
        .update_progress(&req.player_id, &req.player_token, req.update)
        .await?;
    Ok(Json(serde_json::json!({
        "data": outcome.map(|o| o.record),
    })))
}
