use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use c2s_core::ServiceError;

use crate::api::AppState;
use crate::api::gateway::{self, PlayerQuery, RawPlayerQuery};
use crate::model::ProvisionRecord;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/userdata",
            get(list_records).post(provision_record).delete(delete_record),
        )
        .route("/admin/userdata/lookup", post(lookup_record))
}

async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ServiceError> {
    state.auth.check(&headers)?;
    let records = state.svc.list()?;
    Ok(Json(serde_json::json!({ "data": records })))
}

async fn provision_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    state.auth.check(&headers)?;
    let body = gateway::json_object(&body)?;
    let input: ProvisionRecord = serde_json::from_value(Value::Object(body))
        .map_err(|e| ServiceError::Validation(format!("Invalid record: {}", e)))?;
    let record = state.svc.provision(input)?;
    Ok(Json(serde_json::json!({ "data": record })))
}

async fn lookup_record(
    State(state): State<AppState>,
    query: RawPlayerQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    let query = PlayerQuery::from_raw(query);
    let (player_id, player_token) = identify(&state, &query, &headers, &body)?;
    let record = state.svc.lookup(&player_id, &player_token)?;
    Ok(Json(serde_json::json!({ "data": record })))
}

async fn delete_record(
    State(state): State<AppState>,
    query: RawPlayerQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    let query = PlayerQuery::from_raw(query);
    let (player_id, player_token) = identify(&state, &query, &headers, &body)?;
    let discord_id = state.svc.delete(&player_id, &player_token)?;
    Ok(Json(serde_json::json!({
        "message": "User Data successfully deleted",
        "discordId": discord_id,
    })))
}

/// Auth, then `playerId` from the query and `playerToken` from the body.
fn identify(
    state: &AppState,
    query: &PlayerQuery,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<(String, String), ServiceError> {
    state.auth.check(headers)?;
    let player_id = gateway::require_player_id(query)?;
    let body = gateway::json_object(body)?;
    let player_token = gateway::require_player_token(&body)?;
    Ok((player_id, player_token))
}
