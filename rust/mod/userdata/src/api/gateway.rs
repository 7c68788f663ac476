//! Inbound request checks for player-facing routes.
//!
//! Order matters to callers: body shape (422), then `playerId`,
//! Authorization and `playerToken` (all 403), then field presence (400).

use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderMap;
use serde_json::{Map, Value};

use c2s_core::{Authenticator, ServiceError};

use crate::model::ProgressUpdate;

pub const MALFORMED_REQUEST: &str = "Malformed request";
pub const MISSING_PLAYER_ID: &str = "Missing playerId";
pub const MISSING_PLAYER_TOKEN: &str = "Missing playerToken";
pub const MISSING_PROGRESS: &str = "The following are required: betaTester, metabits, dino_rank, prestige_rank, singularity_speedrun_time, all_sharks_obtained, all_hidden_achievements_obtained";

/// Flag fields count as present whenever they are non-null.
const FLAG_FIELDS: [&str; 3] = [
    "betaTester",
    "all_sharks_obtained",
    "all_hidden_achievements_obtained",
];

/// Numeric fields count as present only when truthy, so `0` is absent.
const NUMERIC_FIELDS: [&str; 4] = [
    "metabits",
    "dino_rank",
    "prestige_rank",
    "singularity_speedrun_time",
];

/// Query-string extractor for player routes. Never rejects, so a bad
/// query string still reaches the gateway and gets its ordered answers.
pub type RawPlayerQuery = Result<Query<Vec<(String, String)>>, QueryRejection>;

#[derive(Debug, Default)]
pub struct PlayerQuery {
    pub player_id: Option<String>,
}

impl PlayerQuery {
    /// The first `playerId` wins when the key repeats. An undecodable query
    /// string carries no player id.
    pub fn from_raw(raw: RawPlayerQuery) -> Self {
        let pairs = match raw {
            Ok(Query(pairs)) => pairs,
            Err(e) => {
                tracing::debug!("ignoring undecodable query string: {}", e);
                Vec::new()
            }
        };
        let player_id = pairs
            .into_iter()
            .find(|(k, _)| k == "playerId")
            .map(|(_, v)| v);
        Self { player_id }
    }
}

/// A progress report that passed every gateway check.
#[derive(Debug)]
pub struct ProgressRequest {
    pub player_id: String,
    pub player_token: String,
    pub update: ProgressUpdate,
}

/// Parse the raw body as a JSON object.
pub fn json_object(body: &Bytes) -> Result<Map<String, Value>, ServiceError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ServiceError::Malformed(MALFORMED_REQUEST.into())),
    }
}

pub fn require_player_id(query: &PlayerQuery) -> Result<String, ServiceError> {
    match query.player_id.as_deref() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ServiceError::PermissionDenied(MISSING_PLAYER_ID.into())),
    }
}

/// Only a non-empty string is accepted as a player token.
pub fn require_player_token(body: &Map<String, Value>) -> Result<String, ServiceError> {
    match body.get("playerToken") {
        Some(Value::String(t)) if !t.is_empty() => Ok(t.clone()),
        _ => Err(ServiceError::PermissionDenied(MISSING_PLAYER_TOKEN.into())),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// True when at least one progress field is present.
pub fn has_progress(body: &Map<String, Value>) -> bool {
    let flag = FLAG_FIELDS
        .iter()
        .any(|f| body.get(*f).is_some_and(|v| !v.is_null()));
    let number = NUMERIC_FIELDS
        .iter()
        .any(|f| body.get(*f).is_some_and(truthy));
    flag || number
}

/// Run every check for `POST /userdata` and decode the payload.
pub fn check_progress_request(
    auth: &dyn Authenticator,
    headers: &HeaderMap,
    query: &PlayerQuery,
    body: &Bytes,
) -> Result<ProgressRequest, ServiceError> {
    let body = json_object(body)?;
    let player_id = require_player_id(query)?;
    auth.check(headers)?;
    let player_token = require_player_token(&body)?;

    if !has_progress(&body) {
        return Err(ServiceError::Validation(MISSING_PROGRESS.into()));
    }

    let update: ProgressUpdate = serde_json::from_value(Value::Object(body))
        .map_err(|e| ServiceError::Validation(format!("Invalid progress data: {}", e)))?;
    update.validate().map_err(ServiceError::Validation)?;

    Ok(ProgressRequest {
        player_id,
        player_token,
        update,
    })
}
