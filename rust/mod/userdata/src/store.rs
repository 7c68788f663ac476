use std::sync::Arc;

use c2s_kv::{KVError, KVStore};

use crate::model::{PlayerRecord, ProgressUpdate};

const RECORD_PREFIX: &str = "userdata:record:";
const IDENTITY_PREFIX: &str = "userdata:identity:";

fn record_key(token: &str) -> String {
    format!("{}{}", RECORD_PREFIX, token)
}

fn identity_key(discord_id: &str) -> String {
    format!("{}{}", IDENTITY_PREFIX, discord_id)
}

fn decode(bytes: &[u8]) -> Result<PlayerRecord, KVError> {
    serde_json::from_slice(bytes).map_err(|e| KVError::Serialization(e.to_string()))
}

fn encode(record: &PlayerRecord) -> Result<Vec<u8>, KVError> {
    serde_json::to_vec(record).map_err(|e| KVError::Serialization(e.to_string()))
}

/// Player records as JSON documents in the KV store.
///
/// Records live under `userdata:record:<token>`. A second key,
/// `userdata:identity:<discordId>`, holds the token and keeps one record per
/// member.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KVStore>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    pub fn find_by_token(&self, token: &str) -> Result<Option<PlayerRecord>, KVError> {
        match self.kv.get(&record_key(token))? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Apply `update` to the record addressed by `token` and stamp it with
    /// `now`, in a single write transaction. Returns the record as stored
    /// after the write, or `None` when no record matches.
    pub fn find_one_and_update(
        &self,
        token: &str,
        update: &ProgressUpdate,
        now: i64,
    ) -> Result<Option<PlayerRecord>, KVError> {
        let mut apply = |current: &[u8]| -> Result<Vec<u8>, KVError> {
            let mut record = decode(current)?;
            update.apply_to(&mut record);
            record.touch(now);
            encode(&record)
        };
        match self.kv.update(&record_key(token), &mut apply)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Insert a new record. Fails with `AlreadyExists` if the token or the
    /// member id is already taken.
    pub fn insert(&self, record: &PlayerRecord) -> Result<(), KVError> {
        let value = encode(record)?;
        let rkey = record_key(&record.token);
        let ikey = identity_key(&record.discord_id);
        self.kv.create_all(&[
            (rkey.as_str(), value.as_slice()),
            (ikey.as_str(), record.token.as_bytes()),
        ])
    }

    /// Remove the record addressed by `token` and its identity entry.
    pub fn delete_by_token(&self, token: &str) -> Result<Option<PlayerRecord>, KVError> {
        let Some(record) = self.find_by_token(token)? else {
            return Ok(None);
        };
        let rkey = record_key(token);
        let ikey = identity_key(&record.discord_id);
        self.kv.batch_delete(&[rkey.as_str(), ikey.as_str()])?;
        Ok(Some(record))
    }

    /// Every stored record, ordered by token.
    pub fn list(&self) -> Result<Vec<PlayerRecord>, KVError> {
        self.kv
            .scan(RECORD_PREFIX)?
            .iter()
            .map(|(_, bytes)| decode(bytes))
            .collect()
    }
}
