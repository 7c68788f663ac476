use serde::{Deserialize, Serialize};

use super::number::{
    deserialize_count, deserialize_opt_count, serialize_number, serialize_opt_number,
};

/// A player's stored progress, keyed by the derived auth token.
///
/// Field names match the documents existing game clients already read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Member id on the community platform. Immutable once provisioned.
    #[serde(rename = "discordId")]
    pub discord_id: String,

    /// hex(HMAC-SHA1(shared secret, playerId ‖ playerToken)).
    pub token: String,

    #[serde(rename = "betaTester", default)]
    pub beta_tester: bool,

    #[serde(default, serialize_with = "serialize_number")]
    pub metabits: f64,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub dino_rank: u32,

    /// Informational only, never used for role decisions.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub prestige_rank: u32,

    /// Best singularity run in seconds. `None` means not attempted.
    #[serde(default, serialize_with = "serialize_opt_number")]
    pub singularity_speedrun_time: Option<f64>,

    #[serde(default)]
    pub all_sharks_obtained: bool,

    #[serde(default)]
    pub all_hidden_achievements_obtained: bool,

    /// Unix milliseconds of the last successful update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_timestamp: Option<i64>,
}

impl PlayerRecord {
    /// A fresh record with every progress field at its default.
    pub fn new(discord_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            discord_id: discord_id.into(),
            token: token.into(),
            beta_tester: false,
            metabits: 0.0,
            dino_rank: 0,
            prestige_rank: 0,
            singularity_speedrun_time: None,
            all_sharks_obtained: false,
            all_hidden_achievements_obtained: false,
            edited_timestamp: None,
        }
    }

    /// Stamp the record as edited at `now`, never moving the timestamp back.
    pub fn touch(&mut self, now: i64) {
        let stamp = match self.edited_timestamp {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        self.edited_timestamp = Some(stamp);
    }
}

/// Partial progress payload. Absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressUpdate {
    #[serde(rename = "betaTester", default)]
    pub beta_tester: Option<bool>,

    #[serde(default)]
    pub metabits: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_opt_count")]
    pub dino_rank: Option<u32>,

    #[serde(default, deserialize_with = "deserialize_opt_count")]
    pub prestige_rank: Option<u32>,

    #[serde(default)]
    pub singularity_speedrun_time: Option<f64>,

    #[serde(default)]
    pub all_sharks_obtained: Option<bool>,

    #[serde(default)]
    pub all_hidden_achievements_obtained: Option<bool>,
}

impl ProgressUpdate {
    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.beta_tester.is_none()
            && self.metabits.is_none()
            && self.dino_rank.is_none()
            && self.prestige_rank.is_none()
            && self.singularity_speedrun_time.is_none()
            && self.all_sharks_obtained.is_none()
            && self.all_hidden_achievements_obtained.is_none()
    }

    /// Reject negative or non-finite numbers.
    pub fn validate(&self) -> Result<(), String> {
        let numbers = [
            ("metabits", self.metabits),
            ("singularity_speedrun_time", self.singularity_speedrun_time),
        ];
        for (name, value) in numbers {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{} must be a non-negative number", name));
                }
            }
        }
        Ok(())
    }

    /// Copy every present field onto `record`.
    pub fn apply_to(&self, record: &mut PlayerRecord) {
        if let Some(v) = self.beta_tester {
            record.beta_tester = v;
        }
        if let Some(v) = self.metabits {
            record.metabits = v;
        }
        if let Some(v) = self.dino_rank {
            record.dino_rank = v;
        }
        if let Some(v) = self.prestige_rank {
            record.prestige_rank = v;
        }
        if let Some(v) = self.singularity_speedrun_time {
            record.singularity_speedrun_time = Some(v);
        }
        if let Some(v) = self.all_sharks_obtained {
            record.all_sharks_obtained = v;
        }
        if let Some(v) = self.all_hidden_achievements_obtained {
            record.all_hidden_achievements_obtained = v;
        }
    }
}

/// Input for provisioning a new record.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionRecord {
    #[serde(rename = "discordId")]
    pub discord_id: String,

    #[serde(rename = "playerId")]
    pub player_id: String,

    #[serde(rename = "playerToken")]
    pub player_token: String,

    #[serde(flatten)]
    pub progress: ProgressUpdate,
}
