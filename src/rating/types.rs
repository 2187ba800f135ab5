use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Discipline, MatchContext, MatchId, ParticipantId, Side, team_id};

pub type RatingValue = f64;

/// Identifies one rating namespace entry: a user in a (discipline, pool)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingKey {
    pub user_id: ParticipantId,
    pub discipline: Discipline,
    /// `RatingPool::storage_key`
    pub pool: String,
}

impl RatingKey {
    pub fn for_participant(user_id: &str, context: &MatchContext) -> Self {
        Self {
            user_id: user_id.to_string(),
            discipline: context.discipline,
            pool: context.pool.storage_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub user_id: ParticipantId,
    pub discipline: Discipline,
    pub pool: String,
    pub rating: RatingValue,
    pub match_count: u32,
}

impl RatingRecord {
    /// Record for a participant that has never been rated in this namespace
    pub fn initial(key: &RatingKey, initial_rating: RatingValue) -> Self {
        Self {
            user_id: key.user_id.clone(),
            discipline: key.discipline,
            pool: key.pool.clone(),
            rating: initial_rating,
            match_count: 0,
        }
    }

    pub fn key(&self) -> RatingKey {
        RatingKey {
            user_id: self.user_id.clone(),
            discipline: self.discipline,
            pool: self.pool.clone(),
        }
    }
}

/// Canonical, order-independent key of an exact participant configuration.
///
/// Singles: `amy|bob`. Doubles: each team sorted, then teams sorted: `amy+bob|cat+dan`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantSetKey(String);

impl ParticipantSetKey {
    pub fn from_context(context: &MatchContext) -> Self {
        let mut teams = [team_id(&context.side_a), team_id(&context.side_b)];
        teams.sort_unstable();
        Self(teams.join("|"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ParticipantSetKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParticipantSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownEntry {
    pub participant_set_key: ParticipantSetKey,
    pub last_rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    New,
    Established,
}

impl ParticipantStatus {
    pub fn classify(match_count: u32, threshold: u32) -> Self {
        if match_count < threshold {
            ParticipantStatus::New
        } else {
            ParticipantStatus::Established
        }
    }

    pub fn from_flag(is_new: bool) -> Self {
        if is_new {
            ParticipantStatus::New
        } else {
            ParticipantStatus::Established
        }
    }
}

/// Why a result did not move ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyProcessed,
    Cooldown,
}

impl SkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            SkipReason::AlreadyProcessed => "already_processed",
            SkipReason::Cooldown => "cooldown",
        }
    }
}

/// Rating movement of one participant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub user_id: ParticipantId,
    pub side: Side,
    pub before: RatingValue,
    pub after: RatingValue,
}

impl RatingChange {
    pub fn delta(&self) -> RatingValue {
        self.after - self.before
    }
}

/// Result of applying a match to ratings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingOutcome {
    /// Winner side's rating delta; zero when nothing was applied
    pub delta: RatingValue,
    pub applied: bool,
    pub reason: Option<SkipReason>,
    pub changes: Vec<RatingChange>,
}

impl RatingOutcome {
    pub fn applied(delta: RatingValue, changes: Vec<RatingChange>) -> Self {
        Self {
            delta,
            applied: true,
            reason: None,
            changes,
        }
    }

    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            delta: 0.0,
            applied: false,
            reason: Some(reason),
            changes: Vec::new(),
        }
    }

    pub fn reason_str(&self) -> &str {
        self.reason.as_ref().map(|r| r.as_str()).unwrap_or("applied")
    }
}

/// Stored outcome of a processed match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub match_id: MatchId,
    pub winner: Side,
    pub participant_set_key: ParticipantSetKey,
    /// False for friendlies recorded inside the cooldown window
    pub rated: bool,
    pub processed_at: DateTime<Utc>,
}

/// Everything one `apply_result` writes; committed as a single unit
#[derive(Debug, Clone, PartialEq)]
pub struct RatingUpdate {
    pub outcome: MatchOutcome,
    pub records: Vec<RatingRecord>,
    pub cooldown: Option<CooldownEntry>,
}
