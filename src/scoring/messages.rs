use serde::Serialize;

/// Identifies a validation message independently of its wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    NoSets,
    TooManySets,
    GamesOutOfRange,
    InvalidSetScore,
    TiebreakRequired,
    TiebreakNotAllowed,
    TiebreakNegative,
    TiebreakMargin,
    TiebreakMinimum,
    TiebreakContradictsSet,
    SetWonBelowThreshold,
    SetUnfinished,
    SetAfterDecision,
    RetirementOutOfRange,
}

impl MessageKey {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKey::NoSets => "score.no_sets",
            MessageKey::TooManySets => "score.too_many_sets",
            MessageKey::GamesOutOfRange => "score.games_out_of_range",
            MessageKey::InvalidSetScore => "score.invalid_set_score",
            MessageKey::TiebreakRequired => "score.tiebreak_required",
            MessageKey::TiebreakNotAllowed => "score.tiebreak_not_allowed",
            MessageKey::TiebreakNegative => "score.tiebreak_negative",
            MessageKey::TiebreakMargin => "score.tiebreak_margin",
            MessageKey::TiebreakMinimum => "score.tiebreak_minimum",
            MessageKey::TiebreakContradictsSet => "score.tiebreak_contradicts_set",
            MessageKey::SetWonBelowThreshold => "score.set_won_below_threshold",
            MessageKey::SetUnfinished => "score.set_unfinished",
            MessageKey::SetAfterDecision => "score.set_after_decision",
            MessageKey::RetirementOutOfRange => "score.retirement_out_of_range",
        }
    }
}

/// Values a message may interpolate. `set` is 1-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageParams {
    pub set: Option<usize>,
    pub games_per_set: i32,
    pub max_games: i32,
    pub minimum_points: i32,
    pub count: usize,
}

/// Renders a message for a key. Only affects presentation.
pub type MessageFormatter = Box<dyn Fn(MessageKey, &MessageParams) -> String + Send + Sync>;

/// Default English message set
pub fn default_message(key: MessageKey, params: &MessageParams) -> String {
    let set = params.set.unwrap_or(0);
    match key {
        MessageKey::NoSets => "At least one set is required".to_string(),
        MessageKey::TooManySets => {
            format!("A best-of-3 match has at most 3 sets, got {}", params.count)
        }
        MessageKey::GamesOutOfRange => {
            format!("Set {}: games must be between 0 and {}", set, params.max_games)
        }
        MessageKey::InvalidSetScore => format!(
            "Set {}: score is not a legal finish for sets to {} games",
            set, params.games_per_set
        ),
        MessageKey::TiebreakRequired => format!(
            "Set {}: both sides reached {} games, tiebreak points are required",
            set, params.games_per_set
        ),
        MessageKey::TiebreakNotAllowed => format!(
            "Set {}: tiebreak points are only allowed once both sides reach {} games",
            set, params.games_per_set
        ),
        MessageKey::TiebreakNegative => format!("Set {}: tiebreak points cannot be negative", set),
        MessageKey::TiebreakMargin => {
            format!("Set {}: tiebreak must be won by at least 2 points", set)
        }
        MessageKey::TiebreakMinimum => format!(
            "Set {}: tiebreak winner needs at least {} points",
            set, params.minimum_points
        ),
        MessageKey::TiebreakContradictsSet => {
            format!("Set {}: tiebreak winner does not match the set winner", set)
        }
        MessageKey::SetWonBelowThreshold => format!(
            "Set {}: won with fewer than {} games, please confirm a retirement",
            set, params.games_per_set
        ),
        MessageKey::SetUnfinished => format!("Set {}: set has no winner yet", set),
        MessageKey::SetAfterDecision => {
            format!("Set {}: recorded after the match was already decided", set)
        }
        MessageKey::RetirementOutOfRange => format!(
            "Retirement in set {} but only {} sets were recorded",
            set, params.count
        ),
    }
}
