use std::collections::BTreeSet;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::scoring::types::MatchScore;

pub type ParticipantId = String;
pub type MatchId = String;
pub type TournamentId = String;
pub type ClubId = String;

/// One of the two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "a" => Some(Side::A),
            "b" => Some(Side::B),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Discipline {
    Singles,
    Doubles,
    MixedDoubles,
}

impl Discipline {
    /// Number of participants each side must field
    pub fn side_size(&self) -> usize {
        match self {
            Discipline::Singles => 1,
            Discipline::Doubles | Discipline::MixedDoubles => 2,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Discipline::Singles => "singles",
            Discipline::Doubles => "doubles",
            Discipline::MixedDoubles => "mixed_doubles",
        }
    }

    /// Parse a stored discipline name
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "singles" => Some(Discipline::Singles),
            "doubles" => Some(Discipline::Doubles),
            "mixed_doubles" => Some(Discipline::MixedDoubles),
            _ => None,
        }
    }
}

/// Kind of club competition; selects the K-factor, not the rating namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClubCompetition {
    League,
    Tournament,
}

/// Independent rating namespace a match can affect
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RatingPool {
    Global,
    #[serde(rename_all = "camelCase")]
    Club {
        club_id: ClubId,
        competition: ClubCompetition,
    },
}

impl RatingPool {
    /// Storage namespace. League and tournament matches of one club share it.
    pub fn storage_key(&self) -> String {
        match self {
            RatingPool::Global => "global".to_string(),
            RatingPool::Club { club_id, .. } => format!("club:{}", club_id),
        }
    }
}

/// Context a confirmed match is rated in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchContext {
    pub discipline: Discipline,
    pub pool: RatingPool,
    pub side_a: Vec<ParticipantId>,
    pub side_b: Vec<ParticipantId>,
    #[serde(default)]
    pub new_participant_a: bool,
    #[serde(default)]
    pub new_participant_b: bool,
}

impl MatchContext {
    pub fn participants(&self, side: Side) -> &[ParticipantId] {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn is_new(&self, side: Side) -> bool {
        match side {
            Side::A => self.new_participant_a,
            Side::B => self.new_participant_b,
        }
    }

    pub fn set_new(&mut self, side: Side, is_new: bool) {
        match side {
            Side::A => self.new_participant_a = is_new,
            Side::B => self.new_participant_b = is_new,
        }
    }

    /// Side the participant plays on, if any
    pub fn side_of(&self, participant: &str) -> Option<Side> {
        if self.side_a.iter().any(|p| p == participant) {
            Some(Side::A)
        } else if self.side_b.iter().any(|p| p == participant) {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Checks side sizes against the discipline and that no participant repeats
    pub fn check(&self) -> Result<()> {
        let expected = self.discipline.side_size();

        for side in [Side::A, Side::B] {
            let members = self.participants(side);
            if members.len() != expected {
                bail!(
                    "{} side {} has {} participants, expected {}",
                    self.discipline.as_str(),
                    side.as_str(),
                    members.len(),
                    expected
                );
            }
            if members.iter().any(|p| p.is_empty()) {
                bail!("side {} contains an empty participant id", side.as_str());
            }
        }

        let unique: BTreeSet<&str> = self
            .side_a
            .iter()
            .chain(self.side_b.iter())
            .map(String::as_str)
            .collect();
        if unique.len() != expected * 2 {
            bail!("a participant appears more than once in the match");
        }

        Ok(())
    }
}

/// Two-party confirmation state of a submitted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pending,
    Submitted,
    Confirmed,
    Disputed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Submitted => "submitted",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::Disputed => "disputed",
        }
    }
}

/// Persisted match record as handed over by the storage collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub context: MatchContext,
    pub score: MatchScore,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub submitted_by: Option<ParticipantId>,
    #[serde(default)]
    pub rating_applied: bool,
    #[serde(default)]
    pub tournament_id: Option<TournamentId>,
}

impl MatchRecord {
    pub fn new(id: impl Into<MatchId>, context: MatchContext) -> Self {
        Self {
            id: id.into(),
            context,
            score: MatchScore::default(),
            status: MatchStatus::Pending,
            submitted_by: None,
            rating_applied: false,
            tournament_id: None,
        }
    }

    /// Projection used by tournament standings. Team ids are derived for doubles.
    pub fn to_resolved(&self) -> ResolvedMatch {
        ResolvedMatch {
            match_id: self.id.clone(),
            tournament_id: self.tournament_id.clone(),
            side_a: team_id(&self.context.side_a),
            side_b: team_id(&self.context.side_b),
            winner: self.score.winner,
        }
    }
}

/// A match with its authoritative winner, as consumed by standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMatch {
    pub match_id: MatchId,
    #[serde(default)]
    pub tournament_id: Option<TournamentId>,
    pub side_a: ParticipantId,
    pub side_b: ParticipantId,
    pub winner: Option<Side>,
}

impl ResolvedMatch {
    pub fn participant(&self, side: Side) -> &str {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

/// Order-independent id of a team: members sorted and joined with `+`
pub fn team_id(members: &[ParticipantId]) -> String {
    let mut sorted: Vec<&str> = members.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubles(a: [&str; 2], b: [&str; 2]) -> MatchContext {
        MatchContext {
            discipline: Discipline::Doubles,
            pool: RatingPool::Global,
            side_a: a.iter().map(|s| s.to_string()).collect(),
            side_b: b.iter().map(|s| s.to_string()).collect(),
            new_participant_a: false,
            new_participant_b: false,
        }
    }

    #[test]
    fn test_team_id_is_order_independent() {
        let first = team_id(&["zoe".to_string(), "amy".to_string()]);
        let second = team_id(&["amy".to_string(), "zoe".to_string()]);
        assert_eq!(first, "amy+zoe");
        assert_eq!(first, second);
    }

    #[test]
    fn test_context_check_accepts_valid_doubles() {
        assert!(doubles(["a", "b"], ["c", "d"]).check().is_ok());
    }

    #[test]
    fn test_context_check_rejects_shared_player() {
        assert!(doubles(["a", "b"], ["b", "d"]).check().is_err());
    }

    #[test]
    fn test_context_check_rejects_wrong_side_size() {
        let mut context = doubles(["a", "b"], ["c", "d"]);
        context.discipline = Discipline::Singles;
        assert!(context.check().is_err());
    }

    #[test]
    fn test_discipline_names_round_trip() {
        for discipline in [
            Discipline::Singles,
            Discipline::Doubles,
            Discipline::MixedDoubles,
        ] {
            assert_eq!(Discipline::from_str_name(discipline.as_str()), Some(discipline));
        }
        assert_eq!(Discipline::from_str_name("triples"), None);
    }

    #[test]
    fn test_club_pools_share_storage_key() {
        let league = RatingPool::Club {
            club_id: "riverside".to_string(),
            competition: ClubCompetition::League,
        };
        let tournament = RatingPool::Club {
            club_id: "riverside".to_string(),
            competition: ClubCompetition::Tournament,
        };
        assert_eq!(league.storage_key(), tournament.storage_key());
        assert_ne!(league.storage_key(), RatingPool::Global.storage_key());
    }

    #[test]
    fn test_pool_deserializes_from_tagged_json() {
        let pool: RatingPool =
            serde_json::from_str(r#"{"kind":"club","clubId":"c1","competition":"tournament"}"#)
                .unwrap();
        assert_eq!(
            pool,
            RatingPool::Club {
                club_id: "c1".to_string(),
                competition: ClubCompetition::Tournament
            }
        );
    }
}
