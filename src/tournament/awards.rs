use serde::{Deserialize, Serialize};

use super::standings::TournamentStanding;
use crate::domain::{ParticipantId, TournamentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Gold,
    Silver,
    Bronze,
}

impl Placement {
    pub fn from_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(Placement::Gold),
            2 => Some(Placement::Silver),
            3 => Some(Placement::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Placement::Gold => "gold",
            Placement::Silver => "silver",
            Placement::Bronze => "bronze",
        }
    }
}

/// Award trigger handed to the achievement collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub placement: Placement,
}

/// Podium awards for ranks 1 to 3. A tournament with no decided match awards nothing.
pub fn podium(tournament_id: &str, standings: &[TournamentStanding]) -> Vec<Award> {
    if standings.iter().all(|s| s.wins == 0) {
        return Vec::new();
    }

    standings
        .iter()
        .filter_map(|standing| {
            Placement::from_rank(standing.rank).map(|placement| Award {
                tournament_id: tournament_id.to_string(),
                participant_id: standing.participant_id.clone(),
                placement,
            })
        })
        .collect()
}
