use super::types::ParticipantStatus;
use crate::config::settings::KFactorSettings;
use crate::domain::{ClubCompetition, RatingPool};

/// K-factor for a side, keyed by pool and participant status.
///
/// | Pool            | Status      | K      |
/// |-----------------|-------------|--------|
/// | Club league     | any         | 16     |
/// | Club tournament | new         | 32     |
/// | Club tournament | established | 24     |
/// | Global          | any         | 32     |
pub fn k_factor(settings: &KFactorSettings, pool: &RatingPool, status: ParticipantStatus) -> f64 {
    match pool {
        RatingPool::Global => settings.global,
        RatingPool::Club {
            competition: ClubCompetition::League,
            ..
        } => settings.club_league,
        RatingPool::Club {
            competition: ClubCompetition::Tournament,
            ..
        } => match status {
            ParticipantStatus::New => settings.club_tournament_new,
            ParticipantStatus::Established => settings.club_tournament_established,
        },
    }
}
