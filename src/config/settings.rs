use chrono::Duration;

use crate::scoring::resolver::SETS_TO_WIN;

pub const DEFAULT_DATABASE_PATH: &str = "pickleball_ranking.db";

#[derive(Debug, Clone, PartialEq)]
pub struct KFactorSettings {
    pub club_league: f64,
    pub club_tournament_new: f64,
    pub club_tournament_established: f64,
    pub global: f64,
}

impl Default for KFactorSettings {
    fn default() -> Self {
        Self {
            club_league: 16.0,
            club_tournament_new: 32.0,
            club_tournament_established: 24.0,
            global: 32.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingSettings {
    /// Rating a missing record is materialized with
    pub initial_rating: f64,
    pub k_factors: KFactorSettings,
    /// Repeat matches of the same exact configuration inside this window are not rated
    pub cooldown_window: Duration,
    /// Below this many rated matches in a (discipline, pool) a participant counts as new
    pub new_participant_matches: u32,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            initial_rating: 1500.0,
            k_factors: KFactorSettings::default(),
            cooldown_window: Duration::days(90),
            new_participant_matches: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSettings {
    pub max_sets: usize,
    pub sets_to_win: usize,
    pub tiebreak_margin: i32,
    pub tiebreak_points: i32,
    pub super_tiebreak_points: i32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            max_sets: 3,
            sets_to_win: SETS_TO_WIN,
            tiebreak_margin: 2,
            tiebreak_points: 7,
            super_tiebreak_points: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub scoring: ScoringSettings,
    pub cache: CacheSettings,
    pub database_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            scoring: ScoringSettings::default(),
            cache: CacheSettings::default(),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
        }
    }

    pub fn with_database_path(mut self, path: Option<String>) -> Self {
        if let Some(path) = path {
            self.database_path = path;
        }
        self
    }
}
