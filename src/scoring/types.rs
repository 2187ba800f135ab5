use serde::{Deserialize, Serialize};

use super::input::RawSetScore;
use crate::domain::Side;

/// Tiebreak points won by each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakPoints {
    pub a: i32,
    pub b: i32,
}

impl TiebreakPoints {
    pub fn winner(&self) -> Option<Side> {
        higher_of(self.a, self.b)
    }

    pub fn margin(&self) -> i32 {
        (self.a - self.b).abs()
    }

    pub fn winning_points(&self) -> i32 {
        self.a.max(self.b)
    }
}

/// Canonical set score. Every accepted input shape is normalized into this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSetScore")]
pub struct SetScore {
    pub a: i32,
    pub b: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<TiebreakPoints>,
}

impl SetScore {
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b, tiebreak: None }
    }

    pub fn with_tiebreak(a: i32, b: i32, tiebreak_a: i32, tiebreak_b: i32) -> Self {
        Self {
            a,
            b,
            tiebreak: Some(TiebreakPoints {
                a: tiebreak_a,
                b: tiebreak_b,
            }),
        }
    }

    pub fn games(&self, side: Side) -> i32 {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// Side that took the set; equal game counts fall back to tiebreak points
    pub fn winner(&self) -> Option<Side> {
        higher_of(self.a, self.b).or_else(|| self.tiebreak.and_then(|tb| tb.winner()))
    }
}

fn higher_of(a: i32, b: i32) -> Option<Side> {
    match a.cmp(&b) {
        std::cmp::Ordering::Greater => Some(Side::A),
        std::cmp::Ordering::Less => Some(Side::B),
        std::cmp::Ordering::Equal => None,
    }
}

/// Games needed to win a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringFormat {
    /// Sets to 6 games
    #[default]
    Standard,
    /// Sets to 4 games
    Short,
}

impl ScoringFormat {
    pub fn games_per_set(&self) -> i32 {
        match self {
            ScoringFormat::Standard => 6,
            ScoringFormat::Short => 4,
        }
    }

    /// Whether a set may finish `g+1 : g-1` without a tiebreak
    pub fn allows_extended_finish(&self) -> bool {
        matches!(self, ScoringFormat::Standard)
    }
}

impl TryFrom<u8> for ScoringFormat {
    type Error = anyhow::Error;

    fn try_from(games_per_set: u8) -> anyhow::Result<Self> {
        match games_per_set {
            6 => Ok(ScoringFormat::Standard),
            4 => Ok(ScoringFormat::Short),
            other => anyhow::bail!("Unsupported games per set: {} (expected 6 or 4)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retirement {
    pub set_index: usize,
    pub retired_side: Side,
}

/// Persisted score of one match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    #[serde(default)]
    pub format: ScoringFormat,
    #[serde(default)]
    pub sets: Vec<SetScore>,
    #[serde(default)]
    pub winner: Option<Side>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub retirement: Option<Retirement>,
    #[serde(default)]
    pub walkover: bool,
}

impl MatchScore {
    /// Resolver view of the score; carries no winner field
    pub fn sheet(&self) -> ScoreSheet<'_> {
        ScoreSheet {
            sets: &self.sets,
            retirement: self.retirement,
            walkover: self.walkover,
        }
    }
}

/// Everything the winner can be derived from, and nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSheet<'a> {
    pub sets: &'a [SetScore],
    pub retirement: Option<Retirement>,
    pub walkover: bool,
}

impl<'a> ScoreSheet<'a> {
    pub fn played(sets: &'a [SetScore]) -> Self {
        Self {
            sets,
            retirement: None,
            walkover: false,
        }
    }
}
