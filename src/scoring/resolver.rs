use super::types::{MatchScore, ScoreSheet};
use crate::domain::Side;

/// Sets needed to take a best-of-3 match
pub const SETS_TO_WIN: usize = 2;

/// Derives the authoritative winner of a match.
///
/// Pure and idempotent. `None` means the result cannot be derived from the
/// sheet (walkover, incomplete or tied data) and must be decided elsewhere.
pub fn resolve(sheet: &ScoreSheet<'_>) -> Option<Side> {
    if sheet.walkover {
        return None;
    }

    if let Some(retirement) = sheet.retirement {
        return Some(retirement.retired_side.opponent());
    }

    let mut won_a = 0;
    let mut won_b = 0;
    for set in sheet.sets {
        match set.winner() {
            Some(Side::A) => won_a += 1,
            Some(Side::B) => won_b += 1,
            None => continue,
        }

        if won_a == SETS_TO_WIN {
            return Some(Side::A);
        }
        if won_b == SETS_TO_WIN {
            return Some(Side::B);
        }
    }

    None
}

/// Winner of a persisted score. A walkover carries its externally decided
/// winner; every other score is resolved from its sets.
pub fn authoritative_winner(score: &MatchScore) -> Option<Side> {
    if score.walkover {
        return score.winner;
    }
    resolve(&score.sheet())
}
