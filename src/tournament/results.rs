use log::{debug, warn};

use crate::domain::{MatchRecord, MatchStatus, ResolvedMatch, Side};
use crate::scoring::{ScoreValidator, authoritative_winner};

/// Projects stored match records onto what standings may count.
///
/// Only confirmed records carry a winner. A played score is validated again
/// and its winner derived from the sets, so a winner stored next to the score
/// is never trusted; a walkover keeps the organizer's decision. Every other
/// record is kept without a winner so its participants are still checked
/// against the roster.
pub fn confirmed_results(
    records: &[MatchRecord],
    validator: &ScoreValidator,
) -> Vec<ResolvedMatch> {
    records
        .iter()
        .map(|record| {
            let mut resolved = record.to_resolved();
            resolved.winner = counted_winner(record, validator);
            resolved
        })
        .collect()
}

fn counted_winner(record: &MatchRecord, validator: &ScoreValidator) -> Option<Side> {
    if record.status != MatchStatus::Confirmed {
        debug!(
            "Match {} is {}, not counted",
            record.id,
            record.status.as_str()
        );
        return None;
    }

    let report = validator.validate_match(&record.score);
    if !report.is_valid {
        warn!(
            "Confirmed match {} has an invalid score ({} errors), not counted",
            record.id,
            report.errors.len()
        );
        return None;
    }
    authoritative_winner(&record.score)
}
