use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::Side;
use crate::rating::types::{MatchOutcome, ParticipantSetKey};

/// Inserts the outcome unless the match is already there. Returns false on a duplicate.
pub fn insert_outcome(conn: &Connection, outcome: &MatchOutcome) -> Result<bool> {
    let sql = "INSERT OR IGNORE INTO match_outcomes (match_id, winner, participant_set_key, rated, processed_at) VALUES (?1, ?2, ?3, ?4, ?5)";

    let inserted = conn
        .execute(
            sql,
            params![
                outcome.match_id,
                outcome.winner.as_str(),
                outcome.participant_set_key.as_str(),
                outcome.rated,
                outcome.processed_at
            ],
        )
        .with_context(|| format!("Failed to record outcome of match {}", outcome.match_id))?;

    Ok(inserted == 1)
}

pub fn exists(conn: &Connection, match_id: &str) -> Result<bool> {
    let sql = "SELECT 1 FROM match_outcomes WHERE match_id = ?1";

    let found: Option<i64> = conn
        .query_row(sql, params![match_id], |row| row.get(0))
        .optional()
        .context("Failed to check processed match")?;
    Ok(found.is_some())
}

pub fn find_outcome(conn: &Connection, match_id: &str) -> Result<Option<MatchOutcome>> {
    let sql = "SELECT match_id, winner, participant_set_key, rated, processed_at FROM match_outcomes WHERE match_id = ?1";

    conn.query_row(sql, params![match_id], parse_outcome_row)
        .optional()
        .context("Failed to get match outcome")
}

fn parse_outcome_row(row: &rusqlite::Row) -> rusqlite::Result<MatchOutcome> {
    let winner: String = row.get(1)?;
    let key: String = row.get(2)?;
    Ok(MatchOutcome {
        match_id: row.get(0)?,
        winner: Side::from_str_name(&winner).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("Unknown side in match_outcomes: {}", winner).into(),
            )
        })?,
        participant_set_key: ParticipantSetKey::from(key),
        rated: row.get(3)?,
        processed_at: row.get(4)?,
    })
}
