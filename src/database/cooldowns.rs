use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::rating::types::{CooldownEntry, ParticipantSetKey};

pub fn upsert_cooldown(conn: &Connection, entry: &CooldownEntry) -> Result<()> {
    let sql = "INSERT INTO cooldowns (participant_set_key, last_rated_at) VALUES (?1, ?2) ON CONFLICT (participant_set_key) DO UPDATE SET last_rated_at = excluded.last_rated_at";

    conn.execute(
        sql,
        params![entry.participant_set_key.as_str(), entry.last_rated_at],
    )
    .with_context(|| format!("Failed to upsert cooldown for {}", entry.participant_set_key))?;
    Ok(())
}

pub fn get_cooldown(
    conn: &Connection,
    key: &ParticipantSetKey,
) -> Result<Option<CooldownEntry>> {
    let sql = "SELECT participant_set_key, last_rated_at FROM cooldowns WHERE participant_set_key = ?1";

    conn.query_row(sql, params![key.as_str()], parse_cooldown_row)
        .optional()
        .context("Failed to get cooldown entry")
}

fn parse_cooldown_row(row: &rusqlite::Row) -> rusqlite::Result<CooldownEntry> {
    let key: String = row.get(0)?;
    Ok(CooldownEntry {
        participant_set_key: ParticipantSetKey::from(key),
        last_rated_at: row.get(1)?,
    })
}
