use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::Discipline;
use crate::rating::types::{RatingKey, RatingRecord};

pub fn upsert_rating(conn: &Connection, record: &RatingRecord) -> Result<()> {
    let sql = "INSERT INTO ratings (user_id, discipline, pool, rating, match_count, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP) ON CONFLICT (user_id, discipline, pool) DO UPDATE SET rating = excluded.rating, match_count = excluded.match_count, updated_at = excluded.updated_at";

    conn.execute(
        sql,
        params![
            record.user_id,
            record.discipline.as_str(),
            record.pool,
            record.rating,
            record.match_count
        ],
    )
    .with_context(|| format!("Failed to upsert rating for {}", record.user_id))?;
    Ok(())
}

pub fn get_rating(conn: &Connection, key: &RatingKey) -> Result<Option<RatingRecord>> {
    let sql = "SELECT user_id, discipline, pool, rating, match_count FROM ratings WHERE user_id = ?1 AND discipline = ?2 AND pool = ?3";

    conn.query_row(
        sql,
        params![key.user_id, key.discipline.as_str(), key.pool],
        read_rating_row,
    )
    .optional()
    .context("Failed to get rating")
}

/// Ratings of one (discipline, pool), best first
pub fn list_by_pool(
    conn: &Connection,
    discipline: Discipline,
    pool: &str,
    limit: usize,
) -> Result<Vec<RatingRecord>> {
    let sql = "SELECT user_id, discipline, pool, rating, match_count FROM ratings WHERE discipline = ?1 AND pool = ?2 ORDER BY rating DESC, user_id ASC LIMIT ?3";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![discipline.as_str(), pool, limit as i64], read_rating_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn read_rating_row(row: &rusqlite::Row) -> rusqlite::Result<RatingRecord> {
    let discipline: String = row.get(1)?;
    Ok(RatingRecord {
        user_id: row.get(0)?,
        discipline: parse_discipline(&discipline)?,
        pool: row.get(2)?,
        rating: row.get(3)?,
        match_count: row.get(4)?,
    })
}

fn parse_discipline(name: &str) -> rusqlite::Result<Discipline> {
    Discipline::from_str_name(name).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("Unknown discipline in ratings: {}", name).into(),
        )
    })
}
