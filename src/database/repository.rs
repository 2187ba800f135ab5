use anyhow::{Context, Result, bail};
use rusqlite::{Connection, TransactionBehavior};

use super::connection::{DbPool, get_connection};
use super::{cooldowns, outcomes, ratings};
use crate::cache::TtlCache;
use crate::config::settings::CacheSettings;
use crate::rating::types::{
    CooldownEntry, MatchOutcome, ParticipantSetKey, RatingKey, RatingRecord, RatingUpdate,
};
use crate::repository::{RatingRepository, RatingStore};

/// SQLite-backed rating storage.
///
/// Every unit of work runs in one `IMMEDIATE` transaction, so writers on the
/// same database file are serialized before their first read. Reads outside
/// a unit of work go through a TTL cache refreshed by this repository's writes.
pub struct SqliteRepository {
    pool: DbPool,
    cache: TtlCache<RatingKey, RatingRecord>,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, cache_settings: &CacheSettings) -> Self {
        Self {
            pool,
            cache: TtlCache::from_settings(cache_settings),
        }
    }
}

/// Store bound to an open transaction; never consults the cache
struct TransactionStore<'c> {
    conn: &'c Connection,
    written: Vec<RatingRecord>,
}

impl RatingStore for TransactionStore<'_> {
    fn is_processed(&mut self, match_id: &str) -> Result<bool> {
        outcomes::exists(self.conn, match_id)
    }

    fn get_rating(&mut self, key: &RatingKey) -> Result<Option<RatingRecord>> {
        ratings::get_rating(self.conn, key)
    }

    fn get_cooldown(&mut self, key: &ParticipantSetKey) -> Result<Option<CooldownEntry>> {
        cooldowns::get_cooldown(self.conn, key)
    }

    fn write(&mut self, update: &RatingUpdate) -> Result<()> {
        if !outcomes::insert_outcome(self.conn, &update.outcome)? {
            bail!("Match {} is already processed", update.outcome.match_id);
        }
        for record in &update.records {
            ratings::upsert_rating(self.conn, record)?;
        }
        if let Some(cooldown) = &update.cooldown {
            cooldowns::upsert_cooldown(self.conn, cooldown)?;
        }
        self.written.extend(update.records.iter().cloned());
        Ok(())
    }
}

impl RatingRepository for SqliteRepository {
    fn transact<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn RatingStore) -> Result<T>,
    {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to start rating transaction")?;

        let mut store = TransactionStore {
            conn: &tx,
            written: Vec::new(),
        };
        // dropping `tx` on error rolls the whole unit back
        let value = work(&mut store)?;
        let written = store.written;

        tx.commit().context("Failed to commit rating transaction")?;

        for record in written {
            self.cache.insert(record.key(), record);
        }
        Ok(value)
    }

    fn rating(&mut self, key: &RatingKey) -> Result<Option<RatingRecord>> {
        if let Some(record) = self.cache.get(key) {
            return Ok(Some(record));
        }

        let conn = get_connection(&self.pool)?;
        let record = ratings::get_rating(&conn, key)?;
        if let Some(record) = &record {
            self.cache.insert(key.clone(), record.clone());
        }
        Ok(record)
    }

    fn outcome(&mut self, match_id: &str) -> Result<Option<MatchOutcome>> {
        let conn = get_connection(&self.pool)?;
        outcomes::find_outcome(&conn, match_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_pool, setup::init_database};
    use crate::domain::{Discipline, Side};
    use chrono::{TimeZone, Utc};

    fn temp_repository(name: &str) -> (SqliteRepository, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "pickleball_repo_{}_{}.db",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let pool = create_pool(&path.to_string_lossy()).unwrap();
        init_database(&get_connection(&pool).unwrap()).unwrap();
        (SqliteRepository::new(pool, &CacheSettings::default()), path)
    }

    fn amy() -> RatingKey {
        RatingKey {
            user_id: "amy".to_string(),
            discipline: Discipline::Singles,
            pool: "global".to_string(),
        }
    }

    fn update(match_id: &str, rating: f64) -> RatingUpdate {
        let processed_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        RatingUpdate {
            outcome: MatchOutcome {
                match_id: match_id.to_string(),
                winner: Side::A,
                participant_set_key: ParticipantSetKey::from("amy|bob".to_string()),
                rated: true,
                processed_at,
            },
            records: vec![RatingRecord {
                user_id: "amy".to_string(),
                discipline: Discipline::Singles,
                pool: "global".to_string(),
                rating,
                match_count: 1,
            }],
            cooldown: Some(CooldownEntry {
                participant_set_key: ParticipantSetKey::from("amy|bob".to_string()),
                last_rated_at: processed_at,
            }),
        }
    }

    #[test]
    fn test_unit_of_work_stores_every_part() {
        let (mut repo, path) = temp_repository("commit");

        repo.transact(|store| store.write(&update("m1", 1516.0)))
            .unwrap();

        let outcome = repo.outcome("m1").unwrap().unwrap();
        assert_eq!(outcome.winner, Side::A);
        assert!(outcome.rated);
        assert_eq!(repo.rating(&amy()).unwrap().unwrap().rating, 1516.0);

        let cooldown = repo
            .transact(|store| store.get_cooldown(&ParticipantSetKey::from("amy|bob".to_string())))
            .unwrap();
        assert!(cooldown.is_some());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_failed_unit_of_work_rolls_back() {
        let (mut repo, path) = temp_repository("rollback");

        let result: Result<()> = repo.transact(|store| {
            store.write(&update("m1", 1516.0))?;
            bail!("rating failed after the write")
        });
        assert!(result.is_err());

        assert!(repo.outcome("m1").unwrap().is_none());
        let conn = get_connection(&repo.pool).unwrap();
        assert!(ratings::get_rating(&conn, &amy()).unwrap().is_none());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_duplicate_write_keeps_first_result() {
        let (mut repo, path) = temp_repository("duplicate");

        repo.transact(|store| store.write(&update("m1", 1516.0)))
            .unwrap();
        assert!(
            repo.transact(|store| store.write(&update("m1", 1600.0)))
                .is_err()
        );

        let conn = get_connection(&repo.pool).unwrap();
        let stored = ratings::get_rating(&conn, &amy()).unwrap().unwrap();
        assert_eq!(stored.rating, 1516.0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_reads_inside_unit_of_work_skip_cache() {
        let (mut repo, path) = temp_repository("cache");
        repo.transact(|store| store.write(&update("m1", 1516.0)))
            .unwrap();
        assert_eq!(repo.rating(&amy()).unwrap().unwrap().rating, 1516.0);

        let conn = get_connection(&repo.pool).unwrap();
        let mut changed = update("m2", 1540.0).records.remove(0);
        changed.match_count = 2;
        ratings::upsert_rating(&conn, &changed).unwrap();
        drop(conn);

        let inside = repo
            .transact(|store| store.get_rating(&amy()))
            .unwrap()
            .unwrap();
        assert_eq!(inside.rating, 1540.0);
        assert_eq!(inside.match_count, 2);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unknown_match_has_no_outcome() {
        let (mut repo, path) = temp_repository("unknown");
        assert!(repo.outcome("missing").unwrap().is_none());
        assert!(!repo.transact(|store| store.is_processed("missing")).unwrap());
        let _ = std::fs::remove_file(path);
    }
}
