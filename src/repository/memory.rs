use std::collections::HashMap;

use anyhow::{Result, bail};

use super::{RatingRepository, RatingStore};
use crate::rating::types::{
    CooldownEntry, MatchOutcome, ParticipantSetKey, RatingKey, RatingRecord, RatingUpdate,
};

/// Repository kept entirely in memory; used by tests and dry runs
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    ratings: HashMap<RatingKey, RatingRecord>,
    cooldowns: HashMap<ParticipantSetKey, CooldownEntry>,
    outcomes: HashMap<String, MatchOutcome>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Seeds a rating record directly
    pub fn insert_rating(&mut self, record: RatingRecord) {
        self.ratings.insert(record.key(), record);
    }
}

impl RatingStore for InMemoryRepository {
    fn is_processed(&mut self, match_id: &str) -> Result<bool> {
        Ok(self.outcomes.contains_key(match_id))
    }

    fn get_rating(&mut self, key: &RatingKey) -> Result<Option<RatingRecord>> {
        Ok(self.ratings.get(key).cloned())
    }

    fn get_cooldown(&mut self, key: &ParticipantSetKey) -> Result<Option<CooldownEntry>> {
        Ok(self.cooldowns.get(key).cloned())
    }

    fn write(&mut self, update: &RatingUpdate) -> Result<()> {
        if self.outcomes.contains_key(&update.outcome.match_id) {
            bail!("Match {} is already processed", update.outcome.match_id);
        }

        for record in &update.records {
            self.ratings.insert(record.key(), record.clone());
        }
        if let Some(cooldown) = &update.cooldown {
            self.cooldowns
                .insert(cooldown.participant_set_key.clone(), cooldown.clone());
        }
        self.outcomes
            .insert(update.outcome.match_id.clone(), update.outcome.clone());
        Ok(())
    }
}

impl RatingRepository for InMemoryRepository {
    /// `&mut self` already excludes other writers; a failed unit restores the snapshot
    fn transact<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn RatingStore) -> Result<T>,
    {
        let snapshot = self.clone();
        work(self).inspect_err(|_| *self = snapshot)
    }

    fn rating(&mut self, key: &RatingKey) -> Result<Option<RatingRecord>> {
        Ok(self.ratings.get(key).cloned())
    }

    fn outcome(&mut self, match_id: &str) -> Result<Option<MatchOutcome>> {
        Ok(self.outcomes.get(match_id).cloned())
    }
}
