use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};

use super::elo::{rating_delta, side_rating};
use super::policy::k_factor;
use super::types::{
    CooldownEntry, MatchOutcome, ParticipantSetKey, ParticipantStatus, RatingChange, RatingKey,
    RatingOutcome, RatingRecord, RatingUpdate, SkipReason,
};
use crate::config::settings::RatingSettings;
use crate::domain::{MatchContext, Side};
use crate::repository::{RatingRepository, RatingStore};

/// Applies resolved match results to per-(discipline, pool) Elo ratings.
///
/// Every result is one read-modify-write inside a single repository unit of
/// work: the idempotency guard, the cooldown lookup, the rating reads and the
/// write all see the same state. Ratings of other pools are never read or written.
pub struct RatingEngine<R: RatingRepository> {
    repository: R,
    settings: RatingSettings,
}

impl<R: RatingRepository> RatingEngine<R> {
    pub fn new(repository: R, settings: RatingSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn apply_result(
        &mut self,
        match_id: &str,
        context: &MatchContext,
        winner: Side,
    ) -> Result<RatingOutcome> {
        self.apply_result_at(match_id, context, winner, Utc::now())
    }

    /// Rates a match with the new-participant flags given in `context`
    pub fn apply_result_at(
        &mut self,
        match_id: &str,
        context: &MatchContext,
        winner: Side,
        now: DateTime<Utc>,
    ) -> Result<RatingOutcome> {
        context
            .check()
            .with_context(|| format!("Invalid context for match {}", match_id))?;

        let settings = &self.settings;
        self.repository
            .transact(|store| RatingRun { store, settings }.apply(match_id, context, winner, now))
    }

    /// Fills the new-participant flags from stored match counts and rates the
    /// match, both in the same unit of work
    pub fn apply_classified_at(
        &mut self,
        match_id: &str,
        context: &mut MatchContext,
        winner: Side,
        now: DateTime<Utc>,
    ) -> Result<RatingOutcome> {
        context
            .check()
            .with_context(|| format!("Invalid context for match {}", match_id))?;

        let settings = &self.settings;
        self.repository.transact(|store| {
            let mut run = RatingRun { store, settings };
            run.classify(context)?;
            run.apply(match_id, context, winner, now)
        })
    }

    /// Current record of a participant, materialized at the initial rating if missing
    pub fn rating(&mut self, key: &RatingKey) -> Result<RatingRecord> {
        let record = self.repository.rating(key)?;
        Ok(record.unwrap_or_else(|| RatingRecord::initial(key, self.settings.initial_rating)))
    }

    /// Fills the new-participant flags of a context from stored match counts
    pub fn classify_context(&mut self, context: &mut MatchContext) -> Result<()> {
        let settings = &self.settings;
        self.repository
            .transact(|store| RatingRun { store, settings }.classify(context))
    }
}

/// One unit of work against the rating store
struct RatingRun<'a> {
    store: &'a mut dyn RatingStore,
    settings: &'a RatingSettings,
}

impl RatingRun<'_> {
    fn apply(
        &mut self,
        match_id: &str,
        context: &MatchContext,
        winner: Side,
        now: DateTime<Utc>,
    ) -> Result<RatingOutcome> {
        if self.store.is_processed(match_id)? {
            info!("Match {} already processed, skipping", match_id);
            return Ok(RatingOutcome::skipped(SkipReason::AlreadyProcessed));
        }

        let set_key = ParticipantSetKey::from_context(context);
        if self.in_cooldown(&set_key, now)? {
            return self.record_friendly(match_id, winner, set_key, now);
        }

        let loser = winner.opponent();
        let winner_records = self.load_side(context, winner)?;
        let loser_records = self.load_side(context, loser)?;

        let winner_rating = side_rating(&ratings_of(&winner_records));
        let loser_rating = side_rating(&ratings_of(&loser_records));

        let winner_k = self.side_k(context, winner);
        let loser_k = self.side_k(context, loser);

        let winner_delta = rating_delta(winner_k, winner_rating, loser_rating, 1.0);
        let loser_delta = rating_delta(loser_k, loser_rating, winner_rating, 0.0);
        debug!(
            "Match {}: {:.1} vs {:.1}, K {}/{}, delta {:+.2}/{:+.2}",
            match_id, winner_rating, loser_rating, winner_k, loser_k, winner_delta, loser_delta
        );

        let mut changes = Vec::new();
        let mut records = Vec::new();
        for (side, side_records, delta) in [
            (winner, winner_records, winner_delta),
            (loser, loser_records, loser_delta),
        ] {
            for mut record in side_records {
                changes.push(RatingChange {
                    user_id: record.user_id.clone(),
                    side,
                    before: record.rating,
                    after: record.rating + delta,
                });
                record.rating += delta;
                record.match_count += 1;
                records.push(record);
            }
        }

        self.store.write(&RatingUpdate {
            outcome: MatchOutcome {
                match_id: match_id.to_string(),
                winner,
                participant_set_key: set_key.clone(),
                rated: true,
                processed_at: now,
            },
            records,
            cooldown: Some(CooldownEntry {
                participant_set_key: set_key,
                last_rated_at: now,
            }),
        })?;

        info!(
            "Rated match {} in {} {}: winner delta {:+.2}",
            match_id,
            context.discipline.as_str(),
            context.pool.storage_key(),
            winner_delta
        );
        Ok(RatingOutcome::applied(winner_delta, changes))
    }

    fn classify(&mut self, context: &mut MatchContext) -> Result<()> {
        for side in [Side::A, Side::B] {
            let status = self.side_status(context, side)?;
            context.set_new(side, status == ParticipantStatus::New);
        }
        Ok(())
    }

    /// A side is new when any member is below the match threshold
    fn side_status(&mut self, context: &MatchContext, side: Side) -> Result<ParticipantStatus> {
        let threshold = self.settings.new_participant_matches;
        for user_id in context.participants(side) {
            let record = self.record(&RatingKey::for_participant(user_id, context))?;
            if ParticipantStatus::classify(record.match_count, threshold) == ParticipantStatus::New
            {
                return Ok(ParticipantStatus::New);
            }
        }
        Ok(ParticipantStatus::Established)
    }

    fn record(&mut self, key: &RatingKey) -> Result<RatingRecord> {
        let record = self.store.get_rating(key)?;
        Ok(record.unwrap_or_else(|| RatingRecord::initial(key, self.settings.initial_rating)))
    }

    fn in_cooldown(&mut self, key: &ParticipantSetKey, now: DateTime<Utc>) -> Result<bool> {
        let Some(entry) = self.store.get_cooldown(key)? else {
            return Ok(false);
        };
        let elapsed = now.signed_duration_since(entry.last_rated_at);
        Ok(elapsed < self.settings.cooldown_window)
    }

    fn record_friendly(
        &mut self,
        match_id: &str,
        winner: Side,
        set_key: ParticipantSetKey,
        now: DateTime<Utc>,
    ) -> Result<RatingOutcome> {
        self.store.write(&RatingUpdate {
            outcome: MatchOutcome {
                match_id: match_id.to_string(),
                winner,
                participant_set_key: set_key.clone(),
                rated: false,
                processed_at: now,
            },
            records: Vec::new(),
            cooldown: None,
        })?;

        info!(
            "Match {} recorded as friendly, {} is in rematch cooldown",
            match_id, set_key
        );
        Ok(RatingOutcome::skipped(SkipReason::Cooldown))
    }

    fn load_side(&mut self, context: &MatchContext, side: Side) -> Result<Vec<RatingRecord>> {
        context
            .participants(side)
            .iter()
            .map(|user_id| self.record(&RatingKey::for_participant(user_id, context)))
            .collect()
    }

    fn side_k(&self, context: &MatchContext, side: Side) -> f64 {
        let status = ParticipantStatus::from_flag(context.is_new(side));
        k_factor(&self.settings.k_factors, &context.pool, status)
    }
}

fn ratings_of(records: &[RatingRecord]) -> Vec<f64> {
    records.iter().map(|r| r.rating).collect()
}
