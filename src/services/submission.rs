use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::domain::{MatchRecord, MatchStatus, Side};
use crate::rating::types::RatingOutcome;
use crate::rating::RatingEngine;
use crate::repository::RatingRepository;
use crate::scoring::{Retirement, ScoreValidator, SetScore, ValidationReport, resolve};

type MatchLock = Arc<Mutex<()>>;

/// Per-match lock table. Transitions of one match run one at a time;
/// different matches never wait on each other. An entry lives only while
/// some caller holds or waits for it.
#[derive(Default)]
pub struct MatchLocks {
    locks: Mutex<HashMap<String, MatchLock>>,
}

impl MatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock of `match_id`
    pub fn with_lock<T>(&self, match_id: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let entry = self.acquire(match_id)?;
        let result = entry
            .lock()
            .map_err(|_| anyhow!("Lock of match {} poisoned", match_id))
            .and_then(|_guard| f());
        self.release(match_id, entry);
        result
    }

    fn acquire(&self, match_id: &str) -> Result<MatchLock> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| anyhow!("Match lock table poisoned"))?;
        Ok(locks
            .entry(match_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Drops the entry when the table and `entry` are its only holders.
    /// New holders clone under the table lock, so the count cannot grow here.
    fn release(&self, match_id: &str, entry: MatchLock) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        let idle = locks
            .get(match_id)
            .is_some_and(|held| Arc::ptr_eq(held, &entry) && Arc::strong_count(held) == 2);
        if idle {
            locks.remove(match_id);
        }
    }
}

/// Result of a confirmed match
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub match_id: String,
    pub winner: Side,
    pub rating: RatingOutcome,
}

/// Two-party score confirmation workflow.
///
/// `pending -> submitted -> confirmed | disputed`, a disputed score may be
/// submitted again. Only confirmation resolves the winner and touches ratings.
/// The service is shared by reference; the engine is used by one
/// confirmation at a time and the repository's unit of work serializes
/// writers of other processes.
pub struct SubmissionService<R: RatingRepository> {
    engine: Mutex<RatingEngine<R>>,
    validator: ScoreValidator,
    locks: Arc<MatchLocks>,
}

impl<R: RatingRepository> SubmissionService<R> {
    pub fn new(engine: RatingEngine<R>, validator: ScoreValidator, locks: Arc<MatchLocks>) -> Self {
        Self {
            engine: Mutex::new(engine),
            validator,
            locks,
        }
    }

    /// Runs `f` with exclusive access to the rating engine
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut RatingEngine<R>) -> Result<T>) -> Result<T> {
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| anyhow!("Rating engine lock poisoned"))?;
        f(&mut engine)
    }

    /// Stores a score submitted by one participant.
    ///
    /// An invalid score leaves the record untouched; the report says why.
    pub fn submit(
        &self,
        record: &mut MatchRecord,
        submitter: &str,
        sets: Vec<SetScore>,
        retirement: Option<Retirement>,
    ) -> Result<ValidationReport> {
        let match_id = record.id.clone();
        self.locks.with_lock(&match_id, || {
            if !matches!(record.status, MatchStatus::Pending | MatchStatus::Disputed) {
                bail!(
                    "Match {} is {}, a score cannot be submitted",
                    record.id,
                    record.status.as_str()
                );
            }
            record
                .context
                .check()
                .with_context(|| format!("Invalid context for match {}", record.id))?;
            if record.context.side_of(submitter).is_none() {
                bail!("{} does not play in match {}", submitter, record.id);
            }

            let report = self
                .validator
                .validate_played(&sets, retirement, record.score.format);
            if !report.is_valid {
                warn!(
                    "Rejected score for match {} from {}: {} errors",
                    record.id,
                    submitter,
                    report.errors.len()
                );
                return Ok(report);
            }

            record.score.sets = sets;
            record.score.retirement = retirement;
            record.score.walkover = false;
            record.score.winner = None;
            record.score.is_complete = false;
            record.submitted_by = Some(submitter.to_string());
            record.status = MatchStatus::Submitted;
            info!("Score of match {} submitted by {}", record.id, submitter);
            Ok(report)
        })
    }

    pub fn confirm(&self, record: &mut MatchRecord, confirmer: &str) -> Result<Confirmation> {
        self.confirm_at(record, confirmer, Utc::now())
    }

    /// Confirms a submitted score, resolves the winner and rates the match
    pub fn confirm_at(
        &self,
        record: &mut MatchRecord,
        confirmer: &str,
        now: DateTime<Utc>,
    ) -> Result<Confirmation> {
        let match_id = record.id.clone();
        self.locks.with_lock(&match_id, || {
            if record.status != MatchStatus::Submitted {
                bail!(
                    "Match {} is {}, only a submitted score can be confirmed",
                    record.id,
                    record.status.as_str()
                );
            }
            check_opposing(record, confirmer)?;

            let report = self.validator.validate_match(&record.score);
            if !report.is_valid {
                bail!(
                    "Stored score of match {} is invalid: {}",
                    record.id,
                    join_messages(&report)
                );
            }

            let winner = resolve(&record.score.sheet()).ok_or_else(|| {
                anyhow!(
                    "Winner of match {} cannot be resolved automatically",
                    record.id
                )
            })?;

            let mut context = record.context.clone();
            let rating = self.with_engine(|engine| {
                engine.apply_classified_at(&record.id, &mut context, winner, now)
            })?;

            record.context = context;
            record.score.winner = Some(winner);
            record.score.is_complete = true;
            record.status = MatchStatus::Confirmed;
            record.rating_applied |= rating.applied;
            info!(
                "Match {} confirmed by {}: side {} won, rating {}",
                record.id,
                confirmer,
                winner.as_str(),
                rating.reason_str()
            );

            Ok(Confirmation {
                match_id: record.id.clone(),
                winner,
                rating,
            })
        })
    }

    /// Marks a submitted score as disputed; either side may do so
    pub fn dispute(&self, record: &mut MatchRecord, participant: &str) -> Result<()> {
        let match_id = record.id.clone();
        self.locks.with_lock(&match_id, || {
            if record.status != MatchStatus::Submitted {
                bail!(
                    "Match {} is {}, only a submitted score can be disputed",
                    record.id,
                    record.status.as_str()
                );
            }
            if record.context.side_of(participant).is_none() {
                bail!("{} does not play in match {}", participant, record.id);
            }

            record.status = MatchStatus::Disputed;
            info!("Score of match {} disputed by {}", record.id, participant);
            Ok(())
        })
    }

    /// Records an organizer's walkover decision. Ratings are not touched.
    pub fn award_walkover(
        &self,
        record: &mut MatchRecord,
        winner: Side,
        decided_by: &str,
    ) -> Result<()> {
        let match_id = record.id.clone();
        self.locks.with_lock(&match_id, || {
            if record.status == MatchStatus::Confirmed {
                bail!("Match {} is already confirmed", record.id);
            }

            record.score.sets.clear();
            record.score.retirement = None;
            record.score.walkover = true;
            record.score.winner = Some(winner);
            record.score.is_complete = true;
            record.status = MatchStatus::Confirmed;
            info!(
                "Walkover in match {} awarded to side {} by {}",
                record.id,
                winner.as_str(),
                decided_by
            );
            Ok(())
        })
    }
}

fn check_opposing(record: &MatchRecord, confirmer: &str) -> Result<()> {
    let submitter = record
        .submitted_by
        .as_deref()
        .ok_or_else(|| anyhow!("Match {} has no submitter", record.id))?;
    let submitted_side = record.context.side_of(submitter);
    let confirming_side = record
        .context
        .side_of(confirmer)
        .ok_or_else(|| anyhow!("{} does not play in match {}", confirmer, record.id))?;

    if submitted_side == Some(confirming_side) {
        bail!(
            "{} is on the submitting side of match {} and cannot confirm it",
            confirmer,
            record.id
        );
    }
    Ok(())
}

fn join_messages(report: &ValidationReport) -> String {
    report
        .errors
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
