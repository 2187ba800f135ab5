use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::submission::{MatchLocks, SubmissionService};
use crate::config::settings::AppConfig;
use crate::database::{self, SqliteRepository};
use crate::domain::{MatchContext, MatchId, MatchRecord, ParticipantId, Side, TournamentId};
use crate::rating::types::{RatingOutcome, SkipReason};
use crate::rating::RatingEngine;
use crate::repository::RatingRepository;
use crate::scoring::{Retirement, ScoreValidator, ScoringFormat, SetScore};

/// One played match as it arrives in a batch file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEntry {
    pub id: MatchId,
    pub context: MatchContext,
    #[serde(default)]
    pub format: ScoringFormat,
    #[serde(default)]
    pub sets: Vec<SetScore>,
    #[serde(default)]
    pub retirement: Option<Retirement>,
    pub submitted_by: ParticipantId,
    #[serde(default)]
    pub confirmed_by: Option<ParticipantId>,
    /// Organizer decision; the entry is recorded as a walkover for this side
    #[serde(default)]
    pub walkover_winner: Option<Side>,
    #[serde(default)]
    pub tournament_id: Option<TournamentId>,
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
}

impl MatchEntry {
    fn to_record(&self) -> MatchRecord {
        let mut record = MatchRecord::new(self.id.clone(), self.context.clone());
        record.score.format = self.format;
        record.tournament_id = self.tournament_id.clone();
        record
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMatch {
    pub match_id: MatchId,
    pub record: Option<MatchRecord>,
    pub rating: Option<RatingOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub rated: usize,
    pub cooldown: usize,
    pub already_processed: usize,
    pub walkovers: usize,
    pub rejected: usize,
    pub matches: Vec<ProcessedMatch>,
}

impl BatchSummary {
    fn count(&mut self, processed: &ProcessedMatch) {
        match (&processed.error, &processed.rating) {
            (Some(_), _) => self.rejected += 1,
            (None, Some(rating)) => match rating.reason {
                None => self.rated += 1,
                Some(SkipReason::Cooldown) => self.cooldown += 1,
                Some(SkipReason::AlreadyProcessed) => self.already_processed += 1,
            },
            (None, None) => self.walkovers += 1,
        }
    }
}

pub fn load_entries(path: &Path) -> Result<Vec<MatchEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read match file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse match file {}", path.display()))
}

/// Runs every entry through submission and confirmation, in file order.
///
/// A rejected entry is reported and skipped; it never stops the batch.
pub fn process_entries<R: RatingRepository>(
    service: &SubmissionService<R>,
    entries: &[MatchEntry],
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for (idx, entry) in entries.iter().enumerate() {
        if (idx + 1) % 100 == 0 || idx + 1 == entries.len() {
            info!("  Processing match {}/{}", idx + 1, entries.len());
        }

        let processed = match process_entry(service, entry) {
            Ok((record, rating)) => ProcessedMatch {
                match_id: entry.id.clone(),
                record: Some(record),
                rating,
                error: None,
            },
            Err(e) => {
                warn!("Match {} rejected: {:#}", entry.id, e);
                ProcessedMatch {
                    match_id: entry.id.clone(),
                    record: None,
                    rating: None,
                    error: Some(format!("{:#}", e)),
                }
            }
        };

        summary.count(&processed);
        summary.matches.push(processed);
    }

    summary
}

fn process_entry<R: RatingRepository>(
    service: &SubmissionService<R>,
    entry: &MatchEntry,
) -> Result<(MatchRecord, Option<RatingOutcome>)> {
    let mut record = entry.to_record();

    if let Some(winner) = entry.walkover_winner {
        service.award_walkover(&mut record, winner, &entry.submitted_by)?;
        return Ok((record, None));
    }

    let report = service.submit(
        &mut record,
        &entry.submitted_by,
        entry.sets.clone(),
        entry.retirement,
    )?;
    if !report.is_valid {
        let messages: Vec<&str> = report.errors.iter().map(|i| i.message.as_str()).collect();
        anyhow::bail!("invalid score: {}", messages.join("; "));
    }

    let confirmer = entry
        .confirmed_by
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("no confirming participant"))?;
    let now = entry.played_at.unwrap_or_else(Utc::now);
    let confirmation = service.confirm_at(&mut record, confirmer, now)?;

    Ok((record, Some(confirmation.rating)))
}

/// Applies a batch match file to the rating database
pub struct ProcessingService {
    config: AppConfig,
}

impl ProcessingService {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, path: &Path) -> Result<BatchSummary> {
        info!("=== Processing {} ===", path.display());
        info!("Target DB: {}", self.config.database_path);

        let entries = load_entries(path)?;
        info!("  → Loaded {} matches", entries.len());

        let pool = database::create_pool(&self.config.database_path)?;
        let conn = database::get_connection(&pool)?;
        database::setup::init_database(&conn)?;
        drop(conn);

        let repository = SqliteRepository::new(pool, &self.config.cache);
        let engine = RatingEngine::new(repository, self.config.rating.clone());
        let validator = ScoreValidator::from_settings(self.config.scoring.clone());
        let service = SubmissionService::new(engine, validator, Arc::new(MatchLocks::new()));

        let summary = process_entries(&service, &entries);
        info!(
            "  → {} rated, {} in cooldown, {} already processed, {} walkovers, {} rejected",
            summary.rated,
            summary.cooldown,
            summary.already_processed,
            summary.walkovers,
            summary.rejected
        );
        info!("=== Processing Complete ===");
        Ok(summary)
    }
}
