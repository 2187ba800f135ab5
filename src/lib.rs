pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod rating;
pub mod repository;
pub mod scoring;
pub mod services;
pub mod tournament;

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use serde::Deserialize;

use crate::cli::Cli;
use crate::config::settings::AppConfig;
use crate::domain::{Discipline, MatchRecord, ParticipantId, Side, TournamentId};
use crate::scoring::{
    MatchScore, ScoreValidator, ScoringFormat, ValidationReport, parse_sets, resolve,
};
use crate::services::processing::{BatchSummary, ProcessingService};
use crate::tournament::{
    Award, TournamentStanding, compute_standings, confirmed_results, podium,
};

pub fn interpret() -> Cli {
    Cli::parse()
}

pub fn handle_init(config: &AppConfig, reset: bool) -> Result<()> {
    let pool = database::create_pool(&config.database_path)?;
    let conn = database::get_connection(&pool)?;

    if reset {
        database::setup::reset_database(&conn)?;
    } else {
        database::setup::init_database(&conn)?;
    }
    println!("{} {}", "Database ready:".green(), config.database_path);
    Ok(())
}

pub fn handle_validate(config: &AppConfig, file: &Path, games_per_set: u8) -> Result<()> {
    let format = ScoringFormat::try_from(games_per_set)?;
    let sets = parse_sets(&read_file(file)?)
        .with_context(|| format!("Failed to parse sets in {}", file.display()))?;

    let validator = ScoreValidator::from_settings(config.scoring.clone());
    let report = validator.validate(&sets, format);
    print_report(&report);
    Ok(())
}

pub fn handle_resolve(config: &AppConfig, file: &Path) -> Result<()> {
    let score: MatchScore = serde_json::from_str(&read_file(file)?)
        .with_context(|| format!("Failed to parse match score in {}", file.display()))?;

    if score.walkover {
        println!("{}", "Walkover: the winner is decided by the organizer".yellow());
        return Ok(());
    }

    let validator = ScoreValidator::from_settings(config.scoring.clone());
    let (report, winner) = resolve_played(&validator, &score);
    print_report(&report);
    if !report.is_valid {
        return Ok(());
    }

    match winner {
        Some(side) => println!("{} side {}", "Winner:".green().bold(), side.as_str()),
        None => println!("{}", "Winner cannot be resolved automatically".yellow()),
    }
    Ok(())
}

/// Validates a played score, retirement included, and derives its winner
/// only when the score is valid
fn resolve_played(
    validator: &ScoreValidator,
    score: &MatchScore,
) -> (ValidationReport, Option<Side>) {
    let report = validator.validate_played(&score.sets, score.retirement, score.format);
    let winner = if report.is_valid {
        resolve(&score.sheet())
    } else {
        None
    };
    (report, winner)
}

pub fn handle_process(config: AppConfig, file: &Path) -> Result<()> {
    let service = ProcessingService::new(config);
    let summary = service.run(file)?;
    print_summary(&summary);
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TournamentFile {
    tournament_id: TournamentId,
    roster: Vec<ParticipantId>,
    matches: Vec<MatchRecord>,
}

pub fn handle_standings(config: &AppConfig, file: &Path) -> Result<()> {
    let tournament: TournamentFile = serde_json::from_str(&read_file(file)?)
        .with_context(|| format!("Failed to parse tournament in {}", file.display()))?;

    let validator = ScoreValidator::from_settings(config.scoring.clone());
    let standings = tournament_standings(&tournament, &validator)?;
    let awards = podium(&tournament.tournament_id, &standings);
    print_standings(&standings, &awards);
    Ok(())
}

fn tournament_standings(
    tournament: &TournamentFile,
    validator: &ScoreValidator,
) -> Result<Vec<TournamentStanding>> {
    let resolved = confirmed_results(&tournament.matches, validator);
    compute_standings(&tournament.tournament_id, &resolved, &tournament.roster)
}

pub fn handle_leaderboard(
    config: &AppConfig,
    discipline: &str,
    pool: &str,
    limit: usize,
) -> Result<()> {
    let discipline = Discipline::from_str_name(discipline)
        .ok_or_else(|| anyhow!("Unknown discipline: {}", discipline))?;

    let db = database::create_pool(&config.database_path)?;
    let conn = database::get_connection(&db)?;
    let records = database::ratings::list_by_pool(&conn, discipline, pool, limit)?;

    println!(
        "{}",
        format!("{} / {}", discipline.as_str(), pool).bold()
    );
    for (idx, record) in records.iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:>8.1}  ({} matches)",
            idx + 1,
            record.user_id,
            record.rating,
            record.match_count
        );
    }
    Ok(())
}

pub fn handle_completions(shell: clap_complete::Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_report(report: &ValidationReport) {
    if report.is_valid {
        println!("{}", "Score is valid".green().bold());
    } else {
        println!("{}", "Score is invalid".red().bold());
    }
    for issue in &report.errors {
        println!("  {} {}", "error:".red(), issue.message);
    }
    for issue in &report.warnings {
        println!("  {} {}", "warning:".yellow(), issue.message);
    }
}

fn print_summary(summary: &BatchSummary) {
    for processed in &summary.matches {
        match (&processed.error, &processed.rating) {
            (Some(error), _) => {
                println!("{} {}: {}", "rejected".red(), processed.match_id, error)
            }
            (None, Some(rating)) if rating.applied => println!(
                "{} {}: winner delta {:+.2}",
                "rated".green(),
                processed.match_id,
                rating.delta
            ),
            (None, Some(rating)) => println!(
                "{} {}: {}",
                "skipped".yellow(),
                processed.match_id,
                rating.reason_str()
            ),
            (None, None) => println!("{} {}", "walkover".cyan(), processed.match_id),
        }
    }
    println!(
        "{} {} rated, {} cooldown, {} already processed, {} walkovers, {} rejected",
        "Done:".bold(),
        summary.rated,
        summary.cooldown,
        summary.already_processed,
        summary.walkovers,
        summary.rejected
    );
}

fn print_standings(standings: &[TournamentStanding], awards: &[Award]) {
    for standing in standings {
        println!(
            "{:>3}. {:<24} {}-{}",
            standing.rank, standing.participant_id, standing.wins, standing.losses
        );
    }
    for award in awards {
        println!(
            "{} {}",
            format!("{:>6}", award.placement.as_str()).yellow().bold(),
            award.participant_id
        );
    }
}
