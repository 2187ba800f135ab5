use std::path::PathBuf;
use std::sync::{Arc, Barrier};

use chrono::{DateTime, Duration, TimeZone, Utc};

use pickleball_ranking::config::settings::{AppConfig, CacheSettings, RatingSettings};
use pickleball_ranking::database::{self, SqliteRepository};
use pickleball_ranking::domain::{
    ClubCompetition, Discipline, MatchContext, MatchRecord, RatingPool, Side,
};
use pickleball_ranking::rating::types::{RatingKey, SkipReason};
use pickleball_ranking::rating::RatingEngine;
use pickleball_ranking::scoring::{ScoreValidator, SetScore};
use pickleball_ranking::services::{MatchLocks, ProcessingService, SubmissionService};
use pickleball_ranking::tournament::{Placement, compute_standings, confirmed_results, podium};

fn temp_db(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "pickleball_flow_{}_{}.db",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn sqlite_engine(path: &PathBuf) -> RatingEngine<SqliteRepository> {
    let pool = database::create_pool(&path.to_string_lossy()).unwrap();
    let conn = database::get_connection(&pool).unwrap();
    database::setup::init_database(&conn).unwrap();
    drop(conn);
    RatingEngine::new(
        SqliteRepository::new(pool, &CacheSettings::default()),
        RatingSettings::default(),
    )
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn context(discipline: Discipline, pool: RatingPool, a: &[&str], b: &[&str]) -> MatchContext {
    MatchContext {
        discipline,
        pool,
        side_a: ids(a),
        side_b: ids(b),
        new_participant_a: false,
        new_participant_b: false,
    }
}

fn global_singles() -> MatchContext {
    context(Discipline::Singles, RatingPool::Global, &["amy"], &["bob"])
}

fn rating(engine: &mut RatingEngine<SqliteRepository>, user: &str, ctx: &MatchContext) -> f64 {
    engine
        .rating(&RatingKey::for_participant(user, ctx))
        .unwrap()
        .rating
}

#[test]
fn test_result_is_applied_once_across_engines() {
    let path = temp_db("idempotent");
    let ctx = global_singles();

    let mut first = sqlite_engine(&path);
    let outcome = first.apply_result_at("m1", &ctx, Side::A, start()).unwrap();
    assert!(outcome.applied);

    let mut second = sqlite_engine(&path);
    let replay = second.apply_result_at("m1", &ctx, Side::A, start()).unwrap();
    assert!(!replay.applied);
    assert_eq!(replay.reason, Some(SkipReason::AlreadyProcessed));
    assert!((rating(&mut second, "amy", &ctx) - 1516.0).abs() < 1e-9);

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_cooldown_window_in_storage() {
    let path = temp_db("cooldown");
    let ctx = global_singles();
    let mut engine = sqlite_engine(&path);

    engine.apply_result_at("m1", &ctx, Side::A, start()).unwrap();

    let friendly = engine
        .apply_result_at("m2", &ctx, Side::B, start() + Duration::days(10))
        .unwrap();
    assert_eq!(friendly.reason, Some(SkipReason::Cooldown));
    assert!((rating(&mut engine, "bob", &ctx) - 1484.0).abs() < 1e-9);

    let rated = engine
        .apply_result_at("m3", &ctx, Side::B, start() + Duration::days(91))
        .unwrap();
    assert!(rated.applied);
    assert!(rating(&mut engine, "bob", &ctx) > 1484.0);

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_doubles_partner_change_is_rated() {
    let path = temp_db("doubles");
    let mut engine = sqlite_engine(&path);
    let first = context(
        Discipline::Doubles,
        RatingPool::Global,
        &["amy", "bob"],
        &["cat", "dan"],
    );
    let swapped = context(
        Discipline::Doubles,
        RatingPool::Global,
        &["amy", "eve"],
        &["cat", "dan"],
    );

    assert!(engine.apply_result_at("d1", &first, Side::A, start()).unwrap().applied);
    let rematch = engine
        .apply_result_at("d2", &swapped, Side::A, start() + Duration::days(1))
        .unwrap();
    assert!(rematch.applied);

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_club_rating_does_not_touch_global() {
    let path = temp_db("pools");
    let mut engine = sqlite_engine(&path);
    let club = context(
        Discipline::Singles,
        RatingPool::Club {
            club_id: "riverside".to_string(),
            competition: ClubCompetition::League,
        },
        &["amy"],
        &["bob"],
    );

    let outcome = engine.apply_result_at("c1", &club, Side::A, start()).unwrap();
    assert!((outcome.delta - 8.0).abs() < 1e-9);
    assert!((rating(&mut engine, "amy", &global_singles()) - 1500.0).abs() < 1e-9);

    let _ = std::fs::remove_file(path);
}

fn rate_concurrently(
    path: &PathBuf,
    matches: Vec<(String, MatchContext)>,
) -> Vec<pickleball_ranking::rating::types::RatingOutcome> {
    let barrier = Arc::new(Barrier::new(matches.len()));
    let handles: Vec<_> = matches
        .into_iter()
        .map(|(match_id, ctx)| {
            let mut engine = sqlite_engine(path);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                engine.apply_result_at(&match_id, &ctx, Side::A, start()).unwrap()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_concurrent_rematches_rate_only_one() {
    let path = temp_db("concurrent_rematch");
    let matches = (0..4)
        .map(|i| (format!("r{}", i), global_singles()))
        .collect();

    let outcomes = rate_concurrently(&path, matches);

    assert_eq!(outcomes.iter().filter(|o| o.applied).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| o.reason == Some(SkipReason::Cooldown))
            .count(),
        3
    );

    let mut reader = sqlite_engine(&path);
    let amy = reader
        .rating(&RatingKey::for_participant("amy", &global_singles()))
        .unwrap();
    assert_eq!(amy.match_count, 1);
    assert!((amy.rating - 1516.0).abs() < 1e-9);

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_concurrent_matches_of_one_player_keep_both_updates() {
    let path = temp_db("concurrent_player");
    let matches = vec![
        ("p1".to_string(), global_singles()),
        (
            "p2".to_string(),
            context(Discipline::Singles, RatingPool::Global, &["amy"], &["cat"]),
        ),
    ];

    let outcomes = rate_concurrently(&path, matches);
    assert!(outcomes.iter().all(|o| o.applied));

    let mut reader = sqlite_engine(&path);
    let amy = reader
        .rating(&RatingKey::for_participant("amy", &global_singles()))
        .unwrap();
    assert_eq!(amy.match_count, 2);
    assert!(amy.rating > 1516.0);

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_confirmed_matches_feed_standings() {
    let path = temp_db("standings");
    let service = SubmissionService::new(
        sqlite_engine(&path),
        ScoreValidator::new(),
        Arc::new(MatchLocks::new()),
    );

    let pairings = [("t1", "amy", "bob"), ("t2", "amy", "cat"), ("t3", "bob", "cat")];
    let mut records = Vec::new();
    for (id, a, b) in pairings {
        let mut record = MatchRecord::new(
            id,
            context(Discipline::Singles, RatingPool::Global, &[a], &[b]),
        );
        record.tournament_id = Some("spring-open".to_string());
        service
            .submit(
                &mut record,
                a,
                vec![SetScore::new(6, 1), SetScore::new(6, 2)],
                None,
            )
            .unwrap();
        service.confirm_at(&mut record, b, start()).unwrap();
        records.push(record);
    }

    let resolved = confirmed_results(&records, &ScoreValidator::new());
    let roster = ids(&["cat", "bob", "amy", "dan"]);
    let standings = compute_standings("spring-open", &resolved, &roster).unwrap();

    let order: Vec<&str> = standings.iter().map(|s| s.participant_id.as_str()).collect();
    assert_eq!(order, vec!["amy", "bob", "dan", "cat"]);
    assert_eq!(standings[2].wins, 0);
    assert_eq!(standings[2].losses, 0);

    let awards = podium("spring-open", &standings);
    assert_eq!(awards.len(), 3);
    assert_eq!(awards[0].placement, Placement::Gold);
    assert_eq!(awards[0].participant_id, "amy");

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_processing_service_runs_batch_file() {
    let db_path = temp_db("batch");
    let batch_path = std::env::temp_dir().join(format!(
        "pickleball_flow_batch_{}.json",
        std::process::id()
    ));
    std::fs::write(
        &batch_path,
        r#"[
            {
                "id": "b1",
                "context": {"discipline": "singles", "pool": {"kind": "global"}, "sideA": ["amy"], "sideB": ["bob"]},
                "format": "short",
                "sets": [{"a": 4, "b": 2}, {"a": 4, "b": 1}],
                "submittedBy": "amy",
                "confirmedBy": "bob",
                "playedAt": "2026-06-01T09:00:00Z"
            },
            {
                "id": "b2",
                "context": {"discipline": "singles", "pool": {"kind": "global"}, "sideA": ["cat"], "sideB": ["dan"]},
                "format": "short",
                "sets": [{"a": 5, "b": 3}, {"a": 4, "b": 1}],
                "submittedBy": "cat",
                "confirmedBy": "dan"
            }
        ]"#,
    )
    .unwrap();

    let config = AppConfig::new().with_database_path(Some(db_path.to_string_lossy().to_string()));
    let summary = ProcessingService::new(config).run(&batch_path).unwrap();

    assert_eq!(summary.rated, 1);
    assert_eq!(summary.rejected, 1);

    let _ = std::fs::remove_file(batch_path);
    let _ = std::fs::remove_file(db_path);
}
