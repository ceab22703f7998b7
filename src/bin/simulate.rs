use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use maze_pursuit::autopilot::Autopilot;
use maze_pursuit::constants::{FRAME_MS, GHOST_RADIUS, MOTION_RADIUS_FACTOR, PLAYER_RADIUS};
use maze_pursuit::engine::{EngineOptions, GameEngine};
use maze_pursuit::types::{RuntimeEvent, Snapshot, Vec2};
use maze_pursuit::world::GridMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Number of games to play back to back.
    #[arg(long, default_value_t = 3)]
    games: u32,
    #[arg(long)]
    seed: Option<u32>,
    /// Level every game starts on.
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Simulated time after which an unfinished game is cut off.
    #[arg(long, default_value_t = 10)]
    max_minutes: u32,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    #[serde(rename = "startLevel")]
    start_level: u32,
    #[serde(rename = "maxMinutes")]
    max_minutes: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    GameOver,
    TimeLimit,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    scenario: String,
    seed: u32,
    #[serde(rename = "startLevel")]
    start_level: u32,
    outcome: Outcome,
    score: u32,
    level: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
    #[serde(rename = "livesLeft")]
    lives_left: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "fruitsEaten")]
    fruits_eaten: u32,
    deaths: u32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct GameRun {
    result: GameResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    games: Vec<GameResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at = Utc::now();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, &run_started_at));
    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "game_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "startLevel": scenario.start_level,
                "maxMinutes": scenario.max_minutes,
            }),
        );
        let run = run_game(&scenario);

        for anomaly in &run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }
        if !run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += run.anomaly_records.len();

        emit_log(
            "info",
            "game_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(run.finished_tick),
            json!({
                "outcome": run.result.outcome,
                "score": run.result.score,
                "level": run.result.level,
                "durationMs": run.result.duration_ms,
                "anomalyCount": run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&run.result).expect("game result should serialize")
        );
        results.push(run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at,
        Utc::now(),
        results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "gameCount": summary.game_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "averageDurationMs": summary.average_duration_ms,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_game(scenario: &Scenario) -> GameRun {
    let mut engine = GameEngine::new(EngineOptions {
        seed: scenario.seed,
        start_level: scenario.start_level,
        ..EngineOptions::default()
    });
    let mut pilot = Autopilot::new(scenario.seed ^ 0x9e37_79b9);
    let time_limit_ms = scenario.max_minutes as u64 * 60_000;
    let tick_limit = time_limit_ms / FRAME_MS + 1;

    let mut power_pellets_eaten = 0;
    let mut deaths = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_score = 0u32;
    let mut last_tick = 0u64;

    let mut snapshot = engine.build_snapshot(true);
    while !engine.is_over() && engine.elapsed_ms() < time_limit_ms {
        let intent = pilot.decide(engine.map(), &snapshot);
        engine.tick(FRAME_MS, intent);
        snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        let mut messages = collect_snapshot_anomalies(engine.map(), &snapshot);
        if snapshot.player.score < last_score {
            messages.push(format!(
                "score went backwards: {} -> {}",
                last_score, snapshot.player.score
            ));
        }
        last_score = snapshot.player.score;
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        if snapshot.tick > tick_limit {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                "tick safety limit exceeded".to_string(),
            );
            break;
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PowerPelletEaten { .. } => power_pellets_eaten += 1,
                RuntimeEvent::PlayerDied { .. } => deaths += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    GameRun {
        result: GameResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            start_level: scenario.start_level,
            outcome: if summary.game_over {
                Outcome::GameOver
            } else {
                Outcome::TimeLimit
            },
            score: summary.score,
            level: summary.level,
            levels_cleared: summary.levels_cleared,
            lives_left: summary.lives_left,
            pellets_eaten: summary.pellets_eaten,
            power_pellets_eaten,
            ghosts_eaten: summary.ghosts_eaten,
            fruits_eaten: summary.fruits_eaten,
            deaths,
            duration_ms: summary.duration_ms,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

fn collect_snapshot_anomalies(map: &GridMap, snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    let player = Vec2::new(snapshot.player.x, snapshot.player.y);
    if !player.x.is_finite() || !player.y.is_finite() {
        anomalies.push(format!("player position is not finite: {player:?}"));
    } else if !map.is_valid_position(player, PLAYER_RADIUS * MOTION_RADIUS_FACTOR) {
        anomalies.push(format!("player inside a wall at {:.2},{:.2}", player.x, player.y));
    }

    for ghost in &snapshot.ghosts {
        let pos = Vec2::new(ghost.x, ghost.y);
        if !pos.x.is_finite() || !pos.y.is_finite() {
            anomalies.push(format!("ghost position is not finite: {}", ghost.name));
        } else if !map.is_valid_position(pos, GHOST_RADIUS * MOTION_RADIUS_FACTOR) {
            anomalies.push(format!("ghost inside a wall: {}", ghost.name));
        }
    }

    let pellets = &snapshot.pellets;
    if pellets.pellets_eaten > pellets.pellets_total
        || pellets.power_pellets_eaten > pellets.power_pellets_total
    {
        anomalies.push(format!(
            "pellet counters out of range: {}/{} {}/{}",
            pellets.pellets_eaten,
            pellets.pellets_total,
            pellets.power_pellets_eaten,
            pellets.power_pellets_total
        ));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let start_level = cli.level.clamp(1, 99);
    let max_minutes = cli.max_minutes.clamp(1, 60);
    (0..cli.games.clamp(1, 1_000))
        .map(|idx| Scenario {
            name: format!("game-{}", idx + 1),
            seed: seed.wrapping_add(idx),
            start_level,
            max_minutes,
        })
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, started_at: &DateTime<Utc>) -> String {
    format!("sim-{seed}-{}", started_at.timestamp_millis())
}

fn outcome_key(outcome: Outcome) -> String {
    match outcome {
        Outcome::GameOver => "game_over",
        Outcome::TimeLimit => "time_limit",
    }
    .to_string()
}

fn build_run_summary(
    match_id: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    games: Vec<GameResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let game_count = games.len();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    for game in &games {
        *outcome_counts.entry(outcome_key(game.outcome)).or_insert(0) += 1;
    }
    let (average_score, average_duration_ms) = if game_count == 0 {
        (0, 0)
    } else {
        let total_score: u64 = games.iter().map(|game| game.score as u64).sum();
        let total_duration: u64 = games.iter().map(|game| game.duration_ms).sum();
        (
            (total_score / game_count as u64) as u32,
            total_duration / game_count as u64,
        )
    };
    RunSummary {
        match_id,
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        game_count,
        anomaly_count,
        average_score,
        average_duration_ms,
        outcome_counts,
        games,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_result(outcome: Outcome, score: u32, duration_ms: u64) -> GameResultLine {
        GameResultLine {
            scenario: "test".to_string(),
            seed: 42,
            start_level: 1,
            outcome,
            score,
            level: 1,
            levels_cleared: 0,
            lives_left: 0,
            pellets_eaten: 0,
            power_pellets_eaten: 0,
            ghosts_eaten: 0,
            fruits_eaten: 0,
            deaths: 3,
            duration_ms,
            anomalies: Vec::new(),
        }
    }

    fn fixed_time(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(
            default_match_id(42, &fixed_time(123_456_789)),
            "sim-42-123456789"
        );
    }

    #[test]
    fn build_run_summary_averages_and_counts_outcomes() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            fixed_time(1),
            fixed_time(2),
            vec![
                make_result(Outcome::GameOver, 1_000, 60_000),
                make_result(Outcome::TimeLimit, 3_000, 90_000),
                make_result(Outcome::GameOver, 2_000, 30_000),
            ],
            1,
        );
        assert_eq!(summary.game_count, 3);
        assert_eq!(summary.average_score, 2_000);
        assert_eq!(summary.average_duration_ms, 60_000);
        assert_eq!(summary.outcome_counts.get("game_over"), Some(&2));
        assert_eq!(summary.outcome_counts.get("time_limit"), Some(&1));
        assert_eq!(summary.started_at, "1970-01-01T00:00:00.001Z");
    }

    #[test]
    fn empty_run_summary_has_zero_averages() {
        let summary =
            build_run_summary("sim-0-0".to_string(), fixed_time(0), fixed_time(0), Vec::new(), 0);
        assert_eq!(summary.average_score, 0);
        assert_eq!(summary.average_duration_ms, 0);
        assert!(summary.outcome_counts.is_empty());
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("maze-pursuit-missing-{}", Utc::now().timestamp_millis()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            fixed_time(1),
            fixed_time(2),
            vec![make_result(Outcome::GameOver, 0, 60_000)],
            0,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same anomaly".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same anomaly".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn scenarios_use_consecutive_seeds() {
        let cli = Cli::parse_from(["simulate", "--games", "3", "--seed", "7", "--level", "0"]);
        let scenarios = resolve_scenarios(&cli);
        let seeds: Vec<u32> = scenarios.iter().map(|scenario| scenario.seed).collect();
        assert_eq!(seeds, vec![7, 8, 9]);
        assert!(scenarios.iter().all(|scenario| scenario.start_level == 1));
        assert_eq!(scenarios[2].name, "game-3");
    }

    #[test]
    fn wall_positions_are_reported() {
        let mut engine = GameEngine::new(EngineOptions::default());
        let mut snapshot = engine.build_snapshot(false);
        assert!(collect_snapshot_anomalies(engine.map(), &snapshot).is_empty());
        snapshot.player.x = 0.5;
        snapshot.player.y = 0.5;
        let anomalies = collect_snapshot_anomalies(engine.map(), &snapshot);
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].starts_with("player inside a wall"));
    }

    #[test]
    fn same_seed_plays_the_same_game() {
        let scenario = Scenario {
            name: "repeat".to_string(),
            seed: 99,
            start_level: 1,
            max_minutes: 1,
        };
        let a = run_game(&scenario);
        let b = run_game(&scenario);
        assert_eq!(a.result.score, b.result.score);
        assert_eq!(a.result.deaths, b.result.deaths);
        assert_eq!(a.finished_tick, b.finished_tick);
        assert!(a.result.anomalies.is_empty(), "{:?}", a.result.anomalies);
    }
}
