use std::collections::VecDeque;

use crate::constants::*;
use crate::pathfinding::find_path;
use crate::rng::Rng;
use crate::types::{
    Cell, Direction, FruitKind, FruitView, GamePhase, GameSummary, GhostMode, GhostView, MazeView,
    PelletKind, Personality, PlayerView, RuntimeEvent, Snapshot, Vec2,
};
use crate::world::{ghost_start, GridMap, PLAYER_START};

mod ghost_system;
mod motion;
mod player_system;
mod session_system;
mod utils;

use self::ghost_system::GhostInternal;
use self::motion::{
    best_direction, follow_path, is_passable, possible_directions, steer, Body, SteerOutcome,
    StuckDetector,
};
use self::player_system::PlayerInternal;
use self::session_system::FruitInternal;
use self::utils::{ghost_points, step_length};

#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub seed: u32,
    pub start_level: u32,
    pub lives: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            start_level: 1,
            lives: STARTING_LIVES,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct SessionStats {
    pellets_eaten: u32,
    ghosts_eaten: u32,
    fruits_eaten: u32,
    levels_cleared: u32,
}

/// One player, four ghosts and a maze, advanced by an external clock.
#[derive(Clone, Debug)]
pub struct GameEngine {
    map: GridMap,
    rng: Rng,
    player: PlayerInternal,
    ghosts: Vec<GhostInternal>,
    fruit: Option<FruitInternal>,
    fruit_eaten: bool,
    events: Vec<RuntimeEvent>,

    level: u32,
    phase: GamePhase,
    phase_timer_ms: u64,
    tick_counter: u64,
    elapsed_ms: u64,
    stats: SessionStats,
}

impl GameEngine {
    pub fn new(options: EngineOptions) -> Self {
        let level = options.start_level.max(1);
        let mut engine = Self {
            map: GridMap::for_level(level),
            rng: Rng::new(options.seed),
            player: PlayerInternal::new(options.lives),
            ghosts: Vec::new(),
            fruit: None,
            fruit_eaten: false,
            events: Vec::new(),
            level,
            phase: GamePhase::Ready,
            phase_timer_ms: 0,
            tick_counter: 0,
            elapsed_ms: 0,
            stats: SessionStats::default(),
        };
        engine.load_level(level);
        engine
    }

    /// Advances the game by `dt_ms`, capped at `MAX_TICK_MS`. A direction in
    /// `intent` replaces whatever turn the player had buffered.
    pub fn tick(&mut self, dt_ms: u64, intent: Option<Direction>) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        let dt_ms = dt_ms.min(MAX_TICK_MS);
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if let Some(dir) = intent {
            self.player.next_dir = dir;
        }

        match self.phase {
            GamePhase::Ready => self.update_ready(dt_ms),
            GamePhase::Playing => self.update_playing(dt_ms),
            GamePhase::Dying => self.update_dying(dt_ms),
            GamePhase::LevelComplete => self.update_level_complete(dt_ms),
            GamePhase::GameOver => {}
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            level: self.level,
            phase: self.phase,
            player: self.player.view(),
            ghosts: self.ghosts.iter().map(GhostInternal::view).collect(),
            pellets: self.map.pellet_counts(),
            fruit: self.fruit.as_ref().map(FruitInternal::view),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            score: self.player.score,
            level: self.level,
            levels_cleared: self.stats.levels_cleared,
            lives_left: self.player.lives,
            ghosts_eaten: self.stats.ghosts_eaten,
            pellets_eaten: self.stats.pellets_eaten,
            fruits_eaten: self.stats.fruits_eaten,
            duration_ms: self.elapsed_ms,
            game_over: self.is_over(),
        }
    }

    pub fn maze_view(&self) -> MazeView {
        self.map.maze_view()
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.player.score
    }

    pub fn lives(&self) -> u32 {
        self.player.lives
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use crate::autopilot::Autopilot;
    use crate::constants::{FRAME_MS, LEVEL_COMPLETE_MS, MAX_TICK_MS};
    use crate::engine::session_system::FruitInternal;
    use crate::engine::{EngineOptions, GameEngine};
    use crate::types::{
        Cell, CellKind, Direction, FruitKind, GamePhase, GhostMode, Personality, RuntimeEvent,
        Vec2,
    };
    use crate::world::{ghost_start, PLAYER_START};

    fn engine_with_seed(seed: u32) -> GameEngine {
        GameEngine::new(EngineOptions {
            seed,
            ..EngineOptions::default()
        })
    }

    fn playing_engine(seed: u32) -> GameEngine {
        let mut engine = engine_with_seed(seed);
        engine.phase = GamePhase::Playing;
        engine.events.clear();
        engine
    }

    fn run_until_phase_changes(engine: &mut GameEngine, max_ticks: usize) {
        let start = engine.phase;
        for _ in 0..max_ticks {
            if engine.phase != start {
                return;
            }
            engine.tick(FRAME_MS, None);
        }
    }

    fn ghost_index(engine: &GameEngine, personality: Personality) -> usize {
        engine
            .ghosts
            .iter()
            .position(|ghost| ghost.personality == personality)
            .expect("every personality is on the board")
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = engine_with_seed(424_242);
        let mut b = engine_with_seed(424_242);
        let script = [
            Direction::Left,
            Direction::Up,
            Direction::Right,
            Direction::Down,
        ];

        for tick in 0..1_500usize {
            let intent = script[(tick / 45) % script.len()];
            a.tick(FRAME_MS, Some(intent));
            b.tick(FRAME_MS, Some(intent));
            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);

            assert_eq!(sa.phase, sb.phase);
            assert_eq!(sa.player.x, sb.player.x);
            assert_eq!(sa.player.y, sb.player.y);
            assert_eq!(sa.player.score, sb.player.score);
            assert_eq!(sa.events, sb.events);
            for (ga, gb) in sa.ghosts.iter().zip(sb.ghosts.iter()) {
                assert_eq!(ga.x, gb.x);
                assert_eq!(ga.y, gb.y);
                assert_eq!(ga.mode, gb.mode);
            }
        }
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = engine_with_seed(333);
        let kept = engine.build_snapshot(false);
        assert!(kept.events.is_empty());

        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events, vec![RuntimeEvent::LevelStarted { level: 1 }]);
        assert!(second.events.is_empty());
    }

    #[test]
    fn long_ticks_are_clamped() {
        let mut engine = engine_with_seed(1);
        engine.tick(500, None);
        assert_eq!(engine.elapsed_ms(), MAX_TICK_MS);
        assert_eq!(engine.build_snapshot(false).tick, 1);
    }

    #[test]
    fn input_is_buffered_during_ready() {
        let mut engine = engine_with_seed(2);
        engine.tick(FRAME_MS, Some(Direction::Left));
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert_eq!(engine.player.next_dir, Direction::Left);
        assert_eq!(engine.player.body.pos, PLAYER_START);

        run_until_phase_changes(&mut engine, 200);
        assert_eq!(engine.phase(), GamePhase::Playing);
        engine.tick(FRAME_MS, None);
        assert_eq!(engine.player.body.dir, Direction::Left);
        assert!(engine.player.body.pos.x < PLAYER_START.x);
    }

    #[test]
    fn ghost_chain_scores_200_400_800() {
        let mut engine = playing_engine(7);
        engine.activate_power();
        let at = engine.player.body.pos;

        let chaser = ghost_index(&engine, Personality::Chaser);
        let ambusher = ghost_index(&engine, Personality::Ambusher);
        let fickle = ghost_index(&engine, Personality::Fickle);
        assert_eq!(engine.ghosts[chaser].mode, GhostMode::Frightened);

        // A ghost still chasing is eaten too while the player is powered.
        engine.ghosts[ambusher].mode = GhostMode::Chase;
        engine.ghosts[ambusher].body.pos = at;
        engine.resolve_collisions();
        assert_eq!(engine.player.score, 200);
        assert_eq!(engine.ghosts[ambusher].mode, GhostMode::Eaten);

        engine.ghosts[chaser].body.pos = at;
        engine.resolve_collisions();
        assert_eq!(engine.player.score, 600);

        engine.ghosts[fickle].mode = GhostMode::Frightened;
        engine.ghosts[fickle].body.pos = at;
        engine.resolve_collisions();
        assert_eq!(engine.player.score, 1_400);
        assert!(engine.player.alive);

        let eaten: Vec<(u32, u32)> = engine
            .events
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::GhostEaten { points, chain, .. } => Some((*points, *chain)),
                _ => None,
            })
            .collect();
        assert_eq!(eaten, vec![(200, 1), (400, 2), (800, 3)]);
        assert_eq!(engine.build_summary().ghosts_eaten, 3);
    }

    #[test]
    fn second_power_pellet_restarts_the_chain() {
        let mut engine = playing_engine(17);
        let at = engine.player.body.pos;
        let chaser = ghost_index(&engine, Personality::Chaser);
        let shy = ghost_index(&engine, Personality::Shy);

        engine.activate_power();
        engine.ghosts[shy].mode = GhostMode::Frightened;
        engine.ghosts[shy].body.pos = at;
        engine.resolve_collisions();
        assert_eq!(engine.player.score, 200);

        engine.activate_power();
        assert_eq!(engine.player.ghost_chain, 0);
        engine.ghosts[chaser].body.pos = at;
        engine.resolve_collisions();
        assert_eq!(engine.player.score, 400);
        assert_eq!(engine.player.ghost_chain, 1);
    }

    #[test]
    fn recovering_ghost_is_harmless() {
        let mut engine = playing_engine(8);
        let chaser = ghost_index(&engine, Personality::Chaser);
        engine.ghosts[chaser].mode = GhostMode::Recovering;
        engine.ghosts[chaser].body.pos = engine.player.body.pos;
        engine.resolve_collisions();
        assert!(engine.player.alive);
        assert!(engine.events.is_empty());
    }

    #[test]
    fn death_plays_out_then_respawns_everyone() {
        let mut engine = playing_engine(11);
        let chaser = ghost_index(&engine, Personality::Chaser);
        engine.ghosts[chaser].body.pos = engine.player.body.pos;
        engine.tick(FRAME_MS, None);

        assert!(!engine.player.alive);
        assert_eq!(engine.phase(), GamePhase::Dying);
        assert_eq!(engine.lives(), 2);
        assert!(engine
            .events
            .contains(&RuntimeEvent::PlayerDied { lives_left: 2 }));

        run_until_phase_changes(&mut engine, 200);
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert!(engine.player.alive);
        assert_eq!(engine.player.body.pos, PLAYER_START);
        assert_eq!(
            engine.ghosts[chaser].body.pos,
            ghost_start(Personality::Chaser)
        );
        assert_eq!(engine.lives(), 2);
    }

    #[test]
    fn losing_the_last_life_ends_the_game() {
        let mut engine = GameEngine::new(EngineOptions {
            seed: 12,
            lives: 1,
            ..EngineOptions::default()
        });
        engine.phase = GamePhase::Playing;
        let chaser = ghost_index(&engine, Personality::Chaser);
        engine.ghosts[chaser].body.pos = engine.player.body.pos;
        engine.tick(FRAME_MS, None);
        run_until_phase_changes(&mut engine, 200);

        assert!(engine.is_over());
        assert!(engine.events.contains(&RuntimeEvent::GameOver { score: 0 }));
        let before = engine.build_snapshot(false).tick;
        engine.tick(FRAME_MS, Some(Direction::Left));
        assert_eq!(engine.build_snapshot(false).tick, before);

        let summary = engine.build_summary();
        assert!(summary.game_over);
        assert_eq!(summary.lives_left, 0);
    }

    #[test]
    fn clearing_the_maze_awards_bonus_and_loads_next_level() {
        let mut engine = playing_engine(13);
        let last = Cell::new(12, 23);
        for y in 0..engine.map.height() {
            for x in 0..engine.map.width() {
                let cell = Cell::new(x, y);
                if cell != last {
                    engine.map.consume_pellet(cell);
                }
            }
        }
        assert!(!engine.map.all_pellets_consumed());

        engine.tick(FRAME_MS, Some(Direction::Left));
        run_until_phase_changes(&mut engine, 60);
        assert_eq!(engine.phase(), GamePhase::LevelComplete);
        assert_eq!(engine.score(), 10 + 1_000);
        assert!(engine.events.contains(&RuntimeEvent::LevelCompleted {
            level: 1,
            bonus: 1_000
        }));

        run_until_phase_changes(&mut engine, (LEVEL_COMPLETE_MS / FRAME_MS) as usize + 2);
        assert_eq!(engine.phase(), GamePhase::Ready);
        assert_eq!(engine.level(), 2);
        assert_eq!(engine.map.pellet_counts().pellets_eaten, 0);
        assert!(engine
            .events
            .contains(&RuntimeEvent::LevelStarted { level: 2 }));
        assert_eq!(engine.build_summary().levels_cleared, 1);
    }

    #[test]
    fn fruit_appears_after_a_third_of_the_pellets() {
        let mut engine = playing_engine(14);
        let keep = Cell::new(12, 23);
        let total = engine.map.pellet_counts().pellets_total;
        let targets: Vec<Cell> = (0..engine.map.height())
            .flat_map(|y| (0..engine.map.width()).map(move |x| Cell::new(x, y)))
            .filter(|cell| *cell != keep && engine.map.cell_kind(*cell) == CellKind::Pellet)
            .take((total / 3 - 1) as usize)
            .collect();
        for cell in targets {
            engine.map.consume_pellet(cell);
        }

        engine.tick(FRAME_MS, Some(Direction::Left));
        for _ in 0..30 {
            if engine.fruit.is_some() {
                break;
            }
            engine.tick(FRAME_MS, None);
        }
        let fruit = engine
            .build_snapshot(false)
            .fruit
            .expect("fruit should be offered");
        assert_eq!(fruit.kind, FruitKind::Cherry);
        assert_eq!(fruit.points, 100);
        assert!(engine.events.contains(&RuntimeEvent::FruitSpawned {
            kind: FruitKind::Cherry,
            points: 100
        }));
    }

    #[test]
    fn fruit_is_collected_once_per_level() {
        let mut engine = playing_engine(15);
        engine.fruit = Some(FruitInternal {
            kind: FruitKind::Cherry,
            pos: engine.player.body.pos,
            points: 100,
            remaining_ms: 5_000,
        });
        engine.tick(FRAME_MS, None);
        assert!(engine.fruit.is_none());
        assert!(engine.fruit_eaten);
        assert_eq!(engine.score(), 100);
        assert!(engine.events.contains(&RuntimeEvent::FruitEaten {
            kind: FruitKind::Cherry,
            points: 100
        }));

        engine.check_fruit_spawn();
        assert!(engine.fruit.is_none());
    }

    #[test]
    fn uncollected_fruit_expires() {
        let mut engine = playing_engine(16);
        engine.fruit = Some(FruitInternal {
            kind: FruitKind::Orange,
            pos: Vec2::new(1.5, 1.5),
            points: 500,
            remaining_ms: 10,
        });
        engine.tick(FRAME_MS, None);
        assert!(engine.fruit.is_none());
        assert!(!engine.fruit_eaten);
        assert!(engine.events.contains(&RuntimeEvent::FruitExpired {
            kind: FruitKind::Orange
        }));
    }

    #[test]
    fn later_start_level_uses_mutated_maze() {
        let engine = GameEngine::new(EngineOptions {
            start_level: 3,
            ..EngineOptions::default()
        });
        assert_eq!(engine.level(), 3);
        assert_eq!(engine.maze_view().pellets.pellets_total, 238);
    }

    #[test]
    fn autopilot_run_keeps_every_body_on_open_ground() {
        let mut engine = engine_with_seed(2_024);
        let mut pilot = Autopilot::new(2_024);
        let player_motion = engine.player.body.motion_radius();
        for _ in 0..20_000 {
            if engine.is_over() {
                break;
            }
            let snapshot = engine.build_snapshot(true);
            let intent = pilot.decide(engine.map(), &snapshot);
            engine.tick(FRAME_MS, intent);

            let pos = engine.player.body.pos;
            assert!(engine.map.is_valid_position(pos, player_motion), "player at {pos:?}");
            assert!(!engine.map.is_wall(pos));
            for ghost in &engine.ghosts {
                let pos = ghost.body.pos;
                assert!(
                    engine.map.is_valid_position(pos, ghost.body.motion_radius()),
                    "{:?} at {pos:?}",
                    ghost.personality
                );
            }
        }
        assert!(engine.build_summary().pellets_eaten > 0);
    }
}
