use std::collections::{HashSet, VecDeque};

use crate::rng::Rng;
use crate::types::{Cell, CellKind, Direction, GamePhase, GhostMode, GhostView, Snapshot, Vec2};
use crate::world::GridMap;

/// Ghosts closer than this many cells (Manhattan) send the autopilot running.
const DANGER_RADIUS: i32 = 4;
const KEEP_HEADING_BONUS: f32 = 0.5;
const ESCAPE_JITTER: f32 = 0.25;

/// Headless input source for simulations: reads a snapshot, answers with a
/// direction intent.
#[derive(Clone, Debug)]
pub struct Autopilot {
    rng: Rng,
    last_cell: Option<Cell>,
    search_order: [Direction; 4],
}

impl Autopilot {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
            last_cell: None,
            search_order: Direction::ALL,
        }
    }

    pub fn decide(&mut self, map: &GridMap, snapshot: &Snapshot) -> Option<Direction> {
        if !matches!(snapshot.phase, GamePhase::Ready | GamePhase::Playing)
            || !snapshot.player.alive
        {
            return None;
        }
        let player = &snapshot.player;
        let pos = Vec2::new(player.x, player.y);
        let cell = pos.cell();
        if self.last_cell != Some(cell) {
            self.last_cell = Some(cell);
            self.shuffle_search_order(player.dir);
        }

        if player.powered {
            if let Some(dir) = self.choose_chase_direction(map, cell, &snapshot.ghosts) {
                return Some(dir);
            }
        } else if let Some(threat) = nearest_threat(cell, &snapshot.ghosts) {
            if threat.manhattan(cell) <= DANGER_RADIUS {
                return self.choose_escape_direction(map, cell, threat, player.dir);
            }
        }
        self.choose_pellet_direction(map, cell)
            .or(Some(player.dir).filter(|dir| *dir != Direction::None))
    }

    /// Keeps the current heading first so equally near pellets don't flip
    /// the player back and forth; the rest is re-rolled once per cell.
    fn shuffle_search_order(&mut self, heading: Direction) {
        let shift = self.rng.int_between(0, 3) as usize;
        let mut order = Direction::ALL;
        order.rotate_left(shift);
        if let Some(idx) = order.iter().position(|dir| *dir == heading) {
            order[..=idx].rotate_right(1);
        }
        self.search_order = order;
    }

    fn choose_pellet_direction(&self, map: &GridMap, from: Cell) -> Option<Direction> {
        first_step_toward(map, from, &self.search_order, |cell| {
            matches!(map.cell_kind(cell), CellKind::Pellet | CellKind::PowerPellet)
        })
    }

    fn choose_chase_direction(
        &self,
        map: &GridMap,
        from: Cell,
        ghosts: &[GhostView],
    ) -> Option<Direction> {
        let prey: HashSet<Cell> = ghosts
            .iter()
            .filter(|ghost| ghost.mode == GhostMode::Frightened)
            .map(ghost_cell)
            .collect();
        if prey.is_empty() {
            return None;
        }
        first_step_toward(map, from, &self.search_order, |cell| prey.contains(&cell))
    }

    fn choose_escape_direction(
        &mut self,
        map: &GridMap,
        from: Cell,
        threat: Cell,
        heading: Direction,
    ) -> Option<Direction> {
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;
        for dir in Direction::ALL {
            let next = map.neighbor(from, dir);
            if !map.is_open(next, false) {
                continue;
            }
            let mut score = next.manhattan(threat) as f32;
            if dir == heading {
                score += KEEP_HEADING_BONUS;
            }
            score += self.rng.next_f32() * ESCAPE_JITTER;
            if score > best_score {
                best_score = score;
                best = Some(dir);
            }
        }
        best
    }
}

fn ghost_cell(ghost: &GhostView) -> Cell {
    Vec2::new(ghost.x, ghost.y).cell()
}

/// Closest ghost that can still kill an unpowered player.
fn nearest_threat(from: Cell, ghosts: &[GhostView]) -> Option<Cell> {
    ghosts
        .iter()
        .filter(|ghost| {
            matches!(
                ghost.mode,
                GhostMode::Scatter | GhostMode::Chase | GhostMode::LeavingHouse
            )
        })
        .map(ghost_cell)
        .min_by_key(|cell| cell.manhattan(from))
}

/// Breadth-first search over open cells, tunnels included. Returns the first
/// move on a shortest route to the nearest cell matching `goal`.
fn first_step_toward(
    map: &GridMap,
    from: Cell,
    order: &[Direction; 4],
    goal: impl Fn(Cell) -> bool,
) -> Option<Direction> {
    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::new();
    for &dir in order {
        let next = map.neighbor(from, dir);
        if map.is_open(next, false) && seen.insert(next) {
            queue.push_back((next, dir));
        }
    }
    while let Some((cell, first)) = queue.pop_front() {
        if goal(cell) {
            return Some(first);
        }
        for &dir in order {
            let next = map.neighbor(cell, dir);
            if map.is_open(next, false) && seen.insert(next) {
                queue.push_back((next, first));
            }
        }
    }
    None
}
