use std::collections::VecDeque;

use crate::constants::{
    CENTER_ASSIST_DISTANCE, CENTER_ASSIST_RATE, CENTER_SNAP_DISTANCE, MOTION_RADIUS_FACTOR,
    SAME_DIRECTION_BONUS, STEER_LOOKAHEAD_CELLS, STUCK_EPSILON, STUCK_THRESHOLD,
};
use crate::types::{Cell, Direction, Vec2};
use crate::world::GridMap;

#[derive(Clone, Debug)]
pub(super) struct Body {
    pub pos: Vec2,
    pub dir: Direction,
    pub speed: f32,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            dir: Direction::None,
            speed: 0.0,
            radius,
        }
    }

    pub fn motion_radius(&self) -> f32 {
        self.radius * MOTION_RADIUS_FACTOR
    }

    pub fn cell(&self) -> Cell {
        self.pos.cell()
    }

    pub fn snap_to_center(&mut self) {
        self.pos = self.pos.cell().center();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SteerOutcome {
    Moved,
    Wrapped,
    Blocked,
    Idle,
}

pub(super) fn is_passable(map: &GridMap, pos: Vec2, radius: f32, allow_door: bool) -> bool {
    if !map.is_valid_position(pos, radius) {
        return false;
    }
    let cell = pos.cell();
    !map.in_bounds(cell) || map.is_open(cell, allow_door)
}

/// Moves `step` cells along `dir`. A rejected move leaves the body on its
/// cell center so the caller can pick again.
pub(super) fn steer(
    map: &GridMap,
    body: &mut Body,
    dir: Direction,
    step: f32,
    allow_door: bool,
) -> SteerOutcome {
    if dir == Direction::None {
        return SteerOutcome::Idle;
    }
    let mut candidate = body.pos.offset(dir, step);
    let wrapped_x = map.wrap_x(candidate.x);
    let wrapped = wrapped_x != candidate.x;
    candidate.x = wrapped_x;

    if !is_passable(map, candidate, body.motion_radius(), allow_door) {
        body.snap_to_center();
        return SteerOutcome::Blocked;
    }

    body.pos = candidate;
    body.dir = dir;
    assist_centering(map, body, allow_door);
    if wrapped {
        SteerOutcome::Wrapped
    } else {
        SteerOutcome::Moved
    }
}

fn assist_centering(map: &GridMap, body: &mut Body, allow_door: bool) {
    let center = body.pos.cell().center();
    let mut corrected = body.pos;
    if body.dir.is_horizontal() {
        corrected.y = pull_toward(body.pos.y, center.y);
    } else if body.dir.is_vertical() {
        corrected.x = pull_toward(body.pos.x, center.x);
    }
    if corrected != body.pos && is_passable(map, corrected, body.motion_radius(), allow_door) {
        body.pos = corrected;
    }
}

fn pull_toward(value: f32, center: f32) -> f32 {
    let offset = center - value;
    if offset.abs() < CENTER_SNAP_DISTANCE {
        center
    } else if offset.abs() < CENTER_ASSIST_DISTANCE {
        value + offset * CENTER_ASSIST_RATE
    } else {
        value
    }
}

pub(super) fn follow_path(
    map: &GridMap,
    body: &mut Body,
    path: &mut VecDeque<Vec2>,
    step: f32,
    allow_door: bool,
) -> SteerOutcome {
    let mut remaining = step;
    let mut moved = false;
    while remaining > 0.0 {
        let Some(&next) = path.front() else {
            break;
        };
        let dx = next.x - body.pos.x;
        let dy = next.y - body.pos.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 0.0 {
            body.dir = Direction::from_delta(dx, dy);
        }
        if dist <= remaining {
            body.pos = next;
            path.pop_front();
            remaining -= dist;
            moved = true;
            continue;
        }

        let candidate = Vec2::new(
            body.pos.x + dx / dist * remaining,
            body.pos.y + dy / dist * remaining,
        );
        if !is_passable(map, candidate, body.motion_radius(), allow_door) {
            body.snap_to_center();
            return SteerOutcome::Blocked;
        }
        body.pos = candidate;
        return SteerOutcome::Moved;
    }
    if moved {
        SteerOutcome::Moved
    } else {
        SteerOutcome::Idle
    }
}

pub(super) fn possible_directions(
    map: &GridMap,
    cell: Cell,
    current: Direction,
    allow_door: bool,
) -> Vec<Direction> {
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| map.is_open(map.neighbor(cell, *dir), allow_door))
        .collect();
    let reverse = current.opposite();
    if open.len() > 1 && current != Direction::None {
        let forward: Vec<Direction> = open.iter().copied().filter(|dir| *dir != reverse).collect();
        if !forward.is_empty() {
            return forward;
        }
    }
    open
}

/// Lowest distance to `target` from a point a couple of cells down each corridor.
pub(super) fn best_direction(
    cell: Cell,
    options: &[Direction],
    current: Direction,
    target: Vec2,
) -> Direction {
    let origin = cell.center();
    let mut best = Direction::None;
    let mut best_score = f32::INFINITY;
    for &dir in options {
        let probe = origin.offset(dir, STEER_LOOKAHEAD_CELLS);
        let mut score = probe.distance(target);
        if dir == current {
            score -= SAME_DIRECTION_BONUS;
        }
        if score < best_score {
            best_score = score;
            best = dir;
        }
    }
    best
}

#[derive(Clone, Debug)]
pub(super) struct StuckDetector {
    checkpoint: Vec2,
    low_motion_ticks: u32,
}

impl StuckDetector {
    pub fn new(pos: Vec2) -> Self {
        Self {
            checkpoint: pos,
            low_motion_ticks: 0,
        }
    }

    pub fn reset(&mut self, pos: Vec2) {
        self.checkpoint = pos;
        self.low_motion_ticks = 0;
    }

    pub fn observe(&mut self, pos: Vec2) -> bool {
        if pos.distance(self.checkpoint) < STUCK_EPSILON {
            self.low_motion_ticks += 1;
        } else {
            self.checkpoint = pos;
            self.low_motion_ticks = 0;
        }
        if self.low_motion_ticks >= STUCK_THRESHOLD {
            self.low_motion_ticks = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::world::tests::fixture;
    use crate::world::GridMap;

    fn corridor() -> GridMap {
        fixture(&["#######", "#.....#", "#######"])
    }

    #[test]
    fn steer_advances_and_centers_perpendicular_axis() {
        let map = corridor();
        let mut body = Body::new(Vec2::new(2.5, 1.45), 0.4);
        let outcome = steer(&map, &mut body, Direction::Right, 0.1, false);
        assert_eq!(outcome, SteerOutcome::Moved);
        assert!((body.pos.x - 2.6).abs() < 1e-5);
        assert_eq!(body.pos.y, 1.5);
        assert_eq!(body.dir, Direction::Right);

        let mut body = Body::new(Vec2::new(2.5, 1.3), 0.4);
        steer(&map, &mut body, Direction::Right, 0.1, false);
        assert!((body.pos.y - 1.36).abs() < 1e-5);
    }

    #[test]
    fn steer_into_wall_snaps_to_center() {
        let map = corridor();
        let mut body = Body::new(Vec2::new(5.6, 1.5), 0.4);
        let outcome = steer(&map, &mut body, Direction::Right, 0.3, false);
        assert_eq!(outcome, SteerOutcome::Blocked);
        assert_eq!(body.pos, Vec2::new(5.5, 1.5));
    }

    #[test]
    fn steer_wraps_through_tunnel() {
        let map = GridMap::classic();
        let mut body = Body::new(Vec2::new(0.05, 14.5), 0.4);
        let outcome = steer(&map, &mut body, Direction::Left, 0.1, false);
        assert_eq!(outcome, SteerOutcome::Wrapped);
        assert_eq!(body.pos.x, 27.0);
        assert!(map.is_valid_position(body.pos, body.motion_radius()));

        let mut body = Body::new(Vec2::new(27.95, 14.5), 0.4);
        assert_eq!(
            steer(&map, &mut body, Direction::Right, 0.1, false),
            SteerOutcome::Wrapped
        );
        assert_eq!(body.pos.x, 0.0);
    }

    #[test]
    fn door_blocks_unless_allowed() {
        let map = GridMap::classic();
        let mut body = Body::new(Vec2::new(13.5, 11.9), 0.4);
        assert_eq!(
            steer(&map, &mut body, Direction::Down, 0.2, false),
            SteerOutcome::Blocked
        );
        let mut body = Body::new(Vec2::new(13.5, 11.9), 0.4);
        assert_eq!(
            steer(&map, &mut body, Direction::Down, 0.2, true),
            SteerOutcome::Moved
        );
        assert!(map.is_ghost_door(body.pos));
    }

    #[test]
    fn follow_path_consumes_several_waypoints_in_one_step() {
        let map = corridor();
        let mut body = Body::new(Vec2::new(1.5, 1.5), 0.4);
        let mut path: VecDeque<Vec2> = [2, 3, 4]
            .into_iter()
            .map(|x| Cell::new(x, 1).center())
            .collect();
        let outcome = follow_path(&map, &mut body, &mut path, 2.25, false);
        assert_eq!(outcome, SteerOutcome::Moved);
        assert_eq!(path.len(), 1);
        assert!((body.pos.x - 3.75).abs() < 1e-5);
        assert_eq!(body.dir, Direction::Right);
        assert_eq!(
            follow_path(&map, &mut body, &mut VecDeque::new(), 1.0, false),
            SteerOutcome::Idle
        );
    }

    #[test]
    fn follow_path_reports_blocked_waypoint() {
        let map = fixture(&["#####", "#...#", "#.#.#", "#####"]);
        let mut body = Body::new(Vec2::new(1.5, 1.5), 0.4);
        let mut path = VecDeque::from([Cell::new(2, 2).center()]);
        assert_eq!(
            follow_path(&map, &mut body, &mut path, 1.0, false),
            SteerOutcome::Blocked
        );
        assert_eq!(body.pos, Vec2::new(1.5, 1.5));
    }

    #[test]
    fn possible_directions_drop_reverse_unless_dead_end() {
        let map = fixture(&["#####", "#...#", "#.###", "#####"]);
        let corner = Cell::new(1, 1);
        assert_eq!(
            possible_directions(&map, corner, Direction::Left, false),
            vec![Direction::Down]
        );
        let dead_end = Cell::new(3, 1);
        assert_eq!(
            possible_directions(&map, dead_end, Direction::Right, false),
            vec![Direction::Left]
        );
        assert_eq!(
            possible_directions(&map, Cell::new(2, 1), Direction::None, false),
            vec![Direction::Right, Direction::Left]
        );
    }

    #[test]
    fn best_direction_prefers_target_and_keeps_heading_on_near_ties() {
        let cell = Cell::new(5, 5);
        let options = [Direction::Up, Direction::Right, Direction::Left];
        assert_eq!(
            best_direction(cell, &options, Direction::Left, Vec2::new(20.0, 5.5)),
            Direction::Right
        );
        // Up and Right are equally close; the current heading wins.
        let target = Vec2::new(15.5, -4.5);
        assert_eq!(
            best_direction(cell, &options, Direction::Right, target),
            Direction::Right
        );
        assert_eq!(best_direction(cell, &[], Direction::Up, target), Direction::None);
    }

    #[test]
    fn stuck_detector_fires_after_threshold() {
        let mut detector = StuckDetector::new(Vec2::new(1.5, 1.5));
        for _ in 0..(STUCK_THRESHOLD - 1) {
            assert!(!detector.observe(Vec2::new(1.51, 1.5)));
        }
        assert!(detector.observe(Vec2::new(1.52, 1.5)));
        assert!(!detector.observe(Vec2::new(3.0, 1.5)));
    }
}
