use super::*;

/// What a ghost may read about the rest of the board while choosing a target.
#[derive(Clone, Copy, Debug)]
pub(super) struct ChaseContext {
    pub player_pos: Vec2,
    pub player_dir: Direction,
    pub chaser_pos: Option<Vec2>,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug)]
pub(super) struct GhostInternal {
    pub personality: Personality,
    pub body: Body,
    pub base_speed: f32,
    pub mode: GhostMode,
    pub prior_mode: GhostMode,
    pub schedule_mode: GhostMode,
    pub schedule_timer_ms: u64,
    pub frightened_timer_ms: u64,
    pub blinking: bool,
    pub house_wait_ms: u64,
    pub house_anchor: Vec2,
    pub bob_clock_ms: u64,
    pub recover_timer_ms: u64,
    pub path: VecDeque<Vec2>,
    pub path_refresh_ms: u64,
    pub stuck: StuckDetector,
    pub random_target: Option<Vec2>,
    pub retarget_ms: u64,
    pub decision_cell: Option<Cell>,
}

impl GhostInternal {
    pub fn new(personality: Personality, level: u32) -> Self {
        let start = ghost_start(personality);
        let (mode, house_wait_ms, base) = match personality {
            Personality::Chaser => (GhostMode::Scatter, 0, CHASER_BASE_SPEED),
            Personality::Ambusher => (
                GhostMode::WaitingInHouse,
                AMBUSHER_HOUSE_WAIT_MS,
                GHOST_BASE_SPEED,
            ),
            Personality::Fickle => (
                GhostMode::WaitingInHouse,
                FICKLE_HOUSE_WAIT_MS,
                GHOST_BASE_SPEED,
            ),
            Personality::Shy => (GhostMode::WaitingInHouse, SHY_HOUSE_WAIT_MS, GHOST_BASE_SPEED),
        };
        let base_speed = base * ghost_speed_multiplier(level);
        let mut body = Body::new(start, GHOST_RADIUS);
        body.speed = base_speed;
        body.dir = if mode == GhostMode::Scatter {
            Direction::Left
        } else {
            Direction::Up
        };

        Self {
            personality,
            body,
            base_speed,
            mode,
            prior_mode: GhostMode::Scatter,
            schedule_mode: GhostMode::Scatter,
            schedule_timer_ms: SCATTER_DURATION_MS,
            frightened_timer_ms: 0,
            blinking: false,
            house_wait_ms,
            house_anchor: start,
            bob_clock_ms: 0,
            recover_timer_ms: 0,
            path: VecDeque::new(),
            path_refresh_ms: 0,
            stuck: StuckDetector::new(start),
            random_target: None,
            retarget_ms: 0,
            decision_cell: None,
        }
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            name: self.personality.name(),
            personality: self.personality,
            x: self.body.pos.x,
            y: self.body.pos.y,
            dir: self.body.dir,
            mode: self.mode,
            frightened: self.mode == GhostMode::Frightened,
            blinking: self.blinking,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.mode, GhostMode::Scatter | GhostMode::Chase)
    }

    fn speed_for_mode(&self) -> f32 {
        match self.mode {
            GhostMode::Frightened => self.base_speed * FRIGHTENED_SPEED_MULTIPLIER,
            GhostMode::Eaten => self.base_speed * EATEN_SPEED_MULTIPLIER,
            _ => self.base_speed,
        }
    }

    pub fn scatter_corner(&self, width: i32, height: i32) -> Vec2 {
        let (x, y) = match self.personality {
            Personality::Chaser => (width - 2, 2),
            Personality::Ambusher => (2, 2),
            Personality::Fickle => (width - 2, height - 2),
            Personality::Shy => (2, height - 2),
        };
        Vec2::new(x as f32, y as f32)
    }

    pub fn chase_target(&self, ctx: &ChaseContext) -> Vec2 {
        let player = ctx.player_pos;
        match self.personality {
            Personality::Chaser => player,
            Personality::Ambusher => {
                let mut target = player.offset(ctx.player_dir, AMBUSH_LOOKAHEAD);
                // Facing up also pulls the target left by the same amount.
                if ctx.player_dir == Direction::Up {
                    target.x -= AMBUSH_LOOKAHEAD;
                }
                target
            }
            Personality::Fickle => {
                let pivot = player.offset(ctx.player_dir, FLANK_LOOKAHEAD);
                match ctx.chaser_pos {
                    Some(chaser) => Vec2::new(2.0 * pivot.x - chaser.x, 2.0 * pivot.y - chaser.y),
                    None => pivot,
                }
            }
            Personality::Shy => {
                if self.body.pos.distance(player) > SHY_DISTANCE {
                    player
                } else {
                    self.scatter_corner(ctx.width, ctx.height)
                }
            }
        }
    }

    pub fn target(&self, ctx: &ChaseContext) -> Vec2 {
        if self.mode == GhostMode::Chase {
            self.chase_target(ctx)
        } else {
            self.scatter_corner(ctx.width, ctx.height)
        }
    }

    fn drop_path(&mut self) {
        self.path.clear();
        self.path_refresh_ms = 0;
    }

    /// Scatter and chase alternate on their own clock, which stands still
    /// while the ghost is frightened or heading home.
    fn advance_schedule(&mut self, dt_ms: u64) {
        if matches!(self.mode, GhostMode::Frightened | GhostMode::Eaten) {
            return;
        }
        self.schedule_timer_ms = self.schedule_timer_ms.saturating_sub(dt_ms);
        if self.schedule_timer_ms > 0 {
            return;
        }
        let (next, duration) = if self.schedule_mode == GhostMode::Scatter {
            (GhostMode::Chase, CHASE_DURATION_MS)
        } else {
            (GhostMode::Scatter, SCATTER_DURATION_MS)
        };
        self.schedule_mode = next;
        self.schedule_timer_ms = duration;
        if self.is_active() {
            self.mode = next;
            self.body.dir = self.body.dir.opposite();
            self.decision_cell = Some(self.body.cell());
            self.drop_path();
        }
    }

    pub fn frighten(&mut self, duration_ms: u64) {
        match self.mode {
            GhostMode::Scatter | GhostMode::Chase => {
                self.prior_mode = self.mode;
                self.mode = GhostMode::Frightened;
                self.frightened_timer_ms = duration_ms;
                self.blinking = false;
                self.body.dir = self.body.dir.opposite();
                self.body.speed = self.speed_for_mode();
                self.decision_cell = Some(self.body.cell());
                self.random_target = None;
                self.retarget_ms = 0;
                self.drop_path();
            }
            GhostMode::Frightened => {
                self.frightened_timer_ms = duration_ms;
                self.blinking = false;
            }
            _ => {}
        }
    }

    fn end_frightened(&mut self) {
        self.mode = self.prior_mode;
        self.frightened_timer_ms = 0;
        self.blinking = false;
        self.random_target = None;
        self.body.speed = self.speed_for_mode();
        self.drop_path();
    }

    pub fn mark_eaten(&mut self) {
        self.mode = GhostMode::Eaten;
        self.frightened_timer_ms = 0;
        self.blinking = false;
        self.random_target = None;
        self.decision_cell = None;
        self.body.speed = self.speed_for_mode();
        self.drop_path();
    }

    fn begin_recovering(&mut self) {
        self.mode = GhostMode::Recovering;
        self.recover_timer_ms = RECOVERING_MS;
        self.body.speed = self.speed_for_mode();
        self.path.clear();
    }

    pub fn update(&mut self, map: &GridMap, rng: &mut Rng, ctx: &ChaseContext, dt_ms: u64) {
        self.advance_schedule(dt_ms);
        match self.mode {
            GhostMode::WaitingInHouse => self.wait_in_house(dt_ms),
            GhostMode::LeavingHouse => self.leave_house(dt_ms),
            GhostMode::Scatter | GhostMode::Chase => self.pursue(map, ctx, dt_ms),
            GhostMode::Frightened => self.flee(map, rng, dt_ms),
            GhostMode::Eaten => self.return_home(map, dt_ms),
            GhostMode::Recovering => self.recover(dt_ms),
        }

        let roaming = matches!(
            self.mode,
            GhostMode::Scatter | GhostMode::Chase | GhostMode::Frightened | GhostMode::Eaten
        );
        if !roaming {
            self.stuck.reset(self.body.pos);
        } else if dt_ms > 0 && self.stuck.observe(self.body.pos) {
            self.unstick(map, rng);
        }
    }

    fn wait_in_house(&mut self, dt_ms: u64) {
        self.house_wait_ms = self.house_wait_ms.saturating_sub(dt_ms);
        self.bob_clock_ms += dt_ms;
        if self.house_wait_ms == 0 {
            self.body.pos = self.house_anchor;
            self.mode = GhostMode::LeavingHouse;
            return;
        }
        let phase = self.bob_clock_ms as f32 / HOUSE_BOB_PERIOD_MS * std::f32::consts::TAU;
        let offset = HOUSE_BOB_AMPLITUDE * phase.sin();
        self.body.pos.y = self.house_anchor.y + offset;
        self.body.dir = if phase.cos() >= 0.0 {
            Direction::Down
        } else {
            Direction::Up
        };
    }

    /// Lines up under the door first, then rises through it.
    fn leave_house(&mut self, dt_ms: u64) {
        let exit = Vec2::from(HOUSE_EXIT);
        let mut step = step_length(self.base_speed, dt_ms);
        let dx = exit.x - self.body.pos.x;
        if dx.abs() > f32::EPSILON {
            let shift = dx.abs().min(step);
            self.body.pos.x += shift * dx.signum();
            self.body.dir = Direction::from_delta(dx, 0.0);
            step -= shift;
        }
        if step > 0.0 {
            let dy = exit.y - self.body.pos.y;
            let shift = dy.abs().min(step);
            self.body.pos.y += shift * dy.signum();
            if dy != 0.0 {
                self.body.dir = Direction::from_delta(0.0, dy);
            }
        }

        if self.body.pos.distance(exit) < HOUSE_ARRIVAL_DISTANCE {
            self.body.pos = exit;
            self.body.dir = Direction::Left;
            self.mode = self.schedule_mode;
            self.body.speed = self.speed_for_mode();
            self.decision_cell = None;
            self.drop_path();
        }
    }

    fn pursue(&mut self, map: &GridMap, ctx: &ChaseContext, dt_ms: u64) {
        let target = self.target(ctx);
        let step = step_length(self.body.speed, dt_ms);
        if self.body.pos.distance(target) < DIRECT_STEER_DISTANCE {
            self.path.clear();
            self.steer_toward(map, target, step, false);
            return;
        }

        self.path_refresh_ms = self.path_refresh_ms.saturating_sub(dt_ms);
        if self.path_refresh_ms == 0 {
            self.refresh_path(map, target, false);
            self.path_refresh_ms = PATH_REFRESH_MS;
        }
        self.travel(map, target, step, false);
    }

    fn flee(&mut self, map: &GridMap, rng: &mut Rng, dt_ms: u64) {
        self.frightened_timer_ms = self.frightened_timer_ms.saturating_sub(dt_ms);
        if self.frightened_timer_ms == 0 {
            self.end_frightened();
            return;
        }
        self.blinking = self.frightened_timer_ms <= FRIGHTENED_BLINK_MS;

        self.retarget_ms = self.retarget_ms.saturating_sub(dt_ms);
        if self.retarget_ms == 0 || self.random_target.is_none() {
            if let Some(cell) = map.random_open_cell(rng, FRIGHTENED_RETARGET_ATTEMPTS) {
                self.random_target = Some(cell.center());
            }
            self.retarget_ms = FRIGHTENED_RETARGET_MS;
        }
        let target = self.random_target.unwrap_or(self.body.pos);
        let step = step_length(self.body.speed, dt_ms);
        self.steer_toward(map, target, step, false);
    }

    fn return_home(&mut self, map: &GridMap, dt_ms: u64) {
        if map.is_in_ghost_house(self.body.pos) {
            self.begin_recovering();
            return;
        }
        let target = Vec2::from(HOUSE_CENTER);
        self.path_refresh_ms = self.path_refresh_ms.saturating_sub(dt_ms);
        if self.path_refresh_ms == 0 {
            self.refresh_path(map, target, true);
            self.path_refresh_ms = EATEN_PATH_REFRESH_MS;
        }
        let step = step_length(self.body.speed, dt_ms);
        self.travel(map, target, step, true);
        if map.is_in_ghost_house(self.body.pos) {
            self.begin_recovering();
        }
    }

    fn recover(&mut self, dt_ms: u64) {
        self.recover_timer_ms = self.recover_timer_ms.saturating_sub(dt_ms);
        if self.recover_timer_ms > 0 {
            return;
        }
        self.mode = GhostMode::WaitingInHouse;
        self.house_wait_ms = RESPAWN_WAIT_MS;
        self.house_anchor = self.body.pos;
        self.bob_clock_ms = 0;
        self.body.speed = self.speed_for_mode();
    }

    fn refresh_path(&mut self, map: &GridMap, target: Vec2, allow_door: bool) {
        self.path = find_path(map, self.body.pos, target, allow_door)
            .into_iter()
            .take(MAX_PATH_WAYPOINTS)
            .collect();
    }

    /// Follows the cached path when there is one, otherwise steers directly.
    fn travel(&mut self, map: &GridMap, target: Vec2, step: f32, allow_door: bool) {
        if self.path.is_empty() {
            self.steer_toward(map, target, step, allow_door);
            return;
        }
        if follow_path(map, &mut self.body, &mut self.path, step, allow_door)
            == SteerOutcome::Blocked
        {
            self.decision_cell = None;
            self.drop_path();
        }
    }

    /// Direct steering: a heading is picked once per cell, as the ghost
    /// reaches its center.
    fn steer_toward(&mut self, map: &GridMap, target: Vec2, step: f32, allow_door: bool) {
        let mut remaining = step;
        while remaining > 0.0 {
            let chunk = remaining.min(MAX_SUBSTEP);
            remaining -= chunk;

            let cell = self.body.cell();
            let center = cell.center();
            let along = if self.body.dir.is_horizontal() {
                (self.body.pos.x - center.x).abs()
            } else if self.body.dir.is_vertical() {
                (self.body.pos.y - center.y).abs()
            } else {
                0.0
            };
            let mut travel = chunk;
            if self.decision_cell != Some(cell) && along <= chunk.max(CENTER_SNAP_DISTANCE) {
                self.body.pos = center;
                travel = (chunk - along).max(0.0);
                let options = possible_directions(map, cell, self.body.dir, allow_door);
                self.body.dir = best_direction(cell, &options, self.body.dir, target);
                self.decision_cell = Some(cell);
            }
            if travel <= 0.0 {
                continue;
            }
            let dir = self.body.dir;
            match steer(map, &mut self.body, dir, travel, allow_door) {
                SteerOutcome::Blocked => {
                    self.decision_cell = None;
                    break;
                }
                SteerOutcome::Idle => break,
                SteerOutcome::Moved | SteerOutcome::Wrapped => {}
            }
        }
    }

    /// Back onto the cell center with a random open heading, reversal allowed.
    fn unstick(&mut self, map: &GridMap, rng: &mut Rng) {
        self.body.snap_to_center();
        self.drop_path();
        let cell = self.body.cell();
        let allow_door = self.mode == GhostMode::Eaten;
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| map.is_open(map.neighbor(cell, *dir), allow_door))
            .collect();
        if let Some(dir) = rng.choose(&open) {
            self.body.dir = dir;
        }
        self.decision_cell = Some(cell);
        self.stuck.reset(self.body.pos);
    }
}

impl GameEngine {
    fn chase_context(&self) -> ChaseContext {
        ChaseContext {
            player_pos: self.player.body.pos,
            player_dir: self.player.body.dir,
            chaser_pos: self
                .ghosts
                .iter()
                .find(|ghost| ghost.personality == Personality::Chaser)
                .map(|ghost| ghost.body.pos),
            width: self.map.width(),
            height: self.map.height(),
        }
    }

    pub(super) fn update_ghosts(&mut self, dt_ms: u64) {
        for idx in 0..self.ghosts.len() {
            let ctx = self.chase_context();
            self.ghosts[idx].update(&self.map, &mut self.rng, &ctx, dt_ms);
        }
    }

    pub(super) fn frighten_ghosts(&mut self, duration_ms: u64) {
        for ghost in &mut self.ghosts {
            ghost.frighten(duration_ms);
        }
    }

    pub(super) fn spawn_ghosts(&mut self) {
        self.ghosts = Personality::ROSTER
            .into_iter()
            .map(|personality| GhostInternal::new(personality, self.level))
            .collect();
    }
}
