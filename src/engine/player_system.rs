use super::*;

#[derive(Clone, Debug)]
pub(super) struct PlayerInternal {
    pub body: Body,
    pub next_dir: Direction,
    pub alive: bool,
    pub powered: bool,
    pub power_timer_ms: u64,
    pub power_ending: bool,
    pub lives: u32,
    pub score: u32,
    pub ghost_chain: u32,
}

impl PlayerInternal {
    pub fn new(lives: u32) -> Self {
        Self {
            body: Body::new(PLAYER_START, PLAYER_RADIUS),
            next_dir: Direction::None,
            alive: true,
            powered: false,
            power_timer_ms: 0,
            power_ending: false,
            lives,
            score: 0,
            ghost_chain: 0,
        }
    }

    /// Back to the start cell; score and lives carry over.
    pub fn respawn(&mut self) {
        self.body = Body::new(PLAYER_START, PLAYER_RADIUS);
        self.next_dir = Direction::None;
        self.alive = true;
        self.powered = false;
        self.power_timer_ms = 0;
        self.power_ending = false;
        self.ghost_chain = 0;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.body.pos.x,
            y: self.body.pos.y,
            dir: self.body.dir,
            next_dir: self.next_dir,
            alive: self.alive,
            powered: self.powered,
            power_ending: self.power_ending,
            score: self.score,
            lives: self.lives,
        }
    }

    fn probe_distance(&self) -> f32 {
        self.body.radius * PLAYER_PROBE_DISTANCE_FACTOR
    }

    fn probe_radius(&self) -> f32 {
        self.body.radius * PLAYER_PROBE_RADIUS_FACTOR
    }

    fn probe_clear(&self, map: &GridMap, from: Vec2, dir: Direction) -> bool {
        is_passable(
            map,
            from.offset(dir, self.probe_distance()),
            self.probe_radius(),
            false,
        )
    }

    pub fn try_turn(&mut self, map: &GridMap) -> bool {
        let wanted = self.next_dir;
        if wanted == Direction::None {
            return false;
        }
        if wanted == self.body.dir {
            self.next_dir = Direction::None;
            return false;
        }

        let pos = self.body.pos;
        if wanted == self.body.dir.opposite() {
            if !self.probe_clear(map, pos, wanted) {
                return false;
            }
            self.body.dir = wanted;
            self.next_dir = Direction::None;
            return true;
        }

        let center = self.body.cell().center();
        if self.body.dir != Direction::None {
            let off_center = if self.body.dir.is_horizontal() {
                (pos.x - center.x).abs()
            } else {
                (pos.y - center.y).abs()
            };
            if off_center > PLAYER_TURN_WINDOW {
                return false;
            }
        }

        let aligned = if wanted.is_horizontal() {
            Vec2::new(pos.x, center.y)
        } else {
            Vec2::new(center.x, pos.y)
        };
        if !self.probe_clear(map, aligned, wanted) {
            return false;
        }
        self.body.pos = if is_passable(map, aligned, self.body.motion_radius(), false) {
            aligned
        } else {
            center
        };
        self.body.dir = wanted;
        self.next_dir = Direction::None;
        true
    }

    // Probe first so the body rests short of walls.
    pub fn advance(&mut self, map: &GridMap, step: f32) -> SteerOutcome {
        let dir = self.body.dir;
        if dir == Direction::None || !self.probe_clear(map, self.body.pos, dir) {
            return SteerOutcome::Idle;
        }
        steer(map, &mut self.body, dir, step, false)
    }
}

impl GameEngine {
    pub(super) fn player_speed(&self) -> f32 {
        let mut speed = PLAYER_BASE_SPEED * player_speed_multiplier(self.level);
        if self.player.powered {
            speed *= PLAYER_POWER_SPEED_MULTIPLIER;
        }
        speed
    }

    fn update_power_timer(&mut self, dt_ms: u64) {
        if !self.player.powered {
            return;
        }
        self.player.power_timer_ms = self.player.power_timer_ms.saturating_sub(dt_ms);
        if self.player.power_timer_ms == 0 {
            self.player.powered = false;
            self.player.power_ending = false;
            return;
        }
        self.player.power_ending = self.player.power_timer_ms <= POWER_WARNING_MS;
    }

    pub(super) fn update_player(&mut self, dt_ms: u64) {
        self.update_power_timer(dt_ms);
        self.player.body.speed = self.player_speed();

        let mut remaining = step_length(self.player.body.speed, dt_ms);
        loop {
            let chunk = remaining.min(MAX_SUBSTEP);
            remaining -= chunk;
            self.player.try_turn(&self.map);
            if chunk > 0.0 {
                self.player.advance(&self.map, chunk);
            }
            self.eat_at_player();
            if self.phase != GamePhase::Playing || remaining <= 0.0 {
                break;
            }
        }
    }

    fn eat_at_player(&mut self) {
        let cell = self.player.body.cell();
        let Some(kind) = self.map.consume_pellet(cell) else {
            return;
        };
        self.player.score += kind.points();
        self.stats.pellets_eaten += 1;
        match kind {
            PelletKind::Pellet => self.events.push(RuntimeEvent::PelletEaten {
                x: cell.x,
                y: cell.y,
            }),
            PelletKind::PowerPellet => {
                self.events.push(RuntimeEvent::PowerPelletEaten {
                    x: cell.x,
                    y: cell.y,
                });
                self.activate_power();
            }
        }

        if self.map.all_pellets_consumed() {
            self.complete_level();
            return;
        }
        self.check_fruit_spawn();
    }

    pub fn activate_power(&mut self) {
        let duration_ms = frightened_duration_ms(self.level);
        self.player.powered = true;
        self.player.power_timer_ms = duration_ms;
        self.player.power_ending = false;
        self.player.ghost_chain = 0;
        self.player.body.speed = self.player_speed();
        self.frighten_ghosts(duration_ms);
        self.events
            .push(RuntimeEvent::GhostsFrightened { duration_ms });
    }

    /// Runs after every ghost has moved.
    pub(super) fn resolve_collisions(&mut self) {
        let reach = PLAYER_RADIUS + GHOST_RADIUS - COLLISION_MARGIN;
        for idx in 0..self.ghosts.len() {
            if !self.player.alive {
                return;
            }
            let mode = self.ghosts[idx].mode;
            if mode == GhostMode::Recovering {
                continue;
            }
            if self.player.body.pos.distance(self.ghosts[idx].body.pos) >= reach {
                continue;
            }

            if self.player.powered && mode != GhostMode::Eaten {
                let points = ghost_points(self.player.ghost_chain);
                self.player.ghost_chain += 1;
                self.player.score += points;
                self.stats.ghosts_eaten += 1;
                self.ghosts[idx].mark_eaten();
                self.events.push(RuntimeEvent::GhostEaten {
                    ghost: self.ghosts[idx].personality.name(),
                    points,
                    chain: self.player.ghost_chain,
                });
            } else if !matches!(mode, GhostMode::Frightened | GhostMode::Eaten) {
                self.player.alive = false;
                self.player.lives = self.player.lives.saturating_sub(1);
                self.events.push(RuntimeEvent::PlayerDied {
                    lives_left: self.player.lives,
                });
            }
        }
    }
}
