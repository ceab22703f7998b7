use super::*;

#[derive(Clone, Debug)]
pub(super) struct FruitInternal {
    pub kind: FruitKind,
    pub pos: Vec2,
    pub points: u32,
    pub remaining_ms: u64,
}

impl FruitInternal {
    pub fn view(&self) -> FruitView {
        FruitView {
            kind: self.kind,
            x: self.pos.x,
            y: self.pos.y,
            points: self.points,
        }
    }
}

impl GameEngine {
    /// Rebuilds the maze for `level`, puts everyone back on their starts and
    /// opens with a longer ready pause. Score and lives carry over.
    pub fn load_level(&mut self, level: u32) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.level = level.max(1);
        self.map = GridMap::for_level(self.level);
        self.player.respawn();
        self.spawn_ghosts();
        self.fruit = None;
        self.fruit_eaten = false;
        self.enter_phase(GamePhase::Ready, LEVEL_READY_MS);
        self.events
            .push(RuntimeEvent::LevelStarted { level: self.level });
    }

    fn enter_phase(&mut self, phase: GamePhase, duration_ms: u64) {
        self.phase = phase;
        self.phase_timer_ms = duration_ms;
    }

    /// Counts the phase timer down; true on the tick it runs out.
    fn phase_elapsed(&mut self, dt_ms: u64) -> bool {
        self.phase_timer_ms = self.phase_timer_ms.saturating_sub(dt_ms);
        self.phase_timer_ms == 0
    }

    pub(super) fn update_ready(&mut self, dt_ms: u64) {
        if self.phase_elapsed(dt_ms) {
            self.enter_phase(GamePhase::Playing, 0);
        }
    }

    pub(super) fn update_playing(&mut self, dt_ms: u64) {
        self.update_player(dt_ms);
        if self.phase != GamePhase::Playing {
            return;
        }
        self.update_ghosts(dt_ms);
        self.resolve_collisions();
        if !self.player.alive {
            self.fruit = None;
            self.enter_phase(GamePhase::Dying, DYING_MS);
            return;
        }
        self.update_fruit(dt_ms);
    }

    pub(super) fn update_dying(&mut self, dt_ms: u64) {
        if !self.phase_elapsed(dt_ms) {
            return;
        }
        if self.player.lives == 0 {
            self.enter_phase(GamePhase::GameOver, 0);
            self.events.push(RuntimeEvent::GameOver {
                score: self.player.score,
            });
            return;
        }
        self.player.respawn();
        self.spawn_ghosts();
        self.fruit = None;
        self.enter_phase(GamePhase::Ready, READY_MS);
    }

    pub(super) fn update_level_complete(&mut self, dt_ms: u64) {
        if self.phase_elapsed(dt_ms) {
            self.load_level(self.level + 1);
        }
    }

    pub(super) fn complete_level(&mut self) {
        let bonus = level_clear_bonus(self.level);
        self.player.score += bonus;
        self.stats.levels_cleared += 1;
        self.fruit = None;
        self.enter_phase(GamePhase::LevelComplete, LEVEL_COMPLETE_MS);
        self.events.push(RuntimeEvent::LevelCompleted {
            level: self.level,
            bonus,
        });
    }

    /// One fruit per level, offered when a third or two thirds of the
    /// pellets are gone.
    pub(super) fn check_fruit_spawn(&mut self) {
        if self.fruit.is_some() || self.fruit_eaten {
            return;
        }
        let counts = self.map.pellet_counts();
        let eaten = counts.pellets_eaten;
        let total = counts.pellets_total;
        if eaten != total / 3 && eaten != total * 2 / 3 {
            return;
        }
        let kind = FruitKind::for_level(self.level);
        let points = fruit_points(kind.base_points(), self.level);
        self.fruit = Some(FruitInternal {
            kind,
            pos: Vec2::from(FRUIT_POSITION),
            points,
            remaining_ms: fruit_lifetime_ms(self.level),
        });
        self.events.push(RuntimeEvent::FruitSpawned { kind, points });
    }

    fn update_fruit(&mut self, dt_ms: u64) {
        let Some(fruit) = self.fruit.as_mut() else {
            return;
        };
        if self.player.body.pos.distance(fruit.pos) < self.player.body.radius + FRUIT_RADIUS {
            let (kind, points) = (fruit.kind, fruit.points);
            self.fruit = None;
            self.fruit_eaten = true;
            self.player.score += points;
            self.stats.fruits_eaten += 1;
            self.events.push(RuntimeEvent::FruitEaten { kind, points });
            return;
        }
        fruit.remaining_ms = fruit.remaining_ms.saturating_sub(dt_ms);
        if fruit.remaining_ms == 0 {
            let kind = fruit.kind;
            self.fruit = None;
            self.events.push(RuntimeEvent::FruitExpired { kind });
        }
    }
}
