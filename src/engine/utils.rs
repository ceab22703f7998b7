use crate::constants::GHOST_BASE_POINTS;

/// Points for the next ghost eaten on one power pellet: 200, 400, 800, ...
pub(super) fn ghost_points(chain: u32) -> u32 {
    GHOST_BASE_POINTS << chain.min(8)
}

/// Distance covered at `speed` cells per second over `dt_ms`.
pub(super) fn step_length(speed: f32, dt_ms: u64) -> f32 {
    speed * dt_ms as f32 / 1000.0
}
