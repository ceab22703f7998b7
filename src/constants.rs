pub const MAX_TICK_MS: u64 = 60;
pub const FRAME_MS: u64 = 16;

pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;
pub const GHOST_BASE_POINTS: u32 = 200;
pub const LEVEL_CLEAR_BONUS: u32 = 1_000;
pub const STARTING_LIVES: u32 = 3;

pub const PLAYER_BASE_SPEED: f32 = 6.0;
pub const PLAYER_POWER_SPEED_MULTIPLIER: f32 = 1.2;
pub const PLAYER_RADIUS: f32 = 0.4;
pub const PLAYER_PROBE_DISTANCE_FACTOR: f32 = 0.9;
pub const PLAYER_PROBE_RADIUS_FACTOR: f32 = 0.7;
pub const PLAYER_TURN_WINDOW: f32 = 0.35;
pub const POWER_WARNING_MS: u64 = 2_000;

pub const GHOST_BASE_SPEED: f32 = 4.8;
pub const CHASER_BASE_SPEED: f32 = 5.4;
pub const GHOST_RADIUS: f32 = 0.4;
pub const FRIGHTENED_SPEED_MULTIPLIER: f32 = 0.5;
pub const EATEN_SPEED_MULTIPLIER: f32 = 2.0;
pub const COLLISION_MARGIN: f32 = 0.1;

/// Walls are tested with a body smaller than the drawn radius.
pub const MOTION_RADIUS_FACTOR: f32 = 0.75;

pub const SCATTER_DURATION_MS: u64 = 7_000;
pub const CHASE_DURATION_MS: u64 = 20_000;
pub const BASE_FRIGHTENED_MS: u64 = 7_000;
pub const MIN_FRIGHTENED_MS: u64 = 2_000;
pub const FRIGHTENED_BLINK_MS: u64 = 2_000;
pub const FRIGHTENED_RETARGET_MS: u64 = 1_000;
pub const FRIGHTENED_RETARGET_ATTEMPTS: u32 = 20;
pub const RECOVERING_MS: u64 = 3_000;
pub const RESPAWN_WAIT_MS: u64 = 1_000;
pub const AMBUSHER_HOUSE_WAIT_MS: u64 = 3_000;
pub const FICKLE_HOUSE_WAIT_MS: u64 = 7_000;
pub const SHY_HOUSE_WAIT_MS: u64 = 5_000;

pub const PATH_REFRESH_MS: u64 = 500;
pub const EATEN_PATH_REFRESH_MS: u64 = 100;
pub const MAX_PATH_WAYPOINTS: usize = 10;
pub const DIRECT_STEER_DISTANCE: f32 = 4.0;

pub const STUCK_EPSILON: f32 = 0.05;
pub const STUCK_THRESHOLD: u32 = 10;
pub const CENTER_SNAP_DISTANCE: f32 = 0.1;
pub const CENTER_ASSIST_DISTANCE: f32 = 0.3;
pub const CENTER_ASSIST_RATE: f32 = 0.3;
/// Longest stretch resolved in one go, so fast movers still see every cell center.
pub const MAX_SUBSTEP: f32 = 0.25;

pub const AMBUSH_LOOKAHEAD: f32 = 4.0;
pub const FLANK_LOOKAHEAD: f32 = 2.0;
pub const SHY_DISTANCE: f32 = 8.0;
pub const SAME_DIRECTION_BONUS: f32 = 0.7;
pub const STEER_LOOKAHEAD_CELLS: f32 = 2.0;

pub const HOUSE_EXIT: (f32, f32) = (13.5, 11.0);
pub const HOUSE_CENTER: (f32, f32) = (13.5, 14.0);
pub const HOUSE_BOB_AMPLITUDE: f32 = 0.1;
pub const HOUSE_BOB_PERIOD_MS: f32 = 200.0;
pub const HOUSE_ARRIVAL_DISTANCE: f32 = 0.1;

pub const READY_MS: u64 = 500;
pub const LEVEL_READY_MS: u64 = 1_500;
pub const DYING_MS: u64 = 1_000;
pub const LEVEL_COMPLETE_MS: u64 = 2_000;

pub const FRUIT_POSITION: (f32, f32) = (13.5, 17.0);
pub const FRUIT_RADIUS: f32 = 0.6;

pub fn ghost_speed_multiplier(level: u32) -> f32 {
    (1.0 + level.saturating_sub(1) as f32 * 0.08).min(2.0)
}

pub fn player_speed_multiplier(level: u32) -> f32 {
    (1.0 + level.saturating_sub(1) as f32 * 0.05).min(2.0)
}

pub fn frightened_duration_ms(level: u32) -> u64 {
    let reduction_pct = (level.saturating_sub(1) as u64 * 15).min(75);
    (BASE_FRIGHTENED_MS * (100 - reduction_pct) / 100).max(MIN_FRIGHTENED_MS)
}

pub fn fruit_lifetime_ms(level: u32) -> u64 {
    10_000u64
        .saturating_sub(level.saturating_sub(1) as u64 * 1_000)
        .max(5_000)
}

pub fn level_clear_bonus(level: u32) -> u32 {
    LEVEL_CLEAR_BONUS * level
}

/// Base points grow 20% per level past the first, floored.
pub fn fruit_points(base_points: u32, level: u32) -> u32 {
    base_points * (4 + level.max(1)) / 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_speed_scales_eight_percent_and_caps_at_double() {
        assert_eq!(ghost_speed_multiplier(1), 1.0);
        assert!((ghost_speed_multiplier(2) - 1.08).abs() < 1e-6);
        assert_eq!(ghost_speed_multiplier(20), 2.0);
    }

    #[test]
    fn frightened_duration_shrinks_with_floor() {
        assert_eq!(frightened_duration_ms(1), 7_000);
        assert_eq!(frightened_duration_ms(2), 5_950);
        assert_eq!(frightened_duration_ms(5), 2_800);
        assert_eq!(frightened_duration_ms(6), 2_000);
        assert_eq!(frightened_duration_ms(30), 2_000);
    }

    #[test]
    fn fruit_lifetime_has_five_second_floor() {
        assert_eq!(fruit_lifetime_ms(1), 10_000);
        assert_eq!(fruit_lifetime_ms(4), 7_000);
        assert_eq!(fruit_lifetime_ms(12), 5_000);
    }

    #[test]
    fn fruit_points_scale_by_level() {
        assert_eq!(fruit_points(100, 1), 100);
        assert_eq!(fruit_points(300, 3), 420);
        assert_eq!(fruit_points(500, 6), 1_000);
    }
}
