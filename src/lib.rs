//! Snow War - team snowball fight
//!
//! Core modules:
//! - `sim`: Deterministic simulation (characters, movement, snowballs, cover AI)
//! - `settings`: Movement tunables, physics backend and AI difficulty
//! - `scene`: JSON scene snapshot export
//! - `platform`: Browser/native platform glue

pub mod platform;
pub mod scene;
pub mod settings;
pub mod sim;

pub use scene::SceneSnapshot;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
///
/// Ground-plane positions are stored as `Vec2(x, z)`; height only matters
/// for snowballs.
pub mod consts {
    /// Frame timestep used by headless runs (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Longest frame we are willing to simulate in one tick
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Character defaults
    pub const CHARACTER_MAX_HEALTH: f32 = 150.0;
    pub const CHARACTER_RADIUS: f32 = 0.6;
    /// Height of the character body center (hit tests are done against it)
    pub const CHARACTER_BODY_HEIGHT: f32 = 1.0;
    pub const MAX_MAKE_TIME: f32 = 3.0;
    pub const MAX_CHARGE_TIME: f32 = 2.0;
    /// Time spent in THROWING before returning to IDLE
    pub const THROW_RECOVERY_SECS: f32 = 0.3;

    /// Movement defaults (units/s and units per key step)
    pub const WALK_SPEED: f32 = 2.0;
    pub const RUN_SPEED: f32 = 4.0;
    pub const WALK_STEP_SIZE: f32 = 0.5;
    pub const RUN_STEP_SIZE: f32 = 1.0;
    /// Distance under which a character counts as arrived
    pub const ARRIVE_EPSILON: f32 = 0.1;

    /// Arena half-extent for player-driven targets
    pub const ARENA_HALF_EXTENT: f32 = 25.0;
    /// Arena half-extent for AI wander targets
    pub const WANDER_HALF_EXTENT: f32 = 18.0;

    /// Snowball defaults
    pub const GRAVITY: f32 = 9.82;
    pub const SNOWBALL_LAUNCH_HEIGHT: f32 = 1.4;
    pub const SNOWBALL_RADIUS: f32 = 0.15;
    pub const SNOWBALL_MASS: f32 = 0.1;
    pub const SNOWBALL_MAX_LIFETIME: f32 = 10.0;
    pub const SNOWBALL_HIT_RADIUS: f32 = 1.0;
    pub const SNOWBALL_DAMAGE: f32 = 30.0;
    pub const MIN_THROW_POWER: f32 = 0.1;
    pub const MAX_THROW_POWER: f32 = 1.0;
    /// Horizontal speed = BASE + power * GAIN
    pub const THROW_SPEED_BASE: f32 = 4.0;
    pub const THROW_SPEED_GAIN: f32 = 10.0;
    /// Vertical impulse = BASE + power * GAIN
    pub const THROW_LIFT_BASE: f32 = 1.0;
    pub const THROW_LIFT_GAIN: f32 = 6.0;
    /// Snowballs past these limits are discarded
    pub const WORLD_LIMIT_XZ: f32 = 100.0;
    pub const WORLD_FLOOR_Y: f32 = -10.0;

    /// Barrier defaults
    pub const BARRIER_WIDTH: f32 = 2.0;
    pub const BARRIER_HEIGHT: f32 = 2.0;
    pub const BARRIER_DEPTH: f32 = 0.5;
    /// Minimum cosine between target->barrier and target->shooter for cover
    pub const PROTECTION_DOT: f32 = 0.7;

    /// Cover AI
    pub const AI_UPDATE_INTERVAL: f32 = 0.5;
    pub const AI_MIN_UPDATE_INTERVAL: f32 = 0.2;
    pub const AI_MAKE_SNOWBALL_CHANCE: f32 = 0.7;
    pub const AI_DANGER_RADIUS: f32 = 5.0;
    pub const AI_COVER_OFFSET: f32 = 2.0;
    pub const AI_WANDER_JITTER: f32 = 3.0;
    pub const AI_ATTACK_RANGE_MIN: f32 = 8.0;
    pub const AI_ATTACK_RANGE_MAX: f32 = 12.0;
    pub const AI_THROW_SCORE_THRESHOLD: f32 = 30.0;
    pub const AI_EXPOSED_TARGET_BONUS: f32 = 50.0;
    pub const AI_RELEASE_DELAY_MIN: f32 = 0.5;
    pub const AI_RELEASE_DELAY_MAX: f32 = 1.5;
    pub const AI_RELEASE_POWER_MIN: f32 = 0.6;
    pub const AI_RELEASE_POWER_MAX: f32 = 1.0;

    /// Level flow
    pub const LEVEL_CLEAR_SCORE: u64 = 100;
    pub const VICTORY_DELAY_SECS: f32 = 1.0;
}

/// Unit direction from `from` to `to` on the ground plane.
///
/// Coincident points fall back to "north" (-Z).
#[inline]
pub fn direction_xz(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    let len = delta.length();
    if len == 0.0 {
        return Vec2::new(0.0, -1.0);
    }
    delta / len
}

/// Clamp a ground-plane point to a square arena of the given half-extent
#[inline]
pub fn clamp_to_arena(pos: Vec2, half_extent: f32) -> Vec2 {
    pos.clamp(Vec2::splat(-half_extent), Vec2::splat(half_extent))
}
