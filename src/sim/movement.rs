//! Ground movement and barrier collision
//!
//! Destinations are gated up front (`request_move`), and every per-tick
//! advance is re-checked against the same expanded barrier footprints.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::barrier::Barrier;
use super::character::{Character, CharacterState};
use crate::clamp_to_arena;
use crate::consts::*;

/// Walk/run tunables, adjustable at runtime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementTuning {
    /// Units per second while walking
    pub walk_speed: f32,
    /// Units per second while running
    pub run_speed: f32,
    /// Distance one directional key press targets while walking
    pub walk_step_size: f32,
    /// Distance one directional key press targets while running
    pub run_step_size: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            walk_speed: WALK_SPEED,
            run_speed: RUN_SPEED,
            walk_step_size: WALK_STEP_SIZE,
            run_step_size: RUN_STEP_SIZE,
        }
    }
}

impl MovementTuning {
    pub fn speed(&self, running: bool) -> f32 {
        if running { self.run_speed } else { self.walk_speed }
    }

    pub fn step_size(&self, running: bool) -> f32 {
        if running {
            self.run_step_size
        } else {
            self.walk_step_size
        }
    }
}

/// True if a character centered at (x, z) would overlap any barrier
pub fn collides(x: f32, z: f32, barriers: &[Barrier]) -> bool {
    barriers
        .iter()
        .any(|b| b.bounds().expanded(CHARACTER_RADIUS).contains(x, z))
}

/// Set a new walk target. Colliding destinations are rejected outright.
pub fn request_move(character: &mut Character, destination: Vec2, barriers: &[Barrier]) -> bool {
    if !character.can_move() || collides(destination.x, destination.y, barriers) {
        return false;
    }
    character.target = destination;
    true
}

/// Advance a character toward its target for one tick
pub fn step(character: &mut Character, dt: f32, barriers: &[Barrier]) {
    if !character.is_alive() || character.state() == CharacterState::MakingSnowball {
        return;
    }

    let delta = character.target - character.position;
    let distance = delta.length();

    if distance > ARRIVE_EPSILON {
        let dir = delta / distance;
        let speed = character.tuning.speed(character.running);
        let next = character.position + dir * (speed * dt).min(distance);

        if collides(next.x, next.y, barriers) {
            // Stop dead instead of sliding or bouncing against the obstacle
            character.target = character.position;
            return;
        }

        character.position = next;
        character.set_moving(true);
        if character.state() == CharacterState::Idle {
            character.set_state(CharacterState::Moving);
        }
    } else if character.is_moving() {
        character.set_moving(false);
        if character.state() == CharacterState::Moving {
            character.set_state(CharacterState::Idle);
        }
    }
}

/// Axis vector from held direction keys (up is -Z)
pub fn input_axis(up: bool, down: bool, left: bool, right: bool) -> Vec2 {
    let mut axis = Vec2::ZERO;
    if up {
        axis.y -= 1.0;
    }
    if down {
        axis.y += 1.0;
    }
    if left {
        axis.x -= 1.0;
    }
    if right {
        axis.x += 1.0;
    }
    axis
}

/// Target for one step of directional input, clamped to the arena.
///
/// Diagonals are scaled by 1/sqrt(2) so they cover the same distance as
/// straight steps. Returns `None` without input.
pub fn directional_target(
    position: Vec2,
    axis: Vec2,
    tuning: &MovementTuning,
    running: bool,
) -> Option<Vec2> {
    if axis == Vec2::ZERO {
        return None;
    }

    let mut axis = axis;
    if axis.x != 0.0 && axis.y != 0.0 {
        axis *= FRAC_1_SQRT_2;
    }

    let target = position + axis * tuning.step_size(running);
    Some(clamp_to_arena(target, ARENA_HALF_EXTENT))
}
