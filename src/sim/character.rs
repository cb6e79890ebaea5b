//! Soldiers and their action state machine
//!
//! States: IDLE, MOVING, MAKING_SNOWBALL, READY_TO_THROW, CHARGING_THROW, THROWING.
//! Every action request returns whether it was accepted; rejected requests
//! leave the character untouched.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::barrier::Barrier;
use super::movement::{self, MovementTuning};
use super::schedule::{Scheduler, TaskHandle};
use super::snowball::Snowball;
use crate::consts::*;

/// One of the two opposing sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opponent(&self) -> Team {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }

    /// Fixed throw direction: players throw north (-Z), enemies south (+Z)
    pub fn throw_direction(&self) -> Vec2 {
        match self {
            Team::Player => Vec2::new(0.0, -1.0),
            Team::Enemy => Vec2::new(0.0, 1.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Player => "player",
            Team::Enemy => "enemy",
        }
    }
}

/// Action state of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterState {
    #[default]
    Idle,
    Moving,
    MakingSnowball,
    ReadyToThrow,
    ChargingThrow,
    Throwing,
}

impl CharacterState {
    pub const ALL: [CharacterState; 6] = [
        CharacterState::Idle,
        CharacterState::Moving,
        CharacterState::MakingSnowball,
        CharacterState::ReadyToThrow,
        CharacterState::ChargingThrow,
        CharacterState::Throwing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterState::Idle => "IDLE",
            CharacterState::Moving => "MOVING",
            CharacterState::MakingSnowball => "MAKING_SNOWBALL",
            CharacterState::ReadyToThrow => "READY_TO_THROW",
            CharacterState::ChargingThrow => "CHARGING_THROW",
            CharacterState::Throwing => "THROWING",
        }
    }

    /// Free to walk around or start a new snowball
    pub fn is_free(&self) -> bool {
        matches!(self, CharacterState::Idle | CharacterState::Moving)
    }

    fn is_important(&self) -> bool {
        !self.is_free()
    }
}

/// Whether a detachable part is still on the character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PartState {
    Attached,
    /// Fell off at this ground-plane offset from the body
    Dropped { offset: Vec2 },
}

/// Named sub-parts a renderer animates, tagged once at construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterParts {
    pub body: PartState,
    pub head: PartState,
    pub hat: PartState,
}

impl Default for CharacterParts {
    fn default() -> Self {
        Self {
            body: PartState::Attached,
            head: PartState::Attached,
            hat: PartState::Attached,
        }
    }
}

impl CharacterParts {
    /// Knock the hat off. Returns false if it was already gone.
    pub fn drop_hat(&mut self, offset: Vec2) -> bool {
        if self.hat != PartState::Attached {
            return false;
        }
        self.hat = PartState::Dropped { offset };
        true
    }
}

/// Delayed effects owned by a character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CharacterTask {
    /// Leave THROWING after the throw animation
    FinishThrow,
    /// AI auto-release of the charge identified by `charge`
    ReleaseThrow { power: f32, charge: u32 },
}

/// A soldier on either team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub team: Team,
    /// Ground-plane position (x, z)
    pub position: Vec2,
    /// Where the character is walking to
    pub target: Vec2,
    /// Direction the character last aimed at (presentation only)
    pub facing: Vec2,
    pub tuning: MovementTuning,
    /// Run instead of walk (chosen by the controlling input)
    pub running: bool,
    pub parts: CharacterParts,
    health: f32,
    alive: bool,
    state: CharacterState,
    previous_state: CharacterState,
    has_snowball: bool,
    making_snowball_time: f32,
    charging_throw_time: f32,
    is_moving: bool,
    /// Bumped on every entry into CHARGING_THROW
    charge_epoch: u32,
    tasks: Scheduler<CharacterTask>,
}

impl Character {
    pub fn new(id: u32, team: Team, x: f32, z: f32) -> Self {
        let position = Vec2::new(x, z);
        Self {
            id,
            team,
            position,
            target: position,
            facing: team.throw_direction(),
            tuning: MovementTuning::default(),
            running: false,
            parts: CharacterParts::default(),
            health: CHARACTER_MAX_HEALTH,
            alive: true,
            state: CharacterState::Idle,
            previous_state: CharacterState::Idle,
            has_snowball: false,
            making_snowball_time: 0.0,
            charging_throw_time: 0.0,
            is_moving: false,
            charge_epoch: 0,
            tasks: Scheduler::new(),
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    pub fn previous_state(&self) -> CharacterState {
        self.previous_state
    }

    pub fn has_snowball(&self) -> bool {
        self.has_snowball
    }

    pub fn making_snowball_time(&self) -> f32 {
        self.making_snowball_time
    }

    pub fn charging_throw_time(&self) -> f32 {
        self.charging_throw_time
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub(crate) fn set_moving(&mut self, moving: bool) {
        self.is_moving = moving;
    }

    /// Number of delayed effects still queued
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn set_state(&mut self, new_state: CharacterState) {
        if self.state == new_state {
            return;
        }
        self.previous_state = self.state;
        self.state = new_state;

        if new_state.is_important() || self.previous_state.is_important() {
            log::debug!(
                "{} #{}: {} -> {}",
                self.team.as_str(),
                self.id,
                self.previous_state.as_str(),
                new_state.as_str()
            );
        }

        // Timers restart on entry
        match new_state {
            CharacterState::MakingSnowball => self.making_snowball_time = 0.0,
            CharacterState::ChargingThrow => {
                self.charging_throw_time = 0.0;
                self.charge_epoch = self.charge_epoch.wrapping_add(1);
            }
            _ => {}
        }
    }

    // === Guards ===

    pub fn can_move(&self) -> bool {
        self.alive && self.state != CharacterState::MakingSnowball
    }

    pub fn can_make_snowball(&self) -> bool {
        self.alive && !self.has_snowball && self.state.is_free()
    }

    pub fn can_throw(&self) -> bool {
        self.alive && self.has_snowball && self.state == CharacterState::ReadyToThrow
    }

    // === Actions ===

    /// Request a walk to (x, z). Rejected when the character can't move or the
    /// destination is inside a barrier.
    pub fn move_to(&mut self, x: f32, z: f32, barriers: &[Barrier]) -> bool {
        movement::request_move(self, Vec2::new(x, z), barriers)
    }

    pub fn start_making_snowball(&mut self) -> bool {
        if !self.can_make_snowball() {
            return false;
        }
        self.set_state(CharacterState::MakingSnowball);
        true
    }

    /// Abort snowball making; all progress is lost
    pub fn cancel_making_snowball(&mut self) -> bool {
        if !self.alive || self.state != CharacterState::MakingSnowball {
            return false;
        }
        self.making_snowball_time = 0.0;
        self.set_state(CharacterState::Idle);
        true
    }

    pub fn start_charging_throw(&mut self) -> bool {
        if !self.can_throw() {
            return false;
        }
        self.set_state(CharacterState::ChargingThrow);
        true
    }

    /// Release the charged throw. The returned snowball still has to be added
    /// to the world by the caller.
    pub fn throw_snowball(&mut self, power: f32) -> Option<Snowball> {
        if !self.alive || self.state != CharacterState::ChargingThrow || !self.has_snowball {
            return None;
        }

        self.set_state(CharacterState::Throwing);
        self.has_snowball = false;
        self.charging_throw_time = 0.0;
        self.tasks
            .schedule(THROW_RECOVERY_SECS, CharacterTask::FinishThrow);

        Some(Snowball::new(
            self.id,
            self.team,
            self.position,
            self.team.throw_direction(),
            power,
        ))
    }

    /// Queue an automatic release of the current charge.
    ///
    /// Only one release can be pending per charge; later requests are ignored.
    pub fn schedule_release(&mut self, delay: f32, power: f32) -> Option<TaskHandle> {
        if !self.alive || self.state != CharacterState::ChargingThrow || self.release_pending() {
            return None;
        }
        let charge = self.charge_epoch;
        Some(
            self.tasks
                .schedule(delay, CharacterTask::ReleaseThrow { power, charge }),
        )
    }

    pub fn release_pending(&self) -> bool {
        let charge = self.charge_epoch;
        self.tasks.any_pending(
            |t| matches!(t, CharacterTask::ReleaseThrow { charge: c, .. } if *c == charge),
        )
    }

    /// Drop any AI-issued delayed actions (control handed to a human)
    pub fn cancel_ai_tasks(&mut self) -> usize {
        self.tasks
            .cancel_where(|t| matches!(t, CharacterTask::ReleaseThrow { .. }))
    }

    /// Apply a hit. Non-positive and NaN amounts are ignored; health never
    /// rises.
    pub fn take_damage(&mut self, amount: f32) {
        if !self.alive || amount.is_nan() || amount <= 0.0 {
            return;
        }

        self.health = (self.health - amount).max(0.0);
        log::info!(
            "{} #{} took {} damage, {} left",
            self.team.as_str(),
            self.id,
            amount,
            self.health
        );

        if self.health <= 0.0 {
            self.die();
        }
    }

    fn die(&mut self) {
        self.alive = false;
        self.is_moving = false;
        self.target = self.position;
        // Pending timers die with the character
        self.tasks.clear();
        log::info!("{} #{} is down", self.team.as_str(), self.id);
    }

    // === Per-tick update ===

    /// Advance timers, delayed actions and movement.
    ///
    /// Returns a snowball when a scheduled release fired this tick.
    pub fn update(&mut self, dt: f32, barriers: &[Barrier]) -> Option<Snowball> {
        if !self.alive {
            return None;
        }

        match self.state {
            CharacterState::MakingSnowball => {
                self.making_snowball_time += dt;
                if self.making_snowball_time >= MAX_MAKE_TIME {
                    self.has_snowball = true;
                    self.making_snowball_time = 0.0;
                    self.set_state(CharacterState::ReadyToThrow);
                }
            }
            CharacterState::ChargingThrow => {
                // Capped, never auto-released here
                self.charging_throw_time = (self.charging_throw_time + dt).min(MAX_CHARGE_TIME);
            }
            _ => {}
        }

        let released = self.run_due_tasks(dt);

        movement::step(self, dt, barriers);

        released
    }

    fn run_due_tasks(&mut self, dt: f32) -> Option<Snowball> {
        let mut released = None;
        for task in self.tasks.advance(dt) {
            // Each task re-checks the state it was scheduled for
            match task {
                CharacterTask::FinishThrow => {
                    if self.state == CharacterState::Throwing {
                        self.set_state(CharacterState::Idle);
                    }
                }
                CharacterTask::ReleaseThrow { power, charge } => {
                    if self.state == CharacterState::ChargingThrow && self.charge_epoch == charge {
                        released = self.throw_snowball(power);
                    }
                }
            }
        }
        released
    }

    // === Read-only UI feeders ===

    pub fn state_info(&self) -> String {
        match self.state {
            CharacterState::Idle => "Ready to move".to_string(),
            CharacterState::Moving => "Moving".to_string(),
            CharacterState::MakingSnowball => {
                let progress = (self.making_snowball_time / MAX_MAKE_TIME * 100.0).round();
                format!("Making snowball ({}%)", progress as u32)
            }
            CharacterState::ReadyToThrow => "Ready to throw".to_string(),
            CharacterState::ChargingThrow => {
                let progress = (self.charging_throw_time / MAX_CHARGE_TIME * 100.0).round();
                format!("Charging throw ({}%)", progress as u32)
            }
            CharacterState::Throwing => "Throwing!".to_string(),
        }
    }

    /// Charge fraction in [0, 1] while charging, 0 otherwise
    pub fn throw_power(&self) -> f32 {
        if self.state == CharacterState::ChargingThrow {
            (self.charging_throw_time / MAX_CHARGE_TIME).min(1.0)
        } else {
            0.0
        }
    }

    /// Health fraction for health bars
    pub fn health_fraction(&self) -> f32 {
        self.health / CHARACTER_MAX_HEALTH
    }
}
