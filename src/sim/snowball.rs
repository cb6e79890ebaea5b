//! Snowball projectiles
//!
//! A snowball flies a parabolic arc driven by the physics backend and ends on
//! its first impact (character, ground or barrier). Impacts are terminal: the
//! ball stops, is flagged for removal and never deals damage again.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::character::{Character, Team};
use super::physics::{BodyDesc, BodyHandle, PhysicsBackend, Surface};
use crate::consts::*;

/// What ended a snowball's flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Impact {
    Character { id: u32, damage: f32 },
    Ground,
    Barrier { id: u32 },
}

/// Initial velocity for a throw of `power` along a unit ground direction
pub fn launch_velocity(direction: Vec2, power: f32) -> Vec3 {
    let speed = THROW_SPEED_BASE + power * THROW_SPEED_GAIN;
    let lift = THROW_LIFT_BASE + power * THROW_LIFT_GAIN;
    Vec3::new(direction.x * speed, lift, direction.y * speed)
}

/// A thrown snowball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snowball {
    /// World id, assigned when added to the game
    pub id: u32,
    /// Character that threw it
    pub owner: u32,
    pub team: Team,
    /// Launch point (head height of the thrower)
    pub start_position: Vec3,
    /// Unit throw direction on the ground plane
    pub direction: Vec2,
    /// Throw power in [0.1, 1.0]
    pub power: f32,
    /// Launch velocity
    pub velocity: Vec3,
    /// Current position, synced from the physics body each update
    pub position: Vec3,
    pub lifetime: f32,
    pub impact: Option<Impact>,
    #[serde(skip)]
    pub body: Option<BodyHandle>,
    has_hit_target: bool,
}

impl Snowball {
    pub fn new(owner: u32, team: Team, origin: Vec2, direction: Vec2, power: f32) -> Self {
        let direction = if direction.length_squared() == 0.0 {
            Vec2::new(0.0, -1.0)
        } else {
            direction.normalize()
        };
        let power = power.clamp(MIN_THROW_POWER, MAX_THROW_POWER);
        let start_position = Vec3::new(origin.x, SNOWBALL_LAUNCH_HEIGHT, origin.y);

        Self {
            id: 0,
            owner,
            team,
            start_position,
            direction,
            power,
            velocity: launch_velocity(direction, power),
            position: start_position,
            lifetime: 0.0,
            impact: None,
            body: None,
            has_hit_target: false,
        }
    }

    pub fn has_hit_target(&self) -> bool {
        self.has_hit_target
    }

    /// Physics body description for spawning
    pub fn body_desc(&self) -> BodyDesc {
        BodyDesc {
            position: self.start_position,
            velocity: self.velocity,
            radius: SNOWBALL_RADIUS,
            mass: SNOWBALL_MASS,
        }
    }

    /// Ground-plane position
    pub fn position_xz(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    /// Age the ball, sync it from physics and look for character hits
    pub fn update(
        &mut self,
        dt: f32,
        physics: &mut dyn PhysicsBackend,
        characters: &mut [Character],
    ) -> Option<Impact> {
        self.lifetime += dt;

        if let Some(pos) = self.body.and_then(|h| physics.position(h)) {
            self.position = pos;
        }

        if self.has_hit_target {
            return None;
        }

        let hit = characters.iter_mut().find(|c| {
            c.is_alive() && c.team != self.team && self.distance_to(c) < SNOWBALL_HIT_RADIUS
        })?;

        hit.take_damage(SNOWBALL_DAMAGE);
        log::info!(
            "{} snowball #{} hit {} #{}",
            self.team.as_str(),
            self.id,
            hit.team.as_str(),
            hit.id
        );
        let impact = Impact::Character {
            id: hit.id,
            damage: SNOWBALL_DAMAGE,
        };
        self.finish(impact, physics);
        Some(impact)
    }

    /// React to a physics contact
    pub fn on_contact(
        &mut self,
        surface: Surface,
        physics: &mut dyn PhysicsBackend,
    ) -> Option<Impact> {
        if self.has_hit_target {
            return None;
        }

        let impact = match surface {
            Surface::Ground => Impact::Ground,
            Surface::Barrier(id) => Impact::Barrier { id },
            // Other snowballs pass through; leaving the area is handled by `should_remove`
            Surface::Body(_) | Surface::OutOfBounds => return None,
        };

        if self.team == Team::Player {
            log::debug!("Snowball #{} ended on {:?}", self.id, impact);
        }
        self.finish(impact, physics);
        Some(impact)
    }

    fn finish(&mut self, impact: Impact, physics: &mut dyn PhysicsBackend) {
        self.has_hit_target = true;
        self.impact = Some(impact);
        self.lifetime = self.lifetime.max(SNOWBALL_MAX_LIFETIME);
        if let Some(body) = self.body {
            physics.set_velocity(body, Vec3::ZERO);
        }
    }

    fn distance_to(&self, character: &Character) -> f32 {
        let center = Vec3::new(
            character.position.x,
            CHARACTER_BODY_HEIGHT,
            character.position.y,
        );
        self.position.distance(center)
    }

    pub fn should_remove(&self) -> bool {
        self.lifetime >= SNOWBALL_MAX_LIFETIME
            || self.position.y < WORLD_FLOOR_Y
            || self.position.x.abs() > WORLD_LIMIT_XZ
            || self.position.z.abs() > WORLD_LIMIT_XZ
    }

    /// Drag-free analytic position `t` seconds after launch
    pub fn trajectory_point(&self, t: f32) -> Vec3 {
        self.start_position + self.velocity * t - Vec3::new(0.0, 0.5 * GRAVITY * t * t, 0.0)
    }

    /// Horizontal distance covered before reaching the ground
    pub fn max_range(&self) -> f32 {
        let vy = self.velocity.y;
        let time_to_ground =
            (vy + (vy * vy + 2.0 * GRAVITY * self.start_position.y).sqrt()) / GRAVITY;
        Vec2::new(self.velocity.x, self.velocity.z).length() * time_to_ground
    }
}
