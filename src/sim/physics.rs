//! Physics backends for snowball flight
//!
//! Two interchangeable integrators behind one trait:
//! - `RigidBackend`: fixed-substep rigid bodies with ground plane and box contacts
//! - `EulerBackend`: reduced-fidelity semi-implicit Euler with sphere-distance contacts
//!
//! The backend is picked from `Settings::physics`; callers only see the trait.

use std::fmt::Debug;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::barrier::Barrier;
use crate::consts::GRAVITY;

/// Which integrator drives projectile bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhysicsMode {
    /// Fixed-substep rigid bodies with box and plane contacts
    #[default]
    Rigid,
    /// Simplified semi-implicit Euler fallback
    Euler,
}

impl PhysicsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicsMode::Rigid => "rigid",
            PhysicsMode::Euler => "euler",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rigid" | "full" => Some(PhysicsMode::Rigid),
            "euler" | "simple" | "fallback" => Some(PhysicsMode::Euler),
            _ => None,
        }
    }
}

/// Handle to a dynamic body owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle(u32);

/// What a body touched during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Ground,
    Barrier(u32),
    Body(BodyHandle),
    /// Left the simulated play area (reported, not resolved)
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub body: BodyHandle,
    pub surface: Surface,
}

/// Initial state of a dynamic sphere
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub mass: f32,
}

/// Capability set every physics backend provides
pub trait PhysicsBackend: Debug {
    fn mode(&self) -> PhysicsMode;

    /// Register a dynamic sphere
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Remove a dynamic body. Returns false for unknown handles.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Register a barrier as static collision geometry
    fn add_barrier(&mut self, barrier: &Barrier);

    /// Advance the world by `dt` seconds
    fn step(&mut self, dt: f32);

    fn position(&self, handle: BodyHandle) -> Option<Vec3>;

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3>;

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3);

    /// Contacts gathered since the last drain
    fn drain_contacts(&mut self) -> Vec<Contact>;

    fn body_count(&self) -> usize;
}

/// Build the backend for a mode
pub fn create_backend(mode: PhysicsMode) -> Box<dyn PhysicsBackend> {
    log::info!("Using {} physics backend", mode.as_str());
    match mode {
        PhysicsMode::Rigid => Box::new(RigidBackend::new()),
        PhysicsMode::Euler => Box::new(EulerBackend::new()),
    }
}

#[derive(Debug, Clone)]
struct Body {
    handle: BodyHandle,
    position: Vec3,
    velocity: Vec3,
    radius: f32,
    mass: f32,
}

#[derive(Debug, Clone)]
struct StaticBox {
    barrier_id: u32,
    center: Vec3,
    half_extents: Vec3,
}

/// Body storage shared by both backends (sorted by handle for determinism)
#[derive(Debug, Default)]
struct BodySet {
    bodies: Vec<Body>,
    boxes: Vec<StaticBox>,
    contacts: Vec<Contact>,
    next_id: u32,
}

impl BodySet {
    fn add(&mut self, desc: BodyDesc) -> BodyHandle {
        self.next_id += 1;
        let handle = BodyHandle(self.next_id);
        self.bodies.push(Body {
            handle,
            position: desc.position,
            velocity: desc.velocity,
            radius: desc.radius,
            mass: desc.mass,
        });
        handle
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.handle != handle);
        self.bodies.len() != before
    }

    fn add_box(&mut self, barrier: &Barrier) {
        self.boxes.push(StaticBox {
            barrier_id: barrier.id,
            center: barrier.center(),
            half_extents: barrier.half_extents(),
        });
    }

    fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.iter().find(|b| b.handle == handle)
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.handle == handle)
    }

    /// Pairwise sphere overlap between dynamic bodies
    fn collect_body_pairs(&mut self) {
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if a.position.distance(b.position) < a.radius + b.radius {
                    self.contacts.push(Contact {
                        body: a.handle,
                        surface: Surface::Body(b.handle),
                    });
                    self.contacts.push(Contact {
                        body: b.handle,
                        surface: Surface::Body(a.handle),
                    });
                }
            }
        }
    }
}

/// Full-fidelity backend: fixed substeps, ground plane at y = 0, barrier boxes
#[derive(Debug, Default)]
pub struct RigidBackend {
    set: BodySet,
    accumulator: f32,
}

impl RigidBackend {
    /// Internal substep (60 Hz)
    pub const FIXED_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per step to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Ground/snowball contact material
    pub const GROUND_RESTITUTION: f32 = 0.2;
    pub const GROUND_FRICTION: f32 = 0.3;

    pub fn new() -> Self {
        Self::default()
    }

    fn substep(&mut self, dt: f32) {
        let set = &mut self.set;
        for body in set.bodies.iter_mut().filter(|b| b.mass > 0.0) {
            body.velocity.y -= GRAVITY * dt;
            body.position += body.velocity * dt;

            // Ground plane
            if body.position.y - body.radius <= 0.0 {
                body.position.y = body.radius;
                if body.velocity.y < 0.0 {
                    body.velocity.y = -body.velocity.y * Self::GROUND_RESTITUTION;
                }
                body.velocity.x *= 1.0 - Self::GROUND_FRICTION;
                body.velocity.z *= 1.0 - Self::GROUND_FRICTION;
                set.contacts.push(Contact {
                    body: body.handle,
                    surface: Surface::Ground,
                });
            }

            // Static boxes: closest point on the box to the sphere center
            for static_box in &set.boxes {
                let min = static_box.center - static_box.half_extents;
                let max = static_box.center + static_box.half_extents;
                let closest = body.position.clamp(min, max);
                let offset = body.position - closest;
                let dist = offset.length();
                if dist >= body.radius {
                    continue;
                }

                let normal = if dist > 1e-6 {
                    offset / dist
                } else {
                    (body.position - static_box.center).normalize_or(Vec3::Y)
                };
                body.position = closest + normal * body.radius;
                let into = body.velocity.dot(normal);
                if into < 0.0 {
                    body.velocity -= normal * into * (1.0 + Self::GROUND_RESTITUTION);
                }
                set.contacts.push(Contact {
                    body: body.handle,
                    surface: Surface::Barrier(static_box.barrier_id),
                });
            }
        }

        set.collect_body_pairs();
    }
}

impl PhysicsBackend for RigidBackend {
    fn mode(&self) -> PhysicsMode {
        PhysicsMode::Rigid
    }

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        self.set.add(desc)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.set.remove(handle)
    }

    fn add_barrier(&mut self, barrier: &Barrier) {
        self.set.add_box(barrier);
    }

    fn step(&mut self, dt: f32) {
        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= Self::FIXED_DT && substeps < Self::MAX_SUBSTEPS {
            self.substep(Self::FIXED_DT);
            self.accumulator -= Self::FIXED_DT;
            substeps += 1;
        }
        if substeps == Self::MAX_SUBSTEPS {
            // Drop the backlog rather than fall further behind
            self.accumulator = 0.0;
        }
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.set.get(handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.set.get(handle).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.set.get_mut(handle) {
            body.velocity = velocity;
        }
    }

    fn drain_contacts(&mut self) -> Vec<Contact> {
        std::mem::take(&mut self.set.contacts)
    }

    fn body_count(&self) -> usize {
        self.set.bodies.len()
    }
}

/// Fallback backend: one Euler step per call, sphere-distance collisions only
#[derive(Debug, Default)]
pub struct EulerBackend {
    set: BodySet,
}

impl EulerBackend {
    /// Bodies are kept above this height
    pub const GROUND_LEVEL: f32 = 0.5;
    pub const BOUNCE: f32 = 0.3;
    pub const FRICTION: f32 = 0.8;
    /// Half-extent past which bodies are reported out of bounds
    pub const BOUNDS: f32 = 25.0;
    /// Static geometry is approximated by spheres of this radius
    pub const STATIC_RADIUS: f32 = 0.5;

    pub fn new() -> Self {
        Self::default()
    }
}

impl PhysicsBackend for EulerBackend {
    fn mode(&self) -> PhysicsMode {
        PhysicsMode::Euler
    }

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        self.set.add(desc)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.set.remove(handle)
    }

    fn add_barrier(&mut self, barrier: &Barrier) {
        self.set.add_box(barrier);
    }

    fn step(&mut self, dt: f32) {
        let set = &mut self.set;
        for body in set.bodies.iter_mut().filter(|b| b.mass > 0.0) {
            body.velocity.y -= GRAVITY * dt;
            body.position += body.velocity * dt;

            if body.position.y < Self::GROUND_LEVEL {
                body.position.y = Self::GROUND_LEVEL;
                body.velocity.y = body.velocity.y.abs() * Self::BOUNCE;
                body.velocity.x *= Self::FRICTION;
                body.velocity.z *= Self::FRICTION;
                set.contacts.push(Contact {
                    body: body.handle,
                    surface: Surface::Ground,
                });
            }

            if body.position.x.abs() > Self::BOUNDS || body.position.z.abs() > Self::BOUNDS {
                set.contacts.push(Contact {
                    body: body.handle,
                    surface: Surface::OutOfBounds,
                });
            }

            for static_box in &set.boxes {
                if body.position.distance(static_box.center) < body.radius + Self::STATIC_RADIUS {
                    set.contacts.push(Contact {
                        body: body.handle,
                        surface: Surface::Barrier(static_box.barrier_id),
                    });
                }
            }
        }

        set.collect_body_pairs();
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.set.get(handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.set.get(handle).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.set.get_mut(handle) {
            body.velocity = velocity;
        }
    }

    fn drain_contacts(&mut self) -> Vec<Contact> {
        std::mem::take(&mut self.set.contacts)
    }

    fn body_count(&self) -> usize {
        self.set.bodies.len()
    }
}
