//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Simulated time only (no wall-clock timers)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod ai;
pub mod barrier;
pub mod character;
pub mod movement;
pub mod physics;
pub mod schedule;
pub mod snowball;
pub mod state;
pub mod tick;

pub use ai::{CoverAi, Decision};
pub use barrier::{Barrier, Bounds};
pub use character::{Character, CharacterParts, CharacterState, PartState, Team};
pub use movement::MovementTuning;
pub use physics::{EulerBackend, PhysicsBackend, PhysicsMode, RigidBackend, create_backend};
pub use schedule::{Scheduler, TaskHandle};
pub use snowball::{Impact, Snowball};
pub use state::{GamePhase, GameState, GameStats, StrategicPosition};
pub use tick::{TickInput, tick};
