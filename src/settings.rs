//! Game settings
//!
//! Movement tunables, physics backend choice and AI knobs. Persisted in
//! LocalStorage on the web, defaults natively.

use serde::{Deserialize, Serialize};

use crate::sim::movement::MovementTuning;
use crate::sim::physics::PhysicsMode;

/// Allowed ranges (same as the in-game config sliders)
pub const WALK_SPEED_RANGE: (f32, f32) = (0.5, 5.0);
pub const RUN_SPEED_RANGE: (f32, f32) = (1.0, 10.0);
pub const WALK_STEP_RANGE: (f32, f32) = (0.1, 2.0);
pub const RUN_STEP_RANGE: (f32, f32) = (0.2, 3.0);
pub const Y_OFFSET_RANGE: (f32, f32) = (-1.0, 1.0);

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Walk/run speeds and key step sizes
    pub movement: MovementTuning,
    /// Vertical offset renderers apply to character models
    pub character_y_offset: f32,
    /// Which integrator flies the snowballs
    pub physics: PhysicsMode,
    /// Fixed AI difficulty level; `None` follows the current level
    pub ai_difficulty: Option<u32>,
    /// One player character takes keyboard input; off means AI vs AI
    pub human_control: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            movement: MovementTuning::default(),
            character_y_offset: 0.0,
            physics: PhysicsMode::default(),
            ai_difficulty: None,
            human_control: true,
        }
    }
}

fn clamp_logged(name: &str, value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if !value.is_finite() {
        log::warn!("Setting {} is not a number, using {}", name, fallback);
        return fallback;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("Setting {} = {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

impl Settings {
    /// Copy with every tunable clamped into its allowed range
    pub fn sanitized(&self) -> Self {
        let defaults = MovementTuning::default();
        let m = &self.movement;
        Self {
            movement: MovementTuning {
                walk_speed: clamp_logged(
                    "walk_speed",
                    m.walk_speed,
                    WALK_SPEED_RANGE,
                    defaults.walk_speed,
                ),
                run_speed: clamp_logged(
                    "run_speed",
                    m.run_speed,
                    RUN_SPEED_RANGE,
                    defaults.run_speed,
                ),
                walk_step_size: clamp_logged(
                    "walk_step_size",
                    m.walk_step_size,
                    WALK_STEP_RANGE,
                    defaults.walk_step_size,
                ),
                run_step_size: clamp_logged(
                    "run_step_size",
                    m.run_step_size,
                    RUN_STEP_RANGE,
                    defaults.run_step_size,
                ),
            },
            character_y_offset: clamp_logged(
                "character_y_offset",
                self.character_y_offset,
                Y_OFFSET_RANGE,
                0.0,
            ),
            ..self.clone()
        }
    }

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "snow_war_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Settings saved");
                }
                Err(e) => log::warn!("Could not serialize settings: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
