//! JSON scene snapshot export
//!
//! Flattens the battlefield into a list of positioned, colored objects that a
//! scene editor or external renderer can load. Export only; there is no import.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::sim::character::{PartState, Team};
use crate::sim::state::GameState;

pub const SCENE_VERSION: &str = "1.0";
pub const SCENE_TYPE: &str = "FlashFreezeScene";

/// Material colors (0xRRGGBB)
pub const GROUND_COLOR: u32 = 0xF0F8FF;
pub const BARRIER_COLOR: u32 = 0x87CEEB;
pub const PLAYER_COLOR: u32 = 0x2ECC71;
pub const ENEMY_COLOR: u32 = 0xE74C3C;
pub const HAT_COLOR: u32 = 0x333333;
pub const SNOWBALL_COLOR: u32 = 0xADD8E6;

const GROUND_SIZE: f32 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub generator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneMaterial {
    pub color: u32,
}

/// One exported object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: [f32; 3],
    /// Euler angles in radians (XYZ)
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub material: SceneMaterial,
}

impl SceneObject {
    fn new(kind: &str, position: [f32; 3], scale: [f32; 3], color: u32) -> Self {
        Self {
            kind: kind.to_string(),
            position,
            rotation: [0.0; 3],
            scale,
            material: SceneMaterial { color },
        }
    }

    fn rotated(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = rotation;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub metadata: SceneMetadata,
    pub objects: Vec<SceneObject>,
}

impl SceneSnapshot {
    /// Export the current battlefield
    pub fn from_game(state: &GameState) -> Self {
        let mut objects = Vec::new();

        objects.push(
            SceneObject::new(
                "ground",
                [0.0, -0.1, 0.0],
                [GROUND_SIZE, GROUND_SIZE, 1.0],
                GROUND_COLOR,
            )
            .rotated([-FRAC_PI_2, 0.0, 0.0]),
        );

        for b in &state.barriers {
            let center = b.center();
            objects.push(SceneObject::new(
                "barrier",
                center.to_array(),
                [b.width, b.height, b.depth],
                BARRIER_COLOR,
            ));
        }

        let y_offset = state.settings.character_y_offset;
        for c in &state.characters {
            let color = match c.team {
                Team::Player => PLAYER_COLOR,
                Team::Enemy => ENEMY_COLOR,
            };
            let yaw = c.facing.x.atan2(c.facing.y);
            // Fallen characters lie on their side
            let roll = if c.is_alive() { 0.0 } else { FRAC_PI_2 };

            objects.push(
                SceneObject::new(
                    &format!("character_{}", c.team.as_str()),
                    [c.position.x, y_offset, c.position.y],
                    [1.0; 3],
                    color,
                )
                .rotated([0.0, yaw, roll]),
            );

            if let PartState::Dropped { offset } = c.parts.hat {
                objects.push(SceneObject::new(
                    "hat",
                    [c.position.x + offset.x, 0.1, c.position.y + offset.y],
                    [1.0; 3],
                    HAT_COLOR,
                ));
            }
        }

        for s in &state.snowballs {
            objects.push(SceneObject::new(
                "snowball",
                s.position.to_array(),
                [1.0; 3],
                SNOWBALL_COLOR,
            ));
        }

        Self {
            metadata: SceneMetadata {
                version: SCENE_VERSION.to_string(),
                kind: SCENE_TYPE.to_string(),
                generator: format!("snow-war {}", env!("CARGO_PKG_VERSION")),
            },
            objects,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn count(&self, kind: &str) -> usize {
        self.objects.iter().filter(|o| o.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CHARACTER_MAX_HEALTH;
    use crate::settings::Settings;

    #[test]
    fn test_snapshot_objects() {
        let state = GameState::new(5, Settings::default());
        let snapshot = SceneSnapshot::from_game(&state);

        assert_eq!(snapshot.count("ground"), 1);
        assert_eq!(snapshot.count("barrier"), 8);
        assert_eq!(snapshot.count("character_player"), 3);
        assert_eq!(snapshot.count("character_enemy"), 3);
        assert_eq!(snapshot.count("hat"), 0);

        let barrier = snapshot.objects.iter().find(|o| o.kind == "barrier").unwrap();
        assert_eq!(barrier.position, [-8.0, 1.0, 0.0]);
        assert_eq!(barrier.scale, [2.0, 2.0, 0.5]);
        assert_eq!(barrier.material.color, BARRIER_COLOR);
    }

    #[test]
    fn test_dead_character_exports_hat() {
        let mut state = GameState::new(5, Settings::default());
        let id = state.characters[0].id;
        state.character_mut(id).unwrap().take_damage(CHARACTER_MAX_HEALTH);
        state.handle_downed();

        let snapshot = SceneSnapshot::from_game(&state);
        assert_eq!(snapshot.count("hat"), 1);
        let fallen = snapshot
            .objects
            .iter()
            .find(|o| o.kind == "character_player")
            .unwrap();
        assert_eq!(fallen.rotation[2], FRAC_PI_2);
    }

    #[test]
    fn test_json_shape() {
        let state = GameState::new(5, Settings::default());
        let json = SceneSnapshot::from_game(&state).to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["type"], "FlashFreezeScene");
        assert_eq!(value["metadata"]["version"], "1.0");
        let first = &value["objects"][0];
        assert_eq!(first["type"], "ground");
        assert_eq!(first["position"].as_array().unwrap().len(), 3);
        assert_eq!(first["material"]["color"], GROUND_COLOR);
    }
}
