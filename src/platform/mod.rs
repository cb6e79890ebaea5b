//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (frame timestamps, seeds)
//! - Keyboard codes mapped onto `TickInput`
//! - The wasm handle a JS renderer drives (`web::WebGame`)

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::TickInput;

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Seed for a new game when none was given
pub fn seed_from_clock() -> u64 {
    now_ms() as u64
}

/// Keyboard state folded into one `TickInput` per frame.
///
/// Held keys stay set until released; press/release edges are consumed by
/// `take_frame`.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    input: TickInput,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a DOM `KeyboardEvent.code`. Returns false for keys the game ignores.
    pub fn set_key(&mut self, code: &str, down: bool) -> bool {
        let input = &mut self.input;
        match code {
            "ArrowUp" => input.move_up = down,
            "ArrowDown" => input.move_down = down,
            "ArrowLeft" => input.move_left = down,
            "ArrowRight" => input.move_right = down,
            "ShiftLeft" | "ShiftRight" => input.run = down,
            "KeyS" => {
                if down {
                    input.make_snowball = true;
                } else {
                    input.cancel_snowball = true;
                }
            }
            "Space" => {
                if down {
                    input.charge_throw = true;
                } else {
                    input.release_throw = true;
                }
            }
            "Tab" => input.switch_player |= down,
            "KeyP" | "Escape" => input.pause |= down,
            _ => return false,
        }
        true
    }

    /// Input for this frame; one-shot edges are cleared afterwards
    pub fn take_frame(&mut self) -> TickInput {
        let frame = self.input.clone();
        let input = &mut self.input;
        input.make_snowball = false;
        input.cancel_snowball = false;
        input.charge_throw = false;
        input.release_throw = false;
        input.switch_player = false;
        input.pause = false;
        frame
    }
}
