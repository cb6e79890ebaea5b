//! Browser entry point
//!
//! `WebGame` owns the simulation; the page forwards key events and calls
//! `frame()` from `requestAnimationFrame`, then draws from the JSON exports.

use wasm_bindgen::prelude::*;

use super::{KeyState, now_ms, seed_from_clock};
use crate::consts::*;
use crate::scene::SceneSnapshot;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, tick};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Snow War (wasm) loaded");
}

#[wasm_bindgen]
pub struct WebGame {
    state: GameState,
    keys: KeyState,
    last_time: f64,
}

#[wasm_bindgen]
impl WebGame {
    /// New game; a seed of 0 picks one from the clock
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WebGame {
        let seed = if seed == 0 { seed_from_clock() } else { seed };
        log::info!("Game initialized with seed: {}", seed);
        WebGame {
            state: GameState::new(seed, Settings::load()),
            keys: KeyState::new(),
            last_time: 0.0,
        }
    }

    /// Forward a `KeyboardEvent.code`; returns true when the page should
    /// suppress the browser default for it
    pub fn set_key(&mut self, code: &str, down: bool) -> bool {
        self.keys.set_key(code, down)
    }

    /// Advance by the time since the previous frame
    pub fn frame(&mut self, timestamp_ms: f64) {
        let now = if timestamp_ms > 0.0 { timestamp_ms } else { now_ms() };
        let dt = if self.last_time == 0.0 {
            SIM_DT
        } else {
            ((now - self.last_time) / 1000.0) as f32
        };
        self.last_time = now;

        let input = self.keys.take_frame();
        tick(&mut self.state, &input, dt);
    }

    /// Auto-pause when the tab is hidden
    pub fn pause(&mut self) {
        self.state.pause();
    }

    pub fn resume(&mut self) {
        self.state.resume();
        // Don't count the time spent paused as one long frame
        self.last_time = 0.0;
    }

    pub fn restart(&mut self) {
        self.state.restart();
        self.last_time = 0.0;
    }

    pub fn next_level(&mut self) -> bool {
        self.state.next_level()
    }

    pub fn phase(&self) -> String {
        self.state.phase.as_str().to_string()
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.state.stats())
            .unwrap_or_default()
    }

    pub fn scene_json(&self) -> String {
        match SceneSnapshot::from_game(&self.state).to_json_pretty() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Scene export failed: {}", e);
                String::new()
            }
        }
    }

    /// Status line for the controlled character
    pub fn state_info(&self) -> String {
        self.state
            .controlled_character()
            .map(|c| c.state_info())
            .unwrap_or_default()
    }

    /// Charge bar fill for the controlled character
    pub fn throw_power(&self) -> f32 {
        self.state
            .controlled_character()
            .map_or(0.0, |c| c.throw_power())
    }

    /// Replace settings from the config panel and persist them
    pub fn set_settings_json(&mut self, json: &str) -> bool {
        match Settings::from_json(json) {
            Ok(settings) => {
                settings.save();
                self.state.apply_settings(settings);
                true
            }
            Err(e) => {
                log::warn!("Rejected settings: {}", e);
                false
            }
        }
    }
}
