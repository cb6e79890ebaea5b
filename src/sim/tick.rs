//! Per-frame simulation step
//!
//! Order within a tick: human input, AI pass, physics + contacts, character
//! timers and movement, snowball hit tests, cleanup, win/lose checks.

use serde::{Deserialize, Serialize};

use super::character::Team;
use super::movement::{directional_target, input_axis};
use super::state::{GamePhase, GameState};
use crate::consts::*;

/// Input for a single tick (from keyboard or a replay)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Held direction keys (up is -Z)
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    /// Held run modifier
    pub run: bool,
    /// Make-snowball key went down this frame
    pub make_snowball: bool,
    /// Make-snowball key went up this frame (cancels an unfinished snowball)
    pub cancel_snowball: bool,
    /// Throw key went down this frame (start charging)
    pub charge_throw: bool,
    /// Throw key went up this frame (release at the current charge)
    pub release_throw: bool,
    /// Cycle to the next living player character
    pub switch_player: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game by `dt` seconds of frame time
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.pause();
                return;
            }
            GamePhase::Paused => state.resume(),
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    // Long frames (tab switches) are clamped instead of simulated in full
    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.time += dt;

    apply_human_input(state, input);

    if state.ai.advance(dt) {
        let strategic = state.strategic_positions();
        state.ai.think(
            &mut state.characters,
            &state.snowballs,
            &state.barriers,
            &strategic,
            state.controlled,
            &mut state.rng,
        );
    }

    step_physics(state, dt);

    let mut released = Vec::new();
    for c in state.characters.iter_mut() {
        if let Some(ball) = c.update(dt, &state.barriers) {
            released.push(ball);
        }
    }
    for ball in released {
        state.add_snowball(ball);
    }

    for ball in state.snowballs.iter_mut() {
        ball.update(dt, state.physics.as_mut(), &mut state.characters);
    }

    let expired: Vec<u32> = state
        .snowballs
        .iter()
        .filter(|s| s.should_remove())
        .map(|s| s.id)
        .collect();
    for id in expired {
        state.remove_snowball(id);
    }

    state.handle_downed();
    state.check_game_conditions(dt);
}

/// Physics step, then turn body contacts into snowball impacts
fn step_physics(state: &mut GameState, dt: f32) {
    state.physics.step(dt);

    for contact in state.physics.drain_contacts() {
        if let Some(ball) = state
            .snowballs
            .iter_mut()
            .find(|s| s.body == Some(contact.body))
        {
            ball.on_contact(contact.surface, state.physics.as_mut());
        }
    }
}

/// Route this frame's input to the human-controlled character
fn apply_human_input(state: &mut GameState, input: &TickInput) {
    if input.switch_player {
        state.switch_to_next_player();
    }

    let Some(id) = state.controlled else {
        return;
    };
    let Some(idx) = state.characters.iter().position(|c| c.id == id) else {
        return;
    };
    let barriers = &state.barriers;
    let character = &mut state.characters[idx];
    if !character.is_alive() || character.team != Team::Player {
        return;
    }

    character.running = input.run;

    let axis = input_axis(
        input.move_up,
        input.move_down,
        input.move_left,
        input.move_right,
    );
    let target = directional_target(character.position, axis, &character.tuning, input.run);
    if let Some(target) = target {
        character.move_to(target.x, target.y, barriers);
    }

    if input.make_snowball {
        character.start_making_snowball();
    }
    if input.cancel_snowball && character.cancel_making_snowball() {
        log::debug!("Player #{} stopped making a snowball", character.id);
    }

    if input.charge_throw {
        character.start_charging_throw();
    }

    // Also releases a charge the AI started before control was handed over
    if input.release_throw {
        let power = character.throw_power();
        if let Some(ball) = character.throw_snowball(power) {
            state.add_snowball(ball);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::character::CharacterState;
    use glam::Vec2;

    fn run(state: &mut GameState, input: &TickInput, seconds: f32) {
        let steps = (seconds / SIM_DT).ceil() as usize;
        for _ in 0..steps {
            tick(state, input, SIM_DT);
        }
    }

    fn controlled(state: &GameState) -> &crate::sim::character::Character {
        state.controlled_character().unwrap()
    }

    #[test]
    fn test_pause_toggle_freezes_time() {
        let mut state = GameState::new(7, Settings::default());
        tick(&mut state, &TickInput::default(), SIM_DT);
        let t = state.time;

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        run(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.time, t);

        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.time > t);
    }

    #[test]
    fn test_frame_dt_clamped() {
        let mut state = GameState::new(7, Settings::default());
        tick(&mut state, &TickInput::default(), 5.0);
        assert!((state.time - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_directional_movement() {
        let mut state = GameState::new(7, Settings::default());
        let start = controlled(&state).position;
        let up = TickInput {
            move_up: true,
            ..Default::default()
        };

        run(&mut state, &up, 0.5);

        let moved = controlled(&state).position - start;
        // Walked toward -Z at walk speed
        assert!(moved.y < -0.5 && moved.y > -1.1);
        assert!(moved.x.abs() < 1e-4);
    }

    #[test]
    fn test_human_make_and_throw() {
        let mut state = GameState::new(7, Settings::default());
        let id = state.controlled.unwrap();

        let make = TickInput {
            make_snowball: true,
            ..Default::default()
        };
        tick(&mut state, &make, SIM_DT);
        assert_eq!(controlled(&state).state(), CharacterState::MakingSnowball);
        run(&mut state, &TickInput::default(), MAX_MAKE_TIME);
        assert_eq!(controlled(&state).state(), CharacterState::ReadyToThrow);

        let press = TickInput {
            charge_throw: true,
            ..Default::default()
        };
        tick(&mut state, &press, SIM_DT);
        run(&mut state, &TickInput::default(), 1.0);
        assert!(controlled(&state).throw_power() > 0.45);

        let release = TickInput {
            release_throw: true,
            ..Default::default()
        };
        tick(&mut state, &release, SIM_DT);

        assert_eq!(controlled(&state).state(), CharacterState::Throwing);
        assert!(!controlled(&state).has_snowball());
        let ball = state.snowballs.iter().find(|s| s.owner == id).unwrap();
        assert!(ball.power > 0.45 && ball.power < 0.6);
        assert_eq!(ball.direction, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_release_key_cancels_making() {
        let mut state = GameState::new(7, Settings::default());
        let make = TickInput {
            make_snowball: true,
            ..Default::default()
        };
        tick(&mut state, &make, SIM_DT);
        run(&mut state, &TickInput::default(), 1.0);

        let release = TickInput {
            cancel_snowball: true,
            ..Default::default()
        };
        tick(&mut state, &release, SIM_DT);
        assert_eq!(controlled(&state).state(), CharacterState::Idle);
        assert!(!controlled(&state).has_snowball());
    }

    #[test]
    fn test_snowball_flies_and_is_removed() {
        let settings = Settings {
            human_control: false,
            ..Settings::default()
        };
        let mut state = GameState::new(3, settings);
        let ball = crate::sim::snowball::Snowball::new(
            1,
            Team::Player,
            Vec2::new(20.0, 20.0),
            Vec2::new(0.0, 1.0),
            0.2,
        );
        let id = state.add_snowball(ball);

        // Lands well before a few seconds pass, then gets cleaned up
        run(&mut state, &TickInput::default(), 3.0);
        assert!(state.snowballs.iter().all(|s| s.id != id));
    }

    #[test]
    fn test_deterministic_replay() {
        let settings = Settings {
            human_control: false,
            ..Settings::default()
        };
        let mut a = GameState::new(1234, settings.clone());
        let mut b = GameState::new(1234, settings);

        run(&mut a, &TickInput::default(), 20.0);
        run(&mut b, &TickInput::default(), 20.0);

        assert_eq!(a.stats(), b.stats());
        for (ca, cb) in a.characters.iter().zip(&b.characters) {
            assert_eq!(ca.position, cb.position);
            assert_eq!(ca.health(), cb.health());
            assert_eq!(ca.state(), cb.state());
        }
    }

    #[test]
    fn test_ai_match_makes_progress() {
        let settings = Settings {
            human_control: false,
            ..Settings::default()
        };
        let mut state = GameState::new(99, settings);
        let start: Vec<Vec2> = state.characters.iter().map(|c| c.position).collect();

        run(&mut state, &TickInput::default(), 10.0);

        // Somebody moved or started on a snowball within ten seconds
        let busy = state.characters.iter().zip(&start).any(|(c, p)| {
            c.position != *p || c.state() != CharacterState::Idle || c.has_snowball()
        });
        assert!(busy);
        // Nobody ever ends up inside a barrier
        for c in &state.characters {
            assert!(!crate::sim::movement::collides(c.position.x, c.position.y, &state.barriers));
        }
    }
}
