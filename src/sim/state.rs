//! Game state: the battlefield aggregate
//!
//! Owns every character, snowball and barrier plus the physics backend and
//! the single seeded RNG. Components get what they need passed in as slices.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::CoverAi;
use super::barrier::Barrier;
use super::character::{Character, CharacterState, PartState, Team};
use super::physics::{PhysicsBackend, create_backend};
use super::snowball::Snowball;
use crate::consts::*;
use crate::settings::Settings;

/// Spawn points for the player team (x, z)
pub const PLAYER_SPAWNS: [(f32, f32); 3] = [(-3.0, 15.0), (0.0, 15.0), (3.0, 15.0)];
/// Spawn points for the enemy team (x, z)
pub const ENEMY_SPAWNS: [(f32, f32); 3] = [(-3.0, -15.0), (0.0, -15.0), (3.0, -15.0)];
/// Ice barrier layout: flanks, center line and four diagonals
pub const BARRIER_LAYOUT: [(f32, f32); 8] = [
    (-8.0, 0.0),
    (8.0, 0.0),
    (0.0, 3.0),
    (0.0, -3.0),
    (-4.0, 6.0),
    (4.0, 6.0),
    (-4.0, -6.0),
    (4.0, -6.0),
];

/// Fraction of opponents that must be blocked for a position to count as safe
pub const SAFE_COVER_RATIO: f32 = 0.6;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// All enemies down, level cleared
    Victory,
    /// All players down
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Playing => "playing",
            GamePhase::Paused => "paused",
            GamePhase::Victory => "victory",
            GamePhase::GameOver => "game_over",
        }
    }
}

/// A cover spot next to a barrier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategicPosition {
    pub position: Vec2,
    pub barrier_id: u32,
}

/// One cover spot per barrier, two units on its +Z side
pub fn strategic_positions(barriers: &[Barrier]) -> Vec<StrategicPosition> {
    barriers
        .iter()
        .map(|b| StrategicPosition {
            position: b.position + Vec2::new(0.0, AI_COVER_OFFSET),
            barrier_id: b.id,
        })
        .collect()
}

/// Snapshot for UI overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub phase: GamePhase,
    pub level: u32,
    pub score: u64,
    pub players_alive: usize,
    pub enemies_alive: usize,
    pub snowballs_in_flight: usize,
    pub controlled: Option<u32>,
    pub time: f32,
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// The only randomness source of the match
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Current level (1-based)
    pub level: u32,
    pub score: u64,
    /// Simulated seconds since the level started
    pub time: f32,
    /// Both teams, players first (sorted by id)
    pub characters: Vec<Character>,
    /// Snowballs in flight (sorted by id)
    pub snowballs: Vec<Snowball>,
    pub barriers: Vec<Barrier>,
    pub physics: Box<dyn PhysicsBackend>,
    pub ai: CoverAi,
    pub settings: Settings,
    /// Id of the human-controlled character, if any
    pub controlled: Option<u32>,
    /// Countdown from level cleared to the victory screen
    pub victory_timer: Option<f32>,
    next_id: u32,
}

impl GameState {
    /// Create a new game with the given seed, starting at level 1
    pub fn new(seed: u64, settings: Settings) -> Self {
        let settings = settings.sanitized();
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            level: 1,
            score: 0,
            time: 0.0,
            characters: Vec::new(),
            snowballs: Vec::new(),
            barriers: Vec::new(),
            physics: create_backend(settings.physics),
            ai: CoverAi::new(),
            settings,
            controlled: None,
            victory_timer: None,
            next_id: 1,
        };

        state.setup_level();
        state
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reset the battlefield for the current level
    pub fn setup_level(&mut self) {
        self.characters.clear();
        self.snowballs.clear();
        self.barriers.clear();
        self.physics = create_backend(self.settings.physics);
        self.time = 0.0;
        self.victory_timer = None;
        self.phase = GamePhase::Playing;

        for (x, z) in BARRIER_LAYOUT {
            let id = self.next_entity_id();
            let barrier = Barrier::new(id, x, z);
            self.physics.add_barrier(&barrier);
            self.barriers.push(barrier);
        }

        let spawns = PLAYER_SPAWNS
            .iter()
            .map(|&p| (Team::Player, p))
            .chain(ENEMY_SPAWNS.iter().map(|&p| (Team::Enemy, p)));
        for (team, (x, z)) in spawns {
            let id = self.next_entity_id();
            let mut character = Character::new(id, team, x, z);
            character.tuning = self.settings.movement;
            self.characters.push(character);
        }

        self.controlled = if self.settings.human_control {
            self.player_characters().next().map(|c| c.id)
        } else {
            None
        };

        match self.settings.ai_difficulty {
            Some(level) => self.ai.set_difficulty(level),
            None => self.ai.follow_level(self.level),
        }

        log::info!(
            "Level {} ready: {} characters, {} barriers, {} physics",
            self.level,
            self.characters.len(),
            self.barriers.len(),
            self.physics.mode().as_str()
        );
    }

    /// Start over from level 1 with a fresh score
    pub fn restart(&mut self) {
        self.level = 1;
        self.score = 0;
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.setup_level();
    }

    /// Continue to the next level after a victory
    pub fn next_level(&mut self) -> bool {
        if self.phase != GamePhase::Victory {
            return false;
        }
        self.level += 1;
        self.setup_level();
        true
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
            log::info!("Paused");
        }
    }

    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
            log::info!("Resumed");
        }
    }

    /// Swap in new settings. Movement tuning applies immediately; a physics
    /// change takes effect on the next level setup.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        for c in &mut self.characters {
            c.tuning = self.settings.movement;
        }
        if let Some(level) = self.settings.ai_difficulty {
            self.ai.set_difficulty(level);
        }
        if !self.settings.human_control {
            self.controlled = None;
        }
    }

    // === World accessors ===

    pub fn player_characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| c.team == Team::Player)
    }

    pub fn enemy_characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| c.team == Team::Enemy)
    }

    pub fn living(&self, team: Team) -> impl Iterator<Item = &Character> {
        self.characters
            .iter()
            .filter(move |c| c.team == team && c.is_alive())
    }

    pub fn character(&self, id: u32) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn character_mut(&mut self, id: u32) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    pub fn controlled_character(&self) -> Option<&Character> {
        self.controlled.and_then(|id| self.character(id))
    }

    /// Put a thrown snowball into the world and give it a physics body
    pub fn add_snowball(&mut self, mut snowball: Snowball) -> u32 {
        let id = self.next_entity_id();
        snowball.id = id;
        snowball.body = Some(self.physics.add_body(snowball.body_desc()));
        log::debug!(
            "{} #{} threw snowball #{} at power {:.2}",
            snowball.team.as_str(),
            snowball.owner,
            id,
            snowball.power
        );
        self.snowballs.push(snowball);
        id
    }

    pub fn remove_snowball(&mut self, id: u32) -> bool {
        let Some(idx) = self.snowballs.iter().position(|s| s.id == id) else {
            return false;
        };
        let snowball = self.snowballs.remove(idx);
        if let Some(body) = snowball.body {
            self.physics.remove_body(body);
        }
        true
    }

    /// Hand control to the next living player character (wrapping).
    ///
    /// The new character's pending AI actions are cancelled so the human
    /// starts from a clean slate.
    pub fn switch_to_next_player(&mut self) -> Option<u32> {
        if !self.settings.human_control {
            return None;
        }

        let players: Vec<u32> = self.living(Team::Player).map(|c| c.id).collect();
        if players.is_empty() {
            self.controlled = None;
            return None;
        }

        let next = match self.controlled {
            Some(current) => {
                // Next living id after the current one, wrapping around
                players
                    .iter()
                    .copied()
                    .find(|&id| id > current)
                    .unwrap_or(players[0])
            }
            None => players[0],
        };

        if let Some(previous) = self.controlled.and_then(|id| self.character_mut(id)) {
            previous.running = false;
        }
        self.controlled = Some(next);

        if let Some(character) = self.character_mut(next) {
            let cancelled = character.cancel_ai_tasks();
            log::info!(
                "Switched control to player #{} ({} AI tasks cancelled)",
                next,
                cancelled
            );
        }
        self.take_over_actions(next);
        Some(next)
    }

    /// Settle what the AI left in progress on a character a human just took:
    /// a half-made snowball is lost, a charge is thrown at its current power.
    /// A ready snowball is kept.
    fn take_over_actions(&mut self, id: u32) {
        let Some(character) = self.character_mut(id) else {
            return;
        };
        match character.state() {
            CharacterState::MakingSnowball => {
                character.cancel_making_snowball();
                log::debug!("Player #{} dropped the AI's unfinished snowball", id);
            }
            CharacterState::ChargingThrow => {
                let power = character.throw_power();
                if let Some(snowball) = character.throw_snowball(power) {
                    self.add_snowball(snowball);
                }
            }
            _ => {}
        }
    }

    /// Post-death bookkeeping: drop hats and move control off dead characters
    pub fn handle_downed(&mut self) {
        for c in &mut self.characters {
            if !c.is_alive() && c.parts.hat == PartState::Attached {
                let offset = Vec2::new(
                    self.rng.random_range(-1.0..1.0),
                    self.rng.random_range(-1.0..1.0),
                );
                c.parts.drop_hat(offset);
            }
        }

        let controlled_down = self
            .controlled_character()
            .is_some_and(|c| !c.is_alive());
        if controlled_down {
            self.switch_to_next_player();
        }
    }

    pub fn strategic_positions(&self) -> Vec<StrategicPosition> {
        strategic_positions(&self.barriers)
    }

    /// A position is safe for `team` when the living opponent/barrier
    /// protection pairs outnumber 60% of the opposing team. Never safe once
    /// every opponent is down.
    pub fn is_position_safe(&self, position: Vec2, team: Team) -> bool {
        let opponent_team = team.opponent();
        let total = self
            .characters
            .iter()
            .filter(|c| c.team == opponent_team)
            .count();

        let protected_pairs = self
            .living(opponent_team)
            .flat_map(|shooter| {
                self.barriers
                    .iter()
                    .filter(move |b| b.provides_protection(position, shooter.position))
            })
            .count();

        // Fallen opponents still count toward the total
        protected_pairs as f32 > total as f32 * SAFE_COVER_RATIO
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            phase: self.phase,
            level: self.level,
            score: self.score,
            players_alive: self.living(Team::Player).count(),
            enemies_alive: self.living(Team::Enemy).count(),
            snowballs_in_flight: self.snowballs.len(),
            controlled: self.controlled,
            time: self.time,
        }
    }

    /// Win/lose checks; runs at the end of every playing tick
    pub fn check_game_conditions(&mut self, dt: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }

        if let Some(timer) = self.victory_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                self.victory_timer = None;
                self.phase = GamePhase::Victory;
                log::info!("Victory! Level {} score {}", self.level, self.score);
            }
            return;
        }

        if self.living(Team::Player).next().is_none() {
            self.phase = GamePhase::GameOver;
            log::info!("Game over at level {} with score {}", self.level, self.score);
            return;
        }

        if self.living(Team::Enemy).next().is_none() {
            self.score += LEVEL_CLEAR_SCORE * self.level as u64;
            self.victory_timer = Some(VICTORY_DELAY_SECS);
            log::info!("Level {} complete, score {}", self.level, self.score);
        }
    }
}
