//! Cover AI for characters without a human at the controls
//!
//! Every AI tick each character is looked at once. Deciding is read-only
//! (`decide`) and produces a `Decision`; applying it goes through the same
//! public character operations the human input path uses.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::barrier::Barrier;
use super::character::{Character, CharacterState, Team};
use super::snowball::Snowball;
use super::state::StrategicPosition;
use crate::consts::*;
use crate::{clamp_to_arena, direction_xz};

/// What an AI character does this AI tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Wait,
    MakeSnowball,
    MoveTo(Vec2),
    /// Face the chosen target and start charging
    ChargeAt { target: u32, facing: Vec2 },
    /// Queue the automatic release of the current charge
    Release { delay: f32, power: f32 },
}

/// Read-only view of the battlefield handed to the AI
#[derive(Debug, Clone, Copy)]
pub struct Battlefield<'a> {
    pub characters: &'a [Character],
    pub snowballs: &'a [Snowball],
    pub barriers: &'a [Barrier],
    pub strategic_positions: &'a [StrategicPosition],
}

impl<'a> Battlefield<'a> {
    pub fn living(self, team: Team) -> impl Iterator<Item = &'a Character> + 'a {
        self.characters
            .iter()
            .filter(move |c| c.is_alive() && c.team == team)
    }

    /// True when the target is behind any barrier as seen from the shooter
    pub fn is_protected(&self, shooter: Vec2, target: Vec2) -> bool {
        self.barriers
            .iter()
            .any(|b| b.provides_protection(target, shooter))
    }

    /// An opposing snowball is within the danger radius
    pub fn in_danger(&self, character: &Character) -> bool {
        let hostile = character.team.opponent();
        self.snowballs.iter().any(|s| {
            s.team == hostile && s.position_xz().distance(character.position) < AI_DANGER_RADIUS
        })
    }
}

/// Spot `AI_COVER_OFFSET` behind a barrier, away from the average opponent
pub fn cover_position(barrier: &Barrier, opponents: &[&Character]) -> Vec2 {
    if opponents.is_empty() {
        return barrier.position + Vec2::new(0.0, AI_COVER_OFFSET);
    }

    let sum: Vec2 = opponents.iter().map(|c| c.position).sum();
    let average = sum / opponents.len() as f32;
    barrier.position + direction_xz(average, barrier.position) * AI_COVER_OFFSET
}

/// Target score: closer is better, exposed targets get a large bonus
pub fn score_target(shooter: Vec2, target: Vec2, field: &Battlefield) -> f32 {
    let mut score = 100.0 - shooter.distance(target);
    if !field.is_protected(shooter, target) {
        score += AI_EXPOSED_TARGET_BONUS;
    }
    score
}

/// Best-scoring living opponent and its score
pub fn pick_target<'a>(
    shooter: &Character,
    field: &Battlefield<'a>,
) -> Option<(&'a Character, f32)> {
    let mut best = None;
    let mut best_score = -1.0;

    for opponent in field.living(shooter.team.opponent()) {
        let score = score_target(shooter.position, opponent.position, field);
        if score > best_score {
            best_score = score;
            best = Some(opponent);
        }
    }

    best.map(|c| (c, best_score))
}

/// Drives every character that no human controls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverAi {
    /// Seconds between decision passes
    pub update_interval: f32,
    elapsed: f32,
}

impl Default for CoverAi {
    fn default() -> Self {
        Self {
            update_interval: AI_UPDATE_INTERVAL,
            elapsed: 0.0,
        }
    }
}

impl CoverAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faster reactions at higher levels; this is the only difficulty knob
    pub fn set_difficulty(&mut self, level: u32) {
        self.update_interval = (0.8 - level as f32 * 0.1).max(AI_MIN_UPDATE_INTERVAL);
        log::debug!("AI update interval now {:.2}s", self.update_interval);
    }

    /// Cadence for a level reached by playing: the default at level 1, then
    /// the difficulty knob, never slower than the default
    pub fn follow_level(&mut self, level: u32) {
        if level <= 1 {
            self.update_interval = AI_UPDATE_INTERVAL;
            return;
        }
        self.set_difficulty(level);
        self.update_interval = self.update_interval.min(AI_UPDATE_INTERVAL);
    }

    /// Accumulate time; true when a decision pass is due
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.update_interval {
            self.elapsed = 0.0;
            return true;
        }
        false
    }

    /// Run one decision pass: enemies first, then player-side characters
    /// other than the human-controlled one. Returns how many decisions took effect.
    pub fn think<R: Rng>(
        &self,
        characters: &mut [Character],
        snowballs: &[Snowball],
        barriers: &[Barrier],
        strategic_positions: &[StrategicPosition],
        controlled: Option<u32>,
        rng: &mut R,
    ) -> usize {
        // Stable sort keeps id order within each team
        let mut order: Vec<usize> = (0..characters.len()).collect();
        order.sort_by_key(|&i| characters[i].team != Team::Enemy);

        let mut applied = 0;
        for idx in order {
            let character = &characters[idx];
            if !character.is_alive() || controlled == Some(character.id) {
                continue;
            }

            let field = Battlefield {
                characters: &*characters,
                snowballs,
                barriers,
                strategic_positions,
            };
            let decision = self.decide(character, &field, rng);

            if apply(&mut characters[idx], decision, barriers) {
                applied += 1;
            }
        }
        applied
    }

    /// Pick an action for one character based on its current state
    pub fn decide<R: Rng>(
        &self,
        character: &Character,
        field: &Battlefield,
        rng: &mut R,
    ) -> Decision {
        match character.state() {
            CharacterState::Idle | CharacterState::Moving => {
                self.decide_next_action(character, field, rng)
            }
            CharacterState::ReadyToThrow => self.decide_throw_target(character, field),
            CharacterState::ChargingThrow => {
                if character.release_pending() {
                    return Decision::Wait;
                }
                Decision::Release {
                    delay: rng.random_range(AI_RELEASE_DELAY_MIN..AI_RELEASE_DELAY_MAX),
                    power: rng.random_range(AI_RELEASE_POWER_MIN..AI_RELEASE_POWER_MAX),
                }
            }
            CharacterState::MakingSnowball | CharacterState::Throwing => Decision::Wait,
        }
    }

    fn decide_next_action<R: Rng>(
        &self,
        character: &Character,
        field: &Battlefield,
        rng: &mut R,
    ) -> Decision {
        let opponents: Vec<&Character> = field.living(character.team.opponent()).collect();
        if opponents.is_empty() {
            return Decision::Wait;
        }

        if !character.has_snowball()
            && character.can_make_snowball()
            && rng.random::<f32>() < AI_MAKE_SNOWBALL_CHANCE
        {
            return Decision::MakeSnowball;
        }

        if field.in_danger(character) {
            return Decision::MoveTo(self.safety_position(character, &opponents, field, rng));
        }

        if character.has_snowball() {
            return Decision::MoveTo(self.attack_position(character, &opponents, rng));
        }

        if field.strategic_positions.is_empty() {
            return Decision::MoveTo(self.wander_position(character, rng));
        }
        let pick = rng.random_range(0..field.strategic_positions.len());
        Decision::MoveTo(field.strategic_positions[pick].position)
    }

    fn decide_throw_target(&self, character: &Character, field: &Battlefield) -> Decision {
        match pick_target(character, field) {
            Some((target, score)) if score > AI_THROW_SCORE_THRESHOLD => Decision::ChargeAt {
                target: target.id,
                facing: direction_xz(character.position, target.position),
            },
            // Nothing worth throwing at; keep the snowball ready
            _ => Decision::Wait,
        }
    }

    fn safety_position<R: Rng>(
        &self,
        character: &Character,
        opponents: &[&Character],
        field: &Battlefield,
        rng: &mut R,
    ) -> Vec2 {
        field
            .barriers
            .iter()
            .map(|b| cover_position(b, opponents))
            .min_by(|a, b| {
                a.distance(character.position)
                    .total_cmp(&b.distance(character.position))
            })
            .unwrap_or_else(|| self.wander_position(character, rng))
    }

    /// Somewhere 8-12 units short of the nearest opponent, on our side of it
    fn attack_position<R: Rng>(
        &self,
        character: &Character,
        opponents: &[&Character],
        rng: &mut R,
    ) -> Vec2 {
        let Some(closest) = opponents.iter().min_by(|a, b| {
            a.position
                .distance(character.position)
                .total_cmp(&b.position.distance(character.position))
        }) else {
            return character.position;
        };

        let dir = direction_xz(character.position, closest.position);
        let distance = rng.random_range(AI_ATTACK_RANGE_MIN..AI_ATTACK_RANGE_MAX);
        closest.position - dir * distance
    }

    fn wander_position<R: Rng>(&self, character: &Character, rng: &mut R) -> Vec2 {
        let jitter = Vec2::new(
            (rng.random::<f32>() - 0.5) * 2.0 * AI_WANDER_JITTER,
            (rng.random::<f32>() - 0.5) * 2.0 * AI_WANDER_JITTER,
        );
        clamp_to_arena(character.position + jitter, WANDER_HALF_EXTENT)
    }
}

/// Carry out a decision. Returns whether the character accepted it.
pub fn apply(character: &mut Character, decision: Decision, barriers: &[Barrier]) -> bool {
    let accepted = match decision {
        Decision::Wait => return false,
        Decision::MakeSnowball => character.start_making_snowball(),
        Decision::MoveTo(target) => character.move_to(target.x, target.y, barriers),
        Decision::ChargeAt { facing, .. } => {
            character.facing = facing;
            character.start_charging_throw()
        }
        Decision::Release { delay, power } => character.schedule_release(delay, power).is_some(),
    };

    if accepted {
        log::debug!(
            "AI {} #{}: {:?}",
            character.team.as_str(),
            character.id,
            decision
        );
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn field<'a>(
        characters: &'a [Character],
        snowballs: &'a [Snowball],
        barriers: &'a [Barrier],
    ) -> Battlefield<'a> {
        Battlefield {
            characters,
            snowballs,
            barriers,
            strategic_positions: &[],
        }
    }

    fn ready(mut c: Character) -> Character {
        c.start_making_snowball();
        c.update(MAX_MAKE_TIME, &[]);
        assert_eq!(c.state(), CharacterState::ReadyToThrow);
        c
    }

    #[test]
    fn test_target_scoring_prefers_exposed_closer() {
        let shooter = Character::new(10, Team::Enemy, 0.0, 0.0);
        let exposed = Character::new(1, Team::Player, 10.0, 0.0);
        let covered = Character::new(2, Team::Player, 0.0, 20.0);
        // Right in front of the covered target, on the shooter's side
        let barriers = [Barrier::new(1, 0.0, 18.0)];
        let characters = [shooter.clone(), exposed, covered];
        let f = field(&characters, &[], &barriers);

        assert_eq!(score_target(Vec2::ZERO, Vec2::new(10.0, 0.0), &f), 140.0);
        assert_eq!(score_target(Vec2::ZERO, Vec2::new(0.0, 20.0), &f), 80.0);

        let (target, score) = pick_target(&shooter, &f).unwrap();
        assert_eq!(target.id, 1);
        assert_eq!(score, 140.0);
    }

    #[test]
    fn test_throw_decision_threshold() {
        let ai = CoverAi::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let shooter = ready(Character::new(10, Team::Enemy, 0.0, 0.0));

        // Protected and far away: 100 - 75 = 25, not worth it
        let characters = [shooter.clone(), Character::new(1, Team::Player, 0.0, 75.0)];
        let barriers = [Barrier::new(1, 0.0, 70.0)];
        let f = field(&characters, &[], &barriers);
        assert_eq!(ai.decide(&shooter, &f, &mut rng), Decision::Wait);

        // Exposed at the same distance: 75 > 30
        let f = field(&characters, &[], &[]);
        assert_eq!(
            ai.decide(&shooter, &f, &mut rng),
            Decision::ChargeAt {
                target: 1,
                facing: Vec2::new(0.0, 1.0)
            }
        );
    }

    #[test]
    fn test_cover_position() {
        let barrier = Barrier::new(1, 0.0, 0.0);
        assert_eq!(cover_position(&barrier, &[]), Vec2::new(0.0, 2.0));

        let a = Character::new(1, Team::Player, -2.0, 10.0);
        let b = Character::new(2, Team::Player, 2.0, 10.0);
        // Average opponent at (0, 10): hide on the far side
        assert_eq!(cover_position(&barrier, &[&a, &b]), Vec2::new(0.0, -2.0));
    }

    #[test]
    fn test_danger_only_from_opponents() {
        let enemy = Character::new(10, Team::Enemy, 0.0, -10.0);
        let mut own = Snowball::new(11, Team::Enemy, Vec2::new(0.0, -9.0), Vec2::Y, 0.5);
        own.position = Vec3::new(0.0, 1.0, -9.0);
        let mut hostile = Snowball::new(1, Team::Player, Vec2::new(0.0, -7.0), -Vec2::Y, 0.5);
        hostile.position = Vec3::new(0.0, 1.0, -7.0);

        let characters = [enemy.clone()];
        assert!(!field(&characters, &[own.clone()], &[]).in_danger(&enemy));
        assert!(field(&characters, &[own, hostile.clone()], &[]).in_danger(&enemy));

        hostile.position = Vec3::new(0.0, 1.0, -4.0);
        assert!(!field(&characters, &[hostile], &[]).in_danger(&enemy));
    }

    #[test]
    fn test_danger_moves_to_cover() {
        let ai = CoverAi::new();
        let enemy = Character::new(10, Team::Enemy, 1.0, -5.0);
        let player = Character::new(1, Team::Player, 0.0, 15.0);
        let mut incoming = Snowball::new(1, Team::Player, Vec2::new(0.0, -3.0), -Vec2::Y, 0.5);
        incoming.position = Vec3::new(1.0, 1.0, -3.0);
        let barriers = [Barrier::new(1, 0.0, -3.0), Barrier::new(2, 8.0, 0.0)];
        let characters = [enemy.clone(), player];
        let snowballs = [incoming];
        let f = field(&characters, &snowballs, &barriers);

        let cover = cover_position(&barriers[0], &[&characters[1]]);
        let mut moved = 0;
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            match ai.decide(&enemy, &f, &mut rng) {
                Decision::MakeSnowball => {}
                Decision::MoveTo(target) => {
                    assert!((target - cover).length() < 1e-5);
                    moved += 1;
                }
                other => panic!("unexpected decision {other:?}"),
            }
        }
        assert!(moved > 0);
    }

    #[test]
    fn test_danger_without_barriers_jitters() {
        let ai = CoverAi::new();
        let enemy = Character::new(10, Team::Enemy, 17.5, -17.5);
        let mut incoming = Snowball::new(1, Team::Player, Vec2::new(17.5, -14.0), -Vec2::Y, 0.5);
        incoming.position = Vec3::new(17.5, 1.0, -14.0);
        let characters = [enemy.clone(), Character::new(1, Team::Player, 0.0, 15.0)];
        let snowballs = [incoming];
        // Far-off cover spot that only the calm branch would pick
        let spots = [StrategicPosition {
            position: Vec2::new(-10.0, 10.0),
            barrier_id: 1,
        }];
        let f = Battlefield {
            characters: &characters,
            snowballs: &snowballs,
            barriers: &[],
            strategic_positions: &spots,
        };
        assert!(f.in_danger(&enemy));

        let mut moved = 0;
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            match ai.decide(&enemy, &f, &mut rng) {
                Decision::MakeSnowball => {}
                Decision::MoveTo(target) => {
                    assert!((target - enemy.position).abs().max_element() <= AI_WANDER_JITTER);
                    assert!(target.abs().max_element() <= WANDER_HALF_EXTENT);
                    moved += 1;
                }
                other => panic!("unexpected decision {other:?}"),
            }
        }
        assert!(moved > 0);
    }

    #[test]
    fn test_wander_when_no_strategic_positions() {
        let ai = CoverAi::new();
        let enemy = Character::new(10, Team::Enemy, 17.5, -17.5);
        let characters = [enemy.clone(), Character::new(1, Team::Player, 0.0, 15.0)];
        let f = field(&characters, &[], &[]);

        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            if let Decision::MoveTo(target) = ai.decide(&enemy, &f, &mut rng) {
                assert!((target - enemy.position).abs().max_element() <= AI_WANDER_JITTER);
                assert!(target.x <= WANDER_HALF_EXTENT && target.y >= -WANDER_HALF_EXTENT);
            }
        }
    }

    #[test]
    fn test_no_opponents_waits() {
        let ai = CoverAi::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let enemy = Character::new(10, Team::Enemy, 0.0, 0.0);
        let mut dead = Character::new(1, Team::Player, 0.0, 5.0);
        dead.take_damage(CHARACTER_MAX_HEALTH);
        let characters = [enemy.clone(), dead];
        let f = field(&characters, &[], &[]);
        for _ in 0..20 {
            assert_eq!(ai.decide(&enemy, &f, &mut rng), Decision::Wait);
        }
    }

    #[test]
    fn test_release_scheduled_once_per_charge() {
        let ai = CoverAi::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut enemy = ready(Character::new(10, Team::Enemy, 0.0, 0.0));
        enemy.start_charging_throw();

        let decision = {
            let characters = [enemy.clone()];
            ai.decide(&enemy, &field(&characters, &[], &[]), &mut rng)
        };
        let Decision::Release { delay, power } = decision else {
            panic!("expected a release, got {decision:?}");
        };
        assert!((AI_RELEASE_DELAY_MIN..AI_RELEASE_DELAY_MAX).contains(&delay));
        assert!((AI_RELEASE_POWER_MIN..AI_RELEASE_POWER_MAX).contains(&power));
        assert!(apply(&mut enemy, decision, &[]));

        let characters = [enemy.clone()];
        assert_eq!(
            ai.decide(&enemy, &field(&characters, &[], &[]), &mut rng),
            Decision::Wait
        );

        // Exactly one snowball comes out of the charge
        let released: Vec<_> = (0..120)
            .filter_map(|_| enemy.update(SIM_DT, &[]))
            .collect();
        assert_eq!(released.len(), 1);
    }

    #[test]
    fn test_think_skips_controlled_character() {
        let ai = CoverAi::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut characters = vec![
            ready(Character::new(1, Team::Player, 0.0, 10.0)),
            ready(Character::new(2, Team::Player, 3.0, 10.0)),
            Character::new(3, Team::Enemy, 0.0, -2.0),
        ];

        let applied = ai.think(&mut characters, &[], &[], &[], Some(1), &mut rng);

        // The free player charges at the exposed enemy; the controlled one is left alone
        assert_eq!(characters[0].state(), CharacterState::ReadyToThrow);
        assert_eq!(characters[1].state(), CharacterState::ChargingThrow);
        assert!(applied >= 1);
    }

    #[test]
    fn test_difficulty_knob() {
        let mut ai = CoverAi::new();
        assert_eq!(ai.update_interval, AI_UPDATE_INTERVAL);
        ai.set_difficulty(1);
        assert!((ai.update_interval - 0.7).abs() < 1e-6);
        ai.set_difficulty(10);
        assert_eq!(ai.update_interval, AI_MIN_UPDATE_INTERVAL);

        ai.set_difficulty(3);
        assert!(!ai.advance(0.4));
        assert!(ai.advance(0.11));
        assert!(!ai.advance(0.1));
    }
}
