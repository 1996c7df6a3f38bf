//! Built-in automated shot decision service
//!
//! Picks a legal target ball, aims at it with a little jitter and a random
//! power. Seeded, so a given seed and match replay identically.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{ShotConfig, ShotDecision, ShotPlanner};
use crate::cartesian_to_polar;
use crate::config::AutomationConfig;
use crate::sim::{BallColor, MatchState};

/// Random placements tried before giving up on ball in hand
const PLACEMENT_ATTEMPTS: usize = 64;

#[derive(Debug, Clone)]
pub struct RandomPlanner {
    rng: Pcg32,
    min_power: f32,
    max_power: f32,
    aim_jitter: f32,
}

impl RandomPlanner {
    pub fn new(config: &AutomationConfig) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(config.seed),
            min_power: config.min_power,
            max_power: config.max_power,
            aim_jitter: config.aim_jitter.abs(),
        }
    }

    /// Cue-ball spot for ball in hand: the default spot if free, else random
    fn pick_placement(&mut self, state: &MatchState) -> Option<Vec2> {
        let spot = state.config.rack.cue_ball;
        if state.is_valid_cue_placement(spot) {
            return Some(spot);
        }

        let table = &state.config.table;
        let min = table.min_inner() + Vec2::splat(table.ball_radius());
        let max = table.max_inner() - Vec2::splat(table.ball_radius());
        if min.x >= max.x || min.y >= max.y {
            return None;
        }

        (0..PLACEMENT_ATTEMPTS)
            .map(|_| {
                Vec2::new(
                    self.rng.random_range(min.x..max.x),
                    self.rng.random_range(min.y..max.y),
                )
            })
            .find(|&pos| state.is_valid_cue_placement(pos))
    }

    /// Positions of balls the current shooter may legally hit first
    fn targets(state: &MatchState) -> Vec<Vec2> {
        let player = state.current_player();
        let wanted = |color: BallColor| match player.suit {
            None => color.is_player_suit(),
            Some(_) if player.is_on_eight() => color == BallColor::Black,
            Some(suit) => color == suit,
        };

        let targets: Vec<Vec2> = state
            .balls
            .iter()
            .filter(|b| b.visible && wanted(b.color))
            .map(|b| b.pos)
            .collect();

        if !targets.is_empty() {
            return targets;
        }
        state
            .balls
            .iter()
            .filter(|b| b.visible && b.color == BallColor::Black)
            .map(|b| b.pos)
            .collect()
    }

    fn power(&mut self) -> f32 {
        if self.max_power > self.min_power {
            self.rng.random_range(self.min_power..=self.max_power)
        } else {
            self.max_power
        }
    }
}

impl ShotPlanner for RandomPlanner {
    fn decide(&mut self, state: &MatchState) -> Option<ShotDecision> {
        let placement = if state.is_ball_in_hand() {
            Some(self.pick_placement(state)?)
        } else {
            None
        };

        let cue_pos = match placement {
            Some(pos) => pos,
            None => state.cue_ball()?.pos,
        };

        let targets = Self::targets(state);
        if targets.is_empty() {
            return None;
        }
        let target = targets[self.rng.random_range(0..targets.len())];

        let (_, angle) = cartesian_to_polar(target - cue_pos);
        let jitter = if self.aim_jitter > 0.0 {
            self.rng.random_range(-self.aim_jitter..=self.aim_jitter)
        } else {
            0.0
        };

        Some(ShotDecision {
            placement,
            shot: ShotConfig {
                power: self.power(),
                rotation: angle + jitter,
            },
        })
    }
}
