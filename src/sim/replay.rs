//! Demonstration replay of fetched best shots and predictions
//!
//! Each queued shot is played once from a fresh rack. Demonstrations run
//! the physics and pocket capture but never score or referee.

use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, MatchState, TurnState};
use super::tick::{fire_shot, init_match};
use crate::services::ScoredShot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayKind {
    BestShots,
    Predictions,
}

/// Ordered shots waiting to be demonstrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayQueue {
    pub kind: ReplayKind,
    shots: Vec<ScoredShot>,
    cursor: usize,
}

impl ReplayQueue {
    pub fn new(kind: ReplayKind, shots: Vec<ScoredShot>) -> Self {
        Self {
            kind,
            shots,
            cursor: 0,
        }
    }

    /// Shot being (or about to be) demonstrated
    pub fn current(&self) -> Option<&ScoredShot> {
        self.shots.get(self.cursor)
    }

    pub fn advance(&mut self) {
        if self.cursor < self.shots.len() {
            self.cursor += 1;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.shots.len()
    }

    pub fn remaining(&self) -> usize {
        self.shots.len() - self.cursor
    }
}

/// Install a fetched list. Starts right away unless a shot is in motion,
/// in which case it starts once that shot settles.
pub fn load_replay(state: &mut MatchState, kind: ReplayKind, shots: Vec<ScoredShot>) {
    if shots.is_empty() {
        log::info!("{:?} list is empty, nothing to replay", kind);
        return;
    }

    log::info!("replaying {} {:?}", shots.len(), kind);
    state.replay = Some(ReplayQueue::new(kind, shots));

    if matches!(state.phase, GamePhase::AwaitingShot | GamePhase::BallInHand) {
        start_demonstration(state);
    }
}

/// Re-rack and fire the queue's current shot
pub fn start_demonstration(state: &mut MatchState) {
    let Some(shot) = state
        .replay
        .as_ref()
        .and_then(|q| q.current())
        .map(|s| s.shot_configuration)
    else {
        log::warn!("replay queue exhausted, starting a new match");
        state.replay = None;
        init_match(state);
        return;
    };

    state.rack();
    let id = state.next_turn_id();
    state.turn = TurnState::new(id, false, state.current_player());
    state.phase = GamePhase::Demonstrating;
    fire_shot(state, shot);
}

/// Report the settled demonstration and move on to the next one
pub fn finish_demonstration(state: &mut MatchState) {
    let pocketed = state.num_pocketed_on_turn();
    let Some(queue) = state.replay.as_mut() else {
        init_match(state);
        return;
    };

    let similarity = queue.current().map_or(0.0, |s| s.similarity);
    queue.advance();
    let exhausted = queue.is_exhausted();

    log::info!(
        "demonstration finished: similarity {:.3}, {} pocketed",
        similarity,
        pocketed
    );
    state.push_event(GameEvent::DemonstrationFinished {
        similarity,
        pocketed,
    });

    if exhausted {
        state.replay = None;
        init_match(state);
    } else {
        start_demonstration(state);
    }
}
