//! Fixed timestep simulation tick
//!
//! Drives the turn lifecycle: ball in hand, pocket capture, collisions,
//! input, integration, and turn conclusion once everything settles.

use glam::Vec2;

use super::collision::handle_collisions;
use super::pocket::handle_balls_in_pockets;
use super::referee::Referee;
use super::replay::{self, ReplayKind};
use super::state::{BallColor, GameEvent, GamePhase, MatchState, TurnState};
use crate::services::grid::occupancy_grid;
use crate::services::outbox::{Correlation, ResponsePayload, ServiceRequest, ServiceResponse};
use crate::services::{CorrelationRequest, ScoredShot, ShotConfig, ShotDecision};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position on the table
    pub pointer: Option<Vec2>,
    /// Drop the cue ball at the pointer (ball in hand)
    pub place_pressed: bool,
    /// Take the shot currently aimed with the stick
    pub shoot_pressed: bool,
    /// New stick aim
    pub aim: Option<ShotConfig>,
}

/// Advance the match by one fixed timestep
pub fn tick(state: &mut MatchState, input: &TickInput, referee: &impl Referee) {
    state.time_ticks += 1;

    if state.phase == GamePhase::MatchOver {
        finish_match(state);
        return;
    }

    // No physics while the cue ball is in hand
    if state.turn.ball_in_hand {
        handle_ball_in_hand(state, input);
        return;
    }

    handle_balls_in_pockets(state);
    handle_collisions(state);
    handle_input(state, input);

    state.stick.update();
    let physics = state.config.physics.clone();
    for ball in &mut state.balls {
        ball.update(&physics);
    }

    let in_motion = matches!(state.phase, GamePhase::Simulating | GamePhase::Demonstrating);
    if !in_motion || state.is_balls_moving() || state.stick.visible {
        return;
    }

    if state.phase == GamePhase::Demonstrating {
        replay::finish_demonstration(state);
        return;
    }

    conclude_turn(state, referee);
    next_turn(state, referee);

    // A replay fetched mid-shot takes over once the shot has settled
    if state.replay.is_some() && state.phase != GamePhase::MatchOver {
        replay::start_demonstration(state);
    }
}

/// Rack a fresh match, keeping overall scores
pub fn init_match(state: &mut MatchState) {
    state.match_id += 1;
    state.rack();
    state.current_player = 0;
    for player in &mut state.players {
        player.reset_for_match();
    }

    let id = state.next_turn_id();
    state.turn = TurnState::new(id, false, state.current_player());
    state.phase = GamePhase::AwaitingShot;
    state.balls_collided = false;

    log::info!("match {} racked", state.match_id);
    request_shot_decision(state);
}

/// Strike the cue ball; ignored unless a shot is awaited and power > 0
pub fn shoot_cue_ball(state: &mut MatchState, power: f32, rotation: f32) {
    if power <= 0.0 || state.phase != GamePhase::AwaitingShot {
        return;
    }
    fire_shot(state, ShotConfig { power, rotation });
    state.phase = GamePhase::Simulating;
}

/// Fire a shot regardless of phase. The stick freezes and hides after
/// the configured delay.
pub(crate) fn fire_shot(state: &mut MatchState, shot: ShotConfig) {
    let delay = state.config.stick_hide_delay_ticks;
    state.stick.rotation = shot.rotation;
    state.stick.power = shot.power;
    state.stick.movable = false;
    state.stick.schedule_hide(delay);

    if let Some(cue) = state.cue_ball_mut() {
        cue.shoot(shot.power, shot.rotation);
    }
    state.turn.shot = Some(shot);

    log::debug!(
        "player {} shoots: power {:.0}, rotation {:.3}",
        state.current_player + 1,
        shot.power,
        shot.rotation
    );
    state.push_event(GameEvent::ShotTaken {
        player: state.current_player,
        shot,
    });
}

/// Place the cue ball for a ball-in-hand turn. Illegal spots are ignored.
pub fn place_ball_in_hand(state: &mut MatchState, pos: Vec2) {
    if !state.turn.ball_in_hand || !state.is_valid_cue_placement(pos) {
        return;
    }

    if let Some(cue) = state.cue_ball_mut() {
        cue.show(pos);
    }
    state.turn.ball_in_hand = false;
    state.stick.show(pos);
    state.phase = GamePhase::AwaitingShot;
    state.push_event(GameEvent::CueBallPlaced { pos });
}

fn handle_ball_in_hand(state: &mut MatchState, input: &TickInput) {
    state.phase = GamePhase::BallInHand;

    let Some(pointer) = input.pointer else {
        return;
    };

    if input.place_pressed && state.is_valid_cue_placement(pointer) {
        place_ball_in_hand(state, pointer);
        return;
    }

    // Cue ball follows the pointer until dropped
    state.stick.hide();
    state.stick.movable = false;
    if let Some(cue) = state.cue_ball_mut() {
        cue.show(pointer);
    }
}

fn handle_input(state: &mut MatchState, input: &TickInput) {
    if let Some(aim) = input.aim {
        state.stick.aim(aim.power, aim.rotation);
    }

    // Players may not pre-empt an outstanding automated decision
    if input.shoot_pressed && !state.outbox.awaiting_decision(state.turn.id) {
        let (power, rotation) = (state.stick.power, state.stick.rotation);
        shoot_cue_ball(state, power, rotation);
    }
}

/// Retire pocketed balls, rescore, and referee the finished turn
fn conclude_turn(state: &mut MatchState, referee: &impl Referee) {
    let (pocketed, active): (Vec<_>, Vec<_>) = std::mem::take(&mut state.balls)
        .into_iter()
        .partition(|b| b.color != BallColor::White && state.turn.has_pocketed(b.id));
    state.balls = active;
    state.retired.extend(pocketed);

    // 8 - own remaining - black remaining, for each suit holder
    let black = state.count_color(BallColor::Black);
    for idx in 0..state.players.len() {
        if let Some(suit) = state.players[idx].suit {
            let remaining = state.count_color(suit) + black;
            state.players[idx].match_score = 8usize.saturating_sub(remaining) as u32;
        }
    }

    state.turn.is_valid = referee.is_valid_turn(state.current_player(), &state.turn);
}

/// Hand over (or keep) the table, then check for the end of the match
fn next_turn(state: &mut MatchState, referee: &impl Referee) {
    let shooter = state.current_player;
    let valid = state.turn.is_valid;
    let pocketed = state.num_pocketed_on_turn();
    let shot = state.turn.shot;

    log::info!(
        "turn {} by player {}: {}, {} pocketed",
        state.turn.id,
        shooter + 1,
        if valid { "valid" } else { "foul" },
        pocketed
    );
    state.push_event(GameEvent::TurnConcluded {
        player: shooter,
        valid,
        pocketed,
    });

    if !valid || pocketed == 0 {
        state.current_player = state.next_player_index();
    }

    let spot = state.config.rack.cue_ball;
    let cue_pos = match state.cue_ball_mut() {
        Some(cue) => {
            if !cue.visible {
                cue.show(spot);
            }
            cue.pos
        }
        None => spot,
    };
    state.stick.show(cue_pos);

    let id = state.next_turn_id();
    state.turn = TurnState::new(id, !valid, state.current_player());
    state.phase = if valid {
        GamePhase::AwaitingShot
    } else {
        GamePhase::BallInHand
    };

    let game_over = match (state.cue_ball(), state.eight_ball()) {
        (Some(cue), Some(eight)) => referee.is_game_over(state.current_player(), cue, eight),
        _ => false,
    };
    if game_over {
        handle_game_over(state, shooter, valid, shot);
        return;
    }

    request_shot_decision(state);
}

fn handle_game_over(state: &mut MatchState, shooter: usize, valid: bool, shot: Option<ShotConfig>) {
    let winner = if valid {
        shooter
    } else {
        (shooter + 1) % state.players.len()
    };
    state.players[winner].overall_score += 1;

    log::info!(
        "match {} over: player {} wins ({} - {})",
        state.match_id,
        winner + 1,
        state.players[0].overall_score,
        state.players[1].overall_score
    );
    state.push_event(GameEvent::MatchOver { winner });

    if state.balls_collided {
        let request = CorrelationRequest {
            array: occupancy_grid(&state.balls, &state.config.grid),
            shot_configuration: shot.unwrap_or_default(),
        };
        let correlation = state.correlation();
        state
            .outbox
            .push(correlation, ServiceRequest::SubmitCorrelation(request));
    }

    state.phase = GamePhase::MatchOver;
}

/// Leave MatchOver: replay pending demonstrations or rack a new match
fn finish_match(state: &mut MatchState) {
    if state.replay.is_some() {
        replay::start_demonstration(state);
    } else {
        init_match(state);
    }
}

fn request_shot_decision(state: &mut MatchState) {
    if !state.config.automation.controls(state.current_player)
        || state.outbox.awaiting_decision(state.turn.id)
    {
        return;
    }
    let correlation = state.correlation();
    state.outbox.push(correlation, ServiceRequest::DecideShot);
}

/// Queue a best-shots fetch; the list is replayed when it arrives
pub fn request_best_shots(state: &mut MatchState) {
    let correlation = state.correlation();
    state.outbox.push(correlation, ServiceRequest::FetchBestShots);
}

/// Queue a predictions fetch; the list is replayed when it arrives
pub fn request_predictions(state: &mut MatchState) {
    let correlation = state.correlation();
    state.outbox.push(correlation, ServiceRequest::FetchPredictions);
}

/// Deliver a service result. Unknown, duplicate, and stale results are
/// logged and dropped.
pub fn apply_response(state: &mut MatchState, response: ServiceResponse) {
    let Some(record) = state.outbox.complete(response.id) else {
        log::warn!(
            "dropping response to unknown or answered request {:?}",
            response.id
        );
        return;
    };

    match (record.request, response.payload) {
        (request, ResponsePayload::Failed(e)) => {
            log::error!("{} request failed: {}", request.name(), e);
        }
        (ServiceRequest::DecideShot, ResponsePayload::Decision(decision)) => {
            if record.correlation != state.correlation() {
                log::warn!(
                    "dropping stale shot decision for turn {} (now {})",
                    record.correlation.turn_id,
                    state.turn.id
                );
                return;
            }
            apply_decision(state, decision);
        }
        (ServiceRequest::FetchBestShots, ResponsePayload::Shots(shots)) => {
            apply_fetched(state, record.correlation, ReplayKind::BestShots, shots);
        }
        (ServiceRequest::FetchPredictions, ResponsePayload::Shots(shots)) => {
            apply_fetched(state, record.correlation, ReplayKind::Predictions, shots);
        }
        (ServiceRequest::SubmitCorrelation(_), ResponsePayload::Correlation(value)) => {
            log::info!("correlation submitted: {:?}", value);
        }
        (request, _) => {
            log::warn!("mismatched response to {} request", request.name());
        }
    }
}

/// Play an automated decision for the current turn. An empty decision or a
/// rejected placement asks the planner again so the turn cannot stall.
fn apply_decision(state: &mut MatchState, decision: Option<ShotDecision>) {
    let Some(decision) = decision else {
        log::info!("no automated shot for turn {}, asking again", state.turn.id);
        request_shot_decision(state);
        return;
    };

    if state.turn.ball_in_hand {
        if let Some(pos) = decision.placement {
            place_ball_in_hand(state, pos);
        }
        if state.turn.ball_in_hand {
            log::warn!("automated placement {:?} rejected", decision.placement);
            request_shot_decision(state);
            return;
        }
    }

    if state.phase != GamePhase::AwaitingShot {
        log::warn!("shot decision arrived during {:?}", state.phase);
        return;
    }
    shoot_cue_ball(state, decision.shot.power, decision.shot.rotation);
}

fn apply_fetched(
    state: &mut MatchState,
    correlation: Correlation,
    kind: ReplayKind,
    shots: Vec<ScoredShot>,
) {
    if correlation != state.correlation() {
        log::warn!(
            "dropping {:?} fetched for match {} turn {} (now match {} turn {})",
            kind,
            correlation.match_id,
            correlation.turn_id,
            state.match_id,
            state.turn.id
        );
        return;
    }
    replay::load_replay(state, kind, shots);
}
