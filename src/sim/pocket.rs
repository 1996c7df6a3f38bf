//! Pocket capture
//!
//! A ball whose center enters a pocket's capture radius is hidden. The
//! first tick a hidden ball is seen on a turn it is recorded on the
//! TurnState, raises a pocket event, and may settle suit assignment.

use super::state::{Ball, GameEvent, GamePhase, MatchState};
use super::table::TableGeometry;

/// Hide the ball if it lies inside any pocket; returns true when captured
pub fn resolve_ball_in_pocket(ball: &mut Ball, table: &TableGeometry) -> bool {
    if ball.visible && table.is_inside_pocket(ball.pos) {
        ball.hide();
        return true;
    }
    false
}

/// Capture balls in pockets and record new captures on the current turn
pub fn handle_balls_in_pockets(state: &mut MatchState) {
    let table = state.config.table.clone();

    for idx in 0..state.balls.len() {
        resolve_ball_in_pocket(&mut state.balls[idx], &table);

        let ball = &state.balls[idx];
        if ball.visible || state.turn.has_pocketed(ball.id) {
            continue;
        }

        let ball = ball.clone();
        log::debug!("ball {} ({:?}) pocketed", ball.id, ball.color);
        state.push_event(GameEvent::BallPocketed {
            ball_id: ball.id,
            color: ball.color,
        });

        if state.phase != GamePhase::Demonstrating {
            assign_suits(state, &ball);
        }

        state.turn.record_pocket(&ball);
    }
}

/// First legal-suit capture by a suit-less shooter settles both players' suits
fn assign_suits(state: &mut MatchState, ball: &Ball) {
    if state.current_player().suit.is_some() {
        return;
    }
    let Some(other) = ball.color.complement() else {
        return;
    };

    let current = state.current_player;
    let next = state.next_player_index();
    state.players[current].suit = Some(ball.color);
    state.players[next].suit = Some(other);

    log::info!("player {} takes {:?}", current + 1, ball.color);
    state.push_event(GameEvent::SuitAssigned {
        player: current,
        suit: ball.color,
    });
}
