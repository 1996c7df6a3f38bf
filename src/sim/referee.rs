//! Turn validity and match termination rules
//!
//! The orchestrator drives a [`Referee`] with snapshots only; referees
//! hold no turn-spanning memory.

use super::state::{Ball, BallColor, Player, TurnState};

/// Rule authority consulted at the end of every turn
pub trait Referee {
    /// Called once the turn's physical outcome is fully known
    fn is_valid_turn(&self, player: &Player, turn: &TurnState) -> bool;

    /// Called after scoring, against the player about to shoot
    fn is_game_over(&self, player: &Player, cue_ball: &Ball, eight_ball: &Ball) -> bool;
}

/// Standard 8-ball fouls: scratch, no contact, wrong first contact,
/// and sinking the eight-ball before clearing the suit.
#[derive(Debug, Clone, Copy, Default)]
pub struct EightBallReferee;

impl Referee for EightBallReferee {
    fn is_valid_turn(&self, player: &Player, turn: &TurnState) -> bool {
        if turn.pocketed_color(BallColor::White) {
            return false;
        }

        let Some(first) = turn.first_collided else {
            return false;
        };

        if turn.open_table || player.suit.is_none() {
            return first.is_player_suit() && !turn.pocketed_color(BallColor::Black);
        }

        if turn.on_eight {
            return first == BallColor::Black;
        }

        Some(first) == player.suit && !turn.pocketed_color(BallColor::Black)
    }

    fn is_game_over(&self, _player: &Player, _cue_ball: &Ball, eight_ball: &Ball) -> bool {
        !eight_ball.visible
    }
}
