//! Deterministic simulation module
//!
//! All match logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (by ball index)
//! - No rendering, audio or network dependencies; external services are
//!   reached only through the outbox

pub mod collision;
pub mod pocket;
pub mod referee;
pub mod replay;
pub mod state;
pub mod table;
pub mod tick;

pub use collision::{
    handle_collisions, is_approaching, resolve_ball_collision, resolve_cushion_collision,
};
pub use pocket::{handle_balls_in_pockets, resolve_ball_in_pocket};
pub use referee::{EightBallReferee, Referee};
pub use replay::{ReplayKind, ReplayQueue};
pub use state::{
    Ball, BallColor, GameEvent, GamePhase, MatchState, ON_EIGHT_SCORE, Player, PocketedBall,
    Stick, TurnState,
};
pub use table::TableGeometry;
pub use tick::{
    TickInput, apply_response, init_match, place_ball_in_hand, request_best_shots,
    request_predictions, shoot_cue_ball, tick,
};
