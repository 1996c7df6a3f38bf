//! Match state and core simulation types
//!
//! Everything the orchestrator mutates lives on [`MatchState`]; the
//! collision, pocket and turn functions take it by reference.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::replay::ReplayQueue;
use crate::config::{MatchConfig, PhysicsConfig};
use crate::polar_to_cartesian;
use crate::services::ShotConfig;
use crate::services::outbox::{Correlation, Outbox};

/// Suit/color tag carried by every ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallColor {
    /// Cue ball
    White,
    Red,
    Yellow,
    /// Eight-ball
    Black,
}

impl BallColor {
    /// Red and yellow are the only suits a player can be assigned
    pub fn is_player_suit(self) -> bool {
        matches!(self, BallColor::Red | BallColor::Yellow)
    }

    /// The opposing suit (None for white/black)
    pub fn complement(self) -> Option<BallColor> {
        match self {
            BallColor::Red => Some(BallColor::Yellow),
            BallColor::Yellow => Some(BallColor::Red),
            BallColor::White | BallColor::Black => None,
        }
    }
}

/// A ball on the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub color: BallColor,
    pub pos: Vec2,
    pub vel: Vec2,
    /// False once pocketed
    pub visible: bool,
    #[serde(default)]
    moving: bool,
}

impl Ball {
    pub fn new(id: u32, color: BallColor, pos: Vec2) -> Self {
        Self {
            id,
            color,
            pos,
            vel: Vec2::ZERO,
            visible: true,
            moving: false,
        }
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Position after one integration step, not yet committed
    #[inline]
    pub fn next_pos(&self, dt: f32) -> Vec2 {
        self.pos + self.vel * dt
    }

    /// Set the velocity from a polar (power, rotation) impulse
    pub fn shoot(&mut self, power: f32, rotation: f32) {
        self.vel = polar_to_cartesian(power, rotation);
        self.moving = true;
    }

    /// Put the ball back in play at rest
    pub fn show(&mut self, at: Vec2) {
        self.pos = at;
        self.vel = Vec2::ZERO;
        self.moving = false;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.vel = Vec2::ZERO;
        self.moving = false;
        self.visible = false;
    }

    /// Integrate one tick: move, apply cloth friction, settle below threshold
    pub fn update(&mut self, physics: &PhysicsConfig) {
        if !self.visible {
            return;
        }

        self.pos = self.next_pos(physics.dt);
        self.vel = self.vel * (1.0 - physics.friction);

        if self.vel.length() < physics.min_velocity {
            self.vel = Vec2::ZERO;
            self.moving = false;
        } else {
            self.moving = true;
        }
    }
}

/// The cue stick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stick {
    /// Tip position (at the cue ball)
    pub pos: Vec2,
    /// Aim angle (radians)
    pub rotation: f32,
    /// Shot power
    pub power: f32,
    pub visible: bool,
    /// Whether aim input is accepted
    pub movable: bool,
    /// Ticks left before a scheduled hide fires
    #[serde(default)]
    hide_in: Option<u32>,
}

impl Stick {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            rotation: 0.0,
            power: 0.0,
            visible: true,
            movable: true,
            hide_in: None,
        }
    }

    /// Adjust aim (ignored once the shot is taken)
    pub fn aim(&mut self, power: f32, rotation: f32) {
        if self.movable {
            self.power = power.max(0.0);
            self.rotation = rotation;
        }
    }

    pub fn show(&mut self, at: Vec2) {
        self.pos = at;
        self.power = 0.0;
        self.visible = true;
        self.movable = true;
        self.hide_in = None;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.hide_in = None;
    }

    /// Hide after `ticks` calls to [`Stick::update`]
    pub fn schedule_hide(&mut self, ticks: u32) {
        self.hide_in = Some(ticks);
    }

    pub fn cancel_hide(&mut self) {
        self.hide_in = None;
    }

    pub fn hide_pending(&self) -> bool {
        self.hide_in.is_some()
    }

    /// Advance the deferred hide timer
    pub fn update(&mut self) {
        if let Some(remaining) = self.hide_in {
            if remaining <= 1 {
                self.hide();
            } else {
                self.hide_in = Some(remaining - 1);
            }
        }
    }
}

/// Own-suit progress at which a player is shooting for the eight-ball
pub const ON_EIGHT_SCORE: u32 = 7;

/// Per-match player record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Player {
    /// Assigned suit (None until the first suit-defining pocket)
    pub suit: Option<BallColor>,
    /// Own-suit progress for this match
    pub match_score: u32,
    /// Matches won across the session
    pub overall_score: u32,
}

impl Player {
    /// Suit cleared; only the eight-ball remains as a legal target
    pub fn is_on_eight(&self) -> bool {
        self.suit.is_some() && self.match_score >= ON_EIGHT_SCORE
    }

    /// Clear per-match state, keeping the overall score
    pub fn reset_for_match(&mut self) {
        self.suit = None;
        self.match_score = 0;
    }
}

/// A capture recorded on the turn (identity + suit at capture time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocketedBall {
    pub id: u32,
    pub color: BallColor,
}

/// Per-turn record, created fresh at the start of every turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnState {
    /// Correlation id for service results targeting this turn
    pub id: u64,
    /// The shooter must place the cue ball before shooting
    pub ball_in_hand: bool,
    /// Captures in capture order
    pub pocketed: Vec<PocketedBall>,
    /// Suit of the first non-white ball involved in a contact (first write wins)
    pub first_collided: Option<BallColor>,
    /// Referee verdict, only meaningful after conclusion
    pub is_valid: bool,
    /// Shooter had no suit when the turn began
    #[serde(default)]
    pub open_table: bool,
    /// Shooter had cleared their suit when the turn began
    #[serde(default)]
    pub on_eight: bool,
    /// Shot that started the turn's motion
    #[serde(default)]
    pub shot: Option<ShotConfig>,
}

impl TurnState {
    /// Fresh turn for `shooter`, capturing their standing at turn start
    pub fn new(id: u64, ball_in_hand: bool, shooter: &Player) -> Self {
        Self {
            id,
            ball_in_hand,
            open_table: shooter.suit.is_none(),
            on_eight: shooter.is_on_eight(),
            ..Default::default()
        }
    }

    /// Record the first contact color; returns false if one was already recorded
    pub fn record_first_collision(&mut self, color: BallColor) -> bool {
        if self.first_collided.is_some() {
            return false;
        }
        self.first_collided = Some(color);
        true
    }

    pub fn has_pocketed(&self, ball_id: u32) -> bool {
        self.pocketed.iter().any(|p| p.id == ball_id)
    }

    /// Append a capture; returns false if the ball is already on the list
    pub fn record_pocket(&mut self, ball: &Ball) -> bool {
        if self.has_pocketed(ball.id) {
            return false;
        }
        self.pocketed.push(PocketedBall {
            id: ball.id,
            color: ball.color,
        });
        true
    }

    pub fn pocketed_color(&self, color: BallColor) -> bool {
        self.pocketed.iter().any(|p| p.color == color)
    }
}

/// Current phase of the turn lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Stick visible, waiting for input or an automated decision
    AwaitingShot,
    /// Previous turn fouled; cue ball must be placed first
    BallInHand,
    /// Shot taken, balls integrating and colliding every tick
    Simulating,
    /// Eight-ball down; next tick replays queued demonstrations or re-racks
    MatchOver,
    /// Replaying a queued best-shot or prediction
    Demonstrating,
}

/// Events raised during a tick for presentation/audio collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotTaken { player: usize, shot: ShotConfig },
    /// Intensity in [0, 1], normalized by the max expected collision force
    BallsCollided { intensity: f32 },
    BallPocketed { ball_id: u32, color: BallColor },
    SuitAssigned { player: usize, suit: BallColor },
    CueBallPlaced { pos: Vec2 },
    TurnConcluded { player: usize, valid: bool, pocketed: usize },
    MatchOver { winner: usize },
    DemonstrationFinished { similarity: f32, pocketed: usize },
}

/// Complete match state (owned by the orchestrator, single mutator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub config: MatchConfig,
    /// Incremented on every fresh rack of a match
    pub match_id: u64,
    pub players: [Player; 2],
    pub current_player: usize,
    /// Active balls, in collision order
    pub balls: Vec<Ball>,
    /// Conclusively pocketed balls, still addressable by id
    pub retired: Vec<Ball>,
    pub stick: Stick,
    pub turn: TurnState,
    pub phase: GamePhase,
    /// Any ball-ball contact this match
    pub balls_collided: bool,
    /// Pending best-shot/prediction demonstrations
    pub replay: Option<ReplayQueue>,
    /// Requests waiting on external services
    pub outbox: Outbox,
    /// Simulation tick counter
    pub time_ticks: u64,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
    next_turn_id: u64,
}

impl MatchState {
    /// Create a racked match ready for the first shot
    pub fn new(config: MatchConfig) -> Self {
        let cue_spot = config.rack.cue_ball;
        let mut state = Self {
            config,
            match_id: 0,
            players: [Player::default(), Player::default()],
            current_player: 0,
            balls: Vec::new(),
            retired: Vec::new(),
            stick: Stick::new(cue_spot),
            turn: TurnState::default(),
            phase: GamePhase::AwaitingShot,
            balls_collided: false,
            replay: None,
            outbox: Outbox::default(),
            time_ticks: 0,
            events: Vec::new(),
            next_id: 0,
            next_turn_id: 0,
        };
        super::tick::init_match(&mut state);
        state
    }

    /// Allocate a new ball ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Allocate the id for a fresh TurnState
    pub fn next_turn_id(&mut self) -> u64 {
        self.next_turn_id += 1;
        self.next_turn_id
    }

    /// Recreate every ball at its rack position and reset the stick
    pub fn rack(&mut self) {
        self.next_id = 0;
        self.balls.clear();
        self.retired.clear();

        let rack = self.config.rack.clone();
        for pos in rack.reds {
            let id = self.next_entity_id();
            self.balls.push(Ball::new(id, BallColor::Red, pos));
        }
        for pos in rack.yellows {
            let id = self.next_entity_id();
            self.balls.push(Ball::new(id, BallColor::Yellow, pos));
        }
        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, BallColor::Black, rack.eight_ball));
        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, BallColor::White, rack.cue_ball));

        self.stick = Stick::new(rack.cue_ball);
    }

    #[inline]
    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player]
    }

    #[inline]
    pub fn next_player_index(&self) -> usize {
        (self.current_player + 1) % self.players.len()
    }

    #[inline]
    pub fn next_player(&self) -> &Player {
        &self.players[self.next_player_index()]
    }

    /// Look up a ball by id among active and retired balls
    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls
            .iter()
            .chain(self.retired.iter())
            .find(|b| b.id == id)
    }

    pub fn cue_ball(&self) -> Option<&Ball> {
        self.balls.iter().find(|b| b.color == BallColor::White)
    }

    pub fn cue_ball_mut(&mut self) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.color == BallColor::White)
    }

    /// The eight-ball, whether still active or retired
    pub fn eight_ball(&self) -> Option<&Ball> {
        self.balls
            .iter()
            .chain(self.retired.iter())
            .find(|b| b.color == BallColor::Black)
    }

    /// Active balls of a color (pocketed balls count until the turn concludes)
    pub fn count_color(&self, color: BallColor) -> usize {
        self.balls.iter().filter(|b| b.color == color).count()
    }

    pub fn is_balls_moving(&self) -> bool {
        self.balls.iter().any(|b| b.is_moving())
    }

    #[inline]
    pub fn is_ball_in_hand(&self) -> bool {
        self.turn.ball_in_hand
    }

    #[inline]
    pub fn num_pocketed_on_turn(&self) -> usize {
        self.turn.pocketed.len()
    }

    /// Correlation key for requests issued now
    pub fn correlation(&self) -> Correlation {
        Correlation {
            match_id: self.match_id,
            turn_id: self.turn.id,
        }
    }

    /// Legal cue-ball spot: on the cloth, clear of pockets and other balls
    pub fn is_valid_cue_placement(&self, pos: Vec2) -> bool {
        let diameter = self.config.table.ball_diameter;
        let no_overlap = self
            .balls
            .iter()
            .all(|b| b.color == BallColor::White || b.pos.distance(pos) > diameter);

        no_overlap && self.config.table.is_inside_table(pos)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physics() -> PhysicsConfig {
        PhysicsConfig {
            collision_loss: 0.1,
            friction: 0.5,
            dt: 1.0,
            min_velocity: 5.0,
        }
    }

    #[test]
    fn test_ball_update_friction_and_settle() {
        let mut ball = Ball::new(0, BallColor::Red, Vec2::new(100.0, 100.0));
        ball.vel = Vec2::new(20.0, 0.0);

        ball.update(&physics());
        assert_eq!(ball.pos, Vec2::new(120.0, 100.0));
        assert_eq!(ball.vel, Vec2::new(10.0, 0.0));
        assert!(ball.is_moving());

        ball.update(&physics());
        assert_eq!(ball.pos, Vec2::new(130.0, 100.0));
        // 5.0 is not below the threshold
        assert!(ball.is_moving());

        ball.update(&physics());
        assert_eq!(ball.vel, Vec2::ZERO);
        assert!(!ball.is_moving());
    }

    #[test]
    fn test_hidden_ball_does_not_integrate() {
        let mut ball = Ball::new(0, BallColor::Red, Vec2::new(100.0, 100.0));
        ball.shoot(50.0, 0.0);
        ball.hide();
        ball.update(&physics());
        assert_eq!(ball.pos, Vec2::new(100.0, 100.0));
        assert!(!ball.is_moving());
    }

    #[test]
    fn test_shoot_sets_polar_velocity() {
        let mut ball = Ball::new(0, BallColor::White, Vec2::ZERO);
        ball.shoot(100.0, std::f32::consts::PI);
        assert!((ball.vel.x + 100.0).abs() < 1e-3);
        assert!(ball.vel.y.abs() < 1e-3);
        assert!(ball.is_moving());
    }

    #[test]
    fn test_stick_deferred_hide() {
        let mut stick = Stick::new(Vec2::ZERO);
        stick.schedule_hide(2);
        stick.update();
        assert!(stick.visible);
        stick.update();
        assert!(!stick.visible);
        assert!(!stick.hide_pending());

        stick.show(Vec2::ONE);
        stick.schedule_hide(1);
        stick.cancel_hide();
        stick.update();
        assert!(stick.visible);
    }

    #[test]
    fn test_stick_aim_locked_when_not_movable() {
        let mut stick = Stick::new(Vec2::ZERO);
        stick.aim(300.0, 1.0);
        stick.movable = false;
        stick.aim(900.0, 2.0);
        assert_eq!(stick.power, 300.0);
        assert_eq!(stick.rotation, 1.0);
    }

    #[test]
    fn test_first_collision_first_write_wins() {
        let mut turn = TurnState::new(1, false, &Player::default());
        assert!(turn.record_first_collision(BallColor::Yellow));
        assert!(!turn.record_first_collision(BallColor::Red));
        assert_eq!(turn.first_collided, Some(BallColor::Yellow));
    }

    #[test]
    fn test_record_pocket_once() {
        let mut turn = TurnState::new(1, false, &Player::default());
        let ball = Ball::new(4, BallColor::Red, Vec2::ZERO);
        assert!(turn.record_pocket(&ball));
        assert!(!turn.record_pocket(&ball));
        assert_eq!(turn.pocketed.len(), 1);
        assert!(turn.pocketed_color(BallColor::Red));
    }

    #[test]
    fn test_new_match_rack() {
        let state = MatchState::new(MatchConfig::default());
        assert_eq!(state.balls.len(), 16);
        assert_eq!(state.count_color(BallColor::White), 1);
        assert_eq!(state.count_color(BallColor::Black), 1);
        assert_eq!(state.count_color(BallColor::Red), 7);
        assert_eq!(state.count_color(BallColor::Yellow), 7);
        assert_eq!(state.phase, GamePhase::AwaitingShot);
        assert_eq!(state.match_id, 1);

        // Rack positions never overlap
        let d = state.config.table.ball_diameter;
        for (i, a) in state.balls.iter().enumerate() {
            for b in &state.balls[i + 1..] {
                assert!(a.pos.distance(b.pos) > d, "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_cue_placement_rules() {
        let state = MatchState::new(MatchConfig::default());
        // Default spot is legal
        assert!(state.is_valid_cue_placement(Vec2::new(413.0, 413.0)));
        // On top of the rack apex
        assert!(!state.is_valid_cue_placement(Vec2::new(1022.0, 420.0)));
        // Inside a pocket
        assert!(!state.is_valid_cue_placement(Vec2::new(750.0, 40.0)));
        // Off the cloth
        assert!(!state.is_valid_cue_placement(Vec2::new(10.0, 413.0)));
    }

    #[test]
    fn test_suit_helpers() {
        assert!(BallColor::Red.is_player_suit());
        assert!(!BallColor::Black.is_player_suit());
        assert_eq!(BallColor::Yellow.complement(), Some(BallColor::Red));
        assert_eq!(BallColor::White.complement(), None);
    }
}
