//! Eight Ball - a two-player 8-ball pool match simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collisions, pockets, turn rules)
//! - `services`: Boundary to the shot decision and shot recommendation services
//! - `audio`: Sound cues raised by simulation events
//! - `config`: Data-driven table, physics and rack configuration

pub mod audio;
pub mod config;
pub mod services;
pub mod sim;

pub use config::{ConfigError, MatchConfig};

use glam::Vec2;

/// Default table and physics constants
pub mod consts {
    /// Fixed simulation timestep (177 Hz)
    pub const SIM_DT: f32 = 1.0 / 177.0;

    /// Playfield outer size (pixels)
    pub const TABLE_WIDTH: f32 = 1500.0;
    pub const TABLE_HEIGHT: f32 = 825.0;
    /// Cushion thickness measured inward from the playfield edge
    pub const CUSHION_WIDTH: f32 = 60.0;
    /// Capture radius around each pocket center
    pub const POCKET_RADIUS: f32 = 46.0;

    /// Shared by every ball
    pub const BALL_DIAMETER: f32 = 38.0;
    /// Below this speed a ball is considered at rest
    pub const BALL_MIN_VELOCITY: f32 = 5.0;
    /// Normalization constant for collision feedback intensity
    pub const MAX_EXPECTED_COLLISION_FORCE: f32 = 45.0;

    /// Fraction of velocity lost on every cushion or ball contact
    pub const COLLISION_LOSS: f32 = 0.018;
    /// Fraction of velocity lost to cloth friction every tick
    pub const FRICTION: f32 = 0.018;

    /// Ticks between taking a shot and hiding the cue stick
    pub const STICK_HIDE_DELAY_TICKS: u32 = 35;

    /// Automated shot power range
    pub const MIN_SHOT_POWER: f32 = 1500.0;
    pub const MAX_SHOT_POWER: f32 = 5000.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

/// Linearly map `value` from one range onto another (no clamping)
#[inline]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if (in_max - in_min).abs() < f32::EPSILON {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}
