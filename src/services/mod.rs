//! Boundary to external shot services
//!
//! Two collaborators sit outside the tick loop:
//! - an automated shot decision service (proposes power/rotation for a turn)
//! - a remote recommendation service (best shots, predictions, and a
//!   fire-and-forget correlation submit of the final table layout)
//!
//! The simulation never calls them directly. It queues requests on an
//! [`outbox::Outbox`]; a [`dispatch::Dispatcher`] runs them and hands the
//! results back for delivery on a later tick.

pub mod dispatch;
pub mod grid;
pub mod outbox;
pub mod planner;
pub mod scripted;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::MatchState;

pub use dispatch::Dispatcher;
pub use grid::occupancy_grid;
pub use outbox::{Correlation, Outbox, RequestId, ResponsePayload, ServiceRequest, ServiceResponse};
pub use planner::RandomPlanner;
pub use scripted::ScriptedShotService;

/// Polar cue impulse
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotConfig {
    pub power: f32,
    pub rotation: f32,
}

/// A recommended or predicted shot with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredShot {
    pub shot_configuration: ShotConfig,
    pub similarity: f32,
}

/// Table layout submitted for offline correlation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRequest {
    /// Occupancy grid, row-major
    pub array: Vec<Vec<u8>>,
    pub shot_configuration: ShotConfig,
}

/// Answer from the automated shot decision service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotDecision {
    /// Cue-ball spot when the turn starts with ball in hand
    pub placement: Option<Vec2>,
    pub shot: ShotConfig,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("service returned status {code}")]
    Status { code: u16 },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Automated shot decision service
pub trait ShotPlanner {
    /// Choose a shot for the current turn, or None to leave it to the player
    fn decide(&mut self, state: &MatchState) -> Option<ShotDecision>;
}

/// Remote shot recommendation/statistics service
pub trait ShotService {
    fn best_shots(&mut self) -> Result<Vec<ScoredShot>, ServiceError>;

    fn predictions(&mut self) -> Result<Vec<ScoredShot>, ServiceError>;

    /// Submit a layout; the service may answer with a correlation value
    fn submit_correlation(&mut self, request: &CorrelationRequest)
    -> Result<Option<f32>, ServiceError>;
}

/// Parse a best-shots or predictions body
pub fn decode_shots(body: &str) -> Result<Vec<ScoredShot>, ServiceError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_shots_wire_names() {
        let body = r#"[
            {"shot_configuration": {"power": 3200.5, "rotation": 0.25}, "similarity": 0.91},
            {"shot_configuration": {"power": 1800.0, "rotation": -1.5}, "similarity": 0.42}
        ]"#;
        let shots = decode_shots(body).unwrap();
        assert_eq!(shots.len(), 2);
        assert_eq!(shots[0].shot_configuration.power, 3200.5);
        assert_eq!(shots[1].similarity, 0.42);
    }

    #[test]
    fn test_decode_shots_rejects_garbage() {
        let err = decode_shots("{\"result\": 1}").unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }

    #[test]
    fn test_correlation_request_serializes_expected_shape() {
        let request = CorrelationRequest {
            array: vec![vec![0, 255]],
            shot_configuration: ShotConfig {
                power: 100.0,
                rotation: 0.5,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["array"][0][1], 255);
        assert_eq!(json["shot_configuration"]["rotation"], 0.5);
    }
}
