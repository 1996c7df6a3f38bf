//! Outbox of pending service requests
//!
//! Every request is stamped with the match/turn it was issued for. Results
//! are matched back by request id; the stamp decides whether the result
//! still applies once it arrives.

use serde::{Deserialize, Serialize};

use super::{CorrelationRequest, ScoredShot, ServiceError, ShotDecision};

/// Identifier assigned when a request is queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Match/turn a request was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    pub match_id: u64,
    pub turn_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServiceRequest {
    /// Ask the automated decision service for this turn's shot
    DecideShot,
    FetchBestShots,
    FetchPredictions,
    /// Fire-and-forget layout submit
    SubmitCorrelation(CorrelationRequest),
}

impl ServiceRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceRequest::DecideShot => "decide-shot",
            ServiceRequest::FetchBestShots => "best-shots",
            ServiceRequest::FetchPredictions => "predictions",
            ServiceRequest::SubmitCorrelation(_) => "correlation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: RequestId,
    pub correlation: Correlation,
    pub request: ServiceRequest,
}

#[derive(Debug)]
pub enum ResponsePayload {
    Decision(Option<ShotDecision>),
    Shots(Vec<ScoredShot>),
    Correlation(Option<f32>),
    Failed(ServiceError),
}

/// A result on its way back to the simulation
#[derive(Debug)]
pub struct ServiceResponse {
    pub id: RequestId,
    pub payload: ResponsePayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outbox {
    /// Queued, not yet handed to a dispatcher
    queued: Vec<PendingRequest>,
    /// Handed out, awaiting a response
    in_flight: Vec<PendingRequest>,
    next_id: u64,
}

impl Outbox {
    pub fn push(&mut self, correlation: Correlation, request: ServiceRequest) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        log::debug!("queued {} request {:?}", request.name(), id);
        self.queued.push(PendingRequest {
            id,
            correlation,
            request,
        });
        id
    }

    /// Hand every queued request to the caller, marking them in flight
    pub fn take_queued(&mut self) -> Vec<PendingRequest> {
        let taken = std::mem::take(&mut self.queued);
        self.in_flight.extend(taken.iter().cloned());
        taken
    }

    /// Remove and return the in-flight record for a response.
    ///
    /// None means the id is unknown or was already answered.
    pub fn complete(&mut self, id: RequestId) -> Option<PendingRequest> {
        let idx = self.in_flight.iter().position(|p| p.id == id)?;
        Some(self.in_flight.remove(idx))
    }

    /// A shot decision for this turn is queued or in flight
    pub fn awaiting_decision(&self, turn_id: u64) -> bool {
        self.queued
            .iter()
            .chain(self.in_flight.iter())
            .any(|p| p.request == ServiceRequest::DecideShot && p.correlation.turn_id == turn_id)
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty() && self.in_flight.is_empty()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(turn_id: u64) -> Correlation {
        Correlation {
            match_id: 1,
            turn_id,
        }
    }

    #[test]
    fn test_request_lifecycle() {
        let mut outbox = Outbox::default();
        let id = outbox.push(at(3), ServiceRequest::DecideShot);
        assert!(outbox.awaiting_decision(3));
        assert!(!outbox.awaiting_decision(4));
        assert_eq!(outbox.queued_len(), 1);

        let taken = outbox.take_queued();
        assert_eq!(taken.len(), 1);
        assert_eq!(outbox.queued_len(), 0);
        assert_eq!(outbox.in_flight_len(), 1);
        assert!(outbox.awaiting_decision(3));

        let record = outbox.complete(id).unwrap();
        assert_eq!(record.correlation, at(3));
        assert!(outbox.is_empty());
        assert!(!outbox.awaiting_decision(3));
    }

    #[test]
    fn test_duplicate_completion_is_rejected() {
        let mut outbox = Outbox::default();
        let id = outbox.push(at(1), ServiceRequest::FetchBestShots);
        outbox.take_queued();
        assert!(outbox.complete(id).is_some());
        assert!(outbox.complete(id).is_none());
        assert!(outbox.complete(RequestId(99)).is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut outbox = Outbox::default();
        let a = outbox.push(at(1), ServiceRequest::FetchPredictions);
        let b = outbox.push(at(1), ServiceRequest::FetchPredictions);
        assert_ne!(a, b);
    }
}
