//! Runs queued requests against the service collaborators

use super::outbox::{PendingRequest, ResponsePayload, ServiceRequest, ServiceResponse};
use super::{ShotPlanner, ShotService};
use crate::sim::MatchState;

/// Drains a match's outbox against a planner and a shot service.
///
/// Responses are returned rather than applied, so the caller can deliver
/// them on a later tick.
pub struct Dispatcher<P, S> {
    pub planner: P,
    pub service: S,
}

impl<P: ShotPlanner, S: ShotService> Dispatcher<P, S> {
    pub fn new(planner: P, service: S) -> Self {
        Self { planner, service }
    }

    pub fn dispatch(&mut self, state: &mut MatchState) -> Vec<ServiceResponse> {
        let pending = state.outbox.take_queued();
        pending
            .into_iter()
            .map(|request| self.run(state, request))
            .collect()
    }

    fn run(&mut self, state: &MatchState, pending: PendingRequest) -> ServiceResponse {
        let payload = match &pending.request {
            ServiceRequest::DecideShot => ResponsePayload::Decision(self.planner.decide(state)),
            ServiceRequest::FetchBestShots => match self.service.best_shots() {
                Ok(shots) => ResponsePayload::Shots(shots),
                Err(e) => ResponsePayload::Failed(e),
            },
            ServiceRequest::FetchPredictions => match self.service.predictions() {
                Ok(shots) => ResponsePayload::Shots(shots),
                Err(e) => ResponsePayload::Failed(e),
            },
            ServiceRequest::SubmitCorrelation(request) => {
                match self.service.submit_correlation(request) {
                    Ok(value) => ResponsePayload::Correlation(value),
                    Err(e) => ResponsePayload::Failed(e),
                }
            }
        };

        ServiceResponse {
            id: pending.id,
            payload,
        }
    }
}
