//! In-memory shot recommendation service

use super::{CorrelationRequest, ScoredShot, ServiceError, ShotService, decode_shots};

/// Serves fixed best-shot/prediction lists and records correlation submits
#[derive(Debug, Clone, Default)]
pub struct ScriptedShotService {
    pub best: Vec<ScoredShot>,
    pub predictions: Vec<ScoredShot>,
    /// Every layout submitted so far
    pub submitted: Vec<CorrelationRequest>,
    /// Answer submits with a failure instead of recording them
    pub fail_submissions: bool,
}

impl ScriptedShotService {
    pub fn new(best: Vec<ScoredShot>, predictions: Vec<ScoredShot>) -> Self {
        Self {
            best,
            predictions,
            ..Default::default()
        }
    }

    /// Build from two JSON bodies in the service's wire format
    pub fn from_json(best: &str, predictions: &str) -> Result<Self, ServiceError> {
        Ok(Self::new(decode_shots(best)?, decode_shots(predictions)?))
    }
}

impl ShotService for ScriptedShotService {
    fn best_shots(&mut self) -> Result<Vec<ScoredShot>, ServiceError> {
        Ok(self.best.clone())
    }

    fn predictions(&mut self) -> Result<Vec<ScoredShot>, ServiceError> {
        Ok(self.predictions.clone())
    }

    fn submit_correlation(
        &mut self,
        request: &CorrelationRequest,
    ) -> Result<Option<f32>, ServiceError> {
        if self.fail_submissions {
            return Err(ServiceError::Status { code: 503 });
        }
        self.submitted.push(request.clone());
        Ok(None)
    }
}
