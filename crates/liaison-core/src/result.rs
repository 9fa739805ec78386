//! Outcome envelope of one chain execution.

use serde_json::Value;
use std::time::Duration;

use crate::context::{FlowId, OperationContext};
use crate::error::OperationError;

/// Outcome of one invocation.
///
/// Exactly one of payload and error exists because the outcome is a
/// `Result`. After-hooks may replace the payload and duration (the cache
/// does on a hit) but never flip success into failure or back.
#[derive(Debug)]
pub struct OperationResult<T = Value> {
    outcome: Result<T, OperationError>,
    duration: Duration,
    flow_id: FlowId,
    context: OperationContext,
}

impl<T> OperationResult<T> {
    /// Builds a successful result.
    pub fn success(payload: T, duration: Duration, context: OperationContext) -> Self {
        Self::new(Ok(payload), duration, context)
    }

    /// Builds a failed result.
    pub fn failure(error: OperationError, duration: Duration, context: OperationContext) -> Self {
        Self::new(Err(error), duration, context)
    }

    /// Builds a result from an outcome.
    pub fn new(
        outcome: Result<T, OperationError>,
        duration: Duration,
        context: OperationContext,
    ) -> Self {
        Self {
            outcome,
            duration,
            flow_id: context.flow_id(),
            context,
        }
    }

    /// Returns true if the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the payload of a successful result.
    pub fn payload(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// Returns the error of a failed result.
    pub fn error(&self) -> Option<&OperationError> {
        self.outcome.as_ref().err()
    }

    /// Replaces the payload of a successful result.
    ///
    /// Returns false and leaves a failed result untouched.
    pub fn set_payload(&mut self, payload: T) -> bool {
        match &mut self.outcome {
            Ok(current) => {
                *current = payload;
                true
            }
            Err(_) => false,
        }
    }

    /// Returns the reported duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Overrides the reported duration.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Returns the flow id.
    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    /// Returns the invocation context.
    pub fn context(&self) -> &OperationContext {
        &self.context
    }

    /// Returns the invocation context mutably.
    pub fn context_mut(&mut self) -> &mut OperationContext {
        &mut self.context
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> &Result<T, OperationError> {
        &self.outcome
    }

    /// Consumes the result and returns the outcome.
    pub fn into_outcome(self) -> Result<T, OperationError> {
        self.outcome
    }

    /// Consumes the result and returns outcome, duration and context.
    pub fn into_parts(self) -> (Result<T, OperationError>, Duration, OperationContext) {
        (self.outcome, self.duration, self.context)
    }
}
