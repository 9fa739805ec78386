//! Flow tracking.
//!
//! A flow is the tracked lifetime of one pipeline invocation. The
//! [`FlowTracker`] keeps the set of active flows and a bounded FIFO history
//! of completed ones, from which success-rate and per-controller statistics
//! are derived.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

use crate::context::FlowId;

/// Default number of completed flows kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Lifecycle state of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowStatus {
    /// Still running.
    Active,
    /// Completed successfully.
    Succeeded,
    /// Completed with a failure.
    Failed {
        /// Error text, if one was recorded.
        error: Option<String>,
    },
}

/// Record of one flow.
#[derive(Debug, Clone, Serialize)]
pub struct FlowRecord {
    /// Flow identifier.
    pub id: FlowId,
    /// Controller name.
    pub controller: String,
    /// Operation name.
    pub operation: String,
    /// Wall-clock start time.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end time, once completed.
    pub ended_at: Option<DateTime<Utc>>,
    /// Monotonic duration, once completed.
    pub duration: Option<Duration>,
    /// Current status.
    #[serde(flatten)]
    pub status: FlowStatus,
    /// Metadata supplied at start.
    pub metadata: BTreeMap<String, String>,
    #[serde(skip)]
    started: Instant,
}

impl FlowRecord {
    /// Returns true if the flow completed successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == FlowStatus::Succeeded
    }

    /// Returns true if the flow is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == FlowStatus::Active
    }

    /// Returns the monotonic age of the flow.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Completed-flow statistics for one controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControllerFlowStats {
    /// Completed flows.
    pub total: u64,
    /// Successful completed flows.
    pub successful: u64,
    /// Mean duration over all completed flows.
    pub average_duration: Duration,
}

#[derive(Debug, Default)]
struct FlowState {
    active: HashMap<FlowId, FlowRecord>,
    completed: VecDeque<FlowRecord>,
}

/// Tracks active and completed flows.
///
/// # Example
///
/// ```
/// use liaison_core::FlowTracker;
///
/// let tracker = FlowTracker::new();
/// let id = tracker.start_flow("ChannelController", "createChannel", Default::default());
/// tracker.complete_flow(id, true, None);
///
/// assert_eq!(tracker.total_flows(), 1);
/// assert_eq!(tracker.success_rate(), 100.0);
/// ```
#[derive(Debug)]
pub struct FlowTracker {
    capacity: usize,
    state: Mutex<FlowState>,
}

impl Default for FlowTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowTracker {
    /// Creates a tracker with the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a tracker keeping at most `capacity` completed flows.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(FlowState::default()),
        }
    }

    /// Returns the history capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Opens a new active flow and returns its id.
    pub fn start_flow(
        &self,
        controller: &str,
        operation: &str,
        metadata: BTreeMap<String, String>,
    ) -> FlowId {
        let id = FlowId::new();
        let record = FlowRecord {
            id,
            controller: controller.to_string(),
            operation: operation.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            duration: None,
            status: FlowStatus::Active,
            metadata,
            started: Instant::now(),
        };
        self.state.lock().active.insert(id, record);
        id
    }

    /// Completes an active flow and moves it into history.
    ///
    /// Unknown ids are logged and ignored.
    pub fn complete_flow(&self, id: FlowId, success: bool, error: Option<String>) {
        let mut state = self.state.lock();
        let Some(mut record) = state.active.remove(&id) else {
            tracing::warn!(flow_id = %id, "flow not found");
            return;
        };

        record.ended_at = Some(Utc::now());
        record.duration = Some(record.started.elapsed());
        record.status = if success {
            FlowStatus::Succeeded
        } else {
            FlowStatus::Failed { error }
        };

        state.completed.push_back(record);
        while state.completed.len() > self.capacity {
            state.completed.pop_front();
        }
    }

    /// Returns a snapshot of active flows.
    #[must_use]
    pub fn active_flows(&self) -> Vec<FlowRecord> {
        self.state.lock().active.values().cloned().collect()
    }

    /// Returns a snapshot of the completed-flow history, oldest first.
    #[must_use]
    pub fn completed_flows(&self) -> Vec<FlowRecord> {
        self.state.lock().completed.iter().cloned().collect()
    }

    /// Returns the number of active flows.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Returns the number of completed flows in history.
    #[must_use]
    pub fn total_flows(&self) -> usize {
        self.state.lock().completed.len()
    }

    /// Returns the percentage of successful completed flows.
    ///
    /// Returns `0.0` when the history is empty.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let state = self.state.lock();
        if state.completed.is_empty() {
            return 0.0;
        }
        let successful = state.completed.iter().filter(|r| r.is_success()).count();
        successful as f64 / state.completed.len() as f64 * 100.0
    }

    /// Looks up a flow in the active set, then in history.
    #[must_use]
    pub fn flow(&self, id: FlowId) -> Option<FlowRecord> {
        let state = self.state.lock();
        state
            .active
            .get(&id)
            .or_else(|| state.completed.iter().find(|r| r.id == id))
            .cloned()
    }

    /// Aggregates completed flows per controller.
    #[must_use]
    pub fn controller_stats(&self) -> BTreeMap<String, ControllerFlowStats> {
        let state = self.state.lock();
        let mut sums: BTreeMap<String, (u64, u64, Duration)> = BTreeMap::new();
        for record in &state.completed {
            let entry = sums.entry(record.controller.clone()).or_default();
            entry.0 += 1;
            if record.is_success() {
                entry.1 += 1;
            }
            entry.2 += record.duration.unwrap_or_default();
        }

        sums.into_iter()
            .map(|(controller, (total, successful, cumulative))| {
                let average_duration = u32::try_from(total)
                    .ok()
                    .filter(|n| *n > 0)
                    .map_or(Duration::ZERO, |n| cumulative / n);
                (
                    controller,
                    ControllerFlowStats {
                        total,
                        successful,
                        average_duration,
                    },
                )
            })
            .collect()
    }

    /// Drops completed flows that started at least `max_age` ago.
    ///
    /// Returns the number of records removed.
    pub fn cleanup_older_than(&self, max_age: Duration) -> usize {
        let mut state = self.state.lock();
        let before = state.completed.len();
        state.completed.retain(|r| r.age() < max_age);
        before - state.completed.len()
    }

    /// Clears active flows and history.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.active.clear();
        state.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(tracker: &FlowTracker, controller: &str, success: bool) -> FlowId {
        let id = tracker.start_flow(controller, "op", BTreeMap::new());
        tracker.complete_flow(id, success, (!success).then(|| "boom".to_string()));
        id
    }

    #[test]
    fn test_success_rate_is_zero_when_empty() {
        let tracker = FlowTracker::new();
        assert_eq!(tracker.success_rate(), 0.0);
    }

    #[test]
    fn test_success_rate_three_of_four() {
        let tracker = FlowTracker::new();
        complete(&tracker, "A", true);
        complete(&tracker, "A", true);
        complete(&tracker, "A", true);
        complete(&tracker, "A", false);
        assert_eq!(tracker.success_rate(), 75.0);
    }

    #[test]
    fn test_active_flows_are_not_counted() {
        let tracker = FlowTracker::new();
        let id = tracker.start_flow("A", "op", BTreeMap::new());
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.total_flows(), 0);
        assert!(tracker.flow(id).is_some_and(|r| r.is_active()));

        tracker.complete_flow(id, true, None);
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.total_flows(), 1);
        assert!(tracker.flow(id).is_some_and(|r| r.is_success()));
    }

    #[test]
    fn test_unknown_flow_is_ignored() {
        let tracker = FlowTracker::new();
        tracker.complete_flow(FlowId::new(), true, None);
        assert_eq!(tracker.total_flows(), 0);
    }

    #[test]
    fn test_double_completion_counts_once() {
        let tracker = FlowTracker::new();
        let id = complete(&tracker, "A", true);
        tracker.complete_flow(id, false, None);
        assert_eq!(tracker.total_flows(), 1);
        assert_eq!(tracker.success_rate(), 100.0);
    }

    #[test]
    fn test_failed_flow_keeps_error() {
        let tracker = FlowTracker::new();
        let id = complete(&tracker, "A", false);
        let record = tracker.flow(id).unwrap();
        assert_eq!(
            record.status,
            FlowStatus::Failed {
                error: Some("boom".to_string())
            }
        );
        assert!(record.ended_at.is_some());
    }

    #[test]
    fn test_history_is_fifo_capped() {
        let tracker = FlowTracker::with_capacity(3);
        let ids: Vec<FlowId> = (0..5).map(|_| complete(&tracker, "A", true)).collect();

        let kept: Vec<FlowId> = tracker.completed_flows().iter().map(|r| r.id).collect();
        assert_eq!(kept, ids[2..].to_vec());
        assert!(tracker.flow(ids[0]).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_stats_average_duration() {
        let tracker = FlowTracker::new();

        let a = tracker.start_flow("ChannelController", "createChannel", BTreeMap::new());
        tokio::time::sleep(Duration::from_millis(100)).await;
        tracker.complete_flow(a, true, None);

        let b = tracker.start_flow("ChannelController", "createChannel", BTreeMap::new());
        tokio::time::sleep(Duration::from_millis(300)).await;
        tracker.complete_flow(b, false, None);

        let stats = tracker.controller_stats();
        let channel = &stats["ChannelController"];
        assert_eq!(channel.total, 2);
        assert_eq!(channel.successful, 1);
        assert_eq!(channel.average_duration, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_older_than() {
        let tracker = FlowTracker::new();
        complete(&tracker, "A", true);
        tokio::time::sleep(Duration::from_secs(60)).await;
        complete(&tracker, "A", true);

        assert_eq!(tracker.cleanup_older_than(Duration::from_secs(30)), 1);
        assert_eq!(tracker.total_flows(), 1);
    }
}
