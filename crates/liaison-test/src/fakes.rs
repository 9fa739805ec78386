//! Scripted use cases and collaborator fakes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use liaison_controller::{ActivityEntry, PermissionDecision, PermissionRequest, UseCase};
use liaison_core::{BoxFuture, OperationError};
use parking_lot::Mutex;

type Responder<I, O> = Arc<dyn Fn(&I) -> Result<O, OperationError> + Send + Sync>;

struct Script<I, O> {
    queued: VecDeque<Result<O, OperationError>>,
    calls: Vec<I>,
}

/// A use case answering from a script and recording its inputs.
///
/// Queued outcomes are returned first, in order; afterwards the responder
/// answers. Without either, calls fail with an `UNSCRIPTED` coded error.
///
/// # Example
///
/// ```
/// use liaison_controller::UseCase;
/// use liaison_core::OperationError;
/// use liaison_test::ScriptedUseCase;
///
/// # tokio_test::block_on(async {
/// let lookup = ScriptedUseCase::responding(|id: &String| Ok(id.len()))
///     .then_fail(OperationError::network("offline"));
///
/// assert!(lookup.execute("abc".to_string()).await.is_err());
/// assert_eq!(lookup.execute("abc".to_string()).await.unwrap(), 3);
/// assert_eq!(lookup.call_count(), 2);
/// # });
/// ```
pub struct ScriptedUseCase<I, O> {
    script: Mutex<Script<I, O>>,
    responder: Option<Responder<I, O>>,
    delay: Duration,
}

impl<I, O> fmt::Debug for ScriptedUseCase<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let script = self.script.lock();
        f.debug_struct("ScriptedUseCase")
            .field("queued", &script.queued.len())
            .field("calls", &script.calls.len())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<I, O> Default for ScriptedUseCase<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> ScriptedUseCase<I, O> {
    /// Creates a use case with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                queued: VecDeque::new(),
                calls: Vec::new(),
            }),
            responder: None,
            delay: Duration::ZERO,
        }
    }

    /// Creates a use case answering every call with `responder`.
    #[must_use]
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&I) -> Result<O, OperationError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(responder)),
            ..Self::new()
        }
    }

    /// Queues a success.
    #[must_use]
    pub fn then_return(self, output: O) -> Self {
        self.script.lock().queued.push_back(Ok(output));
        self
    }

    /// Queues a failure.
    #[must_use]
    pub fn then_fail(self, error: OperationError) -> Self {
        self.script.lock().queued.push_back(Err(error));
        self
    }

    /// Sleeps this long before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns how many times the use case ran.
    pub fn call_count(&self) -> usize {
        self.script.lock().calls.len()
    }

    /// Returns the inputs received, in order.
    pub fn calls(&self) -> Vec<I>
    where
        I: Clone,
    {
        self.script.lock().calls.clone()
    }

    fn answer(&self, input: I) -> Result<O, OperationError> {
        let mut script = self.script.lock();
        let outcome = match script.queued.pop_front() {
            Some(outcome) => outcome,
            None => match &self.responder {
                Some(responder) => responder(&input),
                None => Err(OperationError::coded("UNSCRIPTED", "no scripted outcome left")),
            },
        };
        script.calls.push(input);
        outcome
    }
}

impl<I, O> UseCase<I, O> for ScriptedUseCase<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn execute(&self, input: I) -> BoxFuture<'_, Result<O, OperationError>> {
        let outcome = self.answer(input);
        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }
}

/// Permission use case with a fixed default and per-action denials.
///
/// # Example
///
/// ```
/// use liaison_controller::{PermissionRequest, UseCase};
/// use liaison_test::PermissionFake;
///
/// # tokio_test::block_on(async {
/// let permissions = PermissionFake::allow_all().deny("channel", "create");
///
/// let denied = permissions
///     .execute(PermissionRequest::new("u1", "channel", "create"))
///     .await
///     .unwrap();
/// assert!(!denied.allowed);
/// # });
/// ```
#[derive(Debug)]
pub struct PermissionFake {
    allow_by_default: bool,
    denied: Vec<(String, String)>,
    requests: Mutex<Vec<PermissionRequest>>,
}

impl PermissionFake {
    /// Allows everything not explicitly denied.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            allow_by_default: true,
            denied: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Denies everything.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            allow_by_default: false,
            ..Self::allow_all()
        }
    }

    /// Denies one `resource`/`action` pair.
    #[must_use]
    pub fn deny(mut self, resource: &str, action: &str) -> Self {
        self.denied.push((resource.to_string(), action.to_string()));
        self
    }

    /// Returns the requests received.
    pub fn requests(&self) -> Vec<PermissionRequest> {
        self.requests.lock().clone()
    }

    fn decide(&self, request: &PermissionRequest) -> PermissionDecision {
        let listed = self
            .denied
            .iter()
            .any(|(resource, action)| *resource == request.resource && *action == request.action);
        if self.allow_by_default && !listed {
            PermissionDecision::allow()
        } else {
            PermissionDecision::deny(format!("{} {} is not permitted", request.action, request.resource))
        }
    }
}

impl UseCase<PermissionRequest, PermissionDecision> for PermissionFake {
    fn execute(&self, input: PermissionRequest) -> BoxFuture<'_, Result<PermissionDecision, OperationError>> {
        let decision = self.decide(&input);
        self.requests.lock().push(input);
        Box::pin(async move { Ok(decision) })
    }
}

/// Activity log use case that keeps every entry.
#[derive(Debug, Default)]
pub struct ActivityRecorder {
    entries: Mutex<Vec<ActivityEntry>>,
    failing: bool,
}

impl ActivityRecorder {
    /// Creates a recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder whose every call fails after recording.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Returns the recorded entries.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().clone()
    }

    /// Returns the recorded action codes in order.
    pub fn actions(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.action.clone()).collect()
    }
}

impl UseCase<ActivityEntry, ()> for ActivityRecorder {
    fn execute(&self, input: ActivityEntry) -> BoxFuture<'_, Result<(), OperationError>> {
        self.entries.lock().push(input);
        let failing = self.failing;
        Box::pin(async move {
            if failing {
                Err(OperationError::network("activity log unreachable"))
            } else {
                Ok(())
            }
        })
    }
}
