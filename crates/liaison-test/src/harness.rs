//! A standard registry wired to stubs and an in-memory sink.

use std::sync::Arc;

use liaison_controller::{Controller, ControllerRegistry, ControllerSettings, RegistryError};
use liaison_telemetry::LogLevel;

use crate::services::StubServices;
use crate::sink::MemorySink;

/// Registry, stubs and captured logs for one test.
///
/// # Example
///
/// ```
/// use liaison_controller::UserController;
/// use liaison_test::TestHarness;
///
/// # tokio_test::block_on(async {
/// let harness = TestHarness::new();
/// let users = harness.controller::<UserController>("user").unwrap();
///
/// let user = users.get_current_user().await.unwrap();
/// assert!(user.is_some());
/// assert_eq!(harness.stub.activity.actions(), vec!["USER_PROFILE_VIEW"]);
/// # });
/// ```
#[derive(Debug)]
pub struct TestHarness {
    /// Stub services behind every controller.
    pub stub: StubServices,
    /// Receives every log record at debug level and above.
    pub sink: MemorySink,
    /// Registry with the standard factories.
    pub registry: ControllerRegistry,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness over permissive stubs and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stub(StubServices::new())
    }

    /// Harness over the given stubs.
    #[must_use]
    pub fn with_stub(stub: StubServices) -> Self {
        Self::with_settings(stub, ControllerSettings::default())
    }

    /// Harness over the given stubs and settings; the sink is attached to
    /// the settings' logger.
    #[must_use]
    pub fn with_settings(stub: StubServices, settings: ControllerSettings) -> Self {
        let sink = MemorySink::new();
        let settings = settings.with_remote_sink(sink.shared(), LogLevel::Debug);
        let registry = ControllerRegistry::standard(settings, stub.services());
        Self {
            stub,
            sink,
            registry,
        }
    }

    /// Returns the controller registered under `type_name` as `C`.
    ///
    /// # Errors
    ///
    /// Fails for unknown type names and mismatched types.
    pub fn controller<C: Controller>(&self, type_name: &str) -> Result<Arc<C>, RegistryError> {
        self.registry.typed::<C>(type_name)
    }
}
