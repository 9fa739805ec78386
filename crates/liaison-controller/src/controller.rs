//! The controller trait.

use liaison_core::BoxFuture;

use crate::pipeline::{ControllerCore, ControllerInfo, ControllerMetrics};

/// A named set of operations running through a [`ControllerCore`].
///
/// Implementors only provide [`Controller::core`]; lifecycle and reporting
/// delegate to it. Override `initialize`/`cleanup` to add setup of your own,
/// calling the core's version as well.
///
/// # Example
///
/// ```
/// use liaison_controller::{Controller, ControllerCore, ControllerSettings};
///
/// struct PingController {
///     core: ControllerCore,
/// }
///
/// impl Controller for PingController {
///     fn core(&self) -> &ControllerCore {
///         &self.core
///     }
/// }
///
/// let ping = PingController {
///     core: ControllerCore::new("PingController", &ControllerSettings::default()),
/// };
/// assert_eq!(ping.name(), "PingController");
/// assert!(!ping.is_active());
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Returns the shared pipeline.
    fn core(&self) -> &ControllerCore;

    /// Returns the controller name.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Marks the controller ready. Idempotent.
    fn initialize(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.core().initialize() })
    }

    /// Marks the controller inactive.
    fn cleanup(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.core().cleanup() })
    }

    /// Returns whether the controller is initialized.
    fn is_active(&self) -> bool {
        self.core().is_active()
    }

    /// Returns the operation counters.
    fn metrics(&self) -> ControllerMetrics {
        self.core().metrics()
    }

    /// Returns a state snapshot.
    fn info(&self) -> ControllerInfo {
        self.core().info()
    }
}
