//! The standard controllers.
//!
//! Each public method is one tracked operation whose closure asks the
//! permission use case, calls its business use case and records an activity
//! entry.

pub mod channel;
pub mod file;
pub mod message;
pub mod notification;
pub mod user;

pub use channel::ChannelController;
pub use file::FileController;
pub use message::MessageController;
pub use notification::NotificationController;
pub use user::UserController;

use liaison_core::OperationError;
use liaison_telemetry::Logger;
use serde_json::json;

use crate::services::Services;
use crate::usecase::{ActivityEntry, PermissionDecision, PermissionRequest, SharedUseCase};

/// Permission and activity collaborators of one controller.
#[derive(Clone)]
pub(crate) struct Access {
    permissions: SharedUseCase<PermissionRequest, PermissionDecision>,
    activity: SharedUseCase<ActivityEntry, ()>,
    logger: Logger,
}

impl Access {
    pub(crate) fn new(services: &Services, logger: &Logger) -> Self {
        Self {
            permissions: services.permissions.clone(),
            activity: services.activity.clone(),
            logger: logger.clone(),
        }
    }

    /// Fails with a `FORBIDDEN` error unless the request is allowed.
    pub(crate) async fn require(&self, request: PermissionRequest) -> Result<(), OperationError> {
        let decision = self.permissions.execute(request.clone()).await?;
        if decision.allowed {
            return Ok(());
        }
        let reason = decision.reason.unwrap_or_else(|| "not allowed".to_string());
        Err(OperationError::coded(
            "FORBIDDEN",
            format!(
                "permission denied: {} may not {} {}: {reason}",
                request.user_id, request.action, request.resource
            ),
        ))
    }

    /// Records an activity; failures are logged and swallowed.
    pub(crate) async fn record(&self, entry: ActivityEntry) {
        let action = entry.action.clone();
        if let Err(error) = self.activity.execute(entry).await {
            self.logger.warn(
                "Failed to record activity",
                json!({ "action": action, "error": error.to_string() }),
            );
        }
    }
}
