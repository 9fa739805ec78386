//! Notification operations.

use liaison_core::ClassifiedError;
use liaison_middleware::stages::{ValidationRule, ValidationSchema};
use serde_json::json;

use super::Access;
use crate::controller::Controller;
use crate::model::{BulkDelivery, BulkNotification, NewNotification, Notification, NotificationPreferences};
use crate::pipeline::ControllerCore;
use crate::services::{NotificationServices, Services};
use crate::settings::ControllerSettings;
use crate::usecase::{ActivityEntry, PermissionRequest};

/// Controller name.
pub const NAME: &str = "NotificationController";

fn schema() -> ValidationSchema {
    ValidationSchema::new()
        .operation(
            "sendNotification",
            vec![
                ValidationRule::required("userId").with_message("User ID is required"),
                ValidationRule::required("title").with_message("Notification title is required"),
                ValidationRule::max_length("title", 100)
                    .with_message("Notification title must be at most 100 characters"),
            ],
        )
        .operation(
            "updatePreferences",
            vec![ValidationRule::required("userId").with_message("User ID is required")],
        )
        .operation(
            "sendBulkNotifications",
            vec![
                ValidationRule::required("senderId").with_message("Sender ID is required"),
                ValidationRule::required("title").with_message("Notification title is required"),
            ],
        )
}

/// Notification delivery and preferences.
pub struct NotificationController {
    core: ControllerCore,
    services: NotificationServices,
    access: Access,
}

impl std::fmt::Debug for NotificationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationController").field("core", &self.core).finish_non_exhaustive()
    }
}

impl NotificationController {
    /// Creates the controller and registers its validation rules.
    pub fn new(settings: &ControllerSettings, services: &Services) -> Self {
        let core = ControllerCore::new(NAME, settings).with_schema(schema());
        let access = Access::new(services, core.logger());
        Self {
            core,
            services: services.notification.clone(),
            access,
        }
    }

    /// Sends one notification; the recipient must be allowed to receive it.
    pub async fn send_notification(&self, notification: NewNotification) -> Result<Notification, ClassifiedError> {
        self.core
            .execute_as(Some(&notification.user_id), "sendNotification", &notification, || async {
                self.access
                    .require(PermissionRequest::new(&notification.user_id, "notification", "receive"))
                    .await?;
                let sent = self.services.send.execute(notification.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&notification.user_id, "NOTIFICATION_SENT", "notification")
                            .on(&sent.id)
                            .with_details(json!({ "type": sent.kind, "title": sent.title })),
                    )
                    .await;
                Ok(sent)
            })
            .await
    }

    /// Stores notification preferences.
    pub async fn update_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, ClassifiedError> {
        self.core
            .execute_as(Some(&preferences.user_id), "updatePreferences", &preferences, || async {
                let stored = self.services.update_preferences.execute(preferences.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&preferences.user_id, "NOTIFICATION_PREFERENCES_UPDATED", "notification")
                            .with_details(json!({ "mutedChannels": stored.muted_channels.len() })),
                    )
                    .await;
                Ok(stored)
            })
            .await
    }

    /// Sends one notification to many users.
    pub async fn send_bulk_notifications(&self, bulk: BulkNotification) -> Result<BulkDelivery, ClassifiedError> {
        self.core
            .execute_as(Some(&bulk.sender_id), "sendBulkNotifications", &bulk, || async {
                self.access
                    .require(PermissionRequest::new(&bulk.sender_id, "notification", "send_bulk"))
                    .await?;
                let delivery = self.services.send_bulk.execute(bulk.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&bulk.sender_id, "BULK_NOTIFICATION_SENT", "notification")
                            .with_details(json!({
                                "recipients": bulk.user_ids.len(),
                                "sent": delivery.sent,
                                "failed": delivery.failed,
                            })),
                    )
                    .await;
                Ok(delivery)
            })
            .await
    }
}

impl Controller for NotificationController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }
}
