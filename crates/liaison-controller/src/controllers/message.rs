//! Message operations.

use chrono::Utc;
use liaison_core::ClassifiedError;
use liaison_middleware::stages::{ValidationRule, ValidationSchema};
use serde_json::json;

use super::Access;
use crate::controller::Controller;
use crate::model::{
    Message, MessageEdit, MessageKind, MessageRef, MessageSearch, MessageStats, NewMessage,
};
use crate::pipeline::ControllerCore;
use crate::services::{MessageServices, Services};
use crate::settings::ControllerSettings;
use crate::usecase::{ActivityEntry, PermissionRequest};

/// Controller name.
pub const NAME: &str = "MessageController";

/// Longest accepted message body, in characters.
pub const MAX_CONTENT_LENGTH: usize = 1000;

/// Recent messages [`MessageController::get_message_stats`] inspects.
pub const STATS_SAMPLE_SIZE: u32 = 100;

fn content_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule::required("content").with_message("Message content is required"),
        ValidationRule::min_length("content", 1)
            .with_message("Message content must be at least 1 character"),
        ValidationRule::max_length("content", MAX_CONTENT_LENGTH)
            .with_message("Message content must be at most 1000 characters"),
    ]
}

fn schema() -> ValidationSchema {
    let mut send = vec![
        ValidationRule::required("channelId").with_message("Channel ID is required"),
        ValidationRule::required("senderId").with_message("Sender ID is required"),
    ];
    send.extend(content_rules());

    let mut edit = vec![ValidationRule::required("messageId").with_message("Message ID is required")];
    edit.extend(content_rules());

    ValidationSchema::new()
        .operation("sendMessage", send)
        .operation("editMessage", edit)
        .operation(
            "deleteMessage",
            vec![ValidationRule::required("messageId").with_message("Message ID is required")],
        )
        .operation(
            "searchMessages",
            vec![
                ValidationRule::required("channelId").with_message("Channel ID is required"),
                ValidationRule::required("query").with_message("Search query is required"),
            ],
        )
        .operation(
            "getMessageStats",
            vec![
                ValidationRule::required("channelId").with_message("Channel ID is required"),
                ValidationRule::required("userId").with_message("User ID is required"),
            ],
        )
}

fn message_stats(messages: &[Message], user_id: &str) -> MessageStats {
    let total_messages = messages.len();
    let total_length: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    MessageStats {
        total_messages,
        user_messages: messages.iter().filter(|m| m.sender_id == user_id).count(),
        messages_with_files: messages
            .iter()
            .filter(|m| matches!(m.kind, MessageKind::Image | MessageKind::File))
            .count(),
        average_message_length: if total_messages == 0 {
            0.0
        } else {
            total_length as f64 / total_messages as f64
        },
    }
}

/// Sending, editing, deleting and searching messages.
pub struct MessageController {
    core: ControllerCore,
    services: MessageServices,
    access: Access,
}

impl std::fmt::Debug for MessageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageController").field("core", &self.core).finish_non_exhaustive()
    }
}

impl MessageController {
    /// Creates the controller and registers its validation rules.
    pub fn new(settings: &ControllerSettings, services: &Services) -> Self {
        let core = ControllerCore::new(NAME, settings).with_schema(schema());
        let access = Access::new(services, core.logger());
        Self {
            core,
            services: services.message.clone(),
            access,
        }
    }

    /// Sends a message to a channel.
    pub async fn send_message(&self, message: NewMessage) -> Result<Message, ClassifiedError> {
        self.core
            .execute_as(Some(&message.sender_id), "sendMessage", &message, || async {
                self.access
                    .require(
                        PermissionRequest::new(&message.sender_id, "channel", "send_message")
                            .on(&message.channel_id),
                    )
                    .await?;
                let sent = self.services.send.execute(message.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&message.sender_id, "MESSAGE_SEND", "channel")
                            .on(&message.channel_id)
                            .with_details(json!({
                                "messageId": sent.id,
                                "messageType": sent.kind,
                                "hasMetadata": message.metadata.is_some(),
                            })),
                    )
                    .await;
                Ok(sent)
            })
            .await
    }

    /// Replaces the body of a message.
    pub async fn edit_message(&self, edit: MessageEdit) -> Result<Message, ClassifiedError> {
        self.core
            .execute_as(Some(&edit.user_id), "editMessage", &edit, || async {
                self.access
                    .require(PermissionRequest::new(&edit.user_id, "message", "edit").on(&edit.message_id))
                    .await?;
                let edited = self.services.edit.execute(edit.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&edit.user_id, "MESSAGE_EDIT", "message")
                            .on(&edit.message_id)
                            .with_details(json!({ "editedAt": Utc::now() })),
                    )
                    .await;
                Ok(edited)
            })
            .await
    }

    /// Deletes a message, returning whether it existed.
    pub async fn delete_message(&self, message_id: &str, user_id: &str) -> Result<bool, ClassifiedError> {
        let request = MessageRef {
            message_id: message_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.core
            .execute_as(Some(user_id), "deleteMessage", &request, || async {
                self.access
                    .require(PermissionRequest::new(user_id, "message", "delete").on(message_id))
                    .await?;
                let deleted = self.services.delete.execute(request.clone()).await?;
                if deleted {
                    self.access
                        .record(
                            ActivityEntry::new(user_id, "MESSAGE_DELETE", "message")
                                .on(message_id)
                                .with_details(json!({ "deletedAt": Utc::now() })),
                        )
                        .await;
                }
                Ok(deleted)
            })
            .await
    }

    /// Searches the messages of a channel.
    pub async fn search_messages(&self, search: MessageSearch) -> Result<Vec<Message>, ClassifiedError> {
        self.core
            .execute_as(Some(&search.user_id), "searchMessages", &search, || async {
                self.access
                    .require(
                        PermissionRequest::new(&search.user_id, "channel", "read_messages")
                            .on(&search.channel_id),
                    )
                    .await?;
                self.services.search.execute(search.clone()).await
            })
            .await
    }

    /// Summarizes the most recent messages of a channel.
    pub async fn get_message_stats(&self, channel_id: &str, user_id: &str) -> Result<MessageStats, ClassifiedError> {
        let search = MessageSearch {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            query: String::new(),
            limit: Some(STATS_SAMPLE_SIZE),
            offset: None,
        };
        self.core
            .execute_as(Some(user_id), "getMessageStats", &search, || async {
                self.access
                    .require(PermissionRequest::new(user_id, "channel", "read_messages").on(channel_id))
                    .await?;
                let recent = self.services.search.execute(search.clone()).await?;
                Ok(message_stats(&recent, user_id))
            })
            .await
    }
}

impl Controller for MessageController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }
}
