//! Parameter and payload types of the concrete controllers.
//!
//! Parameter structs serialize to the camelCase JSON objects the validation
//! schemas and cache keys are written against.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::usecase::ActivityEntry;

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account id.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Login credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plain password.
    pub password: String,
}

/// A new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Login email.
    pub email: String,
    /// Plain password.
    pub password: String,
    /// Display name.
    pub name: String,
}

/// Profile changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// Account being changed.
    pub user_id: String,
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Reference to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    /// Account id.
    pub user_id: String,
}

/// Filter over a user's activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    /// Whose activities.
    pub user_id: String,
    /// Only this activity code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    /// Not before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Not after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// At most this many entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// A permission granted to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermission {
    /// Permission name, e.g. `channel:create`.
    pub permission: String,
    /// Resource instance it is limited to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Granted at.
    pub granted_at: DateTime<Utc>,
}

/// Summary of a user's activity and permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Activities on record.
    pub total_activities: usize,
    /// The first entries of the activity log.
    pub recent_activities: Vec<ActivityEntry>,
    /// Permissions granted.
    pub total_permissions: usize,
    /// Permission names.
    pub permissions: Vec<String>,
}

/// Channel visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Anyone may join.
    #[default]
    Public,
    /// Invitation only.
    Private,
    /// Two-person conversation.
    Direct,
}

/// A chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Channel id.
    pub id: String,
    /// Channel name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Visibility.
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    /// Creator.
    pub owner_id: String,
    /// Members, including the owner.
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// A channel to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChannel {
    /// Channel name, 1 to 50 characters.
    pub name: String,
    /// Description, at most 200 characters; empty for none.
    #[serde(default)]
    pub description: String,
    /// Visibility.
    #[serde(rename = "type", default)]
    pub kind: ChannelKind,
    /// Creating user.
    pub created_by: String,
    /// Initial members besides the creator.
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// Invitation of users into a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInvite {
    /// Target channel.
    pub channel_id: String,
    /// Inviting member.
    pub inviter_id: String,
    /// Invited users.
    pub user_ids: Vec<String>,
}

/// A user's membership in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMembership {
    /// Channel.
    pub channel_id: String,
    /// Member.
    pub user_id: String,
}

/// Message content type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    #[default]
    Text,
    /// Image attachment.
    Image,
    /// File attachment.
    File,
    /// Generated by the system.
    System,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message id.
    pub id: String,
    /// Channel.
    pub channel_id: String,
    /// Author.
    pub sender_id: String,
    /// Body.
    pub content: String,
    /// Content type.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Sent at.
    pub created_at: DateTime<Utc>,
    /// Last edited at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

/// A message to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Channel.
    pub channel_id: String,
    /// Author.
    pub sender_id: String,
    /// Body, 1 to 1000 characters.
    pub content: String,
    /// Content type.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Client metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// New content for an existing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEdit {
    /// Message.
    pub message_id: String,
    /// Editing user.
    pub user_id: String,
    /// Replacement body.
    pub content: String,
}

/// Reference to a message on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message.
    pub message_id: String,
    /// Acting user.
    pub user_id: String,
}

/// Full-text message search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSearch {
    /// Channel searched.
    pub channel_id: String,
    /// Searching user.
    pub user_id: String,
    /// Search text.
    pub query: String,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Page offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Activity summary of a channel's recent messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    /// Messages inspected.
    pub total_messages: usize,
    /// Of those, sent by the asking user.
    pub user_messages: usize,
    /// Of those, image or file messages.
    pub messages_with_files: usize,
    /// Mean body length in characters.
    pub average_message_length: f64,
}

/// Stored file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// File id.
    pub id: String,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type.
    pub mime_type: String,
    /// Uploader.
    pub uploaded_by: String,
    /// Uploaded at.
    pub uploaded_at: DateTime<Utc>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A file to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    /// Uploader.
    pub user_id: String,
    /// Channel the file is shared in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type.
    pub mime_type: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Reference to a file on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// File.
    pub file_id: String,
    /// Acting user.
    pub user_id: String,
}

/// File search over a user's visible files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearch {
    /// Searching user.
    pub user_id: String,
    /// Matched against file names.
    pub query: String,
    /// Files carrying any of these tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Only this MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Page offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Replacement tags for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTagsUpdate {
    /// File.
    pub file_id: String,
    /// Acting user.
    pub user_id: String,
    /// New tags.
    pub tags: Vec<String>,
}

/// Upload totals of one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    /// Files uploaded.
    pub total_files: usize,
    /// Bytes uploaded.
    pub total_size: u64,
    /// Count per MIME top-level type, e.g. `image`.
    pub by_type: BTreeMap<String, usize>,
    /// Count per upload month, `YYYY-MM`.
    pub by_month: BTreeMap<String, usize>,
    /// Mean size in bytes.
    pub average_file_size: f64,
}

impl FileStats {
    /// Summarizes `files`.
    #[must_use]
    pub fn from_files(files: &[FileInfo]) -> Self {
        let mut stats = Self {
            total_files: files.len(),
            ..Self::default()
        };
        for file in files {
            stats.total_size += file.file_size;
            let kind = file
                .mime_type
                .split('/')
                .next()
                .filter(|kind| !kind.is_empty())
                .unwrap_or("unknown");
            *stats.by_type.entry(kind.to_string()).or_default() += 1;
            *stats
                .by_month
                .entry(file.uploaded_at.format("%Y-%m").to_string())
                .or_default() += 1;
        }
        if stats.total_files > 0 {
            stats.average_file_size = stats.total_size as f64 / stats.total_files as f64;
        }
        stats
    }
}

/// A resolved download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDownload {
    /// File.
    pub file_id: String,
    /// Original file name.
    pub file_name: String,
    /// Signed download URL.
    pub file_url: String,
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// New message.
    Message,
    /// Channel invitation.
    Invitation,
    /// Mention in a message.
    Mention,
    /// System announcement.
    System,
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification id.
    pub id: String,
    /// Recipient.
    pub user_id: String,
    /// Category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

/// A notification to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    /// Recipient.
    pub user_id: String,
    /// Category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Title, at most 100 characters.
    pub title: String,
    /// Body.
    pub body: String,
    /// Deep-link payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Per-user notification switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    /// Owner.
    pub user_id: String,
    /// New-message notifications.
    pub messages: bool,
    /// Mention notifications.
    pub mentions: bool,
    /// Invitation notifications.
    pub invitations: bool,
    /// System announcements.
    pub system: bool,
    /// Channels with notifications muted.
    #[serde(default)]
    pub muted_channels: Vec<String>,
}

/// The same notification for many recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkNotification {
    /// Sending user.
    pub sender_id: String,
    /// Recipients.
    pub user_ids: Vec<String>,
    /// Category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
}

/// Outcome of a bulk send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDelivery {
    /// Delivered notifications.
    pub sent: usize,
    /// Undelivered notifications.
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(size: u64, mime: &str, month: u32) -> FileInfo {
        FileInfo {
            id: format!("f{size}"),
            file_name: "a".to_string(),
            file_size: size,
            mime_type: mime.to_string(),
            uploaded_by: "u1".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2024, month, 3, 12, 0, 0).unwrap(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_file_stats_groups_by_type_and_month() {
        let stats = FileStats::from_files(&[
            file(100, "image/png", 1),
            file(300, "image/jpeg", 2),
            file(200, "", 2),
        ]);

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size, 600);
        assert_eq!(stats.by_type["image"], 2);
        assert_eq!(stats.by_type["unknown"], 1);
        assert_eq!(stats.by_month["2024-01"], 1);
        assert_eq!(stats.by_month["2024-02"], 2);
        assert!((stats.average_file_size - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_file_stats_empty() {
        let stats = FileStats::from_files(&[]);
        assert_eq!(stats.total_files, 0);
        assert!(stats.average_file_size.abs() < f64::EPSILON);
    }

    #[test]
    fn test_file_search_wire_shape() {
        let search = FileSearch {
            user_id: "u1".to_string(),
            query: "notes".to_string(),
            ..FileSearch::default()
        };
        assert_eq!(
            serde_json::to_value(&search).unwrap(),
            serde_json::json!({ "userId": "u1", "query": "notes" })
        );
    }
}
