//! Canned domain values.
//!
//! Timestamps are the Unix epoch so fixtures compare equal across runs.

use chrono::{DateTime, Utc};
use liaison_controller::model::{
    Channel, ChannelKind, Credentials, FileInfo, Message, MessageKind, NewChannel, NewMessage,
    Notification, NotificationKind, Registration, User, UserPermission,
};
use liaison_controller::ActivityEntry;

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// A user with a derived email and name.
#[must_use]
pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.test"),
        name: format!("User {id}"),
        avatar_url: None,
    }
}

/// Valid sign-in credentials.
#[must_use]
pub fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: "hunter22".to_string(),
    }
}

/// A valid registration.
#[must_use]
pub fn registration(email: &str, name: &str) -> Registration {
    Registration {
        email: email.to_string(),
        password: "hunter22".to_string(),
        name: name.to_string(),
    }
}

/// A public channel owned by `owner_id`.
#[must_use]
pub fn channel(id: &str, owner_id: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: format!("channel-{id}"),
        description: None,
        kind: ChannelKind::Public,
        owner_id: owner_id.to_string(),
        member_ids: vec![owner_id.to_string()],
    }
}

/// A public channel request.
#[must_use]
pub fn new_channel(name: &str, created_by: &str) -> NewChannel {
    NewChannel {
        name: name.to_string(),
        description: String::new(),
        kind: ChannelKind::Public,
        created_by: created_by.to_string(),
        member_ids: Vec::new(),
    }
}

/// A text message.
#[must_use]
pub fn message(id: &str, channel_id: &str, sender_id: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        channel_id: channel_id.to_string(),
        sender_id: sender_id.to_string(),
        content: content.to_string(),
        kind: MessageKind::Text,
        reply_to: None,
        created_at: epoch(),
        edited_at: None,
    }
}

/// A text message request.
#[must_use]
pub fn new_message(channel_id: &str, sender_id: &str, content: &str) -> NewMessage {
    NewMessage {
        channel_id: channel_id.to_string(),
        sender_id: sender_id.to_string(),
        content: content.to_string(),
        kind: MessageKind::Text,
        reply_to: None,
        metadata: None,
    }
}

/// File metadata.
#[must_use]
pub fn file_info(id: &str, uploaded_by: &str) -> FileInfo {
    FileInfo {
        id: id.to_string(),
        file_name: format!("{id}.txt"),
        file_size: 128,
        mime_type: "text/plain".to_string(),
        uploaded_by: uploaded_by.to_string(),
        uploaded_at: epoch(),
        tags: Vec::new(),
    }
}

/// An activity log entry stamped at [`fixture_time`].
#[must_use]
pub fn activity(user_id: &str, action: &str) -> ActivityEntry {
    ActivityEntry {
        timestamp: epoch(),
        ..ActivityEntry::new(user_id, action, "user")
    }
}

/// A granted permission.
#[must_use]
pub fn permission(name: &str) -> UserPermission {
    UserPermission {
        permission: name.to_string(),
        resource_id: None,
        granted_at: epoch(),
    }
}

/// A delivered notification.
#[must_use]
pub fn notification(id: &str, user_id: &str, title: &str) -> Notification {
    Notification {
        id: id.to_string(),
        user_id: user_id.to_string(),
        kind: NotificationKind::System,
        title: title.to_string(),
        body: String::new(),
        created_at: epoch(),
    }
}

/// Timestamp used by every fixture.
#[must_use]
pub fn fixture_time() -> DateTime<Utc> {
    epoch()
}
