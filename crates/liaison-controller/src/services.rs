//! Use cases injected into the concrete controllers.

use std::fmt;

use crate::model::{
    ActivityQuery, BulkDelivery, BulkNotification, Channel, ChannelInvite, ChannelMembership,
    Credentials, FileDownload, FileInfo, FileRef, FileSearch, FileTagsUpdate, FileUpload, Message,
    MessageEdit, MessageRef, MessageSearch, NewChannel, NewMessage, NewNotification, Notification,
    NotificationPreferences, Registration, User, UserPermission, UserRef, UserUpdate,
};
use crate::usecase::{ActivityEntry, PermissionDecision, PermissionRequest, SharedUseCase};

/// Account use cases.
#[derive(Clone)]
pub struct UserServices {
    /// Resolves the signed-in user, if any.
    pub current_user: SharedUseCase<(), Option<User>>,
    /// Signs a user in.
    pub authenticate: SharedUseCase<Credentials, User>,
    /// Creates an account.
    pub register: SharedUseCase<Registration, User>,
    /// Changes a profile.
    pub update: SharedUseCase<UserUpdate, User>,
    /// Signs a user out.
    pub logout: SharedUseCase<UserRef, ()>,
    /// Reads a user's activity log, newest first.
    pub activities: SharedUseCase<ActivityQuery, Vec<ActivityEntry>>,
    /// Lists a user's granted permissions.
    pub permissions: SharedUseCase<UserRef, Vec<UserPermission>>,
}

/// Channel use cases.
#[derive(Clone)]
pub struct ChannelServices {
    /// Creates a channel.
    pub create: SharedUseCase<NewChannel, Channel>,
    /// Adds users to a channel.
    pub invite: SharedUseCase<ChannelInvite, Channel>,
    /// Removes a member from a channel.
    pub leave: SharedUseCase<ChannelMembership, ()>,
}

/// Message use cases.
#[derive(Clone)]
pub struct MessageServices {
    /// Sends a message.
    pub send: SharedUseCase<NewMessage, Message>,
    /// Edits a message.
    pub edit: SharedUseCase<MessageEdit, Message>,
    /// Deletes a message, reporting whether it existed.
    pub delete: SharedUseCase<MessageRef, bool>,
    /// Searches a channel.
    pub search: SharedUseCase<MessageSearch, Vec<Message>>,
}

/// File use cases.
#[derive(Clone)]
pub struct FileServices {
    /// Stores a file.
    pub upload: SharedUseCase<FileUpload, FileInfo>,
    /// Resolves a download URL.
    pub download: SharedUseCase<FileRef, FileDownload>,
    /// Reads file metadata.
    pub info: SharedUseCase<FileRef, FileInfo>,
    /// Deletes a file.
    pub delete: SharedUseCase<FileRef, ()>,
    /// Searches files by name, tags and type.
    pub search: SharedUseCase<FileSearch, Vec<FileInfo>>,
    /// Lists the files a user uploaded.
    pub uploaded_by: SharedUseCase<UserRef, Vec<FileInfo>>,
    /// Replaces a file's tags.
    pub update_tags: SharedUseCase<FileTagsUpdate, FileInfo>,
}

/// Notification use cases.
#[derive(Clone)]
pub struct NotificationServices {
    /// Sends one notification.
    pub send: SharedUseCase<NewNotification, Notification>,
    /// Stores notification preferences.
    pub update_preferences: SharedUseCase<NotificationPreferences, NotificationPreferences>,
    /// Sends one notification to many users.
    pub send_bulk: SharedUseCase<BulkNotification, BulkDelivery>,
}

/// Everything the standard controllers delegate to.
#[derive(Clone)]
pub struct Services {
    /// Permission checks shared by all controllers.
    pub permissions: SharedUseCase<PermissionRequest, PermissionDecision>,
    /// Activity log shared by all controllers.
    pub activity: SharedUseCase<ActivityEntry, ()>,
    /// Account use cases.
    pub user: UserServices,
    /// Channel use cases.
    pub channel: ChannelServices,
    /// Message use cases.
    pub message: MessageServices,
    /// File use cases.
    pub file: FileServices,
    /// Notification use cases.
    pub notification: NotificationServices,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
