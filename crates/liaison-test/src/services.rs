//! A complete [`Services`] bundle backed by in-memory stubs.

use std::sync::Arc;

use chrono::Utc;
use liaison_controller::model::{
    ActivityQuery, BulkDelivery, BulkNotification, Channel, ChannelInvite, ChannelMembership,
    Credentials, FileDownload, FileInfo, FileRef, FileSearch, FileTagsUpdate, FileUpload, Message,
    MessageEdit, MessageRef, MessageSearch, NewChannel, NewMessage, NewNotification, Notification,
    NotificationPreferences, Registration, User, UserRef, UserUpdate,
};
use liaison_controller::{
    ChannelServices, FileServices, FnUseCase, MessageServices, NotificationServices, Services,
    UserServices,
};

use crate::fakes::{ActivityRecorder, PermissionFake};
use crate::fixtures;

/// Stub services with handles on the shared permission and activity fakes.
///
/// Every business use case answers deterministically from its input. Swap a
/// field of [`StubServices::services`] to script a specific one:
///
/// ```
/// use std::sync::Arc;
/// use liaison_core::OperationError;
/// use liaison_controller::model::{Credentials, User};
/// use liaison_test::{ScriptedUseCase, StubServices};
///
/// let mut stub = StubServices::new();
/// let authenticate = Arc::new(
///     ScriptedUseCase::<Credentials, User>::new().then_fail(OperationError::status(401, "bad password")),
/// );
/// stub.services.user.authenticate = authenticate.clone();
/// assert_eq!(authenticate.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct StubServices {
    /// Permission fake shared by all controllers.
    pub permissions: Arc<PermissionFake>,
    /// Activity recorder shared by all controllers.
    pub activity: Arc<ActivityRecorder>,
    /// The bundle handed to controllers.
    pub services: Services,
}

impl Default for StubServices {
    fn default() -> Self {
        Self::new()
    }
}

impl StubServices {
    /// Stubs that allow everything.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fakes(PermissionFake::allow_all(), ActivityRecorder::new())
    }

    /// Stubs using the given permission fake.
    #[must_use]
    pub fn with_permissions(permissions: PermissionFake) -> Self {
        Self::with_fakes(permissions, ActivityRecorder::new())
    }

    /// Stubs using the given fakes.
    #[must_use]
    pub fn with_fakes(permissions: PermissionFake, activity: ActivityRecorder) -> Self {
        let permissions = Arc::new(permissions);
        let activity = Arc::new(activity);
        let services = Services {
            permissions: permissions.clone(),
            activity: activity.clone(),
            user: user_stubs(),
            channel: channel_stubs(),
            message: message_stubs(),
            file: file_stubs(),
            notification: notification_stubs(),
        };
        Self {
            permissions,
            activity,
            services,
        }
    }

    /// Returns a clone of the bundle.
    #[must_use]
    pub fn services(&self) -> Services {
        self.services.clone()
    }
}

fn user_stubs() -> UserServices {
    UserServices {
        current_user: FnUseCase::shared(|()| async { Ok(Some(fixtures::user("u1"))) }),
        authenticate: FnUseCase::shared(|credentials: Credentials| async move {
            Ok(User {
                email: credentials.email,
                ..fixtures::user("u1")
            })
        }),
        register: FnUseCase::shared(|registration: Registration| async move {
            Ok(User {
                id: "u-new".to_string(),
                email: registration.email,
                name: registration.name,
                avatar_url: None,
            })
        }),
        update: FnUseCase::shared(|update: UserUpdate| async move {
            let mut user = fixtures::user(&update.user_id);
            if let Some(name) = update.name {
                user.name = name;
            }
            user.avatar_url = update.avatar_url;
            Ok(user)
        }),
        logout: FnUseCase::shared(|_: UserRef| async { Ok(()) }),
        activities: FnUseCase::shared(|query: ActivityQuery| async move {
            let limit = query.limit.map_or(usize::MAX, |n| n as usize);
            Ok(["USER_LOGIN", "MESSAGE_SEND", "USER_LOGOUT"]
                .into_iter()
                .filter(|action| query.activity.as_deref().map_or(true, |a| a == *action))
                .map(|action| fixtures::activity(&query.user_id, action))
                .take(limit)
                .collect())
        }),
        permissions: FnUseCase::shared(|_: UserRef| async {
            Ok(vec![
                fixtures::permission("channel:create"),
                fixtures::permission("message:send"),
            ])
        }),
    }
}

fn channel_stubs() -> ChannelServices {
    ChannelServices {
        create: FnUseCase::shared(|new: NewChannel| async move {
            let mut member_ids = vec![new.created_by.clone()];
            member_ids.extend(new.member_ids);
            Ok(Channel {
                id: "c1".to_string(),
                name: new.name,
                description: Some(new.description).filter(|d| !d.is_empty()),
                kind: new.kind,
                owner_id: new.created_by,
                member_ids,
            })
        }),
        invite: FnUseCase::shared(|invite: ChannelInvite| async move {
            let mut channel = fixtures::channel(&invite.channel_id, &invite.inviter_id);
            channel.member_ids.extend(invite.user_ids);
            Ok(channel)
        }),
        leave: FnUseCase::shared(|_: ChannelMembership| async { Ok(()) }),
    }
}

fn message_stubs() -> MessageServices {
    MessageServices {
        send: FnUseCase::shared(|new: NewMessage| async move {
            Ok(Message {
                kind: new.kind,
                reply_to: new.reply_to,
                ..fixtures::message("m1", &new.channel_id, &new.sender_id, &new.content)
            })
        }),
        edit: FnUseCase::shared(|edit: MessageEdit| async move {
            Ok(Message {
                edited_at: Some(Utc::now()),
                ..fixtures::message(&edit.message_id, "c1", &edit.user_id, &edit.content)
            })
        }),
        delete: FnUseCase::shared(|_: MessageRef| async { Ok(true) }),
        search: FnUseCase::shared(|search: MessageSearch| async move {
            Ok(vec![fixtures::message(
                "m1",
                &search.channel_id,
                "u1",
                &search.query,
            )])
        }),
    }
}

fn file_stubs() -> FileServices {
    FileServices {
        upload: FnUseCase::shared(|upload: FileUpload| async move {
            Ok(FileInfo {
                file_name: upload.file_name,
                file_size: upload.file_size,
                mime_type: upload.mime_type,
                tags: upload.tags,
                ..fixtures::file_info("f1", &upload.user_id)
            })
        }),
        download: FnUseCase::shared(|file: FileRef| async move {
            Ok(FileDownload {
                file_name: format!("{}.txt", file.file_id),
                file_url: format!("https://files.example.test/{}", file.file_id),
                file_id: file.file_id,
            })
        }),
        info: FnUseCase::shared(|file: FileRef| async move {
            Ok(fixtures::file_info(&file.file_id, &file.user_id))
        }),
        delete: FnUseCase::shared(|_: FileRef| async { Ok(()) }),
        search: FnUseCase::shared(|search: FileSearch| async move {
            Ok(["f1", "f2"]
                .into_iter()
                .map(|id| fixtures::file_info(id, "u1"))
                .filter(|file| file.file_name.contains(&search.query))
                .collect())
        }),
        uploaded_by: FnUseCase::shared(|user: UserRef| async move {
            Ok(vec![
                fixtures::file_info("f1", &user.user_id),
                FileInfo {
                    file_size: 512,
                    mime_type: "image/png".to_string(),
                    ..fixtures::file_info("f2", &user.user_id)
                },
            ])
        }),
        update_tags: FnUseCase::shared(|update: FileTagsUpdate| async move {
            Ok(FileInfo {
                tags: update.tags,
                ..fixtures::file_info(&update.file_id, &update.user_id)
            })
        }),
    }
}

fn notification_stubs() -> NotificationServices {
    NotificationServices {
        send: FnUseCase::shared(|new: NewNotification| async move {
            Ok(Notification {
                kind: new.kind,
                body: new.body,
                ..fixtures::notification("n1", &new.user_id, &new.title)
            })
        }),
        update_preferences: FnUseCase::shared(
            |preferences: NotificationPreferences| async move {
                Ok(preferences)
            },
        ),
        send_bulk: FnUseCase::shared(|bulk: BulkNotification| async move {
            Ok(BulkDelivery {
                sent: bulk.user_ids.len(),
                failed: 0,
            })
        }),
    }
}
