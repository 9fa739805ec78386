//! Channel operations.

use liaison_core::ClassifiedError;
use liaison_middleware::stages::{ValidationRule, ValidationSchema};
use serde_json::json;

use super::Access;
use crate::controller::Controller;
use crate::model::{Channel, ChannelInvite, ChannelMembership, NewChannel};
use crate::pipeline::ControllerCore;
use crate::services::{ChannelServices, Services};
use crate::settings::ControllerSettings;
use crate::usecase::{ActivityEntry, PermissionRequest};

/// Controller name.
pub const NAME: &str = "ChannelController";

fn schema() -> ValidationSchema {
    ValidationSchema::new()
        .operation(
            "createChannel",
            vec![
                ValidationRule::required("name").with_message("Channel name is required"),
                ValidationRule::min_length("name", 1)
                    .with_message("Channel name must be at least 1 character"),
                ValidationRule::max_length("name", 50)
                    .with_message("Channel name must be at most 50 characters"),
                ValidationRule::max_length("description", 200)
                    .with_message("Channel description must be at most 200 characters"),
            ],
        )
        .operation(
            "inviteToChannel",
            vec![
                ValidationRule::required("channelId").with_message("Channel ID is required"),
                ValidationRule::required("inviterId").with_message("Inviter ID is required"),
            ],
        )
        .operation(
            "leaveChannel",
            vec![
                ValidationRule::required("channelId").with_message("Channel ID is required"),
                ValidationRule::required("userId").with_message("User ID is required"),
            ],
        )
}

/// Channel lifecycle and membership operations.
pub struct ChannelController {
    core: ControllerCore,
    services: ChannelServices,
    access: Access,
}

impl std::fmt::Debug for ChannelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelController").field("core", &self.core).finish_non_exhaustive()
    }
}

impl ChannelController {
    /// Creates the controller and registers its validation rules.
    pub fn new(settings: &ControllerSettings, services: &Services) -> Self {
        let core = ControllerCore::new(NAME, settings).with_schema(schema());
        let access = Access::new(services, core.logger());
        Self {
            core,
            services: services.channel.clone(),
            access,
        }
    }

    /// Creates a channel owned by `channel.created_by`.
    pub async fn create_channel(&self, channel: NewChannel) -> Result<Channel, ClassifiedError> {
        self.core
            .execute_as(Some(&channel.created_by), "createChannel", &channel, || async {
                self.access
                    .require(PermissionRequest::new(&channel.created_by, "channel", "create"))
                    .await?;
                let created = self.services.create.execute(channel.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&channel.created_by, "CHANNEL_CREATE", "channel")
                            .on(&created.id)
                            .with_details(json!({
                                "name": created.name,
                                "type": created.kind,
                                "members": created.member_ids.len(),
                            })),
                    )
                    .await;
                Ok(created)
            })
            .await
    }

    /// Adds users to a channel.
    pub async fn invite_to_channel(&self, invite: ChannelInvite) -> Result<Channel, ClassifiedError> {
        self.core
            .execute_as(Some(&invite.inviter_id), "inviteToChannel", &invite, || async {
                self.access
                    .require(
                        PermissionRequest::new(&invite.inviter_id, "channel", "invite")
                            .on(&invite.channel_id),
                    )
                    .await?;
                let channel = self.services.invite.execute(invite.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&invite.inviter_id, "CHANNEL_INVITE", "channel")
                            .on(&invite.channel_id)
                            .with_details(json!({ "invited": invite.user_ids })),
                    )
                    .await;
                Ok(channel)
            })
            .await
    }

    /// Removes `user_id` from a channel.
    pub async fn leave_channel(&self, channel_id: &str, user_id: &str) -> Result<(), ClassifiedError> {
        let membership = ChannelMembership {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.core
            .execute_as(Some(user_id), "leaveChannel", &membership, || async {
                self.services.leave.execute(membership.clone()).await?;
                self.access
                    .record(ActivityEntry::new(user_id, "CHANNEL_LEAVE", "channel").on(channel_id))
                    .await;
                Ok(())
            })
            .await
    }
}

impl Controller for ChannelController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }
}
