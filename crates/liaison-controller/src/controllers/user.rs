//! Account operations.

use futures_util::future::try_join;
use liaison_core::ClassifiedError;
use liaison_middleware::stages::{ValidationRule, ValidationSchema};
use serde_json::json;

use super::Access;
use crate::controller::Controller;
use crate::model::{
    ActivityQuery, Credentials, Registration, User, UserPermission, UserRef, UserStats, UserUpdate,
};
use crate::pipeline::ControllerCore;
use crate::services::{Services, UserServices};
use crate::settings::ControllerSettings;
use crate::usecase::{ActivityEntry, PermissionRequest};

/// Controller name.
pub const NAME: &str = "UserController";

/// Activities reported in [`UserStats::recent_activities`].
pub const RECENT_ACTIVITY_COUNT: usize = 10;

fn user_id_rules() -> Vec<ValidationRule> {
    vec![ValidationRule::required("userId").with_message("User ID is required")]
}

fn schema() -> ValidationSchema {
    ValidationSchema::new()
        .operation(
            "authenticateUser",
            vec![
                ValidationRule::required("email").with_message("Email is required"),
                ValidationRule::email("email").with_message("Email is not a valid address"),
                ValidationRule::required("password").with_message("Password is required"),
                ValidationRule::min_length("password", 6)
                    .with_message("Password must be at least 6 characters"),
            ],
        )
        .operation(
            "registerUser",
            vec![
                ValidationRule::required("email").with_message("Email is required"),
                ValidationRule::email("email").with_message("Email is not a valid address"),
                ValidationRule::required("password").with_message("Password is required"),
                ValidationRule::min_length("password", 6)
                    .with_message("Password must be at least 6 characters"),
                ValidationRule::required("name").with_message("Name is required"),
                ValidationRule::min_length("name", 2).with_message("Name must be at least 2 characters"),
            ],
        )
        .operation(
            "updateUser",
            vec![
                ValidationRule::required("userId").with_message("User ID is required"),
                ValidationRule::string("userId").with_message("User ID must be a string"),
            ],
        )
        .operation("getUserActivityLogs", user_id_rules())
        .operation("getUserPermissions", user_id_rules())
        .operation("getUserStats", user_id_rules())
}

fn user_ref(user_id: &str) -> UserRef {
    UserRef {
        user_id: user_id.to_string(),
    }
}

/// Sign-in, registration and profile operations.
pub struct UserController {
    core: ControllerCore,
    services: UserServices,
    access: Access,
}

impl std::fmt::Debug for UserController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserController").field("core", &self.core).finish_non_exhaustive()
    }
}

impl UserController {
    /// Creates the controller and registers its validation rules.
    pub fn new(settings: &ControllerSettings, services: &Services) -> Self {
        let core = ControllerCore::new(NAME, settings).with_schema(schema());
        let access = Access::new(services, core.logger());
        Self {
            core,
            services: services.user.clone(),
            access,
        }
    }

    /// Returns the signed-in user, if any.
    pub async fn get_current_user(&self) -> Result<Option<User>, ClassifiedError> {
        self.core
            .execute_with_tracking("getCurrentUser", &(), || async {
                let user = self.services.current_user.execute(()).await?;
                if let Some(user) = &user {
                    self.access
                        .record(ActivityEntry::new(&user.id, "USER_PROFILE_VIEW", "user").on(&user.id))
                        .await;
                }
                Ok(user)
            })
            .await
    }

    /// Signs a user in.
    pub async fn authenticate_user(&self, credentials: Credentials) -> Result<User, ClassifiedError> {
        self.core
            .execute_with_tracking("authenticateUser", &credentials, || async {
                let email = credentials.email.clone();
                let user = self.services.authenticate.execute(credentials.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&user.id, "USER_LOGIN", "user")
                            .on(&user.id)
                            .with_details(json!({ "email": email })),
                    )
                    .await;
                Ok(user)
            })
            .await
    }

    /// Creates an account.
    pub async fn register_user(&self, registration: Registration) -> Result<User, ClassifiedError> {
        self.core
            .execute_with_tracking("registerUser", &registration, || async {
                let user = self.services.register.execute(registration.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&user.id, "USER_REGISTER", "user")
                            .on(&user.id)
                            .with_details(json!({ "email": user.email, "name": user.name })),
                    )
                    .await;
                Ok(user)
            })
            .await
    }

    /// Changes a profile. Only the account itself may do this.
    pub async fn update_user(&self, update: UserUpdate) -> Result<User, ClassifiedError> {
        self.core
            .execute_as(Some(&update.user_id), "updateUser", &update, || async {
                self.access
                    .require(PermissionRequest::new(&update.user_id, "user", "update").on(&update.user_id))
                    .await?;
                let user = self.services.update.execute(update.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&user.id, "USER_PROFILE_UPDATE", "user")
                            .on(&user.id)
                            .with_details(json!({
                                "name": update.name.is_some(),
                                "avatarUrl": update.avatar_url.is_some(),
                            })),
                    )
                    .await;
                Ok(user)
            })
            .await
    }

    /// Signs a user out.
    pub async fn logout_user(&self, user_id: &str) -> Result<(), ClassifiedError> {
        let request = user_ref(user_id);
        self.core
            .execute_as(Some(user_id), "logoutUser", &request, || async {
                self.services.logout.execute(request.clone()).await?;
                self.access
                    .record(ActivityEntry::new(user_id, "USER_LOGOUT", "user").on(user_id))
                    .await;
                Ok(())
            })
            .await
    }

    /// Reads a user's activity log.
    pub async fn get_user_activity_logs(
        &self,
        query: ActivityQuery,
    ) -> Result<Vec<ActivityEntry>, ClassifiedError> {
        self.core
            .execute_as(Some(&query.user_id), "getUserActivityLogs", &query, || async {
                self.services.activities.execute(query.clone()).await
            })
            .await
    }

    /// Lists a user's granted permissions.
    pub async fn get_user_permissions(&self, user_id: &str) -> Result<Vec<UserPermission>, ClassifiedError> {
        let request = user_ref(user_id);
        self.core
            .execute_as(Some(user_id), "getUserPermissions", &request, || async {
                self.services.permissions.execute(request.clone()).await
            })
            .await
    }

    /// Summarizes a user's activity log and permissions.
    ///
    /// Both are read concurrently; either failing fails the operation.
    pub async fn get_user_stats(&self, user_id: &str) -> Result<UserStats, ClassifiedError> {
        let request = user_ref(user_id);
        self.core
            .execute_as(Some(user_id), "getUserStats", &request, || async {
                let query = ActivityQuery {
                    user_id: user_id.to_string(),
                    ..ActivityQuery::default()
                };
                let (activities, permissions) = try_join(
                    self.services.activities.execute(query),
                    self.services.permissions.execute(request.clone()),
                )
                .await?;
                Ok(UserStats {
                    total_activities: activities.len(),
                    recent_activities: activities.into_iter().take(RECENT_ACTIVITY_COUNT).collect(),
                    total_permissions: permissions.len(),
                    permissions: permissions.into_iter().map(|p| p.permission).collect(),
                })
            })
            .await
    }
}

impl Controller for UserController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }
}
