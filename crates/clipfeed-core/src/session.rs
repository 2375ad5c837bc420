//! Authenticated identity shared by everything downstream.
//!
//! The feed cache and the screen queries stay inert until a session
//! resolves to a user. Only the auth flows below mutate it.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::constants::messages;
use crate::error::CoreError;
use crate::gateway::{GatewayError, PostGateway};
use crate::models::{
    Notification, NotificationSlot, PasswordChange, ProfileUpdate, SignInForm, SignUpForm, User,
};

#[derive(Clone)]
pub struct Session {
    gateway: Arc<dyn PostGateway>,
    user: Arc<RwLock<Option<User>>>,
    /// Outcome of the account-settings flows
    notification: Arc<Mutex<NotificationSlot>>,
}

impl Session {
    pub fn new(gateway: Arc<dyn PostGateway>) -> Self {
        Self {
            gateway,
            user: Arc::new(RwLock::new(None)),
            notification: Arc::new(Mutex::new(NotificationSlot::default())),
        }
    }

    /// Ask the gateway who is signed in. A failing lookup resolves to
    /// signed-out.
    pub async fn resolve(&self) -> Option<User> {
        let user = match self.gateway.current_user().await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "failed to resolve current user");
                None
            }
        };
        tracing::info!(signed_in = user.is_some(), "session resolved");
        *self.user.write() = user.clone();
        user
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.read().is_some()
    }

    pub fn require_user(&self) -> Result<User, CoreError> {
        self.current_user().ok_or(CoreError::NotSignedIn)
    }

    pub async fn sign_in(&self, form: &SignInForm) -> Result<User, CoreError> {
        form.validate()?;
        let user = self.gateway.sign_in(form.email.trim(), &form.password).await?;
        tracing::info!(user_id = %user.id, "signed in");
        *self.user.write() = Some(user.clone());
        Ok(user)
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<User, CoreError> {
        form.validate()?;
        let user = self
            .gateway
            .create_account(form.email.trim(), &form.password, form.username.trim())
            .await?;
        tracing::info!(user_id = %user.id, "account created");
        *self.user.write() = Some(user.clone());
        Ok(user)
    }

    /// End the remote session and forget the identity. The identity is
    /// cleared even when the gateway call fails.
    pub async fn sign_out(&self) -> Result<(), CoreError> {
        let result = self.gateway.sign_out().await;
        *self.user.write() = None;
        result.map_err(CoreError::from)
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notification.lock().current().cloned()
    }

    pub fn dismiss_notification(&self) {
        self.notification.lock().dismiss();
    }

    fn show(&self, notification: Notification) {
        self.notification.lock().show(notification);
    }

    /// Send the fields that actually changed, then reload the current user.
    /// Returns `false` when nothing changed.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<bool, CoreError> {
        let user = self.require_user()?;
        let changes = update.changes_against(&user);
        if changes.is_empty() {
            return Ok(false);
        }

        if let Err(err) = self.gateway.update_profile(&user.id, &changes).await {
            tracing::warn!(user_id = %user.id, error = %err, "profile update failed");
            self.show(Notification::error(err.message()));
            return Err(err.into());
        }
        match self.gateway.current_user().await {
            Ok(Some(refreshed)) => *self.user.write() = Some(refreshed),
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "failed to reload profile after update"),
        }
        self.show(Notification::success(messages::PROFILE_UPDATED));
        Ok(true)
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), CoreError> {
        if let Err(err) = change.validate() {
            self.show(Notification::validation(err.to_string()));
            return Err(err.into());
        }
        self.require_user()?;

        match self.gateway.change_password(&change.new, &change.current).await {
            Ok(()) => {
                self.show(Notification::success(messages::PASSWORD_CHANGED));
                Ok(())
            }
            Err(err) => {
                let message = match err {
                    GatewayError::InvalidCredentials => {
                        messages::WRONG_CURRENT_PASSWORD.to_string()
                    }
                    _ => err.message(),
                };
                tracing::warn!(error = %err, "password change failed");
                self.show(Notification::error(message));
                Err(err.into())
            }
        }
    }
}
