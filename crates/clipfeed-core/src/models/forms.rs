//! User-entered forms and their local validation.
//!
//! Validation failures never reach the gateway; they surface directly as a
//! `Validation` notification at the call site.

use serde::{Deserialize, Serialize};

use crate::constants::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", messages::MISSING_FIELDS)]
    MissingFields,
    #[error("{}", messages::PASSWORD_MISMATCH)]
    PasswordMismatch,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A picked media file awaiting upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub uri: String,
    pub mime_type: String,
}

/// The create-post form as the user filled it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub prompt: String,
    pub thumbnail: Option<MediaAsset>,
    pub video: Option<MediaAsset>,
}

/// A validated post ready to be written by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub prompt: String,
    pub thumbnail: MediaAsset,
    pub video: MediaAsset,
    pub creator_id: String,
}

impl PostForm {
    pub fn validate(&self, creator_id: &str) -> Result<NewPost, ValidationError> {
        match (&self.thumbnail, &self.video) {
            (Some(thumbnail), Some(video))
                if !is_blank(&self.title) && !is_blank(&self.prompt) =>
            {
                Ok(NewPost {
                    title: self.title.trim().to_string(),
                    prompt: self.prompt.trim().to_string(),
                    thumbnail: thumbnail.clone(),
                    video: video.clone(),
                    creator_id: creator_id.to_string(),
                })
            }
            _ => Err(ValidationError::MissingFields),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.email) || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.username) || is_blank(&self.email) || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub repeat: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.current.is_empty() || self.new.is_empty() || self.repeat.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if self.new != self.repeat {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(uri: &str) -> MediaAsset {
        MediaAsset {
            uri: uri.to_string(),
            mime_type: "video/mp4".to_string(),
        }
    }

    #[test]
    fn test_post_form_requires_every_field() {
        let mut form = PostForm {
            title: "Sunset".to_string(),
            prompt: "a sunset over the sea".to_string(),
            thumbnail: Some(asset("file:///thumb.png")),
            video: None,
        };
        assert_eq!(form.validate("u1"), Err(ValidationError::MissingFields));

        form.video = Some(asset("file:///clip.mp4"));
        form.title = "   ".to_string();
        assert_eq!(form.validate("u1"), Err(ValidationError::MissingFields));

        form.title = " Sunset ".to_string();
        let post = form.validate("u1").unwrap();
        assert_eq!(post.title, "Sunset");
        assert_eq!(post.creator_id, "u1");
    }

    #[test]
    fn test_password_change_rules() {
        let change = PasswordChange {
            current: "old".to_string(),
            new: "new-secret".to_string(),
            repeat: "".to_string(),
        };
        assert_eq!(change.validate(), Err(ValidationError::MissingFields));

        let change = PasswordChange {
            repeat: "other".to_string(),
            ..change
        };
        assert_eq!(change.validate(), Err(ValidationError::PasswordMismatch));
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "Passwords do not match"
        );

        let change = PasswordChange {
            repeat: "new-secret".to_string(),
            ..change
        };
        assert!(change.validate().is_ok());
    }

    #[test]
    fn test_sign_up_requires_all_fields() {
        let form = SignUpForm {
            username: "ada".to_string(),
            email: "".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingFields));
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "Please fill in all the fields"
        );
    }
}
