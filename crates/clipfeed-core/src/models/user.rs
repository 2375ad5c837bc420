use serde::{Deserialize, Serialize};

/// The authenticated user's profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Profile fields to change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    /// Drop fields that already match `user`, so only real changes reach
    /// the gateway.
    pub fn changes_against(&self, user: &User) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username.clone().filter(|u| *u != user.username),
            bio: self.bio.clone().filter(|b| Some(b) != user.bio.as_ref()),
            avatar: self.avatar.clone().filter(|a| *a != user.avatar),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(ref username) = self.username {
            user.username = username.clone();
        }
        if let Some(ref bio) = self.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(ref avatar) = self.avatar {
            user.avatar = avatar.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            avatar: "avatar://ada".to_string(),
            bio: Some("hello".to_string()),
        }
    }

    #[test]
    fn test_changes_against_drops_unchanged_fields() {
        let update = ProfileUpdate {
            username: Some("ada".to_string()),
            bio: Some("new bio".to_string()),
            avatar: None,
        };
        let changes = update.changes_against(&user());
        assert_eq!(changes.username, None);
        assert_eq!(changes.bio.as_deref(), Some("new bio"));
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_no_changes_is_empty() {
        let update = ProfileUpdate {
            username: Some("ada".to_string()),
            bio: Some("hello".to_string()),
            avatar: Some("avatar://ada".to_string()),
        };
        assert!(update.changes_against(&user()).is_empty());
    }
}
