use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    Success,
    Error,
    Validation,
}

/// A modal, one-shot message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Validation,
            message: message.into(),
        }
    }
}

/// Holds at most one visible notification. Showing a new one replaces the
/// current one; there is no queue and no history.
#[derive(Debug, Clone, Default)]
pub struct NotificationSlot {
    current: Option<Notification>,
}

impl NotificationSlot {
    pub fn show(&mut self, notification: Notification) {
        self.current = Some(notification);
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_replaces_and_dismiss_clears() {
        let mut slot = NotificationSlot::default();
        assert!(slot.current().is_none());

        slot.show(Notification::error("first"));
        slot.show(Notification::success("second"));
        assert_eq!(slot.current().map(|n| n.message.as_str()), Some("second"));

        slot.dismiss();
        assert!(slot.current().is_none());

        // Dismissing an empty slot is fine
        slot.dismiss();
        assert!(slot.current().is_none());
    }
}
