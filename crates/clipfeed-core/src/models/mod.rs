pub mod engagement;
pub mod forms;
pub mod notification;
pub mod post;
pub mod user;

pub use engagement::EngagementState;
pub use forms::{MediaAsset, NewPost, PasswordChange, PostForm, SignInForm, SignUpForm, ValidationError};
pub use notification::{Notification, NotificationKind, NotificationSlot};
pub use post::{Creator, Post};
pub use user::{ProfileUpdate, User};
