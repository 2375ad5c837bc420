//! Application-wide constants
//!
//! Page sizes and the user-facing notification texts shared by the
//! session, the feed cache and the screen-owned queries.

/// Home feed page size
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Number of posts shown in the latest/trending strip
pub const DEFAULT_LATEST_LIMIT: usize = 7;

/// Notification texts
pub mod messages {
    pub const MISSING_FIELDS: &str = "Please fill in all the fields";
    pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
    pub const POST_UPLOADED: &str = "Post uploaded successfully";
    pub const POST_UPLOAD_FAILED: &str = "Some error occurred while uploading the post";
    pub const POST_DELETED: &str = "Post deleted successfully";
    pub const POST_DELETE_FAILED: &str = "Some error occurred while deleting the post";
    pub const PROFILE_UPDATED: &str = "Your profile has been updated successfully";
    pub const PASSWORD_CHANGED: &str = "Your password has been changed successfully";
    pub const WRONG_CURRENT_PASSWORD: &str = "Invalid credentials. Please check the current password.";
}
