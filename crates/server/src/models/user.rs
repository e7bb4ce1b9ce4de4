//! User account model.

use chrono::{DateTime, Utc};
use foodgram_core::{Email, UserId};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Path of the avatar image relative to the media root.
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}
