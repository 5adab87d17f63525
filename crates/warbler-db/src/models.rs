//! Row types. These map directly to SQLite rows and stay independent of the
//! HTTP layer's types.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

impl fmt::Display for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User #{}: {}, {}>", self.id, self.username, self.email)
    }
}

/// A user built by [`NewUser::signup`] that has not been inserted yet.
///
/// `username` and `email` stay optional so that a missing value reaches the
/// store and fails its NOT NULL constraint, like a duplicate fails UNIQUE.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub image_url: Option<String>,
}

/// A message joined with its author's username and avatar.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub username: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: Option<i64>,
    pub text: String,
    pub user_id: i64,
}

impl NewMessage {
    pub fn new(text: impl Into<String>, user_id: i64) -> Self {
        Self {
            id: None,
            text: text.into(),
            user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRow {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub messages: i64,
    pub following: i64,
    pub followers: i64,
    pub likes: i64,
}
