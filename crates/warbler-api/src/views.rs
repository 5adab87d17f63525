//! HTML views. Templates live in `templates/` and are compiled by askama.

use askama::Template;
use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tracing::{error, warn};

use warbler_db::{MessageRow, UserRow, UserStats};
use warbler_types::session::Flash;

use crate::session::Session;

/// Render a template into a 200 response.
pub fn render<T: Template>(template: &T) -> Result<Response, StatusCode> {
    template
        .render()
        .map(|html| Html(html).into_response())
        .map_err(|e| {
            error!("Template render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// 302 Found to `to`.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" in UTC.
pub fn format_timestamp(raw: &str) -> String {
    match chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(ts) => ts.format("%d %B %Y").to_string(),
        Err(e) => {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            raw.to_string()
        }
    }
}

/// What every page's base template needs.
pub struct Layout {
    pub current_user: Option<UserRow>,
    pub flashes: Vec<Flash>,
}

impl Layout {
    /// Takes the session's pending flashes; they are shown exactly once.
    pub fn new(session: &Session, current_user: Option<UserRow>) -> Self {
        Self {
            current_user,
            flashes: session.take_flashes(),
        }
    }
}

pub struct MessageView {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub username: String,
    pub image_url: String,
    pub liked: bool,
    /// Logged in and not the author.
    pub can_like: bool,
}

impl MessageView {
    pub fn new(row: MessageRow, viewer: Option<&UserRow>, liked_ids: &[i64]) -> Self {
        Self {
            liked: liked_ids.contains(&row.id),
            can_like: viewer.is_some_and(|v| v.id != row.user_id),
            timestamp: format_timestamp(&row.timestamp),
            id: row.id,
            text: row.text,
            user_id: row.user_id,
            username: row.username,
            image_url: row.image_url,
        }
    }

    pub fn list(rows: Vec<MessageRow>, viewer: Option<&UserRow>, liked_ids: &[i64]) -> Vec<Self> {
        rows.into_iter()
            .map(|row| Self::new(row, viewer, liked_ids))
            .collect()
    }
}

pub struct UserCard {
    pub id: i64,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: String,
    /// Viewer follows this user.
    pub followed: bool,
    /// Viewer is logged in and is not this user.
    pub can_follow: bool,
}

impl UserCard {
    pub fn new(user: UserRow, viewer: Option<&UserRow>, followed_ids: &[i64]) -> Self {
        Self {
            followed: followed_ids.contains(&user.id),
            can_follow: viewer.is_some_and(|v| v.id != user.id),
            id: user.id,
            username: user.username,
            image_url: user.image_url,
            header_image_url: user.header_image_url,
            bio: user.bio.unwrap_or_default(),
        }
    }

    pub fn list(users: Vec<UserRow>, viewer: Option<&UserRow>, followed_ids: &[i64]) -> Vec<Self> {
        users
            .into_iter()
            .map(|u| Self::new(u, viewer, followed_ids))
            .collect()
    }
}

/// Profile header shared by the user pages.
pub struct Profile {
    pub user: UserRow,
    pub stats: UserStats,
    pub is_self: bool,
    pub is_following: bool,
    pub logged_in: bool,
}

// -- Pages --

#[derive(Template)]
#[template(path = "home-anon.html")]
pub struct AnonHomeTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub user: UserRow,
    pub stats: UserStats,
    pub messages: Vec<MessageView>,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub layout: Layout,
    pub username: String,
    pub email: String,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub username: String,
}

#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UserIndexTemplate {
    pub layout: Layout,
    pub q: String,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "users/show.html")]
pub struct UserShowTemplate {
    pub layout: Layout,
    pub profile: Profile,
    pub messages: Vec<MessageView>,
}

/// Following and followers pages.
#[derive(Template)]
#[template(path = "users/connections.html")]
pub struct ConnectionsTemplate {
    pub layout: Layout,
    pub profile: Profile,
    pub title: &'static str,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "users/likes.html")]
pub struct LikesTemplate {
    pub layout: Layout,
    pub profile: Profile,
    pub messages: Vec<MessageView>,
}

#[derive(Template)]
#[template(path = "messages/new.html")]
pub struct NewMessageTemplate {
    pub layout: Layout,
    pub text: String,
}

#[derive(Template)]
#[template(path = "messages/show.html")]
pub struct MessageShowTemplate {
    pub layout: Layout,
    pub message: MessageView,
    pub can_delete: bool,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}
