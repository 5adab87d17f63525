use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::{debug, info, warn};

use warbler_db::{Database, UserRow};
use warbler_types::api::UserSearch;

use crate::auth::AppState;
use crate::{parse_id, run_db};
use crate::session::{CurrentUser, Session, unauthorized};
use crate::views::{
    ConnectionsTemplate, Layout, LikesTemplate, MessageView, Profile, UserCard,
    UserIndexTemplate, UserShowTemplate, redirect, render,
};

const PROFILE_MESSAGE_LIMIT: u32 = 100;

/// GET /users — everyone, or usernames containing `?q=`.
pub async fn list_users(
    State(state): State<AppState>,
    Query(search): Query<UserSearch>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let q = search.q.map(|q| q.trim().to_string()).unwrap_or_default();
    let viewer_id = viewer.as_ref().map(|v| v.id);

    let term = q.clone();
    let (users, followed) = run_db(&state, move |db| {
        let users = db.list_users(Some(term.as_str()).filter(|t| !t.is_empty()))?;
        Ok((users, followed_ids(db, viewer_id)?))
    })
    .await?;

    let users = UserCard::list(users, viewer.as_ref(), &followed);
    render(&UserIndexTemplate {
        layout: Layout::new(&session, viewer),
        q,
        users,
    })
}

/// GET /users/{id} — profile with the user's messages.
pub async fn show_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let user_id = parse_id(&raw_id)?;
    let profile = load_profile(&state, user_id, viewer.as_ref()).await?;

    let viewer_id = viewer.as_ref().map(|v| v.id);
    let (rows, liked) = run_db(&state, move |db| {
        let rows = db.user_messages(user_id, PROFILE_MESSAGE_LIMIT)?;
        let liked = match viewer_id {
            Some(uid) => db.liked_message_ids(uid)?,
            None => Vec::new(),
        };
        Ok((rows, liked))
    })
    .await?;

    let messages = MessageView::list(rows, viewer.as_ref(), &liked);
    render(&UserShowTemplate {
        layout: Layout::new(&session, viewer),
        profile,
        messages,
    })
}

/// GET /users/{id}/following
pub async fn show_following(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let user_id = parse_id(&raw_id)?;
    connections(state, user_id, session, viewer, Connection::Following).await
}

/// GET /users/{id}/followers
pub async fn show_followers(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let user_id = parse_id(&raw_id)?;
    connections(state, user_id, session, viewer, Connection::Followers).await
}

#[derive(Clone, Copy)]
enum Connection {
    Following,
    Followers,
}

async fn connections(
    state: AppState,
    user_id: i64,
    session: Session,
    viewer: Option<UserRow>,
    which: Connection,
) -> Result<Response, StatusCode> {
    let Some(viewer) = viewer else {
        return Ok(unauthorized(&session));
    };

    let profile = load_profile(&state, user_id, Some(&viewer)).await?;

    let viewer_id = viewer.id;
    let (users, followed) = run_db(&state, move |db| {
        let users = match which {
            Connection::Following => db.following(user_id)?,
            Connection::Followers => db.followers(user_id)?,
        };
        Ok((users, followed_ids(db, Some(viewer_id))?))
    })
    .await?;

    let title = match which {
        Connection::Following => "Following",
        Connection::Followers => "Followers",
    };
    let users = UserCard::list(users, Some(&viewer), &followed);
    render(&ConnectionsTemplate {
        layout: Layout::new(&session, Some(viewer)),
        profile,
        title,
        users,
    })
}

/// GET /users/{id}/likes — messages the user liked.
pub async fn show_likes(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let user_id = parse_id(&raw_id)?;
    let Some(viewer) = viewer else {
        return Ok(unauthorized(&session));
    };

    let profile = load_profile(&state, user_id, Some(&viewer)).await?;

    let viewer_id = viewer.id;
    let (rows, liked) = run_db(&state, move |db| {
        Ok((db.liked_messages(user_id)?, db.liked_message_ids(viewer_id)?))
    })
    .await?;

    let messages = MessageView::list(rows, Some(&viewer), &liked);
    render(&LikesTemplate {
        layout: Layout::new(&session, Some(viewer)),
        profile,
        messages,
    })
}

/// POST /users/follow/{id}
pub async fn follow(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let followed_id = parse_id(&raw_id)?;
    let Some(viewer) = viewer else {
        return Ok(unauthorized(&session));
    };

    let uid = viewer.id;
    let found = run_db(&state, move |db| {
        if db.get_user_by_id(followed_id)?.is_none() {
            return Ok(false);
        }
        if !db.follow_once(uid, followed_id)? {
            debug!("User #{} already follows #{}", uid, followed_id);
        }
        Ok(true)
    })
    .await?;
    if !found {
        return Err(StatusCode::NOT_FOUND);
    }

    info!("User #{} followed #{}", uid, followed_id);
    Ok(redirect(&format!("/users/{}/following", uid)))
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let followed_id = parse_id(&raw_id)?;
    let Some(viewer) = viewer else {
        return Ok(unauthorized(&session));
    };

    let uid = viewer.id;
    if !run_db(&state, move |db| db.unfollow(uid, followed_id)).await? {
        warn!("User #{} was not following #{}", uid, followed_id);
    }

    Ok(redirect(&format!("/users/{}/following", uid)))
}

/// POST /users/delete — removes the logged-in account and everything it owns.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let Some(viewer) = viewer else {
        return Ok(unauthorized(&session));
    };

    let uid = viewer.id;
    run_db(&state, move |db| db.delete_user(uid)).await?;
    session.logout();

    Ok(redirect("/signup"))
}

/// Profile header data for `user_id` as seen by `viewer`; 404 if unknown.
async fn load_profile(
    state: &AppState,
    user_id: i64,
    viewer: Option<&UserRow>,
) -> Result<Profile, StatusCode> {
    let viewer_id = viewer.map(|v| v.id);
    let (user, stats, is_following) = run_db(state, move |db| {
        let Some(user) = db.get_user_by_id(user_id)? else {
            return Ok((None, Default::default(), false));
        };
        let stats = db.user_stats(user_id)?;
        let is_following = match viewer_id {
            Some(vid) => db.is_following(vid, user_id)?,
            None => false,
        };
        Ok((Some(user), stats, is_following))
    })
    .await?;

    let user = user.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Profile {
        is_self: viewer_id == Some(user.id),
        logged_in: viewer_id.is_some(),
        user,
        stats,
        is_following,
    })
}

fn followed_ids(db: &Database, viewer_id: Option<i64>) -> warbler_db::Result<Vec<i64>> {
    match viewer_id {
        Some(uid) => Ok(db.following(uid)?.into_iter().map(|u| u.id).collect()),
        None => Ok(Vec::new()),
    }
}
