use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::info;

use warbler_db::NewMessage;
use warbler_types::api::{MAX_MESSAGE_LEN, MessageForm};

use crate::auth::AppState;
use crate::{parse_id, run_db};
use crate::session::{CurrentUser, Session, unauthorized};
use crate::views::{
    AnonHomeTemplate, HomeTemplate, Layout, MessageShowTemplate, MessageView, NewMessageTemplate,
    redirect, render,
};

const TIMELINE_LIMIT: u32 = 100;

/// GET / — landing page for visitors, timeline for members.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let Some(user) = user else {
        return render(&AnonHomeTemplate {
            layout: Layout::new(&session, None),
        });
    };

    let uid = user.id;
    let (rows, stats, liked) = run_db(&state, move |db| {
        Ok((
            db.timeline(uid, TIMELINE_LIMIT)?,
            db.user_stats(uid)?,
            db.liked_message_ids(uid)?,
        ))
    })
    .await?;

    let messages = MessageView::list(rows, Some(&user), &liked);
    render(&HomeTemplate {
        layout: Layout::new(&session, Some(user.clone())),
        user,
        stats,
        messages,
    })
}

pub async fn new_message_form(
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    if user.is_none() {
        return Ok(unauthorized(&session));
    }
    render(&NewMessageTemplate {
        layout: Layout::new(&session, user),
        text: String::new(),
    })
}

/// POST /messages/new — redirects to the author's profile.
pub async fn create_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<MessageForm>,
) -> Result<Response, StatusCode> {
    let Some(user) = user else {
        return Ok(unauthorized(&session));
    };

    let Some(text) = form.validated_text() else {
        session.flash(
            "danger",
            format!("Messages must be between 1 and {} characters.", MAX_MESSAGE_LEN),
        );
        return render(&NewMessageTemplate {
            layout: Layout::new(&session, Some(user)),
            text: form.text.clone().unwrap_or_default(),
        });
    };

    let new = NewMessage::new(text, user.id);
    let message = run_db(&state, move |db| db.insert_message(&new)).await?;
    info!("User #{} posted message #{}", user.id, message.id);

    Ok(redirect(&format!("/users/{}", user.id)))
}

pub async fn show_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let message_id = parse_id(&raw_id)?;
    let viewer = user.as_ref().map(|u| u.id);
    let (row, liked) = run_db(&state, move |db| {
        let row = db.get_message(message_id)?;
        let liked = match viewer {
            Some(uid) => db.liked_message_ids(uid)?,
            None => Vec::new(),
        };
        Ok((row, liked))
    })
    .await?;
    let row = row.ok_or(StatusCode::NOT_FOUND)?;

    let can_delete = viewer == Some(row.user_id);
    let message = MessageView::new(row, user.as_ref(), &liked);
    render(&MessageShowTemplate {
        layout: Layout::new(&session, user),
        message,
        can_delete,
    })
}

/// POST /messages/{id}/delete — only the author may delete.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let message_id = parse_id(&raw_id)?;
    let Some(user) = user else {
        return Ok(unauthorized(&session));
    };

    let message = run_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;

    if message.user_id != user.id {
        info!(
            "User #{} tried to delete message #{} owned by #{}",
            user.id, message.id, message.user_id
        );
        return Ok(unauthorized(&session));
    }

    run_db(&state, move |db| db.delete_message(message_id)).await?;
    info!("User #{} deleted message #{}", user.id, message_id);

    Ok(redirect(&format!("/users/{}", user.id)))
}
