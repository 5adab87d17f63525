use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use warbler_types::api::ToggleLikeResponse;

use crate::auth::AppState;
use crate::{parse_id, run_db};
use crate::session::{CurrentUser, Session, unauthorized};

/// POST /users/toggle_like/{message_id} — like if not liked, unlike if liked.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let message_id = parse_id(&raw_id)?;
    let Some(user) = user else {
        return Ok(unauthorized(&session));
    };

    let uid = user.id;
    let liked = run_db(&state, move |db| {
        if db.get_message(message_id)?.is_none() {
            return Ok(None);
        }
        db.toggle_like(uid, message_id).map(Some)
    })
    .await?
    .ok_or(StatusCode::NOT_FOUND)?;

    debug!("User #{} liked message #{}: {}", uid, message_id, liked);
    Ok(Json(ToggleLikeResponse { msg_liked: liked }).into_response())
}
