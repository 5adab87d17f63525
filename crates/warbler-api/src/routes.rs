use std::path::Path;

use axum::{
    Extension, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::session::{CurrentUser, Session, load_session};
use crate::views::{Layout, NotFoundTemplate, render};
use crate::{likes, messages, users};

/// The full application: pages, static assets, session handling, tracing.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let pages = Router::new()
        .route("/", get(messages::home))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/{user_id}/likes", get(users::show_likes))
        .route("/users/follow/{user_id}", post(users::follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/toggle_like/{message_id}", post(likes::toggle_like))
        .route("/users/delete", post(users::delete_user))
        .route("/messages/new", get(messages::new_message_form).post(messages::create_message))
        .route("/messages/{message_id}", get(messages::show_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .with_state(state);

    Router::new()
        .nest_service("/static", ServeDir::new(static_dir))
        .merge(pages)
        .layer(TraceLayer::new_for_http())
}

async fn not_found(
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let page = render(&NotFoundTemplate {
        layout: Layout::new(&session, user),
    });
    match page {
        Ok(page) => (StatusCode::NOT_FOUND, page).into_response(),
        Err(status) => status.into_response(),
    }
}
