use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use warbler_db::{Database, DbError, NewUser};
use warbler_types::api::{LoginForm, SignupForm};

use crate::session::{CurrentUser, Session};
use crate::views::{Layout, LoginTemplate, SignupTemplate, redirect, render};
use crate::{run_db, try_db};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub secret_key: String,
}

pub async fn signup_form(
    Extension(session): Extension<Session>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    if user.is_some() {
        return Ok(redirect("/"));
    }
    render(&SignupTemplate {
        layout: Layout::new(&session, None),
        username: String::new(),
        email: String::new(),
        image_url: String::new(),
    })
}

pub async fn signup(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<SignupForm>,
) -> Result<Response, StatusCode> {
    let username = non_empty(&form.username);
    let email = non_empty(&form.email);

    if username.is_none() || email.is_none() || non_empty(&form.password).is_none() {
        session.flash("danger", "Username, email and password are required.");
        return rerender_signup(&session, &form);
    }
    if !email.is_some_and(|e| e.contains('@')) {
        session.flash("danger", "Invalid email address.");
        return rerender_signup(&session, &form);
    }

    let username = username.map(str::to_owned);
    let email = email.map(str::to_owned);
    let password = form.password.clone();
    let image_url = form.image_url.as_deref().map(|u| u.trim().to_owned());

    // Hash on the blocking pool along with the insert.
    let created = try_db(&state, move |db| {
        let new_user = NewUser::signup(
            username.as_deref(),
            email.as_deref(),
            password.as_deref(),
            image_url.as_deref(),
        )?;
        db.insert_user(&new_user)
    })
    .await?;

    match created {
        Ok(user) => {
            session.login(user.id);
            Ok(redirect("/"))
        }
        Err(DbError::Integrity(reason)) => {
            info!("Signup conflict: {}", reason);
            session.flash("danger", "Username or email already taken");
            rerender_signup(&session, &form)
        }
        Err(e) => {
            error!("Signup failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn rerender_signup(session: &Session, form: &SignupForm) -> Result<Response, StatusCode> {
    render(&SignupTemplate {
        layout: Layout::new(session, None),
        username: form.username.clone().unwrap_or_default(),
        email: form.email.clone().unwrap_or_default(),
        image_url: form.image_url.clone().unwrap_or_default(),
    })
}

pub async fn login_form(Extension(session): Extension<Session>) -> Result<Response, StatusCode> {
    render(&LoginTemplate {
        layout: Layout::new(&session, None),
        username: String::new(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    let username = form.username.clone().unwrap_or_default();
    let password = form.password.clone().unwrap_or_default();

    let name = username.clone();
    let user = run_db(&state, move |db| db.authenticate(&name, &password)).await?;

    match user {
        Some(user) => {
            info!("User #{} logged in", user.id);
            session.login(user.id);
            session.flash("success", format!("Hello, {}!", user.username));
            Ok(redirect("/"))
        }
        None => {
            session.flash("danger", "Invalid credentials.");
            render(&LoginTemplate {
                layout: Layout::new(&session, None),
                username,
            })
        }
    }
}

pub async fn logout(Extension(session): Extension<Session>) -> impl IntoResponse {
    session.logout();
    session.flash("success", "You have successfully logged out.");
    redirect("/login")
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
