//! In-process test client: drives the router with `oneshot`, carries the
//! session cookie between requests and can follow redirects.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use warbler_api::session::encode_session;
use warbler_api::{AppState, AppStateInner};
use warbler_db::{Database, NewMessage, NewUser};
use warbler_types::session::{SESSION_COOKIE, SessionData};

pub const SECRET: &str = "test-secret";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db,
            secret_key: SECRET.to_string(),
        });
        let router = warbler_api::router(state.clone(), Path::new("../../static"));
        Self {
            state,
            router,
            cookie: None,
        }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Pretend `user_id` already logged in.
    pub fn login_as(&mut self, user_id: i64) {
        let token = encode_session(&SessionData::for_user(user_id), SECRET).unwrap();
        self.cookie = Some(format!("{}={}", SESSION_COOKIE, token));
    }

    pub fn logged_in_user(&self) -> Option<i64> {
        let cookie = self.cookie.as_deref()?;
        let token = cookie.strip_prefix(&format!("{}=", SESSION_COOKIE))?;
        warbler_api::session::decode_session(token, SECRET)?.curr_user
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str) -> TestResponse {
        self.send(Method::POST, path, Some(String::new())).await
    }

    pub async fn post_form(&mut self, path: &str, form: &str) -> TestResponse {
        self.send(Method::POST, path, Some(form.to_string())).await
    }

    /// Keep following `Location` with GETs until a non-redirect arrives.
    pub async fn follow(&mut self, mut resp: TestResponse) -> TestResponse {
        for _ in 0..5 {
            if !resp.status.is_redirection() {
                return resp;
            }
            let to = resp.location().expect("redirect without Location").to_string();
            resp = self.get(&to).await;
        }
        panic!("too many redirects");
    }

    async fn send(&mut self, method: Method, path: &str, form: Option<String>) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                req = req.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form)
            }
            None => Body::empty(),
        };

        let resp = self
            .router
            .clone()
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set) = resp.headers().get(header::SET_COOKIE) {
            let set = set.to_str().unwrap();
            self.cookie = set.split(';').next().map(str::to_string);
        }

        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

pub fn add_user(db: &Database, id: i64, username: &str, email: &str, password: &str) {
    let user = NewUser::signup(Some(username), Some(email), Some(password), None)
        .unwrap()
        .with_id(id);
    db.insert_user(&user).unwrap();
}

pub fn add_message(db: &Database, id: Option<i64>, text: &str, user_id: i64) -> i64 {
    db.insert_message(&NewMessage {
        id,
        text: text.to_string(),
        user_id,
    })
    .unwrap()
    .id
}
