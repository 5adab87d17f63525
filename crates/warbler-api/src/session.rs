use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, error, warn};

use warbler_db::UserRow;
use warbler_types::session::{CURR_USER_KEY, Flash, SESSION_COOKIE, SessionData};

use crate::auth::AppState;
use crate::run_db;
use crate::views::redirect;

/// The request's session. Cloned handles share state, so the middleware sees
/// whatever the handler wrote.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

#[derive(Default)]
struct SessionState {
    data: SessionData,
    dirty: bool,
}

impl Session {
    pub fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState { data, dirty: false })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.state().data.curr_user
    }

    pub fn login(&self, user_id: i64) {
        let mut state = self.state();
        state.data.curr_user = Some(user_id);
        state.dirty = true;
    }

    pub fn logout(&self) {
        let mut state = self.state();
        state.data.curr_user = None;
        state.dirty = true;
    }

    pub fn flash(&self, category: &str, message: impl Into<String>) {
        let mut state = self.state();
        state.data.flashes.push(Flash::new(category, message));
        state.dirty = true;
    }

    /// Drain pending flashes for rendering.
    pub fn take_flashes(&self) -> Vec<Flash> {
        let mut state = self.state();
        if state.data.flashes.is_empty() {
            return Vec::new();
        }
        state.dirty = true;
        std::mem::take(&mut state.data.flashes)
    }

    /// The data to write back, if anything changed during the request.
    fn changed(&self) -> Option<SessionData> {
        let state = self.state();
        state.dirty.then(|| state.data.clone())
    }
}

/// The user named by the session, if it still exists.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<UserRow>);

pub fn encode_session(data: &SessionData, secret: &str) -> jsonwebtoken::errors::Result<String> {
    encode(
        &Header::default(),
        &data.clone().refreshed(),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// `None` for a missing, tampered or expired token.
pub fn decode_session(token: &str, secret: &str) -> Option<SessionData> {
    decode::<SessionData>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| debug!("Discarding session cookie: {}", e))
    .ok()
}

/// Decode the session cookie, resolve the current user, and write the cookie
/// back if the handler changed the session.
pub async fn load_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let data = CookieJar::from_headers(req.headers())
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(cookie.value(), &state.secret_key))
        .unwrap_or_default();

    let current_user = match data.curr_user {
        Some(id) => match run_db(&state, move |db| db.get_user_by_id(id)).await {
            Ok(user) => {
                if user.is_none() {
                    warn!("Session {} names unknown user #{}", CURR_USER_KEY, id);
                }
                user
            }
            Err(status) => return status.into_response(),
        },
        None => None,
    };

    let session = Session::new(data);
    req.extensions_mut().insert(session.clone());
    req.extensions_mut().insert(CurrentUser(current_user));

    let mut response = next.run(req).await;

    if let Some(data) = session.changed() {
        match encode_session(&data, &state.secret_key) {
            Ok(token) => {
                let cookie = Cookie::build((SESSION_COOKIE, token))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .build();
                match HeaderValue::from_str(&cookie.to_string()) {
                    Ok(value) => {
                        response.headers_mut().append(header::SET_COOKIE, value);
                    }
                    Err(e) => error!("Invalid session cookie header: {}", e),
                }
            }
            Err(e) => error!("Failed to encode session: {}", e),
        }
    }

    response
}

/// Flash "Access unauthorized." and send the visitor home.
pub fn unauthorized(session: &Session) -> Response {
    session.flash("danger", "Access unauthorized.");
    redirect("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_roundtrip() {
        let token = encode_session(&SessionData::for_user(7), "secret").unwrap();
        let data = decode_session(&token, "secret").unwrap();
        assert_eq!(data.curr_user, Some(7));
    }

    #[test]
    fn tampered_session_is_discarded() {
        let token = encode_session(&SessionData::for_user(7), "secret").unwrap();
        assert!(decode_session(&token, "other-secret").is_none());
        assert!(decode_session("garbage", "secret").is_none());
    }

    #[test]
    fn flashes_mark_session_changed() {
        let session = Session::new(SessionData::default());
        assert!(session.changed().is_none());
        assert!(session.take_flashes().is_empty());
        assert!(session.changed().is_none());

        session.flash("danger", "Access unauthorized.");
        let flashes = session.take_flashes();
        assert_eq!(flashes, vec![Flash::new("danger", "Access unauthorized.")]);
        assert!(session.changed().unwrap().flashes.is_empty());
    }

    #[test]
    fn token_claims_carry_current_user_key() {
        let token = encode_session(&SessionData::for_user(9), "secret").unwrap();
        let claims = jsonwebtoken::decode::<std::collections::HashMap<String, serde_json::Value>>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap()
        .claims;
        assert_eq!(claims[CURR_USER_KEY], 9);
    }

    #[test]
    fn login_and_logout() {
        let session = Session::default();
        session.login(3);
        assert_eq!(session.user_id(), Some(3));
        session.logout();
        assert_eq!(session.user_id(), None);
        assert!(session.changed().is_some());
    }
}
