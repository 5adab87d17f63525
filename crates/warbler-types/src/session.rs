use serde::{Deserialize, Serialize};

/// Claim name of [`SessionData::curr_user`] in the encoded session token.
pub const CURR_USER_KEY: &str = "curr_user";

/// Cookie carrying the signed session.
pub const SESSION_COOKIE: &str = "warbler_session";

/// Days a session cookie stays valid after its last write.
pub const SESSION_LIFETIME_DAYS: i64 = 31;

/// Everything kept in the session cookie. Encoded as JWT claims, so `exp`
/// is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curr_user: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
    pub exp: usize,
}

impl SessionData {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            curr_user: Some(user_id),
            ..Self::default()
        }
        .refreshed()
    }

    /// Push `exp` out to a full lifetime from now.
    pub fn refreshed(mut self) -> Self {
        self.exp = (chrono::Utc::now() + chrono::Duration::days(SESSION_LIFETIME_DAYS)).timestamp()
            as usize;
        self
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_claims_use_curr_user_key() {
        let data = SessionData::for_user(5);
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value[CURR_USER_KEY], 5);
        assert!(value.get("flashes").is_none());
        assert!(data.exp > chrono::Utc::now().timestamp() as usize);
    }
}
