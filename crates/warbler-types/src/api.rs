use serde::{Deserialize, Serialize};

/// Longest message the store accepts.
pub const MAX_MESSAGE_LEN: usize = 140;

// -- Auth --

/// Fields are optional so that a missing one reaches validation instead of
/// failing form extraction.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub q: Option<String>,
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
pub struct MessageForm {
    pub text: Option<String>,
}

impl MessageForm {
    /// Trimmed text if it is non-empty and within [`MAX_MESSAGE_LEN`] characters.
    pub fn validated_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && t.chars().count() <= MAX_MESSAGE_LEN)
    }
}

// -- Likes --

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleLikeResponse {
    pub msg_liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_text_validation() {
        let form = |t: &str| MessageForm { text: Some(t.to_string()) };
        assert_eq!(form("  Hello ").validated_text(), Some("Hello"));
        assert_eq!(form("   ").validated_text(), None);
        assert_eq!(MessageForm::default().validated_text(), None);
        assert!(form(&"é".repeat(140)).validated_text().is_some());
        assert!(form(&"a".repeat(141)).validated_text().is_none());
    }

    #[test]
    fn toggle_like_wire_format() {
        let json = serde_json::to_string(&ToggleLikeResponse { msg_liked: true }).unwrap();
        assert_eq!(json, r#"{"msg_liked":true}"#);
    }
}
