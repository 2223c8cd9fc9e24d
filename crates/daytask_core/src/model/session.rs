//! Signed-in user identity.
//!
//! Authentication itself happens outside core. This module only keeps the
//! data it produces: a stable user id plus optional profile fields.

use serde::{Deserialize, Serialize};

const MISSING_PROFILE_FIELD: &str = "not provided";

/// Opaque identity of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Profile view with every field resolved to displayable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub name: String,
    pub email: String,
    pub user_id: String,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            display_name: None,
        }
    }

    /// Resolves profile fields, substituting a placeholder for blanks.
    pub fn profile_summary(&self) -> ProfileSummary {
        ProfileSummary {
            name: or_placeholder(self.display_name.as_deref()),
            email: or_placeholder(self.email.as_deref()),
            user_id: or_placeholder(Some(self.user_id.as_str())),
        }
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => MISSING_PROFILE_FIELD.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::UserSession;

    #[test]
    fn profile_summary_falls_back_for_missing_fields() {
        let mut session = UserSession::new("uid-42");
        session.email = Some("   ".to_string());

        let summary = session.profile_summary();
        assert_eq!(summary.user_id, "uid-42");
        assert_eq!(summary.email, "not provided");
        assert_eq!(summary.name, "not provided");
    }
}
