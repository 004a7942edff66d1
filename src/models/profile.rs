//! Profile model for storage and API.

use serde::{Deserialize, Serialize};

/// Name shown on the profile screen when none was set.
pub const DEFAULT_PROFILE_NAME: &str = "Car Enthusiast";
/// Name given to lazily created profiles and unnamed post authors.
pub const ANONYMOUS_NAME: &str = "Anonymous User";

/// Stored placeholders count as "no name" so each view applies its own default.
fn is_placeholder(name: &str) -> bool {
    name == DEFAULT_PROFILE_NAME || name == ANONYMOUS_NAME
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Auth uid (also used as document ID)
    pub id: String,
    /// Display name
    pub full_name: Option<String>,
    /// Whether the `pro_features` entitlement is active
    #[serde(default)]
    pub is_pro: bool,
    /// Last update timestamp (ISO 8601)
    pub updated_at: String,
}

impl Profile {
    pub fn new(id: &str, full_name: Option<String>, now: &str) -> Self {
        Self {
            id: id.to_string(),
            full_name,
            is_pro: false,
            updated_at: now.to_string(),
        }
    }

    /// Name for the profile screen.
    pub fn display_name(&self) -> &str {
        self.name_or(DEFAULT_PROFILE_NAME)
    }

    /// Name for the social feed.
    pub fn author_name(&self) -> &str {
        self.name_or(ANONYMOUS_NAME)
    }

    fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty() && !is_placeholder(n))
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut profile = Profile::new("uid", None, "2024-01-01T00:00:00Z");
        assert_eq!(profile.display_name(), DEFAULT_PROFILE_NAME);
        assert_eq!(profile.author_name(), ANONYMOUS_NAME);

        profile.full_name = Some("   ".to_string());
        assert_eq!(profile.author_name(), ANONYMOUS_NAME);

        profile.full_name = Some("Jamie".to_string());
        assert_eq!(profile.display_name(), "Jamie");
        assert_eq!(profile.author_name(), "Jamie");
    }

    #[test]
    fn test_stored_placeholders_do_not_cross_views() {
        let lazily_created = Profile::new(
            "uid",
            Some(ANONYMOUS_NAME.to_string()),
            "2024-01-01T00:00:00Z",
        );
        assert_eq!(lazily_created.display_name(), DEFAULT_PROFILE_NAME);
        assert_eq!(lazily_created.author_name(), ANONYMOUS_NAME);

        let legacy_signup = Profile::new(
            "uid",
            Some(DEFAULT_PROFILE_NAME.to_string()),
            "2024-01-01T00:00:00Z",
        );
        assert_eq!(legacy_signup.author_name(), ANONYMOUS_NAME);
        assert_eq!(legacy_signup.display_name(), DEFAULT_PROFILE_NAME);
    }

    #[test]
    fn test_is_pro_defaults_when_missing() {
        let profile: Profile = serde_json::from_str(
            r#"{"id":"uid","full_name":null,"updated_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(!profile.is_pro);
    }
}
