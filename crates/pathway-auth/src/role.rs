//! Application roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role attached to an authenticated identity, stored in `profiles.user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Least privileged role; the fallback whenever a role cannot be determined.
    #[default]
    Pilgrim,
    Agent,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Pilgrim, Role::Agent, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pilgrim => "pilgrim",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }

    /// Map a stored `user_type` value to a role.
    ///
    /// Total: missing, blank, or unrecognised values yield the default role.
    pub fn from_profile_value(value: Option<&str>) -> Role {
        match value.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(user_type = raw, "Unrecognised user_type, using default role");
                Role::default()
            }),
            _ => Role::default(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pilgrim" => Ok(Role::Pilgrim),
            "agent" => Ok(Role::Agent),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_pilgrim() {
        assert_eq!(Role::default(), Role::Pilgrim);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" agent ".parse::<Role>().unwrap(), Role::Agent);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_from_profile_value_is_total() {
        assert_eq!(Role::from_profile_value(Some("admin")), Role::Admin);
        assert_eq!(Role::from_profile_value(Some("agent")), Role::Agent);
        assert_eq!(Role::from_profile_value(Some("")), Role::Pilgrim);
        assert_eq!(Role::from_profile_value(Some("moderator")), Role::Pilgrim);
        assert_eq!(Role::from_profile_value(None), Role::Pilgrim);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Agent).unwrap(), "\"agent\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_display_matches_as_str() {
        for role in Role::ALL {
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
