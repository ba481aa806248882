//! User classification types.

use serde::{Deserialize, Serialize};

/// Account classification for a user.
///
/// Stored as text in the `users` table; new accounts always start as
/// [`UserType::Regular`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "regular_user")]
    Regular,
    #[serde(rename = "premium_user")]
    Premium,
}

impl UserType {
    /// Parse from the stored string representation.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "regular_user" => Ok(Self::Regular),
            "premium_user" => Ok(Self::Premium),
            other => Err(crate::Error::InvalidUserType(other.to_string())),
        }
    }

    /// Get the string representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular_user",
            Self::Premium => "premium_user",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for ty in [UserType::Regular, UserType::Premium] {
            assert_eq!(UserType::parse(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(matches!(
            UserType::parse("admin_user"),
            Err(crate::Error::InvalidUserType(_))
        ));
    }

    #[test]
    fn serde_uses_stored_names() {
        let json = serde_json::to_string(&UserType::Premium).unwrap();
        assert_eq!(json, "\"premium_user\"");
    }
}
