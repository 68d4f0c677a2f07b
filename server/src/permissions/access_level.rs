//! Project access levels.
//!
//! Ordered role strengths a member can hold on a project:
//! Guest < Reporter < Developer < Master < Owner.
//!
//! The numeric codes (10..=50) are both the wire and the storage
//! representation, so they must never be renumbered.

use serde::{Deserialize, Serialize};

/// Role strength of a project member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum AccessLevel {
    /// Can view the project.
    Guest = 10,
    /// Can view and report issues.
    Reporter = 20,
    /// Can push changes.
    Developer = 30,
    /// Can manage the project and its members.
    Master = 40,
    /// Full control, including removing the project.
    Owner = 50,
}

/// A requested access level outside the recognized set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Access level {0} is not recognized")]
pub struct InvalidAccessLevel(pub i64);

impl AccessLevel {
    /// Validate a raw access level from a request or a stored row.
    pub const fn validate(value: i64) -> Result<Self, InvalidAccessLevel> {
        match value {
            10 => Ok(Self::Guest),
            20 => Ok(Self::Reporter),
            30 => Ok(Self::Developer),
            40 => Ok(Self::Master),
            50 => Ok(Self::Owner),
            other => Err(InvalidAccessLevel(other)),
        }
    }

    /// Numeric code used on the wire and in the database.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Lowercase name for presentation and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Reporter => "reporter",
            Self::Developer => "developer",
            Self::Master => "master",
            Self::Owner => "owner",
        }
    }

    /// Whether this level may add, update and remove project members.
    #[must_use]
    pub const fn can_manage_members(self) -> bool {
        matches!(self, Self::Master | Self::Owner)
    }

    /// All levels, weakest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Guest,
            Self::Reporter,
            Self::Developer,
            Self::Master,
            Self::Owner,
        ]
    }
}

impl From<AccessLevel> for i32 {
    fn from(level: AccessLevel) -> Self {
        level.as_i32()
    }
}

impl TryFrom<i32> for AccessLevel {
    type Error = InvalidAccessLevel;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::validate(i64::from(value))
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_known_levels() {
        assert_eq!(AccessLevel::validate(10), Ok(AccessLevel::Guest));
        assert_eq!(AccessLevel::validate(20), Ok(AccessLevel::Reporter));
        assert_eq!(AccessLevel::validate(30), Ok(AccessLevel::Developer));
        assert_eq!(AccessLevel::validate(40), Ok(AccessLevel::Master));
        assert_eq!(AccessLevel::validate(50), Ok(AccessLevel::Owner));
    }

    #[test]
    fn test_validate_rejects_unknown_levels() {
        for value in [-1, 0, 5, 15, 25, 35, 45, 51, 60, 100, i64::MAX] {
            assert_eq!(
                AccessLevel::validate(value),
                Err(InvalidAccessLevel(value)),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_ordering_follows_strength() {
        let levels = AccessLevel::all();
        for pair in levels.windows(2) {
            assert!(pair[0] < pair[1], "{} should be weaker than {}", pair[0], pair[1]);
        }
        assert!(AccessLevel::Guest < AccessLevel::Owner);
    }

    #[test]
    fn test_manage_members_requires_master() {
        assert!(!AccessLevel::Guest.can_manage_members());
        assert!(!AccessLevel::Reporter.can_manage_members());
        assert!(!AccessLevel::Developer.can_manage_members());
        assert!(AccessLevel::Master.can_manage_members());
        assert!(AccessLevel::Owner.can_manage_members());
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&AccessLevel::Developer).unwrap();
        assert_eq!(json, "30");

        let level: AccessLevel = serde_json::from_str("40").unwrap();
        assert_eq!(level, AccessLevel::Master);

        assert!(serde_json::from_str::<AccessLevel>("42").is_err());
    }

    #[test]
    fn test_error_carries_rejected_value() {
        let err = AccessLevel::validate(42).unwrap_err();
        assert_eq!(err.0, 42);
        assert_eq!(err.to_string(), "Access level 42 is not recognized");
    }
}
