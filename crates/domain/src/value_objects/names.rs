//! Validated name newtypes for domain entities
//!
//! These newtypes ensure that names are valid by construction:
//! - Non-empty
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for instance and location names
const MAX_NAME_LENGTH: usize = 200;

/// Team names are shown on leaderboards, so they stay short
const MAX_TEAM_NAME_LENGTH: usize = 60;

fn validated(kind: &str, name: String, max: usize) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{kind} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{kind} cannot exceed {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new validated name.
            ///
            /// # Errors
            ///
            /// Returns `DomainError::Validation` if the name is empty after
            /// trimming or exceeds the length limit.
            pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
                validated($kind, name.into(), $max).map(Self)
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> String {
                name.0
            }
        }
    };
}

define_name!(
    /// A validated game instance name (non-empty, <=200 chars, trimmed)
    InstanceName,
    "Instance name",
    MAX_NAME_LENGTH
);

define_name!(
    /// A validated location name (non-empty, <=200 chars, trimmed)
    LocationName,
    "Location name",
    MAX_NAME_LENGTH
);

define_name!(
    /// A validated team display name (non-empty, <=60 chars, trimmed)
    TeamName,
    "Team name",
    MAX_TEAM_NAME_LENGTH
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        let name = LocationName::new("  Old Library ").expect("valid name");
        assert_eq!(name.as_str(), "Old Library");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            InstanceName::new("   "),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn team_name_limit_is_shorter() {
        assert!(TeamName::new("x".repeat(61)).is_err());
        assert!(LocationName::new("x".repeat(61)).is_ok());
    }
}
