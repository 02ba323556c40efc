//! Human-enterable codes.
//!
//! Team codes and marker (scan) codes are typed by players, read off posters,
//! or decoded from QR links. Both normalise the same way: surrounding
//! whitespace is dropped and letters are upper-cased, so `" ab12 "` and
//! `"AB12"` name the same thing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for any human-enterable code
const MAX_CODE_LENGTH: usize = 32;

fn normalize_code(kind: &str, raw: &str) -> Result<String, DomainError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(DomainError::validation(format!("{kind} cannot be empty")));
    }
    if code.len() > MAX_CODE_LENGTH {
        return Err(DomainError::validation(format!(
            "{kind} cannot exceed {MAX_CODE_LENGTH} characters"
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::validation(format!(
            "{kind} may only contain letters and digits"
        )));
    }
    Ok(code)
}

macro_rules! define_code {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new normalised code.
            ///
            /// # Errors
            ///
            /// Returns `DomainError::Validation` if the code is empty after
            /// trimming, too long, or contains anything but ASCII letters and digits.
            pub fn new(code: impl AsRef<str>) -> Result<Self, DomainError> {
                normalize_code($kind, code.as_ref()).map(Self)
            }

            /// Returns the code as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether raw player input refers to this code.
            pub fn matches(&self, raw: &str) -> bool {
                raw.trim().eq_ignore_ascii_case(&self.0)
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
            fn from(code: $name) -> String {
                code.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_code!(
    /// The join code shared by the players of a team.
    TeamCode,
    "Team code"
);

define_code!(
    /// The scan code printed on a location's marker.
    MarkerCode,
    "Marker code"
);
