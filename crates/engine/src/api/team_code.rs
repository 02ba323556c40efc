//! Player identity.
//!
//! The player client sends its team code on every request. Resolving the
//! code to a team happens in the handlers so that an unknown code gets the
//! same "double check" treatment as any other bad code.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::http::ApiError;

pub const TEAM_CODE_HEADER: &str = "x-team-code";

/// Raw team code taken from the `X-Team-Code` header
#[derive(Debug, Clone)]
pub struct TeamCodeHeader(pub String);

impl<S: Send + Sync> FromRequestParts<S> for TeamCodeHeader {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TEAM_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .ok_or(ApiError::MissingTeamCode)
    }
}
