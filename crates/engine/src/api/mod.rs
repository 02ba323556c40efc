//! API layer - HTTP entry points.

pub mod http;
mod team_code;

pub use team_code::{TeamCodeHeader, TEAM_CODE_HEADER};
