//! Infrastructure layer - external dependency implementations.
//!
//! This module contains:
//! - Port traits (the abstractions use cases depend on)
//! - SQLite adapters for those ports
//! - System clock and randomness

pub mod clock;
pub mod ports;
pub mod sqlite;
