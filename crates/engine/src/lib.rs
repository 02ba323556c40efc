//! ScanQuest Engine library.
//!
//! This crate contains all server-side code for ScanQuest.
//!
//! ## Structure
//!
//! - `use_cases/` - Navigation, the check-in ledger, blocks, gameplay, teams, management
//! - `infrastructure/` - Port traits and their SQLite adapters
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::{App, AppConfig};
