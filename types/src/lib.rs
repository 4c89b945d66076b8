//! Shared types for the Ahiru CSV playground
//!
//! All JS-facing types are exported to TypeScript via tsify.

pub mod config;
pub mod data;
pub mod messages;
pub mod ui;

pub use config::*;
pub use data::*;
pub use messages::*;
pub use ui::*;
