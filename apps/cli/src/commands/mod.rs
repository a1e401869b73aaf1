//! CLI command implementations.

pub mod models;
pub mod ping;
pub mod status;
pub mod types;
pub mod watch;
