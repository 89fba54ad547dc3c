// ABOUTME: Library root for reimage - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod backup;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod oracle;
pub mod output;
pub mod runtime;
pub mod snapshot;
pub mod types;
pub mod update;
