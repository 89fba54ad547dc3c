// ABOUTME: Command module aggregator for the reimage CLI.
// ABOUTME: Re-exports update, list and restore command handlers.

mod list;
mod restore;
mod runtime_connection;
mod update;

pub use list::list;
pub use restore::restore;
pub use runtime_connection::connect_to_runtime;
pub use update::update;
