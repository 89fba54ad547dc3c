// ABOUTME: Immutable per-invocation options for the replacement workflow.
// ABOUTME: Passed by value; there is no global flag state.

use std::time::Duration;

/// How an update behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Skip the staleness check and always replace.
    pub force: bool,
    /// Decide only; issue no mutating engine call.
    pub dry_run: bool,
    /// Do not write a backup record.
    pub skip_backup: bool,
    /// Grace period before the old container is killed.
    pub stop_timeout: Duration,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            force: false,
            dry_run: false,
            skip_backup: false,
            stop_timeout: Duration::from_secs(10),
        }
    }
}
