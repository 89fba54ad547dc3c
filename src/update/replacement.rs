// ABOUTME: Generic replacement struct parameterized by state.
// ABOUTME: State types carry their own data for compile-time guarantees.

use super::options::UpdateOptions;
use super::state::{Idle, Removed, Resolved, StalenessChecked, Started};
use crate::oracle::{Staleness, StalenessReport};
use crate::runtime::traits::ContainerRef;
use crate::snapshot::ConfigurationSnapshot;
use crate::types::ContainerName;

/// One container's replacement in progress, parameterized by its current state.
///
/// Transitions consume the value, so a step can only run once and only in
/// order. Whatever a later step needs (the snapshot, the backup path) travels
/// inside the state type.
#[derive(Debug)]
pub struct Replacement<S> {
    pub(crate) name: ContainerName,
    pub(crate) options: UpdateOptions,
    pub(crate) state: S,
}

/// What to do after the staleness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Digests match; stop here without side effects.
    UpToDate,
    /// Dry run; report the plan and stop.
    DryRun(Option<Staleness>),
    /// Go on with backup and replacement.
    Proceed,
}

impl Replacement<Idle> {
    pub fn new(name: ContainerName, options: UpdateOptions) -> Self {
        Replacement {
            name,
            options,
            state: Idle,
        }
    }
}

impl<S> Replacement<S> {
    /// Container name; stays the same across the replacement.
    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    pub fn options(&self) -> UpdateOptions {
        self.options
    }

    pub(crate) fn transition<T>(self, state: T) -> Replacement<T> {
        Replacement {
            name: self.name,
            options: self.options,
            state,
        }
    }
}

impl Replacement<Resolved> {
    pub fn container(&self) -> &ContainerRef {
        &self.state.container
    }
}

impl Replacement<StalenessChecked> {
    pub fn container(&self) -> &ContainerRef {
        &self.state.container
    }

    /// `None` when the check was bypassed with `force`.
    pub fn report(&self) -> Option<&StalenessReport> {
        self.state.report.as_ref()
    }

    pub fn verdict(&self) -> Verdict {
        let staleness = self.state.report.as_ref().map(|r| r.staleness);
        if !self.options.force && staleness == Some(Staleness::Current) {
            return Verdict::UpToDate;
        }
        if self.options.dry_run {
            return Verdict::DryRun(staleness);
        }
        Verdict::Proceed
    }
}

impl Replacement<Removed> {
    /// The configuration the replacement will be created from.
    pub fn snapshot(&self) -> &ConfigurationSnapshot {
        &self.state.snapshot
    }
}

impl Replacement<Started> {
    pub fn container(&self) -> &ContainerRef {
        &self.state.container
    }
}
