// ABOUTME: Replacement state types for the type state pattern.
// ABOUTME: Each state carries exactly the data the next transition needs.

use crate::oracle::StalenessReport;
use crate::runtime::traits::ContainerRef;
use crate::snapshot::ConfigurationSnapshot;
use crate::types::ImageDigest;
use std::path::PathBuf;

/// Nothing looked up yet.
/// Available actions: `resolve()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

/// Container found.
/// Available actions: `check()`
#[derive(Debug, Clone)]
pub struct Resolved {
    pub(crate) container: ContainerRef,
}

/// Staleness decided (or skipped under force).
/// Available actions: `verdict()`, `backup()`
#[derive(Debug, Clone)]
pub struct StalenessChecked {
    pub(crate) container: ContainerRef,
    /// `None` when the check was bypassed.
    pub(crate) report: Option<StalenessReport>,
}

/// Backup attempted (or skipped).
/// Available actions: `stop()`
#[derive(Debug, Clone)]
pub struct BackedUp {
    pub(crate) container: ContainerRef,
    pub(crate) snapshot: Option<ConfigurationSnapshot>,
    pub(crate) backup: Option<PathBuf>,
}

/// Old container stopped.
/// Available actions: `pull()`, `restart_original()`
#[derive(Debug, Clone)]
pub struct Stopped {
    pub(crate) container: ContainerRef,
    pub(crate) snapshot: Option<ConfigurationSnapshot>,
    pub(crate) backup: Option<PathBuf>,
    /// Whether the stop call succeeded, i.e. we are the ones who stopped it.
    pub(crate) stopped_by_us: bool,
}

/// New image present locally.
/// Available actions: `remove()`, `restart_original()`
#[derive(Debug, Clone)]
pub struct Pulled {
    pub(crate) container: ContainerRef,
    pub(crate) snapshot: Option<ConfigurationSnapshot>,
    pub(crate) backup: Option<PathBuf>,
    pub(crate) stopped_by_us: bool,
    pub(crate) digest: Option<ImageDigest>,
}

/// Old container gone; the snapshot is now the only record of it.
/// Available actions: `recreate()`
#[derive(Debug, Clone)]
pub struct Removed {
    pub(crate) container: ContainerRef,
    pub(crate) snapshot: ConfigurationSnapshot,
    pub(crate) backup: Option<PathBuf>,
    pub(crate) digest: Option<ImageDigest>,
}

/// New container created, not yet running.
/// Available actions: `start()`
#[derive(Debug, Clone)]
pub struct Recreated {
    pub(crate) container: ContainerRef,
    pub(crate) backup: Option<PathBuf>,
    pub(crate) digest: Option<ImageDigest>,
}

/// New container running.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Started {
    pub(crate) container: ContainerRef,
    pub(crate) backup: Option<PathBuf>,
    pub(crate) digest: Option<ImageDigest>,
}

/// States in which the original container still exists, stopped.
pub trait HoldsOriginal {
    fn original(&self) -> &ContainerRef;

    fn stopped_by_us(&self) -> bool;
}

impl HoldsOriginal for Stopped {
    fn original(&self) -> &ContainerRef {
        &self.container
    }

    fn stopped_by_us(&self) -> bool {
        self.stopped_by_us
    }
}

impl HoldsOriginal for Pulled {
    fn original(&self) -> &ContainerRef {
        &self.container
    }

    fn stopped_by_us(&self) -> bool {
        self.stopped_by_us
    }
}
