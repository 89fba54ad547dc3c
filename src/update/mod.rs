// ABOUTME: Container replacement orchestration using the type state pattern.
// ABOUTME: Exports state markers, the per-container driver and the batch coordinator.

mod batch;
mod driver;
mod error;
mod options;
mod outcome;
mod replacement;
mod restore;
mod state;
mod survey;
mod transitions;

pub use batch::{Aborted, BatchReport, ContainerResult, Summary, Target, run};
pub use driver::Updater;
pub use error::{Stage, UpdateError};
pub use options::UpdateOptions;
pub use outcome::UpdateOutcome;
pub use replacement::{Replacement, Verdict};
pub use restore::{RestoreError, restore};
pub use state::{
    BackedUp, HoldsOriginal, Idle, Pulled, Recreated, Removed, Resolved, StalenessChecked,
    Started, Stopped,
};
pub use survey::{StatusRow, survey};
pub use transitions::TransitionResult;
