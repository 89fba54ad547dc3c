// ABOUTME: Diagnostics accumulator for non-fatal warnings during an update.
// ABOUTME: Collects warnings that shouldn't fail an update but should be shown to users.

use crate::types::ContainerName;

/// Collects non-fatal warnings during update operations.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(container = %warning.container, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during an update.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub container: ContainerName,
    pub message: String,
}

impl Warning {
    fn new(kind: WarningKind, container: &ContainerName, message: impl Into<String>) -> Self {
        Self {
            kind,
            container: container.clone(),
            message: message.into(),
        }
    }

    /// Create a backup failure warning.
    pub fn backup_failed(container: &ContainerName, message: impl Into<String>) -> Self {
        Self::new(WarningKind::BackupFailed, container, message)
    }

    /// Create a tolerated stop failure warning.
    pub fn stop_tolerated(container: &ContainerName, message: impl Into<String>) -> Self {
        Self::new(WarningKind::StopTolerated, container, message)
    }

    /// Create an unknown staleness warning.
    pub fn staleness_unknown(container: &ContainerName, message: impl Into<String>) -> Self {
        Self::new(WarningKind::StalenessUnknown, container, message)
    }

    /// Create a warning for an original container that could not be restarted.
    pub fn restore_original_failed(container: &ContainerName, message: impl Into<String>) -> Self {
        Self::new(WarningKind::RestoreOriginalFailed, container, message)
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.container, self.message)
    }
}

/// Categories of warnings that can occur during an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Backup could not be captured or written; the update went ahead.
    BackupFailed,
    /// Stop was refused by the engine (e.g. already stopped).
    StopTolerated,
    /// Digests could not be compared; the update went ahead.
    StalenessUnknown,
    /// An aborted update could not start the original container again.
    RestoreOriginalFailed,
}
