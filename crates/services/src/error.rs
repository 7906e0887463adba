//! Shared error types for the services crate.

use thiserror::Error;

use course_core::ProgressionError;
use course_core::model::{ModuleError, ModuleId, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressionServiceError {
    #[error("module {module} not found")]
    UnknownModule { module: ModuleId },
    /// The learner has not unlocked the module yet. `message` is the blocking
    /// module's unlock message.
    #[error("module {module} is locked: {message}")]
    ModuleLocked {
        module: ModuleId,
        blocked_by: ModuleId,
        message: String,
    },
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProgressionServiceError {
    /// Whether the error is a learner-facing rejection rather than a failure.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::ModuleLocked { .. } | Self::Progression(_) | Self::UnknownModule { .. }
        )
    }
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error("module {module} not found")]
    UnknownModule { module: ModuleId },
    #[error("order index {order_index} is already used by module {existing}")]
    DuplicateOrderIndex { order_index: u32, existing: ModuleId },
    #[error("module {module} has no quiz")]
    QuizNotEnabled { module: ModuleId },
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
