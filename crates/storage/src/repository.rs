use async_trait::async_trait;
use course_core::model::{CourseId, Module, ModuleId, ModuleProgress, QuizQuestion, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// An optimistic write lost a race with another writer.
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Module definitions, read by the engine and written by admin tooling.
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Persist or update a module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the module cannot be stored.
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError>;

    /// Fetch a module by ID. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError>;

    /// All modules of a course, ordered by `order_index` then ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn modules_for_course(&self, course_id: CourseId) -> Result<Vec<Module>, StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a quiz question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &QuizQuestion) -> Result<(), StorageError>;

    /// Questions of a module ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_for_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<QuizQuestion>, StorageError>;
}

/// Per-learner progress records.
///
/// Quiz fields, completion and study time are written by separate operations.
/// Each one only moves its own columns forward, so concurrent writers never
/// roll back each other's fields.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<Option<ModuleProgress>, StorageError>;

    /// All of a learner's records for modules in `course_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn progress_for_course(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<ModuleProgress>, StorageError>;

    /// Write every field of a record, replacing what is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, progress: &ModuleProgress) -> Result<(), StorageError>;

    /// Record completion, creating the record if needed. Completion is
    /// sticky: an incomplete `progress` never clears a stored completion, and
    /// the first stored `completed_at` is kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_completion(&self, progress: &ModuleProgress) -> Result<(), StorageError>;

    /// Add `minutes` to the stored study time (saturating) and return the new
    /// total, creating the record if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn add_time_spent(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
        minutes: u32,
    ) -> Result<u32, StorageError>;

    /// Write the quiz fields of a graded attempt, but only if the stored
    /// attempt count still equals `expected_prior_attempts` (a missing record
    /// counts as zero).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when another attempt was recorded in
    /// between, or other `StorageError`s on backend failures.
    async fn save_attempt(
        &self,
        progress: &ModuleProgress,
        expected_prior_attempts: u32,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

type ProgressKey = (UserId, ModuleId);

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    modules: Arc<Mutex<HashMap<ModuleId, Module>>>,
    questions: Arc<Mutex<HashMap<ModuleId, Vec<QuizQuestion>>>>,
    progress: Arc<Mutex<HashMap<ProgressKey, ModuleProgress>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn merge_completion(
    stored: &ModuleProgress,
    incoming: &ModuleProgress,
) -> Result<ModuleProgress, StorageError> {
    ModuleProgress::from_persisted(
        stored.user_id().clone(),
        stored.module_id(),
        stored.is_completed() || incoming.is_completed(),
        stored.completed_at().or(incoming.completed_at()),
        stored.quiz_passed(),
        stored.quiz_score(),
        stored.quiz_attempts(),
        stored.time_spent_minutes(),
        stored.last_attempt_at(),
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

fn with_time_spent(stored: &ModuleProgress, minutes: u32) -> Result<ModuleProgress, StorageError> {
    ModuleProgress::from_persisted(
        stored.user_id().clone(),
        stored.module_id(),
        stored.is_completed(),
        stored.completed_at(),
        stored.quiz_passed(),
        stored.quiz_score(),
        stored.quiz_attempts(),
        minutes,
        stored.last_attempt_at(),
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

fn merge_attempt(
    stored: &ModuleProgress,
    incoming: &ModuleProgress,
) -> Result<ModuleProgress, StorageError> {
    ModuleProgress::from_persisted(
        stored.user_id().clone(),
        stored.module_id(),
        stored.is_completed(),
        stored.completed_at(),
        incoming.quiz_passed(),
        incoming.quiz_score(),
        incoming.quiz_attempts(),
        stored.time_spent_minutes(),
        incoming.last_attempt_at(),
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModuleRepository for InMemoryRepository {
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        lock(&self.modules)?.insert(module.id(), module.clone());
        Ok(())
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        Ok(lock(&self.modules)?.get(&id).cloned())
    }

    async fn modules_for_course(&self, course_id: CourseId) -> Result<Vec<Module>, StorageError> {
        let guard = lock(&self.modules)?;
        let mut found: Vec<Module> = guard
            .values()
            .filter(|m| m.course_id() == course_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| (m.order_index(), m.id()));
        Ok(found)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &QuizQuestion) -> Result<(), StorageError> {
        let mut guard = lock(&self.questions)?;
        let bucket = guard.entry(question.module_id()).or_default();
        match bucket.iter_mut().find(|q| q.id() == question.id()) {
            Some(existing) => *existing = question.clone(),
            None => bucket.push(question.clone()),
        }
        bucket.sort_by_key(QuizQuestion::id);
        Ok(())
    }

    async fn questions_for_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        Ok(lock(&self.questions)?
            .get(&module_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<Option<ModuleProgress>, StorageError> {
        Ok(lock(&self.progress)?
            .get(&(user_id.clone(), module_id))
            .cloned())
    }

    async fn progress_for_course(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<ModuleProgress>, StorageError> {
        let module_ids: Vec<ModuleId> = lock(&self.modules)?
            .values()
            .filter(|m| m.course_id() == course_id)
            .map(Module::id)
            .collect();

        let guard = lock(&self.progress)?;
        let mut found: Vec<ModuleProgress> = module_ids
            .into_iter()
            .filter_map(|id| guard.get(&(user_id.clone(), id)).cloned())
            .collect();
        found.sort_by_key(ModuleProgress::module_id);
        Ok(found)
    }

    async fn upsert_progress(&self, progress: &ModuleProgress) -> Result<(), StorageError> {
        lock(&self.progress)?.insert(
            (progress.user_id().clone(), progress.module_id()),
            progress.clone(),
        );
        Ok(())
    }

    async fn save_completion(&self, progress: &ModuleProgress) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;
        let key = (progress.user_id().clone(), progress.module_id());
        let fresh = ModuleProgress::new(key.0.clone(), key.1);
        let merged = merge_completion(guard.get(&key).unwrap_or(&fresh), progress)?;
        guard.insert(key, merged);
        Ok(())
    }

    async fn add_time_spent(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
        minutes: u32,
    ) -> Result<u32, StorageError> {
        let mut guard = lock(&self.progress)?;
        let key = (user_id.clone(), module_id);
        let stored = guard
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ModuleProgress::new(user_id.clone(), module_id));
        let total = stored.time_spent_minutes().saturating_add(minutes);
        guard.insert(key, with_time_spent(&stored, total)?);
        Ok(total)
    }

    async fn save_attempt(
        &self,
        progress: &ModuleProgress,
        expected_prior_attempts: u32,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;
        let key = (progress.user_id().clone(), progress.module_id());
        let stored_attempts = guard.get(&key).map_or(0, ModuleProgress::quiz_attempts);
        if stored_attempts != expected_prior_attempts {
            return Err(StorageError::Conflict);
        }

        let merged = match guard.get(&key) {
            Some(stored) => merge_attempt(stored, progress)?,
            None => progress.clone(),
        };
        guard.insert(key, merged);
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub modules: Arc<dyn ModuleRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            modules: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            progress: Arc::new(repo),
        }
    }
}
