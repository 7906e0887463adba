use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{ModuleId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("quiz score must be between 0 and 100, got {0}")]
    InvalidScore(u8),

    #[error("quiz marked passed without a recorded score")]
    PassedWithoutScore,

    #[error("quiz has a score but no recorded attempt")]
    ScoreWithoutAttempt,

    #[error("completed_at set on an incomplete module")]
    CompletedAtWithoutCompletion,
}

/// Per-learner, per-module progress.
///
/// `is_completed` and `quiz_passed` are independent flags: content can be
/// marked done without touching the quiz, and only `quiz_passed` feeds unlock
/// evaluation. `quiz_attempts` only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleProgress {
    user_id: UserId,
    module_id: ModuleId,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    quiz_passed: bool,
    quiz_score: Option<u8>,
    quiz_attempts: u32,
    time_spent_minutes: u32,
    last_attempt_at: Option<DateTime<Utc>>,
}

impl ModuleProgress {
    /// Fresh progress for a learner who has not interacted with the module yet.
    #[must_use]
    pub fn new(user_id: UserId, module_id: ModuleId) -> Self {
        Self {
            user_id,
            module_id,
            is_completed: false,
            completed_at: None,
            quiz_passed: false,
            quiz_score: None,
            quiz_attempts: 0,
            time_spent_minutes: 0,
            last_attempt_at: None,
        }
    }

    /// Rehydrate a progress record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when the stored flags contradict each other or
    /// the score is outside 0..=100.
    #[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
    pub fn from_persisted(
        user_id: UserId,
        module_id: ModuleId,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
        quiz_passed: bool,
        quiz_score: Option<u8>,
        quiz_attempts: u32,
        time_spent_minutes: u32,
        last_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if let Some(score) = quiz_score {
            if score > 100 {
                return Err(ProgressError::InvalidScore(score));
            }
            if quiz_attempts == 0 {
                return Err(ProgressError::ScoreWithoutAttempt);
            }
        }
        if quiz_passed && quiz_score.is_none() {
            return Err(ProgressError::PassedWithoutScore);
        }
        if completed_at.is_some() && !is_completed {
            return Err(ProgressError::CompletedAtWithoutCompletion);
        }

        Ok(Self {
            user_id,
            module_id,
            is_completed,
            completed_at,
            quiz_passed,
            quiz_score,
            quiz_attempts,
            time_spent_minutes,
            last_attempt_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn quiz_passed(&self) -> bool {
        self.quiz_passed
    }

    /// Score of the latest graded attempt, if any.
    #[must_use]
    pub fn quiz_score(&self) -> Option<u8> {
        self.quiz_score
    }

    #[must_use]
    pub fn quiz_attempts(&self) -> u32 {
        self.quiz_attempts
    }

    #[must_use]
    pub fn time_spent_minutes(&self) -> u32 {
        self.time_spent_minutes
    }

    #[must_use]
    pub fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempt_at
    }

    pub(crate) fn record_attempt(&mut self, score: u8, passed: bool, at: DateTime<Utc>) {
        self.quiz_attempts = self.quiz_attempts.saturating_add(1);
        self.quiz_score = Some(score);
        self.quiz_passed = passed;
        self.last_attempt_at = Some(at);
    }

    pub(crate) fn mark_completed(&mut self, at: DateTime<Utc>) {
        if !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(at);
        }
    }

    pub(crate) fn add_time_spent(&mut self, minutes: u32) {
        self.time_spent_minutes = self.time_spent_minutes.saturating_add(minutes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_progress_is_blank() {
        let progress = ModuleProgress::new(UserId::new("u1"), ModuleId::new(1));
        assert!(!progress.is_completed());
        assert!(!progress.quiz_passed());
        assert_eq!(progress.quiz_score(), None);
        assert_eq!(progress.quiz_attempts(), 0);
    }

    #[test]
    fn from_persisted_rejects_contradictions() {
        let user = UserId::new("u1");
        let module = ModuleId::new(1);

        let err = ModuleProgress::from_persisted(
            user.clone(),
            module,
            false,
            None,
            true,
            None,
            1,
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressError::PassedWithoutScore);

        let err = ModuleProgress::from_persisted(
            user.clone(),
            module,
            false,
            None,
            false,
            Some(101),
            1,
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressError::InvalidScore(101));

        let err = ModuleProgress::from_persisted(
            user,
            module,
            false,
            Some(fixed_now()),
            false,
            None,
            0,
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressError::CompletedAtWithoutCompletion);
    }

    #[test]
    fn mark_completed_keeps_first_timestamp() {
        let mut progress = ModuleProgress::new(UserId::new("u1"), ModuleId::new(1));
        let first = fixed_now();
        progress.mark_completed(first);
        progress.mark_completed(first + chrono::Duration::hours(1));
        assert_eq!(progress.completed_at(), Some(first));
    }

    #[test]
    fn time_spent_saturates() {
        let mut progress = ModuleProgress::new(UserId::new("u1"), ModuleId::new(1));
        progress.add_time_spent(u32::MAX);
        progress.add_time_spent(10);
        assert_eq!(progress.time_spent_minutes(), u32::MAX);
    }
}
