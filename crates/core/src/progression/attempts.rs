use chrono::{DateTime, Utc};
use serde::Serialize;

use super::grading::{Answers, GradeResult, grade, validate_submission};
use crate::error::ProgressionError;
use crate::model::{Module, ModuleProgress, QuizQuestion, UserId};

/// A graded attempt together with the progress record it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptOutcome {
    pub grade: GradeResult,
    pub progress: ModuleProgress,
    /// `quiz_attempts` as observed before this attempt. Storage uses it for
    /// its optimistic write check.
    pub prior_attempts: u32,
}

/// Attempts left before the module's quiz is closed to this learner.
#[must_use]
pub fn attempts_remaining(module: &Module, progress: Option<&ModuleProgress>) -> u32 {
    let used = progress.map_or(0, ModuleProgress::quiz_attempts);
    module.max_attempts().saturating_sub(used)
}

/// # Errors
///
/// Returns `ProgressionError::AttemptsExhausted` once `max_attempts` is used up.
pub fn ensure_attempts_left(
    module: &Module,
    progress: Option<&ModuleProgress>,
) -> Result<(), ProgressionError> {
    let attempts = progress.map_or(0, ModuleProgress::quiz_attempts);
    if attempts >= module.max_attempts() {
        return Err(ProgressionError::AttemptsExhausted {
            attempts,
            max_attempts: module.max_attempts(),
        });
    }
    Ok(())
}

/// Run one quiz submission through the attempt gate and the grader.
///
/// Checks, in order: attempts left, then submission shape, then grades.
/// Only questions belonging to `module` are considered. On success the
/// returned progress has `quiz_attempts` incremented by exactly one and the
/// latest score/pass flag; an earlier pass is overwritten by a later fail.
/// The input `progress` is left untouched; a missing record starts fresh.
///
/// # Errors
///
/// Returns `ProgressionError::AttemptsExhausted` when no attempts remain and
/// `ProgressionError::MalformedSubmission` for an empty payload or an answer
/// to a question outside the module. Nothing is graded or counted in either
/// case.
pub fn submit_quiz(
    module: &Module,
    questions: &[QuizQuestion],
    answers: &Answers,
    user_id: &UserId,
    progress: Option<&ModuleProgress>,
    submitted_at: DateTime<Utc>,
) -> Result<AttemptOutcome, ProgressionError> {
    ensure_attempts_left(module, progress)?;

    let own: Vec<QuizQuestion> = questions
        .iter()
        .filter(|q| q.module_id() == module.id())
        .cloned()
        .collect();
    validate_submission(&own, answers)?;

    let result = grade(&own, answers, module.passing_score());

    let mut updated = progress
        .cloned()
        .unwrap_or_else(|| ModuleProgress::new(user_id.clone(), module.id()));
    let prior_attempts = updated.quiz_attempts();
    updated.record_attempt(result.score, result.passed, submitted_at);

    Ok(AttemptOutcome {
        grade: result,
        progress: updated,
        prior_attempts,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
