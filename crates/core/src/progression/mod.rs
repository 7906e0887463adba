//! The self-paced progression engine.
//!
//! Pure functions over plain records: which modules a learner can open, how a
//! quiz submission is graded and counted, and how far through a course they
//! are. Loading and saving the records is the caller's job.

use std::collections::HashMap;

use crate::model::{ModuleId, ModuleProgress};

mod attempts;
mod completion;
mod grading;
mod unlock;

pub use attempts::{AttemptOutcome, attempts_remaining, ensure_attempts_left, submit_quiz};
pub use completion::{CourseProgress, course_progress, mark_completed, record_time_spent};
pub use grading::{
    Answers, GradeResult, QuestionResult, RawAnswers, grade, parse_answers, percentage_half_up,
    validate_submission,
};
pub use unlock::{ModuleUnlock, PathUnlocks, UnlockState, evaluate_unlocks, next_module};

/// Lookup of one learner's progress by module.
pub(crate) struct ProgressIndex<'a> {
    by_module: HashMap<ModuleId, &'a ModuleProgress>,
}

impl<'a> ProgressIndex<'a> {
    pub(crate) fn new(progress: &'a [ModuleProgress]) -> Self {
        Self {
            by_module: progress.iter().map(|p| (p.module_id(), p)).collect(),
        }
    }

    pub(crate) fn get(&self, module_id: ModuleId) -> Option<&'a ModuleProgress> {
        self.by_module.get(&module_id).copied()
    }
}
