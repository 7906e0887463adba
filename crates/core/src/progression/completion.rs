use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ProgressIndex;
use super::grading::percentage_half_up;
use crate::model::{Module, ModuleId, ModuleProgress, UserId};

/// Mark a module's content as done for a learner.
///
/// Independent of the quiz: neither requires nor changes `quiz_passed`.
/// Repeating it keeps the original `completed_at`.
#[must_use]
pub fn mark_completed(
    user_id: &UserId,
    module_id: ModuleId,
    progress: Option<&ModuleProgress>,
    at: DateTime<Utc>,
) -> ModuleProgress {
    let mut updated = progress
        .cloned()
        .unwrap_or_else(|| ModuleProgress::new(user_id.clone(), module_id));
    updated.mark_completed(at);
    updated
}

/// Add study minutes to a learner's module progress.
#[must_use]
pub fn record_time_spent(
    user_id: &UserId,
    module_id: ModuleId,
    progress: Option<&ModuleProgress>,
    minutes: u32,
) -> ModuleProgress {
    let mut updated = progress
        .cloned()
        .unwrap_or_else(|| ModuleProgress::new(user_id.clone(), module_id));
    updated.add_time_spent(minutes);
    updated
}

/// Course-level progress summary, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub completed: u32,
    pub total: u32,
    /// `completed / total * 100`, rounded half-up; 0 for an empty course.
    pub percent: u8,
    pub quiz_modules: u32,
    pub quizzes_passed: u32,
    pub time_spent_minutes: u64,
}

impl CourseProgress {
    /// Every module completed and every module quiz currently passed.
    #[must_use]
    pub fn certificate_eligible(&self) -> bool {
        self.total > 0 && self.completed == self.total && self.quizzes_passed == self.quiz_modules
    }
}

#[must_use]
pub fn course_progress(modules: &[Module], progress: &[ModuleProgress]) -> CourseProgress {
    let index = ProgressIndex::new(progress);
    let mut summary = CourseProgress {
        completed: 0,
        total: 0,
        percent: 0,
        quiz_modules: 0,
        quizzes_passed: 0,
        time_spent_minutes: 0,
    };

    for module in modules {
        summary.total += 1;
        let record = index.get(module.id());

        if record.is_some_and(ModuleProgress::is_completed) {
            summary.completed += 1;
        }
        if module.requires_quiz() {
            summary.quiz_modules += 1;
            if record.is_some_and(ModuleProgress::quiz_passed) {
                summary.quizzes_passed += 1;
            }
        }
        summary.time_spent_minutes += record.map_or(0, |p| u64::from(p.time_spent_minutes()));
    }

    summary.percent = percentage_half_up(u64::from(summary.completed), u64::from(summary.total));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, QuizSettings};
    use crate::progression::evaluate_unlocks;
    use crate::time::fixed_now;

    fn module(id: u64, order: u32, quiz: QuizSettings) -> Module {
        Module::new(
            ModuleId::new(id),
            CourseId::new(1),
            format!("M{id}"),
            order,
            quiz,
            "locked",
        )
        .unwrap()
    }

    fn path() -> Vec<Module> {
        vec![
            module(1, 0, QuizSettings::gated(70, 3).unwrap()),
            module(2, 1, QuizSettings::no_quiz()),
            module(3, 2, QuizSettings::no_quiz()),
        ]
    }

    fn user() -> UserId {
        UserId::new("u1")
    }

    #[test]
    fn completion_does_not_change_unlocks() {
        let modules = path();
        let before = evaluate_unlocks(&modules, &[]);

        let done: Vec<ModuleProgress> = modules
            .iter()
            .map(|m| mark_completed(&user(), m.id(), None, fixed_now()))
            .collect();
        let after = evaluate_unlocks(&modules, &done);

        assert_eq!(before, after);
    }

    #[test]
    fn completing_does_not_pass_the_quiz() {
        let progress = mark_completed(&user(), ModuleId::new(1), None, fixed_now());
        assert!(progress.is_completed());
        assert!(!progress.quiz_passed());
        assert_eq!(progress.quiz_attempts(), 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        let modules = path();
        let done = vec![mark_completed(&user(), ModuleId::new(2), None, fixed_now())];
        let summary = course_progress(&modules, &done);

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.percent, 33);

        let two = vec![
            mark_completed(&user(), ModuleId::new(2), None, fixed_now()),
            mark_completed(&user(), ModuleId::new(3), None, fixed_now()),
        ];
        assert_eq!(course_progress(&modules, &two).percent, 67);
    }

    #[test]
    fn empty_course_is_zero_percent_and_not_eligible() {
        let summary = course_progress(&[], &[]);
        assert_eq!(summary.percent, 0);
        assert!(!summary.certificate_eligible());
    }

    #[test]
    fn certificate_needs_completion_and_passed_quizzes() {
        let modules = path();
        let mut records: Vec<ModuleProgress> = modules
            .iter()
            .map(|m| mark_completed(&user(), m.id(), None, fixed_now()))
            .collect();
        assert!(!course_progress(&modules, &records).certificate_eligible());

        records[0].record_attempt(90, true, fixed_now());
        let summary = course_progress(&modules, &records);
        assert_eq!(summary.quizzes_passed, 1);
        assert!(summary.certificate_eligible());
    }

    #[test]
    fn time_spent_accumulates_across_modules() {
        let modules = path();
        let first = record_time_spent(&user(), ModuleId::new(1), None, 15);
        let first = record_time_spent(&user(), ModuleId::new(1), Some(&first), 5);
        let second = record_time_spent(&user(), ModuleId::new(2), None, 30);

        assert_eq!(first.time_spent_minutes(), 20);
        assert_eq!(course_progress(&modules, &[first, second]).time_spent_minutes, 50);
    }
}
