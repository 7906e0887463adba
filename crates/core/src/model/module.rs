use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("passing score must be between 0 and 100, got {0}")]
    InvalidPassingScore(u8),

    #[error("max attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("a module cannot gate unlocking on a quiz it does not have")]
    GateWithoutQuiz,
}

//
// ─── QUIZ SETTINGS ─────────────────────────────────────────────────────────────
//

/// Quiz requirements attached to a module.
///
/// `requires_quiz` says the module has a quiz at all. `quiz_required_to_unlock`
/// turns that quiz into a gate: later modules stay locked until it is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizSettings {
    requires_quiz: bool,
    quiz_required_to_unlock: bool,
    passing_score: u8,
    max_attempts: u32,
}

impl QuizSettings {
    pub const DEFAULT_PASSING_SCORE: u8 = 70;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Creates validated quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::InvalidPassingScore` if `passing_score > 100`,
    /// `ModuleError::InvalidMaxAttempts` if `max_attempts == 0`, and
    /// `ModuleError::GateWithoutQuiz` if the quiz gates unlocking but the
    /// module has no quiz.
    pub fn new(
        requires_quiz: bool,
        quiz_required_to_unlock: bool,
        passing_score: u8,
        max_attempts: u32,
    ) -> Result<Self, ModuleError> {
        if passing_score > 100 {
            return Err(ModuleError::InvalidPassingScore(passing_score));
        }
        if max_attempts == 0 {
            return Err(ModuleError::InvalidMaxAttempts);
        }
        if quiz_required_to_unlock && !requires_quiz {
            return Err(ModuleError::GateWithoutQuiz);
        }

        Ok(Self {
            requires_quiz,
            quiz_required_to_unlock,
            passing_score,
            max_attempts,
        })
    }

    /// Settings for a content-only module with no quiz.
    #[must_use]
    pub fn no_quiz() -> Self {
        Self {
            requires_quiz: false,
            quiz_required_to_unlock: false,
            passing_score: Self::DEFAULT_PASSING_SCORE,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Settings for a module whose quiz must be passed before moving on.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSettings::new`].
    pub fn gated(passing_score: u8, max_attempts: u32) -> Result<Self, ModuleError> {
        Self::new(true, true, passing_score, max_attempts)
    }

    #[must_use]
    pub fn requires_quiz(&self) -> bool {
        self.requires_quiz
    }

    #[must_use]
    pub fn quiz_required_to_unlock(&self) -> bool {
        self.quiz_required_to_unlock
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self::no_quiz()
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// One ordered step of a course's learning path.
///
/// `order_index` is the sequencing key; it is expected to be unique within a
/// course, but nothing here relies on that for safety.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    id: ModuleId,
    course_id: CourseId,
    title: String,
    order_index: u32,
    quiz: QuizSettings,
    unlock_message: String,
}

impl Module {
    /// Creates a new module.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the title is empty or whitespace-only.
    pub fn new(
        id: ModuleId,
        course_id: CourseId,
        title: impl Into<String>,
        order_index: u32,
        quiz: QuizSettings,
        unlock_message: impl Into<String>,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }

        Ok(Self {
            id,
            course_id,
            title: title.trim().to_owned(),
            order_index,
            quiz,
            unlock_message: unlock_message.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizSettings {
        &self.quiz
    }

    /// Message shown to learners blocked by this module's gate. Stored verbatim.
    #[must_use]
    pub fn unlock_message(&self) -> &str {
        &self.unlock_message
    }

    #[must_use]
    pub fn requires_quiz(&self) -> bool {
        self.quiz.requires_quiz()
    }

    #[must_use]
    pub fn quiz_required_to_unlock(&self) -> bool {
        self.quiz.quiz_required_to_unlock()
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.quiz.passing_score()
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.quiz.max_attempts()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_passing_score_above_100() {
        let err = QuizSettings::new(true, false, 101, 3).unwrap_err();
        assert_eq!(err, ModuleError::InvalidPassingScore(101));
    }

    #[test]
    fn rejects_zero_max_attempts() {
        let err = QuizSettings::gated(70, 0).unwrap_err();
        assert_eq!(err, ModuleError::InvalidMaxAttempts);
    }

    #[test]
    fn rejects_gate_without_quiz() {
        let err = QuizSettings::new(false, true, 70, 3).unwrap_err();
        assert_eq!(err, ModuleError::GateWithoutQuiz);
    }

    #[test]
    fn boundary_scores_are_accepted() {
        assert!(QuizSettings::gated(0, 1).is_ok());
        assert!(QuizSettings::gated(100, 1).is_ok());
    }

    #[test]
    fn module_trims_title_and_keeps_message_verbatim() {
        let module = Module::new(
            ModuleId::new(1),
            CourseId::new(1),
            "  Intro  ",
            0,
            QuizSettings::gated(70, 3).unwrap(),
            "  Pass the intro quiz first.",
        )
        .unwrap();

        assert_eq!(module.title(), "Intro");
        assert_eq!(module.unlock_message(), "  Pass the intro quiz first.");
        assert!(module.quiz_required_to_unlock());
        assert_eq!(module.max_attempts(), 3);
    }

    #[test]
    fn module_rejects_blank_title() {
        let err = Module::new(
            ModuleId::new(1),
            CourseId::new(1),
            "   ",
            0,
            QuizSettings::no_quiz(),
            "",
        )
        .unwrap_err();
        assert_eq!(err, ModuleError::EmptyTitle);
    }
}
