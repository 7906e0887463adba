use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use course_core::model::{CourseId, Module, ModuleId, ModuleProgress, QuizQuestion, UserId};
use course_core::progression::{
    self, Answers, CourseProgress, GradeResult, PathUnlocks, RawAnswers, UnlockState,
};
use storage::repository::{
    ModuleRepository, ProgressRepository, QuestionRepository, StorageError,
};

use crate::Clock;
use crate::error::ProgressionServiceError;

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// One row of a learner's course overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOverview {
    pub module_id: ModuleId,
    pub title: String,
    pub order_index: u32,
    #[serde(flatten)]
    pub state: UnlockState,
    pub requires_quiz: bool,
    pub is_completed: bool,
    pub quiz_passed: bool,
    pub quiz_score: Option<u8>,
    pub attempts_used: u32,
    pub attempts_remaining: u32,
}

/// A learner's view of a whole course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseOverview {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub modules: Vec<ModuleOverview>,
    pub progress: CourseProgress,
    pub certificate_eligible: bool,
    pub next_module: Option<ModuleId>,
}

/// Result of a persisted quiz submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSubmission {
    pub grade: GradeResult,
    pub progress: ModuleProgress,
    pub attempts_remaining: u32,
}

/// Everything needed to decide what a learner may do with one module.
struct ModuleContext {
    module: Module,
    course_progress: Vec<ModuleProgress>,
    unlocks: PathUnlocks,
}

impl ModuleContext {
    fn current(&self) -> Option<&ModuleProgress> {
        self.course_progress
            .iter()
            .find(|p| p.module_id() == self.module.id())
    }

    fn ensure_unlocked(&self) -> Result<(), ProgressionServiceError> {
        match self.unlocks.state_of(self.module.id()) {
            Some(UnlockState::Locked {
                blocked_by,
                message,
            }) => Err(ProgressionServiceError::ModuleLocked {
                module: self.module.id(),
                blocked_by: *blocked_by,
                message: message.clone(),
            }),
            _ => Ok(()),
        }
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Runs the progression engine against stored modules, questions and progress.
///
/// Each call reads what it needs, evaluates, and writes at most one progress
/// record. Quiz attempts are written with an optimistic counter check, so two
/// racing submissions cannot both consume the same attempt.
#[derive(Clone)]
pub struct ProgressionService {
    clock: Clock,
    modules: Arc<dyn ModuleRepository>,
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        modules: Arc<dyn ModuleRepository>,
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            modules,
            questions,
            progress,
        }
    }

    /// Unlock states, progress and next step for a learner in a course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::Storage` if repository access fails.
    #[instrument(skip_all, fields(course = %course_id, user = %user_id))]
    pub async fn course_overview(
        &self,
        course_id: CourseId,
        user_id: &UserId,
    ) -> Result<CourseOverview, ProgressionServiceError> {
        let modules = self.modules.modules_for_course(course_id).await?;
        let records = self.progress.progress_for_course(user_id, course_id).await?;

        let unlocks = progression::evaluate_unlocks(&modules, &records);
        let summary = progression::course_progress(&modules, &records);
        let next = progression::next_module(&modules, &records).map(Module::id);
        debug!(
            modules = modules.len(),
            unlocked = unlocks.unlocked_count(),
            "evaluated unlocks"
        );

        let rows = unlocks
            .entries()
            .iter()
            .filter_map(|entry| {
                let module = modules.iter().find(|m| m.id() == entry.module_id)?;
                let record = records.iter().find(|p| p.module_id() == entry.module_id);
                Some(ModuleOverview {
                    module_id: module.id(),
                    title: module.title().to_owned(),
                    order_index: module.order_index(),
                    state: entry.state.clone(),
                    requires_quiz: module.requires_quiz(),
                    is_completed: record.is_some_and(ModuleProgress::is_completed),
                    quiz_passed: record.is_some_and(ModuleProgress::quiz_passed),
                    quiz_score: record.and_then(ModuleProgress::quiz_score),
                    attempts_used: record.map_or(0, ModuleProgress::quiz_attempts),
                    attempts_remaining: progression::attempts_remaining(module, record),
                })
            })
            .collect();

        Ok(CourseOverview {
            course_id,
            user_id: user_id.clone(),
            modules: rows,
            certificate_eligible: summary.certificate_eligible(),
            progress: summary,
            next_module: next,
        })
    }

    /// Grade a learner's quiz submission and record the attempt.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::UnknownModule` if the module does not
    /// exist, `ProgressionServiceError::ModuleLocked` if the learner has not
    /// unlocked it, `ProgressionServiceError::Progression` when attempts are
    /// exhausted or the submission is malformed, and
    /// `ProgressionServiceError::Storage` on persistence failures, including
    /// `StorageError::Conflict` when another attempt landed first.
    #[instrument(skip_all, fields(module = %module_id, user = %user_id, answers = answers.len()))]
    pub async fn submit_quiz(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
        answers: &Answers,
    ) -> Result<QuizSubmission, ProgressionServiceError> {
        let (ctx, questions) = self.load_quiz(user_id, module_id).await?;
        self.grade_and_record(user_id, &ctx, &questions, answers).await
    }

    /// Like [`submit_quiz`](Self::submit_quiz), for answers given as plain
    /// text. Each value is typed by the kind of question it answers.
    ///
    /// # Errors
    ///
    /// Same as [`submit_quiz`](Self::submit_quiz).
    #[instrument(skip_all, fields(module = %module_id, user = %user_id, answers = raw.len()))]
    pub async fn submit_raw_answers(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
        raw: &RawAnswers,
    ) -> Result<QuizSubmission, ProgressionServiceError> {
        let (ctx, questions) = self.load_quiz(user_id, module_id).await?;
        let answers = progression::parse_answers(&questions, raw);
        self.grade_and_record(user_id, &ctx, &questions, &answers).await
    }

    /// Mark a module's content as completed for a learner.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::UnknownModule`,
    /// `ProgressionServiceError::ModuleLocked`, or
    /// `ProgressionServiceError::Storage`.
    #[instrument(skip_all, fields(module = %module_id, user = %user_id))]
    pub async fn complete_module(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<ModuleProgress, ProgressionServiceError> {
        let ctx = self.load_context(user_id, module_id).await?;
        ctx.ensure_unlocked()?;

        let updated =
            progression::mark_completed(user_id, module_id, ctx.current(), self.clock.now());
        self.progress.save_completion(&updated).await?;
        info!("module completed");
        self.stored_progress(user_id, module_id).await
    }

    /// Add study time to a learner's module progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::UnknownModule`,
    /// `ProgressionServiceError::ModuleLocked`, or
    /// `ProgressionServiceError::Storage`.
    #[instrument(skip_all, fields(module = %module_id, user = %user_id))]
    pub async fn record_time(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
        minutes: u32,
    ) -> Result<ModuleProgress, ProgressionServiceError> {
        let ctx = self.load_context(user_id, module_id).await?;
        ctx.ensure_unlocked()?;

        let total = self
            .progress
            .add_time_spent(user_id, module_id, minutes)
            .await?;
        debug!(minutes, total, "time recorded");
        self.stored_progress(user_id, module_id).await
    }

    async fn load_quiz(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<(ModuleContext, Vec<QuizQuestion>), ProgressionServiceError> {
        let ctx = self.load_context(user_id, module_id).await?;
        ctx.ensure_unlocked()
            .inspect_err(|err| warn!(%err, "submission to locked module"))?;
        let questions = self.questions.questions_for_module(module_id).await?;
        Ok((ctx, questions))
    }

    async fn grade_and_record(
        &self,
        user_id: &UserId,
        ctx: &ModuleContext,
        questions: &[QuizQuestion],
        answers: &Answers,
    ) -> Result<QuizSubmission, ProgressionServiceError> {
        let outcome = progression::submit_quiz(
            &ctx.module,
            questions,
            answers,
            user_id,
            ctx.current(),
            self.clock.now(),
        )
        .inspect_err(|err| warn!(%err, "quiz submission rejected"))?;

        self.progress
            .save_attempt(&outcome.progress, outcome.prior_attempts)
            .await
            .inspect_err(|err| warn!(%err, "failed to record quiz attempt"))?;

        let remaining = progression::attempts_remaining(&ctx.module, Some(&outcome.progress));
        info!(
            score = outcome.grade.score,
            passed = outcome.grade.passed,
            attempt = outcome.progress.quiz_attempts(),
            remaining,
            "quiz graded"
        );

        Ok(QuizSubmission {
            grade: outcome.grade,
            progress: outcome.progress,
            attempts_remaining: remaining,
        })
    }

    async fn stored_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<ModuleProgress, ProgressionServiceError> {
        Ok(self
            .progress
            .get_progress(user_id, module_id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }

    async fn load_context(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<ModuleContext, ProgressionServiceError> {
        let module = self
            .modules
            .get_module(module_id)
            .await?
            .ok_or(ProgressionServiceError::UnknownModule { module: module_id })?;
        let course_modules = self.modules.modules_for_course(module.course_id()).await?;
        let course_progress = self
            .progress
            .progress_for_course(user_id, module.course_id())
            .await?;
        let unlocks = progression::evaluate_unlocks(&course_modules, &course_progress);

        Ok(ModuleContext {
            module,
            course_progress,
            unlocks,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
