use std::sync::Arc;

use course_core::model::{
    CourseId, Module, ModuleId, QuestionId, QuestionPayload, QuizQuestion, QuizSettings,
};
use storage::repository::{ModuleRepository, QuestionRepository};
use tracing::info;

use crate::error::CatalogServiceError;

/// Authoring side of the learning path: modules and their quiz questions.
#[derive(Clone)]
pub struct CatalogService {
    modules: Arc<dyn ModuleRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(modules: Arc<dyn ModuleRepository>, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { modules, questions }
    }

    /// Create or replace a module.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Module` for validation failures,
    /// `CatalogServiceError::DuplicateOrderIndex` if another module of the
    /// course already sits at `order_index`, and
    /// `CatalogServiceError::Storage` if persistence fails.
    pub async fn save_module(
        &self,
        id: ModuleId,
        course_id: CourseId,
        title: String,
        order_index: u32,
        quiz: QuizSettings,
        unlock_message: String,
    ) -> Result<Module, CatalogServiceError> {
        let module = Module::new(id, course_id, title, order_index, quiz, unlock_message)?;

        let siblings = self.modules.modules_for_course(course_id).await?;
        if let Some(existing) = siblings
            .iter()
            .find(|m| m.order_index() == order_index && m.id() != id)
        {
            return Err(CatalogServiceError::DuplicateOrderIndex {
                order_index,
                existing: existing.id(),
            });
        }

        self.modules.upsert_module(&module).await?;
        info!(module = %module.id(), course = %course_id, order_index, "module saved");
        Ok(module)
    }

    /// Create or replace a quiz question on a module that has a quiz.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::UnknownModule` if the module is missing,
    /// `CatalogServiceError::QuizNotEnabled` if it has no quiz,
    /// `CatalogServiceError::Question` for invalid payloads, and
    /// `CatalogServiceError::Storage` if persistence fails.
    pub async fn save_question(
        &self,
        id: QuestionId,
        module_id: ModuleId,
        prompt: String,
        payload: QuestionPayload,
        points: u32,
    ) -> Result<QuizQuestion, CatalogServiceError> {
        let module = self
            .modules
            .get_module(module_id)
            .await?
            .ok_or(CatalogServiceError::UnknownModule { module: module_id })?;
        if !module.requires_quiz() {
            return Err(CatalogServiceError::QuizNotEnabled { module: module_id });
        }

        let question = QuizQuestion::new(id, module_id, prompt, payload, points)?;
        self.questions.upsert_question(&question).await?;
        info!(question = %id, module = %module_id, kind = question.payload().kind(), "question saved");
        Ok(question)
    }

    /// Modules of a course in path order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, CatalogServiceError> {
        Ok(self.modules.modules_for_course(course_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn list_questions(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<QuizQuestion>, CatalogServiceError> {
        Ok(self.questions.questions_for_module(module_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn service() -> CatalogService {
        let repo = InMemoryRepository::new();
        CatalogService::new(Arc::new(repo.clone()), Arc::new(repo))
    }

    #[tokio::test]
    async fn rejects_second_module_at_same_position() {
        let catalog = service();
        catalog
            .save_module(
                ModuleId::new(1),
                CourseId::new(1),
                "Intro".into(),
                0,
                QuizSettings::no_quiz(),
                String::new(),
            )
            .await
            .unwrap();

        let err = catalog
            .save_module(
                ModuleId::new(2),
                CourseId::new(1),
                "Also intro".into(),
                0,
                QuizSettings::no_quiz(),
                String::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogServiceError::DuplicateOrderIndex { order_index: 0, existing } if existing == ModuleId::new(1)
        ));
    }

    #[tokio::test]
    async fn resaving_a_module_keeps_its_position() {
        let catalog = service();
        for title in ["Intro", "Intro (revised)"] {
            catalog
                .save_module(
                    ModuleId::new(1),
                    CourseId::new(1),
                    title.into(),
                    0,
                    QuizSettings::no_quiz(),
                    String::new(),
                )
                .await
                .unwrap();
        }
        let modules = catalog.list_modules(CourseId::new(1)).await.unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].title(), "Intro (revised)");
    }

    #[tokio::test]
    async fn questions_need_a_quiz_module() {
        let catalog = service();
        catalog
            .save_module(
                ModuleId::new(1),
                CourseId::new(1),
                "Reading".into(),
                0,
                QuizSettings::no_quiz(),
                String::new(),
            )
            .await
            .unwrap();

        let err = catalog
            .save_question(
                QuestionId::new(1),
                ModuleId::new(1),
                "Done?".into(),
                QuestionPayload::TrueFalse { correct: true },
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogServiceError::QuizNotEnabled { .. }));

        let err = catalog
            .save_question(
                QuestionId::new(1),
                ModuleId::new(42),
                "Done?".into(),
                QuestionPayload::TrueFalse { correct: true },
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogServiceError::UnknownModule { .. }));
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_before_storage() {
        let catalog = service();
        catalog
            .save_module(
                ModuleId::new(1),
                CourseId::new(1),
                "Quiz".into(),
                0,
                QuizSettings::gated(70, 3).unwrap(),
                "Pass the quiz".into(),
            )
            .await
            .unwrap();

        let err = catalog
            .save_question(
                QuestionId::new(1),
                ModuleId::new(1),
                "Pick one".into(),
                QuestionPayload::MultipleChoice {
                    options: vec!["a".into()],
                    correct_index: 3,
                },
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogServiceError::Question(_)));
        assert!(catalog.list_questions(ModuleId::new(1)).await.unwrap().is_empty());
    }
}
