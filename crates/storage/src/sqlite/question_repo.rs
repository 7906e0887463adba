use course_core::model::{ModuleId, QuizQuestion};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_question_row, payload_to_json};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &QuizQuestion) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_questions (id, module_id, prompt, payload, points)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                module_id = excluded.module_id,
                prompt = excluded.prompt,
                payload = excluded.payload,
                points = excluded.points
            ",
        )
        .bind(id_to_i64("id", question.id().value())?)
        .bind(id_to_i64("module_id", question.module_id().value())?)
        .bind(question.prompt().to_owned())
        .bind(payload_to_json(question.payload())?)
        .bind(i64::from(question.points()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn questions_for_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, module_id, prompt, payload, points
            FROM quiz_questions
            WHERE module_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("module_id", module_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }
}
