use course_core::model::{CourseId, Module, ModuleId};

use super::SqliteRepository;
use super::mapping::{bool_to_i64, conn, id_to_i64, map_module_row};
use crate::repository::{ModuleRepository, StorageError};

#[async_trait::async_trait]
impl ModuleRepository for SqliteRepository {
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO modules (
                id, course_id, title, order_index, requires_quiz,
                quiz_required_to_unlock, passing_score, max_attempts, unlock_message
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                course_id = excluded.course_id,
                title = excluded.title,
                order_index = excluded.order_index,
                requires_quiz = excluded.requires_quiz,
                quiz_required_to_unlock = excluded.quiz_required_to_unlock,
                passing_score = excluded.passing_score,
                max_attempts = excluded.max_attempts,
                unlock_message = excluded.unlock_message
            ",
        )
        .bind(id_to_i64("id", module.id().value())?)
        .bind(id_to_i64("course_id", module.course_id().value())?)
        .bind(module.title().to_owned())
        .bind(i64::from(module.order_index()))
        .bind(bool_to_i64(module.requires_quiz()))
        .bind(bool_to_i64(module.quiz_required_to_unlock()))
        .bind(i64::from(module.passing_score()))
        .bind(i64::from(module.max_attempts()))
        .bind(module.unlock_message().to_owned())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, course_id, title, order_index, requires_quiz,
                   quiz_required_to_unlock, passing_score, max_attempts, unlock_message
            FROM modules WHERE id = ?1
            ",
        )
        .bind(id_to_i64("id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_module_row).transpose()
    }

    async fn modules_for_course(&self, course_id: CourseId) -> Result<Vec<Module>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, title, order_index, requires_quiz,
                   quiz_required_to_unlock, passing_score, max_attempts, unlock_message
            FROM modules
            WHERE course_id = ?1
            ORDER BY order_index ASC, id ASC
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_module_row).collect()
    }
}
