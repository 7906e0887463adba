use course_core::model::{CourseId, ModuleId, ModuleProgress, UserId};

use super::SqliteRepository;
use super::mapping::{bool_to_i64, conn, id_to_i64, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "
    p.user_id, p.module_id, p.is_completed, p.completed_at, p.quiz_passed,
    p.quiz_score, p.quiz_attempts, p.time_spent_minutes, p.last_attempt_at
";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<Option<ModuleProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM module_progress p WHERE p.user_id = ?1 AND p.module_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(user_id.as_str().to_owned())
            .bind(id_to_i64("module_id", module_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn progress_for_course(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<ModuleProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS}
             FROM module_progress p
             JOIN modules m ON m.id = p.module_id
             WHERE p.user_id = ?1 AND m.course_id = ?2
             ORDER BY p.module_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_str().to_owned())
            .bind(id_to_i64("course_id", course_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn upsert_progress(&self, progress: &ModuleProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO module_progress (
                user_id, module_id, is_completed, completed_at, quiz_passed,
                quiz_score, quiz_attempts, time_spent_minutes, last_attempt_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id, module_id) DO UPDATE SET
                is_completed = excluded.is_completed,
                completed_at = excluded.completed_at,
                quiz_passed = excluded.quiz_passed,
                quiz_score = excluded.quiz_score,
                quiz_attempts = excluded.quiz_attempts,
                time_spent_minutes = excluded.time_spent_minutes,
                last_attempt_at = excluded.last_attempt_at
            ",
        )
        .bind(progress.user_id().as_str().to_owned())
        .bind(id_to_i64("module_id", progress.module_id().value())?)
        .bind(bool_to_i64(progress.is_completed()))
        .bind(progress.completed_at())
        .bind(bool_to_i64(progress.quiz_passed()))
        .bind(progress.quiz_score().map(i64::from))
        .bind(i64::from(progress.quiz_attempts()))
        .bind(i64::from(progress.time_spent_minutes()))
        .bind(progress.last_attempt_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn save_completion(&self, progress: &ModuleProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO module_progress (
                user_id, module_id, is_completed, completed_at, quiz_passed,
                quiz_score, quiz_attempts, time_spent_minutes, last_attempt_at
            )
            VALUES (?1, ?2, ?3, ?4, 0, NULL, 0, 0, NULL)
            ON CONFLICT(user_id, module_id) DO UPDATE SET
                is_completed = MAX(module_progress.is_completed, excluded.is_completed),
                completed_at = COALESCE(module_progress.completed_at, excluded.completed_at)
            ",
        )
        .bind(progress.user_id().as_str().to_owned())
        .bind(id_to_i64("module_id", progress.module_id().value())?)
        .bind(bool_to_i64(progress.is_completed()))
        .bind(progress.completed_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn add_time_spent(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
        minutes: u32,
    ) -> Result<u32, StorageError> {
        let total: i64 = sqlx::query_scalar(
            r"
            INSERT INTO module_progress (
                user_id, module_id, is_completed, completed_at, quiz_passed,
                quiz_score, quiz_attempts, time_spent_minutes, last_attempt_at
            )
            VALUES (?1, ?2, 0, NULL, 0, NULL, 0, ?3, NULL)
            ON CONFLICT(user_id, module_id) DO UPDATE SET
                time_spent_minutes = MIN(
                    module_progress.time_spent_minutes + excluded.time_spent_minutes,
                    ?4
                )
            RETURNING time_spent_minutes
            ",
        )
        .bind(user_id.as_str().to_owned())
        .bind(id_to_i64("module_id", module_id.value())?)
        .bind(i64::from(minutes))
        .bind(i64::from(u32::MAX))
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        u32::try_from(total).map_err(|_| {
            StorageError::Serialization(format!("invalid time_spent_minutes: {total}"))
        })
    }

    async fn save_attempt(
        &self,
        progress: &ModuleProgress,
        expected_prior_attempts: u32,
    ) -> Result<(), StorageError> {
        let user = progress.user_id().as_str().to_owned();
        let module_id = id_to_i64("module_id", progress.module_id().value())?;
        let expected = i64::from(expected_prior_attempts);

        // Each branch is one conditional statement, so the counter check and
        // the write happen atomically.
        let res = if expected_prior_attempts == 0 {
            sqlx::query(
                r"
                INSERT INTO module_progress (
                    user_id, module_id, is_completed, completed_at, quiz_passed,
                    quiz_score, quiz_attempts, time_spent_minutes, last_attempt_at
                )
                VALUES (?1, ?2, 0, NULL, ?3, ?4, ?5, 0, ?6)
                ON CONFLICT(user_id, module_id) DO UPDATE SET
                    quiz_passed = excluded.quiz_passed,
                    quiz_score = excluded.quiz_score,
                    quiz_attempts = excluded.quiz_attempts,
                    last_attempt_at = excluded.last_attempt_at
                WHERE module_progress.quiz_attempts = ?7
                ",
            )
        } else {
            sqlx::query(
                r"
                UPDATE module_progress SET
                    quiz_passed = ?3,
                    quiz_score = ?4,
                    quiz_attempts = ?5,
                    last_attempt_at = ?6
                WHERE user_id = ?1 AND module_id = ?2 AND quiz_attempts = ?7
                ",
            )
        }
        .bind(user)
        .bind(module_id)
        .bind(bool_to_i64(progress.quiz_passed()))
        .bind(progress.quiz_score().map(i64::from))
        .bind(i64::from(progress.quiz_attempts()))
        .bind(progress.last_attempt_at())
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 1 {
            Ok(())
        } else {
            Err(StorageError::Conflict)
        }
    }
}
