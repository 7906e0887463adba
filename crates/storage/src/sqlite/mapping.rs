use course_core::model::{
    CourseId, Module, ModuleId, ModuleProgress, QuestionId, QuestionPayload, QuizQuestion,
    QuizSettings, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// A unique-constraint violation means a concurrent writer got there first.
pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    i64::from(v)
}

fn i64_to_bool(field: &'static str, v: i64) -> Result<bool, StorageError> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid {field}: {other}"
        ))),
    }
}

fn get_bool(row: &SqliteRow, field: &'static str) -> Result<bool, StorageError> {
    i64_to_bool(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

fn get_u32(row: &SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    i64_to_u32(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn payload_to_json(payload: &QuestionPayload) -> Result<String, StorageError> {
    serde_json::to_string(payload).map_err(ser)
}

pub(crate) fn map_module_row(row: &SqliteRow) -> Result<Module, StorageError> {
    let passing_score = u8::try_from(row.try_get::<i64, _>("passing_score").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("passing_score overflow".into()))?;

    let quiz = QuizSettings::new(
        get_bool(row, "requires_quiz")?,
        get_bool(row, "quiz_required_to_unlock")?,
        passing_score,
        get_u32(row, "max_attempts")?,
    )
    .map_err(ser)?;

    Module::new(
        ModuleId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?),
        CourseId::new(i64_to_u64("course_id", row.try_get("course_id").map_err(ser)?)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        get_u32(row, "order_index")?,
        quiz,
        row.try_get::<String, _>("unlock_message").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuizQuestion, StorageError> {
    let payload_json: String = row.try_get("payload").map_err(ser)?;
    let payload: QuestionPayload = serde_json::from_str(&payload_json).map_err(ser)?;

    QuizQuestion::new(
        QuestionId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?),
        ModuleId::new(i64_to_u64("module_id", row.try_get("module_id").map_err(ser)?)?),
        row.try_get::<String, _>("prompt").map_err(ser)?,
        payload,
        get_u32(row, "points")?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ModuleProgress, StorageError> {
    let quiz_score = row
        .try_get::<Option<i64>, _>("quiz_score")
        .map_err(ser)?
        .map(|v| {
            u8::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid quiz_score: {v}")))
        })
        .transpose()?;

    ModuleProgress::from_persisted(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        ModuleId::new(i64_to_u64("module_id", row.try_get("module_id").map_err(ser)?)?),
        get_bool(row, "is_completed")?,
        row.try_get("completed_at").map_err(ser)?,
        get_bool(row, "quiz_passed")?,
        quiz_score,
        get_u32(row, "quiz_attempts")?,
        get_u32(row, "time_spent_minutes")?,
        row.try_get("last_attempt_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_columns_are_strict() {
        assert!(i64_to_bool("flag", 1).unwrap());
        assert!(!i64_to_bool("flag", 0).unwrap());
        assert!(matches!(
            i64_to_bool("flag", 2),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(i64_to_u64("id", -1).is_err());
        assert_eq!(id_to_i64("id", 7).unwrap(), 7);
        assert!(id_to_i64("id", u64::MAX).is_err());
    }
}
