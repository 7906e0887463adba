use thiserror::Error;

use crate::model::QuestionId;

/// Why a quiz submission was refused before grading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedSubmission {
    #[error("no answers were submitted")]
    EmptyAnswers,

    #[error("question {0} does not belong to this module")]
    UnknownQuestion(QuestionId),
}

/// Rejections raised by the progression engine.
///
/// Both are user-facing, non-fatal conditions. Absence of data (no progress
/// record, unanswered question) is never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("no quiz attempts left ({attempts} of {max_attempts} used)")]
    AttemptsExhausted { attempts: u32, max_attempts: u32 },

    #[error("malformed submission: {0}")]
    MalformedSubmission(#[from] MalformedSubmission),
}
