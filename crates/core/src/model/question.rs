use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ModuleId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("multiple choice question needs at least one option")]
    NoOptions,

    #[error("option {index} is blank")]
    BlankOption { index: usize },

    #[error("correct option index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("question points must be at least 1")]
    InvalidPoints,
}

//
// ─── PAYLOAD ───────────────────────────────────────────────────────────────────
//

/// Kind-specific shape of a question, including its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionPayload {
    MultipleChoice {
        options: Vec<String>,
        correct_index: usize,
    },
    TrueFalse {
        correct: bool,
    },
}

impl QuestionPayload {
    /// Checks the payload is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for empty/blank options or an out-of-range
    /// correct index.
    pub fn validate(&self) -> Result<(), QuestionError> {
        match self {
            Self::MultipleChoice {
                options,
                correct_index,
            } => {
                if options.is_empty() {
                    return Err(QuestionError::NoOptions);
                }
                if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
                    return Err(QuestionError::BlankOption { index });
                }
                if *correct_index >= options.len() {
                    return Err(QuestionError::CorrectIndexOutOfRange {
                        index: *correct_index,
                        len: options.len(),
                    });
                }
                Ok(())
            }
            Self::TrueFalse { .. } => Ok(()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MultipleChoice { .. } => "multiple_choice",
            Self::TrueFalse { .. } => "true_false",
        }
    }

    /// Reads a raw form value as an answer of this question's kind.
    ///
    /// Multiple-choice answers keep the text as given, so an option literally
    /// named `true` still matches. True/false questions accept `true` and
    /// `false`; any other text stays a choice and is graded wrong.
    #[must_use]
    pub fn parse_answer(&self, raw: &str) -> SubmittedAnswer {
        match (self, raw) {
            (Self::TrueFalse { .. }, "true") => SubmittedAnswer::TrueFalse(true),
            (Self::TrueFalse { .. }, "false") => SubmittedAnswer::TrueFalse(false),
            _ => SubmittedAnswer::Choice(raw.to_owned()),
        }
    }

    /// Whether `answer` is exactly the stored correct value.
    ///
    /// Option text is compared byte-for-byte; an answer of the wrong kind is
    /// never correct.
    #[must_use]
    pub fn is_correct(&self, answer: &SubmittedAnswer) -> bool {
        match (self, answer) {
            (
                Self::MultipleChoice {
                    options,
                    correct_index,
                },
                SubmittedAnswer::Choice(value),
            ) => options.get(*correct_index) == Some(value),
            (Self::TrueFalse { correct }, SubmittedAnswer::TrueFalse(value)) => correct == value,
            _ => false,
        }
    }
}

//
// ─── SUBMITTED ANSWER ──────────────────────────────────────────────────────────
//

/// A learner's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    TrueFalse(bool),
    Choice(String),
}

impl From<bool> for SubmittedAnswer {
    fn from(value: bool) -> Self {
        Self::TrueFalse(value)
    }
}

impl From<&str> for SubmittedAnswer {
    fn from(value: &str) -> Self {
        Self::Choice(value.to_owned())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A quiz question belonging to exactly one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    id: QuestionId,
    module_id: ModuleId,
    prompt: String,
    payload: QuestionPayload,
    points: u32,
}

impl QuizQuestion {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, the payload is
    /// inconsistent, or `points == 0`.
    pub fn new(
        id: QuestionId,
        module_id: ModuleId,
        prompt: impl Into<String>,
        payload: QuestionPayload,
        points: u32,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if points == 0 {
            return Err(QuestionError::InvalidPoints);
        }
        payload.validate()?;

        Ok(Self {
            id,
            module_id,
            prompt: prompt.trim().to_owned(),
            payload,
            points,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn payload(&self) -> &QuestionPayload {
        &self.payload
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(options: &[&str], correct_index: usize) -> QuestionPayload {
        QuestionPayload::MultipleChoice {
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            correct_index,
        }
    }

    #[test]
    fn multiple_choice_requires_options() {
        let err = choice(&[], 0).validate().unwrap_err();
        assert_eq!(err, QuestionError::NoOptions);
    }

    #[test]
    fn multiple_choice_rejects_out_of_range_index() {
        let err = choice(&["a", "b"], 2).validate().unwrap_err();
        assert_eq!(err, QuestionError::CorrectIndexOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn multiple_choice_rejects_blank_option() {
        let err = choice(&["a", " "], 0).validate().unwrap_err();
        assert_eq!(err, QuestionError::BlankOption { index: 1 });
    }

    #[test]
    fn question_rejects_zero_points() {
        let err = QuizQuestion::new(
            QuestionId::new(1),
            ModuleId::new(1),
            "2 + 2?",
            QuestionPayload::TrueFalse { correct: true },
            0,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::InvalidPoints);
    }

    #[test]
    fn choice_match_is_exact() {
        let payload = choice(&["Paris", "Rome"], 0);
        assert!(payload.is_correct(&"Paris".into()));
        assert!(!payload.is_correct(&"paris".into()));
        assert!(!payload.is_correct(&"Paris ".into()));
        assert!(!payload.is_correct(&SubmittedAnswer::TrueFalse(true)));
    }

    #[test]
    fn true_false_match_is_boolean() {
        let payload = QuestionPayload::TrueFalse { correct: false };
        assert!(payload.is_correct(&false.into()));
        assert!(!payload.is_correct(&true.into()));
        assert!(!payload.is_correct(&"false".into()));
    }

    #[test]
    fn true_false_answers_parse_literal_booleans() {
        let payload = QuestionPayload::TrueFalse { correct: true };
        assert_eq!(payload.parse_answer("true"), SubmittedAnswer::TrueFalse(true));
        assert_eq!(payload.parse_answer("false"), SubmittedAnswer::TrueFalse(false));
        assert_eq!(payload.parse_answer("True"), SubmittedAnswer::Choice("True".into()));
    }

    #[test]
    fn choice_named_true_stays_text() {
        let payload = choice(&["true", "false", "maybe"], 0);
        let answer = payload.parse_answer("true");
        assert_eq!(answer, SubmittedAnswer::Choice("true".into()));
        assert!(payload.is_correct(&answer));
        assert!(!payload.is_correct(&payload.parse_answer("false")));
    }

    #[test]
    fn payload_json_is_tagged() {
        let json = serde_json::to_string(&choice(&["x"], 0)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"multiple_choice","options":["x"],"correct_index":0}"#
        );
        let back: QuestionPayload =
            serde_json::from_str(r#"{"type":"true_false","correct":true}"#).unwrap();
        assert_eq!(back, QuestionPayload::TrueFalse { correct: true });
    }
}
