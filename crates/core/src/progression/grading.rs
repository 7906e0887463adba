use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::MalformedSubmission;
use crate::model::{QuestionId, QuizQuestion, SubmittedAnswer};

/// Answers keyed by question, as submitted by a learner.
pub type Answers = BTreeMap<QuestionId, SubmittedAnswer>;

/// Untyped answers straight from a form or command line.
pub type RawAnswers = BTreeMap<QuestionId, String>;

/// Outcome for a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub correct: bool,
    pub points_awarded: u32,
}

/// Result of grading one submission.
///
/// `correct_count` counts questions; `score` is weighted by points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeResult {
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
    pub earned_points: u64,
    pub total_points: u64,
    pub passed: bool,
    pub questions: Vec<QuestionResult>,
}

/// `100 * part / whole`, rounded half-up. Returns 0 when `whole` is 0.
#[must_use]
pub fn percentage_half_up(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole);
    let pct = (200 * u128::from(part) + u128::from(whole)) / (2 * u128::from(whole));
    u8::try_from(pct).unwrap_or(100)
}

/// Grade `answers` against `questions`.
///
/// Each answer must equal the stored correct value exactly; there is no
/// partial credit and no normalization. Unanswered questions are wrong.
/// Answers for unknown question ids are ignored here; reject them first with
/// [`validate_submission`].
#[must_use]
pub fn grade(questions: &[QuizQuestion], answers: &Answers, passing_score: u8) -> GradeResult {
    let mut results = Vec::with_capacity(questions.len());
    let mut correct_count = 0u32;
    let mut earned_points = 0u64;
    let mut total_points = 0u64;

    for question in questions {
        let points = u64::from(question.points());
        total_points += points;

        let correct = answers
            .get(&question.id())
            .is_some_and(|answer| question.payload().is_correct(answer));
        if correct {
            correct_count += 1;
            earned_points += points;
        }

        results.push(QuestionResult {
            question_id: question.id(),
            correct,
            points_awarded: if correct { question.points() } else { 0 },
        });
    }

    let score = percentage_half_up(earned_points, total_points);

    GradeResult {
        score,
        correct_count,
        total_questions: u32::try_from(questions.len()).unwrap_or(u32::MAX),
        earned_points,
        total_points,
        passed: score >= passing_score,
        questions: results,
    }
}

/// Reject submissions that cannot be graded meaningfully.
///
/// # Errors
///
/// Returns `MalformedSubmission::EmptyAnswers` for an empty payload and
/// `MalformedSubmission::UnknownQuestion` for the first answer whose id is not
/// among `questions`.
pub fn validate_submission(
    questions: &[QuizQuestion],
    answers: &Answers,
) -> Result<(), MalformedSubmission> {
    if answers.is_empty() {
        return Err(MalformedSubmission::EmptyAnswers);
    }

    let known: HashSet<QuestionId> = questions.iter().map(QuizQuestion::id).collect();
    match answers.keys().find(|id| !known.contains(id)) {
        Some(id) => Err(MalformedSubmission::UnknownQuestion(*id)),
        None => Ok(()),
    }
}

/// Type each raw answer by the kind of the question it targets.
///
/// Answers to ids not among `questions` are kept as text so that
/// [`validate_submission`] still reports them.
#[must_use]
pub fn parse_answers(questions: &[QuizQuestion], raw: &RawAnswers) -> Answers {
    raw.iter()
        .map(|(id, value)| {
            let answer = match questions.iter().find(|q| q.id() == *id) {
                Some(question) => question.payload().parse_answer(value),
                None => SubmittedAnswer::Choice(value.clone()),
            };
            (*id, answer)
        })
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
