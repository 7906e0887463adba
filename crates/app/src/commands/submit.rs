use course_core::model::{ModuleId, UserId};
use course_core::progression::RawAnswers;
use services::{AppServices, QuizSubmission};

pub async fn execute(
    app: &AppServices,
    user: &UserId,
    module: ModuleId,
    answers: RawAnswers,
    json: bool,
) -> anyhow::Result<()> {
    let result = app
        .progression()
        .submit_raw_answers(user, module, &answers)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", summary(&result));
    }
    Ok(())
}

fn summary(result: &QuizSubmission) -> String {
    let grade = &result.grade;
    let verdict = if grade.passed { "passed" } else { "not passed" };
    format!(
        "score {}% ({}/{} correct, {}/{} points) {verdict}; attempt {}, {} left",
        grade.score,
        grade.correct_count,
        grade.total_questions,
        grade.earned_points,
        grade.total_points,
        result.progress.quiz_attempts(),
        result.attempts_remaining,
    )
}
