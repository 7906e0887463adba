use course_core::model::{CourseId, UserId};
use course_core::progression::UnlockState;
use services::{AppServices, CourseOverview, ModuleOverview};

pub async fn execute(
    app: &AppServices,
    user: &UserId,
    course: CourseId,
    json: bool,
) -> anyhow::Result<()> {
    let overview = app.progression().course_overview(course, user).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        print!("{}", render(&overview));
    }
    Ok(())
}

fn render(overview: &CourseOverview) -> String {
    let progress = &overview.progress;
    let mut out = format!(
        "course {} for {}: {}/{} completed ({}%), {} min studied\n",
        overview.course_id,
        overview.user_id,
        progress.completed,
        progress.total,
        progress.percent,
        progress.time_spent_minutes,
    );

    for module in &overview.modules {
        out.push_str(&render_module(module));
        out.push('\n');
    }

    match overview.next_module {
        Some(next) => out.push_str(&format!("next: module {next}\n")),
        None => out.push_str("next: nothing left to open\n"),
    }
    if overview.certificate_eligible {
        out.push_str("certificate: eligible\n");
    }
    out
}

fn render_module(module: &ModuleOverview) -> String {
    let marker = if module.is_completed { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{marker} {:>6}  {:<20}",
        module.module_id.to_string(),
        module.title
    );

    match &module.state {
        UnlockState::Unlocked => line.push_str(" open"),
        UnlockState::Locked { message, .. } => {
            line.push_str(" locked");
            if !message.is_empty() {
                line.push_str(&format!(": {message}"));
            }
        }
    }

    if module.requires_quiz {
        match module.quiz_score {
            Some(score) => {
                let verdict = if module.quiz_passed { "passed" } else { "not passed" };
                line.push_str(&format!(" | quiz {score}% {verdict}"));
            }
            None => line.push_str(" | quiz not taken"),
        }
        line.push_str(&format!(", {} attempts left", module.attempts_remaining));
    }
    line
}
