//! `learnpath`: command-line front end for the learning-path progression engine.

use std::process;

use clap::{Parser, Subcommand};
use course_core::model::{CourseId, ModuleId, QuestionId, UserId};
use services::{AppServices, Clock, ProgressionServiceError};
use tracing_subscriber::EnvFilter;

mod commands;
mod db;

#[derive(Parser)]
#[command(name = "learnpath", version, about = "Self-paced learning path progression")]
struct Cli {
    /// SQLite database URL or file path
    #[arg(
        long,
        global = true,
        env = "LEARN_DB_URL",
        default_value = "sqlite://learnpath.sqlite3"
    )]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the demo course (idempotent)
    Seed {
        /// Course id to seed the demo path into
        #[arg(long, default_value_t = 1)]
        course: u64,
    },

    /// Show unlock states and progress for a learner
    Status {
        #[arg(long)]
        user: String,

        #[arg(long)]
        course: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Submit quiz answers for a module
    Submit {
        #[arg(long)]
        user: String,

        #[arg(long)]
        module: u64,

        /// Answer as `<question_id>=<value>`: the option text, or `true`/`false`
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(QuestionId, String)>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Mark a module's content as completed
    Complete {
        #[arg(long)]
        user: String,

        #[arg(long)]
        module: u64,
    },

    /// Record study time on a module
    Time {
        #[arg(long)]
        user: String,

        #[arg(long)]
        module: u64,

        #[arg(long)]
        minutes: u32,
    },
}

fn parse_answer(raw: &str) -> Result<(QuestionId, String), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <question_id>=<value>, got `{raw}`"))?;
    let id = id
        .trim()
        .parse::<QuestionId>()
        .map_err(|err| format!("invalid question id in `{raw}`: {err}"))?;
    Ok((id, value.to_owned()))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default()).await?;

    match cli.command {
        Commands::Seed { course } => commands::seed::execute(&app, CourseId::new(course)).await,
        Commands::Status { user, course, json } => {
            commands::status::execute(&app, &UserId::new(user), CourseId::new(course), json).await
        }
        Commands::Submit {
            user,
            module,
            answers,
            json,
        } => {
            commands::submit::execute(
                &app,
                &UserId::new(user),
                ModuleId::new(module),
                answers.into_iter().collect(),
                json,
            )
            .await
        }
        Commands::Complete { user, module } => {
            commands::study::complete(&app, &UserId::new(user), ModuleId::new(module)).await
        }
        Commands::Time {
            user,
            module,
            minutes,
        } => commands::study::time(&app, &UserId::new(user), ModuleId::new(module), minutes).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        // 1 for rejections such as a locked module, 2 for failures.
        let rejected = err
            .downcast_ref::<ProgressionServiceError>()
            .is_some_and(ProgressionServiceError::is_user_facing);
        process::exit(if rejected { 1 } else { 2 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_values_stay_untyped_text() {
        assert_eq!(
            parse_answer("1011=true").unwrap(),
            (QuestionId::new(1011), "true".to_owned())
        );
        assert_eq!(
            parse_answer("7=a=b").unwrap(),
            (QuestionId::new(7), "a=b".to_owned())
        );
        assert!(parse_answer("nope").is_err());
        assert!(parse_answer("x=true").is_err());
    }
}
