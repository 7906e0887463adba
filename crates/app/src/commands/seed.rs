use anyhow::Context;
use course_core::model::{CourseId, ModuleId, QuestionId, QuestionPayload, QuizSettings};
use services::AppServices;

struct DemoModule {
    title: &'static str,
    quiz: fn() -> anyhow::Result<QuizSettings>,
    unlock_message: &'static str,
    questions: &'static [DemoQuestion],
}

struct DemoQuestion {
    prompt: &'static str,
    payload: fn() -> QuestionPayload,
    points: u32,
}

fn choice(options: &[&str], correct_index: usize) -> QuestionPayload {
    QuestionPayload::MultipleChoice {
        options: options.iter().map(|o| (*o).to_owned()).collect(),
        correct_index,
    }
}

const DEMO_PATH: &[DemoModule] = &[
    DemoModule {
        title: "Ownership",
        quiz: || Ok(QuizSettings::gated(70, 3)?),
        unlock_message: "Pass the Ownership quiz to unlock Borrowing.",
        questions: &[
            DemoQuestion {
                prompt: "After `let b = a;` with a String, which binding owns it?",
                payload: || choice(&["a", "b", "both"], 1),
                points: 2,
            },
            DemoQuestion {
                prompt: "A value can have two owners at the same time.",
                payload: || QuestionPayload::TrueFalse { correct: false },
                points: 1,
            },
        ],
    },
    DemoModule {
        title: "Borrowing",
        quiz: || Ok(QuizSettings::new(true, false, 60, 2)?),
        unlock_message: "",
        questions: &[DemoQuestion {
            prompt: "How many mutable borrows may be live at once?",
            payload: || choice(&["zero", "one", "many"], 1),
            points: 1,
        }],
    },
    DemoModule {
        title: "Lifetimes",
        quiz: || Ok(QuizSettings::gated(80, 2)?),
        unlock_message: "Score 80% on Lifetimes to unlock the capstone.",
        questions: &[
            DemoQuestion {
                prompt: "Lifetime annotations change how long a value lives.",
                payload: || QuestionPayload::TrueFalse { correct: false },
                points: 1,
            },
            DemoQuestion {
                prompt: "Which lifetime outlives every other?",
                payload: || choice(&["'a", "'static", "'_"], 1),
                points: 1,
            },
        ],
    },
    DemoModule {
        title: "Capstone",
        quiz: || Ok(QuizSettings::no_quiz()),
        unlock_message: "",
        questions: &[],
    },
];

fn demo_module_id(course: CourseId, order: u32) -> Option<ModuleId> {
    course
        .value()
        .checked_mul(100)?
        .checked_add(u64::from(order) + 1)
        .map(ModuleId::new)
}

fn demo_question_id(module: ModuleId, position: u64) -> Option<QuestionId> {
    module
        .value()
        .checked_mul(10)?
        .checked_add(position)
        .map(QuestionId::new)
}

/// Module ids are `course * 100 + position`, question ids `module * 10 + position`.
pub async fn execute(app: &AppServices, course: CourseId) -> anyhow::Result<()> {
    let catalog = app.catalog();
    let mut question_count = 0;

    for (order, demo) in (0u32..).zip(DEMO_PATH) {
        let module_id = demo_module_id(course, order)
            .with_context(|| format!("course id {course} is too large to seed"))?;
        catalog
            .save_module(
                module_id,
                course,
                demo.title.to_owned(),
                order,
                (demo.quiz)()?,
                demo.unlock_message.to_owned(),
            )
            .await?;

        for (position, question) in (1u64..).zip(demo.questions) {
            catalog
                .save_question(
                    demo_question_id(module_id, position)
                        .with_context(|| format!("course id {course} is too large to seed"))?,
                    module_id,
                    question.prompt.to_owned(),
                    (question.payload)(),
                    question.points,
                )
                .await?;
            question_count += 1;
        }
    }

    println!(
        "seeded course {course}: {} modules, {question_count} questions",
        DEMO_PATH.len()
    );
    Ok(())
}
