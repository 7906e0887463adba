use course_core::model::{
    CourseId, Module, ModuleId, ModuleProgress, QuestionId, QuestionPayload, QuizQuestion,
    QuizSettings, UserId,
};
use course_core::progression::{Answers, mark_completed, submit_quiz};
use course_core::time::fixed_now;
use storage::repository::{ModuleRepository, ProgressRepository, QuestionRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_module(id: u64, order: u32, quiz: QuizSettings) -> Module {
    Module::new(
        ModuleId::new(id),
        CourseId::new(1),
        format!("Module {id}"),
        order,
        quiz,
        format!("Finish module {id}'s quiz first"),
    )
    .unwrap()
}

fn build_questions(module: ModuleId) -> Vec<QuizQuestion> {
    vec![
        QuizQuestion::new(
            QuestionId::new(module.value() * 10 + 1),
            module,
            "Which keyword declares an immutable binding?",
            QuestionPayload::MultipleChoice {
                options: vec!["let".into(), "mut".into(), "var".into()],
                correct_index: 0,
            },
            1,
        )
        .unwrap(),
        QuizQuestion::new(
            QuestionId::new(module.value() * 10 + 2),
            module,
            "Borrowed references can outlive their owner",
            QuestionPayload::TrueFalse { correct: false },
            2,
        )
        .unwrap(),
    ]
}

fn user() -> UserId {
    UserId::new("learner-1")
}

#[tokio::test]
async fn sqlite_roundtrips_modules_and_questions() {
    let repo = connect("memdb_modules").await;

    let gated = build_module(1, 0, QuizSettings::gated(80, 2).unwrap());
    let plain = build_module(2, 1, QuizSettings::no_quiz());
    repo.upsert_module(&plain).await.unwrap();
    repo.upsert_module(&gated).await.unwrap();

    let modules = repo.modules_for_course(CourseId::new(1)).await.unwrap();
    assert_eq!(modules, vec![gated.clone(), plain]);

    let fetched = repo.get_module(ModuleId::new(1)).await.unwrap();
    assert_eq!(fetched, Some(gated));
    assert_eq!(repo.get_module(ModuleId::new(99)).await.unwrap(), None);

    for q in build_questions(ModuleId::new(1)) {
        repo.upsert_question(&q).await.unwrap();
    }
    let questions = repo.questions_for_module(ModuleId::new(1)).await.unwrap();
    assert_eq!(questions, build_questions(ModuleId::new(1)));
}

#[tokio::test]
async fn sqlite_progress_tracks_attempts_optimistically() {
    let repo = connect("memdb_attempts").await;
    let module = build_module(1, 0, QuizSettings::gated(70, 3).unwrap());
    repo.upsert_module(&module).await.unwrap();
    let questions = build_questions(module.id());

    let answers: Answers = [
        (QuestionId::new(11), "let".into()),
        (QuestionId::new(12), false.into()),
    ]
    .into_iter()
    .collect();

    let first = submit_quiz(&module, &questions, &answers, &user(), None, fixed_now()).unwrap();
    repo.save_attempt(&first.progress, first.prior_attempts)
        .await
        .unwrap();

    // Replaying the same stale outcome must not double count.
    let err = repo
        .save_attempt(&first.progress, first.prior_attempts)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let stored = repo
        .get_progress(&user(), module.id())
        .await
        .unwrap()
        .expect("progress stored");
    assert_eq!(stored.quiz_attempts(), 1);
    assert_eq!(stored.quiz_score(), Some(100));
    assert!(stored.quiz_passed());

    let second =
        submit_quiz(&module, &questions, &answers, &user(), Some(&stored), fixed_now()).unwrap();
    repo.save_attempt(&second.progress, second.prior_attempts)
        .await
        .unwrap();
    let stored = repo.get_progress(&user(), module.id()).await.unwrap().unwrap();
    assert_eq!(stored.quiz_attempts(), 2);
}

#[tokio::test]
async fn sqlite_study_writes_keep_quiz_columns() {
    let repo = connect("memdb_study").await;
    let module = build_module(1, 0, QuizSettings::gated(70, 3).unwrap());
    repo.upsert_module(&module).await.unwrap();

    let completed = mark_completed(&user(), module.id(), None, fixed_now());
    repo.save_completion(&completed).await.unwrap();

    let questions = build_questions(module.id());
    let wrong: Answers = [(QuestionId::new(11), "var".into())].into_iter().collect();
    let outcome = submit_quiz(&module, &questions, &wrong, &user(), Some(&completed), fixed_now())
        .unwrap();
    repo.save_attempt(&outcome.progress, outcome.prior_attempts)
        .await
        .unwrap();

    assert_eq!(repo.add_time_spent(&user(), module.id(), 25).await.unwrap(), 25);

    let stored = repo.get_progress(&user(), module.id()).await.unwrap().unwrap();
    assert!(stored.is_completed());
    assert_eq!(stored.completed_at(), Some(fixed_now()));
    assert_eq!(stored.time_spent_minutes(), 25);
    assert_eq!(stored.quiz_attempts(), 1);
    assert_eq!(stored.quiz_score(), Some(0));
}

#[tokio::test]
async fn sqlite_time_after_completion_keeps_completion() {
    let repo = connect("memdb_time_after_completion").await;
    let module = build_module(1, 0, QuizSettings::no_quiz());
    repo.upsert_module(&module).await.unwrap();

    // Both writers started from the same empty snapshot.
    repo.save_completion(&mark_completed(&user(), module.id(), None, fixed_now()))
        .await
        .unwrap();
    repo.add_time_spent(&user(), module.id(), 5).await.unwrap();
    repo.save_completion(&ModuleProgress::new(user(), module.id()))
        .await
        .unwrap();

    let stored = repo.get_progress(&user(), module.id()).await.unwrap().unwrap();
    assert!(stored.is_completed());
    assert_eq!(stored.completed_at(), Some(fixed_now()));
    assert_eq!(stored.time_spent_minutes(), 5);
}

#[tokio::test]
async fn sqlite_completion_after_time_keeps_minutes() {
    let repo = connect("memdb_completion_after_time").await;
    let module = build_module(1, 0, QuizSettings::no_quiz());
    repo.upsert_module(&module).await.unwrap();

    repo.add_time_spent(&user(), module.id(), 5).await.unwrap();
    repo.add_time_spent(&user(), module.id(), 10).await.unwrap();
    repo.save_completion(&mark_completed(&user(), module.id(), None, fixed_now()))
        .await
        .unwrap();
    let later = fixed_now() + chrono::Duration::hours(2);
    repo.save_completion(&mark_completed(&user(), module.id(), None, later))
        .await
        .unwrap();

    let stored = repo.get_progress(&user(), module.id()).await.unwrap().unwrap();
    assert!(stored.is_completed());
    assert_eq!(stored.completed_at(), Some(fixed_now()));
    assert_eq!(stored.time_spent_minutes(), 15);
}

#[tokio::test]
async fn sqlite_time_saturates() {
    let repo = connect("memdb_time_saturates").await;
    let module = build_module(1, 0, QuizSettings::no_quiz());
    repo.upsert_module(&module).await.unwrap();

    repo.add_time_spent(&user(), module.id(), u32::MAX - 1).await.unwrap();
    let total = repo.add_time_spent(&user(), module.id(), 10).await.unwrap();
    assert_eq!(total, u32::MAX);
}

#[tokio::test]
async fn sqlite_duplicate_order_index_is_a_conflict() {
    let repo = connect("memdb_duplicate_order").await;
    repo.upsert_module(&build_module(1, 0, QuizSettings::no_quiz()))
        .await
        .unwrap();

    let err = repo
        .upsert_module(&build_module(2, 0, QuizSettings::no_quiz()))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_progress_for_course_joins_modules() {
    let repo = connect("memdb_course_progress").await;
    let in_course = build_module(1, 0, QuizSettings::no_quiz());
    let other_course = Module::new(
        ModuleId::new(5),
        CourseId::new(2),
        "Elsewhere",
        0,
        QuizSettings::no_quiz(),
        "",
    )
    .unwrap();
    repo.upsert_module(&in_course).await.unwrap();
    repo.upsert_module(&other_course).await.unwrap();

    for id in [1, 5] {
        let p: ModuleProgress = mark_completed(&user(), ModuleId::new(id), None, fixed_now());
        repo.upsert_progress(&p).await.unwrap();
    }

    let found = repo
        .progress_for_course(&user(), CourseId::new(1))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].module_id(), ModuleId::new(1));
}
