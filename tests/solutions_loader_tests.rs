use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use edutools::{
    course::{
        AnswerPlaceholder, CheckStatus, Course, Lesson, Section, StudyItem, Task, TaskFile, TaskKind,
    },
    stepik::{
        FsSolutionSink, SolutionSource, SolutionsLoader, StepikError,
        options::migrate_reply,
        solutions::apply_reply,
        wrappers::Reply,
    },
};
use serde_json::{Value, json};
use uuid::Uuid;

/// Canned progress and submissions keyed by step id.
#[derive(Default)]
struct FakeSource {
    statuses:    HashMap<u64, bool>,
    submissions: HashMap<(u64, bool), Value>,
    fetches:     AtomicUsize,
    active:      AtomicUsize,
    peak:        AtomicUsize,
    delay:       Duration,
}

impl FakeSource {
    fn solved(mut self, step_id: u64, solved: bool) -> Self {
        self.statuses.insert(step_id, solved);
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn submission(mut self, step_id: u64, solved: bool, reply: Value) -> Self {
        self.submissions.insert((step_id, solved), reply);
        self
    }
}

impl SolutionSource for FakeSource {
    async fn task_statuses(&self, step_ids: &[u64]) -> Result<Vec<Option<bool>>, StepikError> {
        Ok(step_ids.iter().map(|id| self.statuses.get(id).copied()).collect())
    }

    async fn last_submission(
        &self,
        step_id: u64,
        is_solved: bool,
        language: &str,
    ) -> Result<Option<Reply>, StepikError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        if step_id == 99 {
            return Err(StepikError::Malformed("step 99 is broken".into()));
        }
        match self.submissions.get(&(step_id, is_solved)) {
            Some(reply) => Ok(Some(migrate_reply(reply.clone(), language)?)),
            None => Ok(None),
        }
    }
}

fn greeting_file() -> TaskFile {
    let mut file = TaskFile::new("hello.py", "print(\"Hello, world! My name is type your name\")");
    file.placeholders = vec![
        AnswerPlaceholder::builder()
            .offset(32)
            .length(14)
            .placeholder_text("type your name")
            .build(),
    ];
    file
}

fn edu_task(name: &str, step_id: u64) -> Task {
    let mut task = Task::builder().name(name).step_id(step_id).build();
    task.add_file(greeting_file());
    task
}

fn code_task(name: &str, step_id: u64) -> Task {
    let mut task = Task::builder()
        .name(name)
        .kind(TaskKind::Code)
        .step_id(step_id)
        .build();
    task.add_file(TaskFile::new("main.py", ""));
    task
}

fn course() -> Course {
    let mut top = Lesson::new("Greetings");
    top.tasks = vec![
        edu_task("Hello", 1),
        Task::builder()
            .name("About")
            .kind(TaskKind::Theory)
            .step_id(2)
            .build(),
        code_task("Sum", 3),
    ];
    let mut nested = Lesson::new("Basics");
    nested.tasks = vec![edu_task("Bye", 4)];
    let mut section = Section::new("Part one");
    section.lessons = vec![nested];

    let mut course = Course::builder()
        .name("Sync")
        .programming_language("Python")
        .items(vec![StudyItem::Lesson(top), StudyItem::Section(section)])
        .build();
    course.init();
    course
}

fn temp_course_dir() -> PathBuf {
    std::env::temp_dir().join(format!("edutools-solutions-{}", Uuid::new_v4()))
}

fn tagged_reply(answer: &str) -> Value {
    json!({
        "solution": [{
            "name": "hello.py",
            "text": format!("print(\"Hello, world! My name is <placeholder>{answer}</placeholder>\")")
        }],
        "version": 8
    })
}

#[tokio::test]
async fn picks_tasks_behind_the_remote_state() {
    let source = FakeSource::default()
        .solved(1, true)
        .solved(2, true)
        .solved(3, false)
        .submission(3, false, json!({"code": ""}))
        .solved(4, true);
    let mut course = course();
    let bye = course.tasks()[3].0;
    course
        .task_at_mut(bye)
        .expect("Bye")
        .set_status(CheckStatus::Solved);

    let loader = SolutionsLoader::new(Arc::new(source), 4);
    let selected = loader.tasks_to_update(&mut course).await.expect("statuses");

    let names: Vec<&str> = selected
        .iter()
        .filter_map(|&loc| course.task_at(loc))
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["Hello"]);
    assert_eq!(course.task_at(selected[0]).expect("Hello").status, CheckStatus::Solved);
}

#[tokio::test]
async fn section_lessons_are_checked_first() {
    let source = FakeSource::default().solved(1, false).solved(4, true).submission(
        1,
        false,
        tagged_reply("Bob"),
    );
    let mut course = course();

    let loader = SolutionsLoader::new(Arc::new(source), 4);
    let selected = loader.tasks_to_update(&mut course).await.expect("statuses");

    let names: Vec<&str> = selected
        .iter()
        .filter_map(|&loc| course.task_at(loc))
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["Bye", "Hello"]);
}

#[tokio::test]
async fn loads_solutions_into_the_course_directory() {
    let source = FakeSource::default()
        .solved(1, true)
        .submission(1, true, tagged_reply("Liana"))
        .solved(2, true)
        .solved(3, false)
        .submission(
            3,
            false,
            json!({"code": "# Posted from EduTools plugin\nprint(1 + 2)", "language": "python3"}),
        );
    let mut course = course();
    let root = temp_course_dir();

    let loader = SolutionsLoader::new(Arc::new(source), 2);
    let report = loader
        .load_solutions(&mut course, &mut FsSolutionSink::new(&root))
        .await
        .expect("sync");

    assert_eq!(report.updated, 2);
    assert_eq!(report.failed, 0);
    assert!(!report.needs_update_notification);

    let hello = std::fs::read_to_string(root.join("lesson1").join("task1").join("hello.py"))
        .expect("hello.py written");
    assert_eq!(hello, "print(\"Hello, world! My name is Liana\")");
    let sum = std::fs::read_to_string(root.join("lesson1").join("task3").join("main.py"))
        .expect("main.py written");
    assert_eq!(sum, "\nprint(1 + 2)");

    let (hello_loc, _) = course.tasks()[0];
    let task = course.task_at(hello_loc).expect("Hello");
    assert_eq!(task.status, CheckStatus::Solved);
    let file = task.file("hello.py").expect("hello.py");
    assert_eq!(file.text, hello);
    assert_eq!(file.placeholders[0].offset, 32);
    assert_eq!(file.placeholders[0].length, 5);

    let (sum_loc, _) = course.tasks()[2];
    assert_eq!(course.task_at(sum_loc).expect("Sum").status, CheckStatus::Failed);

    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn section_tasks_are_written_under_their_section() {
    let source = FakeSource::default()
        .solved(4, true)
        .submission(4, true, tagged_reply("Ann"));
    let mut course = course();
    let root = temp_course_dir();

    let loader = SolutionsLoader::new(Arc::new(source), 1);
    let report = loader
        .load_solutions(&mut course, &mut FsSolutionSink::new(&root))
        .await
        .expect("sync");

    assert_eq!(report.updated, 1);
    let path = root
        .join("section2")
        .join("lesson1")
        .join("task1")
        .join("hello.py");
    assert_eq!(
        std::fs::read_to_string(path).expect("written"),
        "print(\"Hello, world! My name is Ann\")"
    );

    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn failed_fetches_are_counted() {
    let source = FakeSource::default().solved(99, true);
    let mut course = course();
    let hello = course.tasks()[0].0;
    course.task_at_mut(hello).expect("Hello").step_id = 99;
    let root = temp_course_dir();

    let loader = SolutionsLoader::new(Arc::new(source), 1);
    let report = loader
        .load_solutions(&mut course, &mut FsSolutionSink::new(&root))
        .await
        .expect("sync");

    assert_eq!(report.updated, 0);
    assert_eq!(report.failed, 1);
    assert!(!root.exists());
}

#[tokio::test]
async fn newer_submissions_ask_for_an_update() {
    let mut reply = tagged_reply("Liana");
    reply["version"] = json!(42);
    let source = FakeSource::default().solved(1, true).submission(1, true, reply);
    let mut course = course();
    let root = temp_course_dir();

    let loader = SolutionsLoader::new(Arc::new(source), 1);
    let report = loader
        .load_solutions(&mut course, &mut FsSolutionSink::new(&root))
        .await
        .expect("sync");

    assert!(report.needs_update_notification);
    assert_eq!(report.updated, 0);
    assert!(!root.exists());
}

#[tokio::test]
async fn single_task_loading_uses_one_fetch() {
    let source = Arc::new(FakeSource::default().submission(1, false, tagged_reply("Zoe")));
    let loader = SolutionsLoader::new(Arc::clone(&source), 1);
    let mut task = edu_task("Hello", 1);

    let solutions = loader
        .load_solution(&mut task, false, "Python")
        .await
        .expect("load");

    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert!(solutions.has_files());
    assert_eq!(task.status, CheckStatus::Failed);
    assert_eq!(
        solutions.files.get("hello.py").map(String::as_str),
        Some("print(\"Hello, world! My name is Zoe\")")
    );
}

#[test]
fn empty_edu_replies_reset_the_task() {
    let mut task = edu_task("Hello", 1);
    task.set_status(CheckStatus::Solved);

    let solutions = apply_reply(&mut task, None, true, "Python");

    assert!(!solutions.has_files());
    assert_eq!(task.status, CheckStatus::Unchecked);
}

#[test]
fn embedded_tasks_replace_placeholder_state() {
    let embedded = json!({
        "task": {
            "name": "Hello",
            "task_type": "edu",
            "task_files": {
                "hello.py": {
                    "name": "hello.py",
                    "text": "print(\"Hello, world! My name is Liana\")",
                    "placeholders": [{
                        "offset": 32,
                        "length": 5,
                        "hints": ["Say your name"],
                        "possible_answer": "Liana",
                        "placeholder_text": "type your name",
                        "status": "Solved"
                    }]
                }
            }
        }
    });
    let reply: Reply = serde_json::from_value(json!({
        "solution": [{"name": "hello.py", "text": "print(\"Hello, world! My name is Liana\")"}],
        "edu_task": embedded.to_string(),
        "version": 8
    }))
    .expect("reply");
    let mut task = edu_task("Hello", 1);

    let solutions = apply_reply(&mut task, Some(reply), true, "Python");

    let expected: BTreeMap<String, String> = [(
        "hello.py".to_string(),
        "print(\"Hello, world! My name is Liana\")".to_string(),
    )]
    .into();
    assert_eq!(solutions.files, expected);
    let placeholder = &task.file("hello.py").expect("hello.py").placeholders[0];
    assert_eq!(placeholder.length, 5);
    assert_eq!(placeholder.hints, vec!["Say your name"]);
    assert_eq!(placeholder.status, CheckStatus::Solved);
    assert_eq!(task.status, CheckStatus::Solved);
}

#[test]
fn embedded_tasks_with_gson_dates_are_read() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("replies")
        .join("edu_task_gson_date.json");
    let text = std::fs::read_to_string(path).expect("read reply fixture");
    let reply: Reply = serde_json::from_str(&text).expect("reply");
    let mut task = edu_task("Hello", 1);

    let solutions = apply_reply(&mut task, Some(reply), true, "Python");

    assert!(solutions.has_files());
    let placeholder = &task.file("hello.py").expect("hello.py").placeholders[0];
    assert_eq!(placeholder.length, 5);
    assert_eq!(task.status, CheckStatus::Solved);
}

fn many_tasks_course(count: u64) -> Course {
    let mut lesson = Lesson::new("Many");
    lesson.tasks = (1..=count).map(|id| edu_task(&format!("Task {id}"), id)).collect();
    let mut course = Course::builder()
        .name("Many")
        .programming_language("Python")
        .items(vec![StudyItem::Lesson(lesson)])
        .build();
    course.init();
    course
}

#[tokio::test]
async fn submission_checks_respect_the_concurrency_limit() {
    let source = (1..=40).fold(FakeSource::default(), |source, id| source.solved(id, false));
    let source = Arc::new(source.slow(Duration::from_millis(5)));
    let mut course = many_tasks_course(40);

    let loader = SolutionsLoader::new(Arc::clone(&source), 4);
    let selected = loader.tasks_to_update(&mut course).await.expect("statuses");

    assert!(selected.is_empty());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 40);
    let peak = source.peak.load(Ordering::SeqCst);
    assert!((1..=4).contains(&peak), "peak of {peak} concurrent checks");
}

#[tokio::test]
async fn unfinished_fetches_can_be_cancelled() {
    let source = (1..=3).fold(FakeSource::default(), |source, id| source.solved(id, true));
    let source = Arc::new(source.slow(Duration::from_secs(3600)));
    let mut course = many_tasks_course(3);
    let root = temp_course_dir();
    let mut sink = FsSolutionSink::new(&root);

    let loader = SolutionsLoader::new(Arc::clone(&source), 8);
    let cancel = async {
        while source.fetches.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        loader.cancel_unfinished();
    };
    let sync = async { loader.load_solutions(&mut course, &mut sink).await };
    let (report, ()) = tokio::time::timeout(Duration::from_secs(10), async { tokio::join!(sync, cancel) })
        .await
        .expect("cancelled fetches end the sync");

    let report = report.expect("sync");
    assert_eq!(report.updated, 0);
    assert_eq!(report.failed, 0);
    assert!(!root.exists());
}
