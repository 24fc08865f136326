use std::path::{Path, PathBuf};

use edutools::{
    course::{FeedbackLinkType, TaskKind},
    format::yaml::{self, TaskConfig},
};

fn yaml_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("yaml")
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).expect("read fixture")
}

#[test]
fn task_config_shows_placeholder_text_to_students() {
    let dir = yaml_dir();
    let config = read(&dir, "task-info.yaml");
    let task = yaml::task_with_texts(&config, |name| std::fs::read_to_string(dir.join(name)).ok())
        .expect("read task config");

    assert_eq!(task.kind, TaskKind::Edu);
    let hello = task.file("hello.py").expect("hello.py");
    assert_eq!(hello.text, "print(\"Hello, world! My name is type your name\")\n");

    let placeholder = &hello.placeholders[0];
    assert_eq!(placeholder.offset, 32);
    assert_eq!(placeholder.length, 14);
    assert_eq!(placeholder.possible_answer, "Liana");
    assert_eq!(placeholder.placeholder_text, "type your name");

    let util = task.file("util.py").expect("util.py");
    assert!(!util.is_visible);
    assert_eq!(util.text, "");

    assert_eq!(task.feedback_link.kind, FeedbackLinkType::Custom);
    assert_eq!(task.feedback_link.link.as_deref(), Some("https://example.com/feedback"));
}

#[test]
fn task_config_without_texts_has_blank_answers() {
    let task = yaml::task(&read(&yaml_dir(), "task-info.yaml")).expect("read task config");
    let placeholder = &task.file("hello.py").expect("hello.py").placeholders[0];

    assert_eq!(placeholder.possible_answer, "     ");
    assert_eq!(placeholder.offset, 32);
    assert_eq!(placeholder.length, 14);
}

#[test]
fn written_task_config_spans_the_author_answer() {
    let dir = yaml_dir();
    let task = yaml::task_with_texts(&read(&dir, "task-info.yaml"), |name| {
        std::fs::read_to_string(dir.join(name)).ok()
    })
    .expect("read task config");

    let written = yaml::write_task(&task).expect("write task config");
    let config: TaskConfig = serde_yaml::from_str(&written).expect("parse written config");

    assert_eq!(config.kind, TaskKind::Edu);
    assert_eq!(config.task_files.len(), 2);
    let placeholder = &config.task_files[0].placeholders[0];
    assert_eq!(placeholder.offset, 32);
    assert_eq!(placeholder.length, 5);
    assert_eq!(placeholder.placeholder_text, "type your name");
    assert!(!config.task_files[1].visible);
    assert_eq!(config.feedback_link.as_deref(), Some("https://example.com/feedback"));
}

#[test]
fn later_placeholders_shift_with_earlier_answers() {
    let config = "\
type: edu
task_files:
- name: sum.py
  placeholders:
  - offset: 0
    length: 1
    placeholder_text: first
  - offset: 4
    length: 1
    placeholder_text: second
";
    let task = yaml::task_with_texts(config, |_| Some("a + b".to_string())).expect("read");
    let file = task.file("sum.py").expect("sum.py");

    assert_eq!(file.text, "first + second");
    assert_eq!(file.placeholders[0].offset, 0);
    assert_eq!(file.placeholders[1].offset, 8);
    assert_eq!(file.placeholders[1].possible_answer, "b");

    let written: TaskConfig =
        serde_yaml::from_str(&yaml::write_task(&task).expect("write")).expect("parse");
    let offsets: Vec<usize> = written.task_files[0]
        .placeholders
        .iter()
        .map(|p| p.offset)
        .collect();
    assert_eq!(offsets, vec![0, 4]);
}

#[test]
fn course_config_lists_items_in_order() {
    let course = yaml::course(&read(&yaml_dir(), "course-info.yaml")).expect("read course config");

    assert_eq!(course.name, "Kotlin Koans");
    assert_eq!(course.programming_language, "kotlin");
    let names: Vec<&str> = course.items.iter().map(|item| item.name()).collect();
    assert_eq!(names, vec!["Introduction", "Conventions"]);

    let written = yaml::write_course(&course).expect("write course config");
    assert!(written.contains("- Introduction\n- Conventions"));
}

#[test]
fn lesson_config_names_its_tasks() {
    let lesson = yaml::lesson("content:\n- task1\n- task2\n").expect("read lesson config");
    let names: Vec<&str> = lesson.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["task1", "task2"]);

    let section = yaml::section("content: [lesson1]").expect("read section config");
    assert_eq!(section.lessons[0].name, "lesson1");
}
