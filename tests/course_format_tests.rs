use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use edutools::{
    course::{
        AnswerPlaceholderDependency, CheckStatus, DescriptionFormat, LessonKind, StudyItem, TaskKind,
        ValidationError, dates::parse_update_date,
    },
    format::{FormatError, JSON_FORMAT_VERSION, json, task_roots::task_roots},
};
use serde_json::Value;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("course")
        .join(name);
    std::fs::read_to_string(&path).expect("read fixture")
}

#[test]
fn version_six_java_course_moves_files_under_task_roots() {
    let course = json::read_course(&fixture("java_v6.json")).expect("read course");

    let lesson = course.items[0].as_lesson().expect("first item is a lesson");
    let task = &lesson.tasks[0];
    let names: Vec<&str> = task.task_files.names().collect();
    assert_eq!(names, vec!["src/Task.java"]);
    assert!(task.test_files.contains_key("test/Tests.java"));

    let file = task.file("src/Task.java").expect("renamed file");
    assert_eq!(file.name, "src/Task.java");
    let dependency = file.placeholders[0]
        .dependency
        .as_ref()
        .expect("dependency kept");
    assert_eq!(dependency.file, "src/Task.java");
}

#[test]
fn version_seven_additional_files_become_objects() {
    let course = json::read_course(&fixture("java_v6.json")).expect("read course");
    let task = &course.items[0].as_lesson().expect("lesson").tasks[0];

    let data = task.additional_files.get("data.txt").expect("additional file");
    assert_eq!(data.text, "some text");
    assert!(data.is_visible);
}

#[test]
fn unknown_task_types_are_dropped() {
    let course = json::read_course(&fixture("java_v6.json")).expect("read course");
    let lesson = course.items[0].as_lesson().expect("lesson");

    assert_eq!(lesson.tasks.len(), 1);
    assert_eq!(lesson.tasks[0].name, "task1");
}

#[test]
fn legacy_additional_materials_are_renamed() {
    let course = json::read_course(&fixture("java_v6.json")).expect("read course");
    let lesson = course.items[1].as_lesson().expect("lesson");

    assert_eq!(lesson.name, "Edu additional materials");
    assert_eq!(lesson.tasks[0].name, "Edu additional materials");
    assert_eq!(lesson.tasks[0].kind, TaskKind::Edu);
}

#[test]
fn unsupported_item_type_is_an_error() {
    let err = json::read_course(&fixture("unsupported_item.json")).expect_err("exam items are unknown");
    match err {
        FormatError::UnsupportedItemType(kind) => assert_eq!(kind, "exam"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn newer_documents_are_rejected() {
    let err = json::read_course(&fixture("future_version.json")).expect_err("version 42");
    assert!(matches!(
        err,
        FormatError::UnsupportedVersion {
            found: 42,
            supported: JSON_FORMAT_VERSION
        }
    ));
}

#[test]
fn sections_and_framework_lessons_are_read() {
    let course = json::read_course(&fixture("python_v8_sections.json")).expect("read course");

    let section = course.items[0].as_section().expect("section first");
    assert_eq!(section.name, "Basics");
    assert_eq!(section.index, 1);
    assert_eq!(section.lessons[0].tasks[1].kind, TaskKind::Theory);
    assert_eq!(section.lessons[0].tasks[1].description_format, DescriptionFormat::Md);

    let project = course.items[1].as_lesson().expect("framework lesson");
    assert_eq!(project.kind, LessonKind::Framework);
    assert_eq!(project.index, 2);
    assert_eq!(project.tasks[1].index, 2);

    let paths: Vec<String> = course
        .tasks()
        .into_iter()
        .filter_map(|(loc, _)| course.task_path(loc))
        .collect();
    assert_eq!(paths, vec![
        "Basics/Variables/Assignment",
        "Basics/Variables/Reading",
        "Project/Stage 1",
        "Project/Stage 2",
    ]);
}

#[test]
fn written_courses_carry_the_current_version_and_file_order() {
    let course = json::read_course(&fixture("python_v8_sections.json")).expect("read course");
    let text = json::write_course(&course).expect("write course");

    let document: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(document["version"], Value::from(JSON_FORMAT_VERSION));

    let files = document["items"][0]["items"][0]["task_list"][0]["task_files"]
        .as_object()
        .expect("task files object");
    let names: Vec<&String> = files.keys().collect();
    assert_eq!(names, vec!["task.py", "helper.py"]);

    let reread = json::read_course(&text).expect("read written course");
    assert_eq!(reread, course);
}

#[test]
fn task_status_reaches_every_placeholder() {
    let mut course = json::read_course(&fixture("python_v8_sections.json")).expect("read course");
    let (loc, _) = course.tasks()[0];
    let task = course.task_at_mut(loc).expect("task");

    task.set_status(CheckStatus::Solved);

    assert_eq!(task.status, CheckStatus::Solved);
    let file = task.file("task.py").expect("file");
    assert!(file.placeholders.iter().all(|p| p.status == CheckStatus::Solved));
}

#[test]
fn validation_reports_placeholders_past_the_text() {
    let course = json::read_course(&fixture("out_of_bounds.json")).expect("read course");
    let problems = course.validate();

    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].1, ValidationError::PlaceholderOutOfBounds {
        file:        "task.py".into(),
        placeholder: 2,
        end:         13,
        text_len:    5,
    });
}

#[test]
fn description_lists_placeholder_hints() {
    let course = json::read_course(&fixture("java_v6.json")).expect("read course");
    let task = &course.items[0].as_lesson().expect("lesson").tasks[0];

    assert_eq!(
        task.description_with_hints(),
        "Fill in your name<br><div class='hint'>Use quotes</div><br>"
    );
}

#[test]
fn dependencies_parse_and_print() {
    let dependency: AnswerPlaceholderDependency =
        "Basics#Variables#Assignment#task.py#1".parse().expect("parse");
    assert_eq!(dependency.section.as_deref(), Some("Basics"));
    assert_eq!(dependency.lesson, "Variables");
    assert_eq!(dependency.placeholder, 1);
    assert_eq!(dependency.to_string(), "Basics#Variables#Assignment#task.py#1");

    let without_section: AnswerPlaceholderDependency =
        "lesson1#task1#Task.java#2".parse().expect("parse");
    assert_eq!(without_section.section, None);
    assert_eq!(without_section.to_string(), "lesson1#task1#Task.java#2");

    assert!("lesson1#task1#Task.java".parse::<AnswerPlaceholderDependency>().is_err());
    assert!("a#b#c#d#first".parse::<AnswerPlaceholderDependency>().is_err());
}

#[test]
fn items_default_to_lessons() {
    let course = json::read_course(
        r#"{"title": "Tiny", "version": 8, "items": [{"title": "only", "task_list": []}]}"#,
    )
    .expect("read course");
    assert!(matches!(&course.items[0], StudyItem::Lesson(lesson) if lesson.name == "only"));
    assert_eq!(course.language, "en");
}

#[test]
fn gson_update_dates_are_understood() {
    let course = json::read_course(&fixture("gson_dates.json")).expect("read course");

    assert_eq!(course.update_date, utc(2019, 3, 14, 17, 7, 9));
    let lesson = course.items[0].as_lesson().expect("lesson first");
    assert_eq!(lesson.update_date, utc(1970, 1, 1, 3, 0, 0));
    assert_eq!(lesson.tasks[0].update_date, utc(2018, 12, 31, 23, 59, 59));
    let section = course.items[1].as_section().expect("section second");
    assert_eq!(section.update_date, utc(2020, 2, 3, 4, 5, 6));
}

#[test]
fn update_date_layouts() {
    assert_eq!(
        parse_update_date("Jan 1, 1970 3:00:00\u{202f}AM"),
        Some(utc(1970, 1, 1, 3, 0, 0))
    );
    assert_eq!(
        parse_update_date("2021-06-01T12:00:00+02:00"),
        Some(utc(2021, 6, 1, 10, 0, 0))
    );
    assert_eq!(parse_update_date("yesterday"), None);
}

fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid date")
}

#[test]
fn task_roots_depend_on_the_language() {
    let java = task_roots("JAVA").expect("java has roots");
    assert_eq!(java.task_file("Task.java"), "src/Task.java");
    assert_eq!(java.test_file("Tests.java"), "test/Tests.java");

    let android = task_roots("android").expect("android has roots");
    assert_eq!(android.task_file("Main.kt"), "src/main/Main.kt");
    assert_eq!(android.test_file("Tests.kt"), "src/test/Tests.kt");

    assert_eq!(task_roots("Python"), None);
}
