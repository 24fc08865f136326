use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::course::{CheckStatus, Course, Lesson, StudyItem, Task};

/// `pycharm<version> <language>` course types.
fn course_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"pycharm(\d*) (\w+)").expect("valid course type pattern"))
}

/// Sets the programming language of `course` from its Stepik course type.
pub fn set_course_language(course: &mut Course, course_type: &str) {
    match course_type_pattern()
        .captures(course_type)
        .and_then(|c| c.get(2))
    {
        Some(language) => course.programming_language = language.as_str().to_string(),
        None => info!("Language for course `{}` with `{course_type}` type can't be set", course.name),
    }
}

/// Sets `status` on every task of the course.
pub fn set_status_recursively(course: &mut Course, status: CheckStatus) {
    for item in &mut course.items {
        match item {
            StudyItem::Lesson(lesson) => set_lesson_status(lesson, status),
            StudyItem::Section(section) => {
                for lesson in &mut section.lessons {
                    set_lesson_status(lesson, status);
                }
            }
        }
    }
}

/// Sets `status` on every task of `lesson`.
fn set_lesson_status(lesson: &mut Lesson, status: CheckStatus) {
    lesson.tasks.iter_mut().for_each(|t| t.set_status(status));
}

/// Link to the step of `task` in `lesson` on the Stepik site.
pub fn stepik_link(stepik_url: &str, lesson: &Lesson, task: &Task) -> String {
    format!("{stepik_url}/lesson/{}/step/{}", lesson.id, task.index)
}
