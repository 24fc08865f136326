#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde_json::Value;
use tracing::warn;

use super::{
    ADDITIONAL_MATERIALS, DEFAULT_FORMAT_VERSION, FormatError, JSON_FORMAT_VERSION, PYCHARM_ADDITIONAL,
    convert::{migrate_course, migrate_task},
};
use crate::course::{Course, Task, TaskKind};

/// Format version stored in a serialized document, 1 when absent.
pub fn document_version(document: &Value) -> u32 {
    document
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DEFAULT_FORMAT_VERSION)
}

/// Reads a course JSON document of any supported version.
///
/// The document is upgraded to [`JSON_FORMAT_VERSION`] before it is
/// deserialized. Tasks with a missing or unknown `task_type` are dropped with a
/// warning.
pub fn read_course(text: &str) -> Result<Course, FormatError> {
    let mut document: Value = serde_json::from_str(text)?;
    let version = document_version(&document);
    migrate_course(&mut document, version)?;
    normalize_course(&mut document)?;

    let mut course: Course = serde_json::from_value(document)?;
    course.init();
    Ok(course)
}

/// Writes `course` as pretty-printed JSON of the current version.
pub fn write_course(course: &Course) -> Result<String, FormatError> {
    let mut document = serde_json::to_value(course)?;
    if let Some(object) = document.as_object_mut() {
        object.insert("version".into(), Value::from(JSON_FORMAT_VERSION));
    }
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Reads one serialized task written by format `version`.
///
/// Returns `Ok(None)` when the task type is missing or unknown.
pub fn read_task(mut task: Value, version: u32, language: &str) -> Result<Option<Task>, FormatError> {
    migrate_task(&mut task, version, language)?;
    if !normalize_task(&mut task) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(task)?))
}

/// Renames legacy items, validates item types and drops unreadable tasks.
fn normalize_course(course: &mut Value) -> Result<(), FormatError> {
    let Some(items) = course.get_mut("items").and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for item in items {
        let kind = item
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("lesson")
            .to_owned();
        rename_legacy(item, "title");
        match kind.as_str() {
            "lesson" | "framework" => normalize_lesson(item),
            "section" => {
                if let Some(lessons) = item.get_mut("items").and_then(Value::as_array_mut) {
                    for lesson in lessons {
                        rename_legacy(lesson, "title");
                        normalize_lesson(lesson);
                    }
                }
            }
            other => return Err(FormatError::UnsupportedItemType(other.to_string())),
        }
    }
    Ok(())
}

/// Normalizes the tasks of a lesson, dropping the unreadable ones.
fn normalize_lesson(lesson: &mut Value) {
    if let Some(tasks) = lesson.get_mut("task_list").and_then(Value::as_array_mut) {
        tasks.retain_mut(normalize_task);
    }
}

/// Renames a legacy task and reports whether its type is known.
fn normalize_task(task: &mut Value) -> bool {
    rename_legacy(task, "name");
    match task.get("task_type").and_then(Value::as_str) {
        Some(kind) if TaskKind::KNOWN_TYPES.contains(&kind) => true,
        Some(kind) => {
            warn!("Unsupported task type {kind}");
            false
        }
        None => {
            warn!("No task type found in json {task}");
            false
        }
    }
}

/// Replaces the old additional-materials name stored under `key`.
fn rename_legacy(object: &mut Value, key: &str) {
    if let Some(name) = object.get_mut(key)
        && name.as_str() == Some(PYCHARM_ADDITIONAL)
    {
        *name = Value::String(ADDITIONAL_MATERIALS.to_string());
    }
}
