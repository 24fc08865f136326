#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Converters upgrading serialized tasks one format version at a time.
//!
//! Every version step has a converter, most of them the identity, so a
//! document is always walked through each intermediate version in order.

use serde_json::{Map, Value};
use tracing::debug;

use super::{FormatError, JSON_FORMAT_VERSION, task_roots::task_roots};

/// Upgrades a single serialized task from one format version to the next.
pub trait TaskConverter: Send + Sync {
    /// Version this converter reads.
    fn from_version(&self) -> u32;

    /// Rewrites `task` in place. `language` is the course programming
    /// language.
    fn convert_task(&self, task: &mut Map<String, Value>, language: &str) -> Result<(), FormatError>;
}

/// A step that changed nothing in the task layout.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub u32);

impl TaskConverter for Identity {
    fn from_version(&self) -> u32 {
        self.0
    }

    fn convert_task(&self, _task: &mut Map<String, Value>, _language: &str) -> Result<(), FormatError> {
        Ok(())
    }
}

/// 6 → 7: moves task and test files under the language's task roots.
#[derive(Debug, Clone, Copy)]
pub struct ToSeventhVersion;

impl TaskConverter for ToSeventhVersion {
    fn from_version(&self) -> u32 {
        6
    }

    fn convert_task(&self, task: &mut Map<String, Value>, language: &str) -> Result<(), FormatError> {
        let Some(roots) = task_roots(language) else {
            return Ok(());
        };

        if let Some(files) = task.get_mut("task_files") {
            let files = files.as_object_mut().ok_or_else(|| FormatError::Conversion {
                from:   6,
                reason: "`task_files` is not an object".into(),
            })?;
            let renamed: Map<String, Value> = std::mem::take(files)
                .into_iter()
                .map(|(name, mut file)| {
                    let new_name = roots.task_file(&name);
                    if let Some(file) = file.as_object_mut() {
                        file.insert("name".into(), Value::String(new_name.clone()));
                        prefix_dependencies(file, |f| roots.task_file(f));
                    }
                    (new_name, file)
                })
                .collect();
            *files = renamed;
        }

        if let Some(tests) = task.get_mut("test_files").and_then(Value::as_object_mut) {
            let renamed: Map<String, Value> = std::mem::take(tests)
                .into_iter()
                .map(|(name, text)| (roots.test_file(&name), text))
                .collect();
            *tests = renamed;
        }

        Ok(())
    }
}

/// Rewrites the `file` of every placeholder dependency in a task file.
pub(crate) fn prefix_dependencies(file: &mut Map<String, Value>, rename: impl Fn(&str) -> String) {
    let Some(placeholders) = file.get_mut("placeholders").and_then(Value::as_array_mut) else {
        return;
    };
    for placeholder in placeholders {
        let dependency_file = placeholder
            .get_mut("dependency")
            .and_then(Value::as_object_mut)
            .and_then(|dep| dep.get_mut("file"));
        if let Some(Value::String(name)) = dependency_file {
            *name = rename(name);
        }
    }
}

/// 7 → 8: plain-string additional files become `{text, is_visible}` objects.
#[derive(Debug, Clone, Copy)]
pub struct ToEighthVersion;

impl TaskConverter for ToEighthVersion {
    fn from_version(&self) -> u32 {
        7
    }

    fn convert_task(&self, task: &mut Map<String, Value>, _language: &str) -> Result<(), FormatError> {
        if let Some(files) = task.get_mut("additional_files").and_then(Value::as_object_mut) {
            upgrade_additional_files(files);
        }
        Ok(())
    }
}

/// Wraps legacy string entries of an additional files map into objects.
pub(crate) fn upgrade_additional_files(files: &mut Map<String, Value>) {
    for value in files.values_mut() {
        if let Value::String(text) = value {
            let mut object = Map::new();
            object.insert("text".into(), Value::String(std::mem::take(text)));
            object.insert("is_visible".into(), Value::Bool(true));
            *value = Value::Object(object);
        }
    }
}

/// Converter reading `version`.
pub fn converter_for(version: u32) -> Box<dyn TaskConverter> {
    match version {
        6 => Box::new(ToSeventhVersion),
        7 => Box::new(ToEighthVersion),
        other => Box::new(Identity(other)),
    }
}

/// Converters taking a document from `from` up to `to`, one per version.
pub fn chain(from: u32, to: u32) -> Vec<Box<dyn TaskConverter>> {
    (from..to).map(converter_for).collect()
}

/// Upgrades a single serialized task from `from` to the current version.
pub fn migrate_task(task: &mut Value, from: u32, language: &str) -> Result<(), FormatError> {
    check_version(from)?;
    let task = task.as_object_mut().ok_or_else(|| FormatError::Conversion {
        from,
        reason: "task is not an object".into(),
    })?;
    for converter in chain(from, JSON_FORMAT_VERSION) {
        debug!("Converting task from version {}", converter.from_version());
        converter.convert_task(task, language)?;
    }
    Ok(())
}

/// Upgrades every task of a serialized course from `from` to the current
/// version.
pub fn migrate_course(course: &mut Value, from: u32) -> Result<(), FormatError> {
    check_version(from)?;
    let language = course
        .get("programming_language")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    for converter in chain(from, JSON_FORMAT_VERSION) {
        debug!("Converting course from version {}", converter.from_version());
        for task in course_tasks_mut(course) {
            let task = task.as_object_mut().ok_or_else(|| FormatError::Conversion {
                from:   converter.from_version(),
                reason: "task is not an object".into(),
            })?;
            converter.convert_task(task, &language)?;
        }
    }
    Ok(())
}

/// Rejects documents newer than this build.
fn check_version(version: u32) -> Result<(), FormatError> {
    if version > JSON_FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion {
            found:     version,
            supported: JSON_FORMAT_VERSION,
        });
    }
    Ok(())
}

/// Every serialized task of a course, sections included.
fn course_tasks_mut(course: &mut Value) -> Vec<&mut Value> {
    let mut tasks = Vec::new();
    let Some(items) = course.get_mut("items").and_then(Value::as_array_mut) else {
        return tasks;
    };
    for item in items {
        let is_section = item.get("type").and_then(Value::as_str) == Some("section");
        if is_section {
            if let Some(lessons) = item.get_mut("items").and_then(Value::as_array_mut) {
                for lesson in lessons {
                    collect_lesson_tasks(lesson, &mut tasks);
                }
            }
        } else {
            collect_lesson_tasks(item, &mut tasks);
        }
    }
    tasks
}

/// Pushes the tasks of a serialized lesson onto `tasks`.
fn collect_lesson_tasks<'a>(lesson: &'a mut Value, tasks: &mut Vec<&'a mut Value>) {
    if let Some(list) = lesson.get_mut("task_list").and_then(Value::as_array_mut) {
        tasks.extend(list.iter_mut());
    }
}
