#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Options of `pycharm` steps and submission replies, with the migrations
//! that bring older payloads up to date.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    StepikError,
    wrappers::{Reply, SolutionFile, StepikStep},
};
use crate::{
    constants::{CHOICE_BLOCK, CODE_BLOCK, PYCHARM_PREFIX, TEXT_BLOCK, code_file_name},
    course::{
        AdditionalFile, DescriptionFormat, FeedbackLink, Task, TaskFile, TaskFiles, TaskKind,
    },
    format::{
        ADDITIONAL_MATERIALS, JSON_FORMAT_VERSION, PYCHARM_ADDITIONAL,
        convert::{prefix_dependencies, upgrade_additional_files},
        json::read_task,
        task_roots::task_roots,
    },
};

/// Current version of step options.
pub const STEP_OPTIONS_VERSION: u32 = 6;

/// Course format version that introduced task roots.
const TASK_ROOTS_VERSION: u32 = 7;

/// Options of a `pycharm` step, at [`STEP_OPTIONS_VERSION`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepOptions {
    /// Task name.
    #[serde(default)]
    pub title:              String,
    /// Task description.
    #[serde(default, alias = "descriptionText")]
    pub description_text:   String,
    /// Markup of the description.
    #[serde(default, alias = "descriptionFormat")]
    pub description_format: DescriptionFormat,
    /// Student files in order.
    #[serde(default)]
    pub files:              Vec<TaskFile>,
    /// Test files in order.
    #[serde(default)]
    pub test:               Vec<SolutionFile>,
    /// Extra files by name.
    #[serde(default)]
    pub additional_files:   BTreeMap<String, AdditionalFile>,
    /// Version the options were written with.
    #[serde(default)]
    pub format_version:     u32,
    /// Task kind; absent for the oldest steps.
    #[serde(default)]
    pub task_type:          Option<String>,
    /// Where feedback goes.
    #[serde(default)]
    pub feedback_link:      FeedbackLink,
}

impl StepOptions {
    /// Reads raw options of any version, upgrading them first. `language` is
    /// the course programming language.
    pub fn from_value(mut options: Value, language: &str) -> Result<Self, StepikError> {
        migrate_step_options(&mut options, language)?;
        let mut options: StepOptions = serde_json::from_value(options)?;
        if options.title == PYCHARM_ADDITIONAL {
            options.title = ADDITIONAL_MATERIALS.to_string();
        }
        Ok(options)
    }

    /// Builds the task these options describe, or `None` when the task type
    /// is unknown.
    pub fn into_task(self) -> Option<Task> {
        let kind = match self.task_type.as_deref() {
            None => TaskKind::Edu,
            Some(name) if TaskKind::KNOWN_TYPES.contains(&name) => {
                serde_json::from_value(Value::String(name.to_string())).ok()?
            }
            Some(name) => {
                warn!("Unsupported task type {name}");
                return None;
            }
        };

        let task_files: TaskFiles = self.files.into_iter().collect();
        let test_files = self
            .test
            .into_iter()
            .map(|file| (file.name, file.text))
            .collect();

        Some(
            Task::builder()
                .name(self.title)
                .kind(kind)
                .task_files(task_files)
                .test_files(test_files)
                .description_text(self.description_text)
                .description_format(self.description_format)
                .additional_files(self.additional_files)
                .feedback_link(self.feedback_link)
                .build(),
        )
    }
}

/// Upgrades raw step options in place to [`STEP_OPTIONS_VERSION`].
///
/// Versions:
/// 1. placeholders are addressed by `line` and `start`;
/// 2. placeholders keep their answer in `subtask_infos`;
/// 3. a placeholder has one `hint` plus `additional_hints`;
/// 4. additional files are plain strings;
/// 5. files are not under the language's task roots.
pub fn migrate_step_options(options: &mut Value, language: &str) -> Result<(), StepikError> {
    let options = options
        .as_object_mut()
        .ok_or_else(|| StepikError::Malformed("step options are not an object".into()))?;
    let mut version = match options.get("format_version").and_then(Value::as_u64) {
        Some(v) => u32::try_from(v).unwrap_or(u32::MAX).max(1),
        None => 1,
    };
    if version > STEP_OPTIONS_VERSION {
        return Err(StepikError::Malformed(format!(
            "step options version {version} is newer than {STEP_OPTIONS_VERSION}"
        )));
    }

    while version < STEP_OPTIONS_VERSION {
        debug!("Converting step options from version {version}");
        match version {
            1 => for_each_file(options, line_start_to_offset),
            2 => for_each_placeholder(options, lift_subtask_info),
            3 => for_each_placeholder(options, merge_hints),
            4 => {
                if let Some(files) = options
                    .get_mut("additional_files")
                    .and_then(Value::as_object_mut)
                {
                    upgrade_additional_files(files);
                }
            }
            _ => add_task_roots(options, language),
        }
        version += 1;
    }
    options.insert("format_version".into(), Value::from(STEP_OPTIONS_VERSION));
    Ok(())
}

/// Applies `f` to every serialized file of the options.
fn for_each_file(options: &mut Map<String, Value>, f: impl Fn(&mut Map<String, Value>)) {
    let Some(files) = options.get_mut("files").and_then(Value::as_array_mut) else {
        return;
    };
    files.iter_mut().filter_map(Value::as_object_mut).for_each(f);
}

/// Applies `f` to every serialized placeholder of the options.
fn for_each_placeholder(options: &mut Map<String, Value>, f: impl Fn(&mut Map<String, Value>)) {
    for_each_file(options, |file| {
        if let Some(placeholders) = file.get_mut("placeholders").and_then(Value::as_array_mut) {
            placeholders
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .for_each(&f);
        }
    });
}

/// 1 → 2: `line` and `start` become a character `offset` into the file text.
fn line_start_to_offset(file: &mut Map<String, Value>) {
    let text = file
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut line_starts = vec![0];
    for (i, c) in text.chars().enumerate() {
        if c == '\n' {
            line_starts.push(i + 1);
        }
    }

    let Some(placeholders) = file.get_mut("placeholders").and_then(Value::as_array_mut) else {
        return;
    };
    for placeholder in placeholders.iter_mut().filter_map(Value::as_object_mut) {
        let line = placeholder.remove("line").and_then(|v| v.as_u64());
        let start = placeholder.remove("start").and_then(|v| v.as_u64());
        if let (Some(line), Some(start)) = (line, start) {
            let line_start = line_starts.get(line as usize).copied().unwrap_or_default();
            placeholder.insert("offset".into(), Value::from(line_start + start as usize));
        }
    }
}

/// 2 → 3: the answer of the first subtask moves onto the placeholder.
fn lift_subtask_info(placeholder: &mut Map<String, Value>) {
    let Some(infos) = placeholder.remove("subtask_infos") else {
        return;
    };
    let first = match infos {
        Value::Array(mut infos) if !infos.is_empty() => infos.swap_remove(0),
        Value::Object(mut infos) => match infos.remove("0") {
            Some(info) => info,
            None => return,
        },
        _ => return,
    };
    let Value::Object(info) = first else {
        return;
    };
    for key in ["hint", "additional_hints", "possible_answer", "placeholder_text"] {
        if let Some(value) = info.get(key) {
            placeholder.insert(key.into(), value.clone());
        }
    }
}

/// 3 → 4: `hint` and `additional_hints` become a single `hints` list.
fn merge_hints(placeholder: &mut Map<String, Value>) {
    let mut hints = Vec::new();
    if let Some(Value::String(hint)) = placeholder.remove("hint")
        && !hint.is_empty()
    {
        hints.push(Value::String(hint));
    }
    if let Some(Value::Array(more)) = placeholder.remove("additional_hints") {
        hints.extend(more);
    }
    if !hints.is_empty() || !placeholder.contains_key("hints") {
        placeholder.insert("hints".into(), Value::Array(hints));
    }
}

/// 5 → 6: files, dependencies and tests move under the task roots.
fn add_task_roots(options: &mut Map<String, Value>, language: &str) {
    let Some(roots) = task_roots(language) else {
        return;
    };
    for_each_file(options, |file| {
        if let Some(Value::String(name)) = file.get_mut("name") {
            *name = roots.task_file(name);
        }
        prefix_dependencies(file, |f| roots.task_file(f));
    });
    if let Some(tests) = options.get_mut("test").and_then(Value::as_array_mut) {
        for test in tests.iter_mut().filter_map(Value::as_object_mut) {
            if let Some(Value::String(name)) = test.get_mut("name") {
                *name = roots.test_file(name);
            }
        }
    }
}

/// Builds the task a step describes.
///
/// `pycharm` steps carry full task options. Theory, choice and code steps
/// become tasks of the matching kind named after their position. Other steps
/// yield `None`.
pub fn task_from_step(step: &StepikStep, language: &str) -> Result<Option<Task>, StepikError> {
    let block = &step.block;
    let task = if block.name.starts_with(PYCHARM_PREFIX) {
        let Some(options) = block.options.clone() else {
            warn!("Step {} has no options", step.id);
            return Ok(None);
        };
        match StepOptions::from_value(options, language)?.into_task() {
            Some(task) => task,
            None => return Ok(None),
        }
    } else {
        let name = format!("step{}", step.position);
        match block.name.as_str() {
            TEXT_BLOCK => Task::builder()
                .name(name)
                .kind(TaskKind::Theory)
                .description_text(block.text.clone())
                .build(),
            CHOICE_BLOCK => choice_task(name, step),
            CODE_BLOCK => {
                let mut task = Task::builder()
                    .name(name)
                    .kind(TaskKind::Code)
                    .description_text(block.text.clone())
                    .build();
                task.add_file(TaskFile::new(code_file_name(language), ""));
                task
            }
            other => {
                debug!("Skipping step {} of unsupported kind {other}", step.id);
                return Ok(None);
            }
        }
    };

    Ok(Some(Task {
        step_id: step.id,
        update_date: step.update_date,
        ..task
    }))
}

/// A choice task from the variants in the step options.
fn choice_task(name: String, step: &StepikStep) -> Task {
    let options = step.block.options.as_ref();
    let variants = options
        .and_then(|o| o.get("options"))
        .and_then(Value::as_array)
        .map(|variants| {
            variants
                .iter()
                .filter_map(|v| v.get("text").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let is_multichoice = options
        .and_then(|o| o.get("is_multiple_choice"))
        .and_then(Value::as_bool)
        .unwrap_or_default();

    Task::builder()
        .name(name)
        .kind(TaskKind::Choice)
        .description_text(step.block.text.clone())
        .choice_variants(variants)
        .is_multichoice(is_multichoice)
        .build()
}

/// Reads a raw submission reply, moving old solution file names under the
/// task roots of `language`.
pub fn migrate_reply(reply: Value, language: &str) -> Result<Reply, StepikError> {
    let mut reply: Reply = serde_json::from_value(reply)?;
    if reply.version < TASK_ROOTS_VERSION
        && let Some(roots) = task_roots(language)
        && let Some(files) = reply.solution.as_mut()
    {
        for file in files {
            file.name = roots.task_file(&file.name);
        }
    }
    Ok(reply)
}

/// The task a reply was submitted from, upgraded to the current format.
///
/// Returns `Ok(None)` when the reply has no task or the task cannot be read.
pub fn reply_task(reply: &Reply, language: &str) -> Result<Option<Task>, StepikError> {
    let Some(edu_task) = reply.edu_task.as_deref() else {
        return Ok(None);
    };
    if reply.version > JSON_FORMAT_VERSION {
        return Ok(None);
    }
    let mut wrapper: Value = serde_json::from_str(edu_task)?;
    let Some(task) = wrapper.get_mut("task").map(Value::take) else {
        return Ok(None);
    };
    Ok(read_task(task, reply.version, language)?)
}
