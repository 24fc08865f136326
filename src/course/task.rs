#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, fmt};

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ValidationError,
    status::{CheckStatus, DescriptionFormat, FeedbackLink, StepikChangeStatus},
    task_file::{TaskFile, TaskFiles},
};

/// Kind of a task, stored as `task_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Task with placeholders checked by tests.
    #[default]
    #[serde(alias = "pycharm")]
    Edu,
    /// Task checked by comparing program output.
    Output,
    /// Reading material, nothing to check.
    Theory,
    /// Multiple-choice quiz.
    Choice,
    /// Stepik code challenge.
    Code,
    /// Free-form IDE task.
    Ide,
}

impl TaskKind {
    /// Every known `task_type` value, deprecated spellings included.
    pub const KNOWN_TYPES: [&'static str; 7] =
        ["edu", "output", "theory", "choice", "code", "ide", "pycharm"];

    /// The serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Edu => "edu",
            TaskKind::Output => "output",
            TaskKind::Theory => "theory",
            TaskKind::Choice => "choice",
            TaskKind::Code => "code",
            TaskKind::Ide => "ide",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-student file shipped with a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalFile {
    /// File contents.
    #[serde(default)]
    pub text:       String,
    /// Whether the file is shown in the project view.
    #[serde(default)]
    pub is_visible: bool,
}

/// A single exercise inside a lesson.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct Task {
    /// Task name, also its directory name.
    pub name:               String,
    /// Kind of task.
    #[serde(rename = "task_type")]
    #[builder(default)]
    pub kind:               TaskKind,
    /// Id of the Stepik step backing the task, 0 for local tasks.
    #[serde(rename = "stepic_id", default)]
    #[builder(default)]
    pub step_id:            u64,
    /// Student files in order.
    #[serde(default)]
    #[builder(default)]
    pub task_files:         TaskFiles,
    /// Test file texts by name.
    #[serde(default)]
    #[builder(default)]
    pub test_files:         BTreeMap<String, String>,
    /// Task description.
    #[serde(default)]
    #[builder(default)]
    pub description_text:   String,
    /// Markup of the description.
    #[serde(default)]
    #[builder(default)]
    pub description_format: DescriptionFormat,
    /// Extra files by name.
    #[serde(default)]
    #[builder(default)]
    pub additional_files:   BTreeMap<String, AdditionalFile>,
    /// Last modification on the remote side.
    #[serde(default, deserialize_with = "super::dates::deserialize")]
    #[builder(default)]
    pub update_date:        DateTime<Utc>,
    /// Where feedback goes.
    #[serde(default)]
    #[builder(default)]
    pub feedback_link:      FeedbackLink,
    /// Result of the last check.
    #[serde(default)]
    #[builder(default)]
    pub status:             CheckStatus,
    /// Answer variants of a choice task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub choice_variants:    Vec<String>,
    /// Whether a choice task accepts several answers.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[builder(default)]
    pub is_multichoice:     bool,
    /// 1-based position in the lesson, assigned by `Course::init`.
    #[serde(skip)]
    #[builder(default)]
    pub index:              usize,
    /// Pending Stepik upload state.
    #[serde(skip)]
    #[builder(default)]
    pub change_status:      StepikChangeStatus,
}

impl Task {
    /// Sets the task status together with the status of every placeholder.
    pub fn set_status(&mut self, status: CheckStatus) {
        for file in self.task_files.iter_mut() {
            file.set_status(status);
        }
        self.status = status;
    }

    /// File named `name`.
    pub fn file(&self, name: &str) -> Option<&TaskFile> {
        self.task_files.get(name)
    }

    /// Adds or replaces a student file.
    pub fn add_file(&mut self, file: TaskFile) {
        self.task_files.insert(file);
    }

    /// Adds a visible additional file.
    pub fn add_additional_file(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.additional_files.insert(name.into(), AdditionalFile {
            text:       text.into(),
            is_visible: true,
        });
    }

    /// Whether the student's code is posted to Stepik as an edu submission.
    pub fn is_to_submit_to_stepik(&self) -> bool {
        self.kind == TaskKind::Edu
    }

    /// The description followed by every non-empty placeholder hint.
    pub fn description_with_hints(&self) -> String {
        let hints: Vec<&str> = self
            .task_files
            .iter()
            .flat_map(|f| f.placeholders.iter())
            .flat_map(|p| p.visible_hints())
            .collect();
        if hints.is_empty() {
            return self.description_text.clone();
        }

        let mut text = self.description_text.clone();
        text.push_str("<br>");
        for hint in hints {
            text.push_str(&format!("<div class='hint'>{hint}</div>"));
        }
        text.push_str("<br>");
        text
    }

    /// Placeholder bound violations across the task's files.
    pub fn validate(&self) -> Vec<ValidationError> {
        self.task_files.iter().flat_map(TaskFile::validate).collect()
    }
}
