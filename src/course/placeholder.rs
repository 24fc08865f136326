use std::{fmt, str::FromStr, sync::OnceLock};

use bon::Builder;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::status::CheckStatus;

/// An editable blank inside a task file that the student fills in.
///
/// `offset` and `length` count characters of the owning file's text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct AnswerPlaceholder {
    /// Start of the placeholder in the file text.
    #[builder(default)]
    pub offset:           usize,
    /// Length of the placeholder in the file text.
    #[builder(default)]
    pub length:           usize,
    /// Hints shown one after another.
    #[serde(default)]
    #[builder(default)]
    pub hints:            Vec<String>,
    /// Author's answer.
    #[serde(default)]
    #[builder(default)]
    pub possible_answer:  String,
    /// Text shown to the student before they type anything.
    #[serde(default)]
    #[builder(default)]
    pub placeholder_text: String,
    /// Placeholder whose answer this one is prefilled with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency:       Option<AnswerPlaceholderDependency>,
    /// Status of the last check.
    #[serde(default)]
    #[builder(default)]
    pub status:           CheckStatus,
    /// Whether the placeholder is selected in the editor.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[builder(default)]
    pub selected:         bool,
}

impl AnswerPlaceholder {
    /// First character index after the placeholder.
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Hints with empty entries dropped.
    pub fn visible_hints(&self) -> impl Iterator<Item = &str> {
        self.hints
            .iter()
            .map(String::as_str)
            .filter(|hint| !hint.is_empty())
    }
}

/// Reference from one placeholder to another one, possibly in another task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPlaceholderDependency {
    /// Section holding the lesson, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section:     Option<String>,
    /// Lesson name.
    pub lesson:      String,
    /// Task name.
    pub task:        String,
    /// Task file name.
    pub file:        String,
    /// 1-based index of the placeholder within the file.
    pub placeholder: usize,
    /// Whether the dependency is shown to the student.
    #[serde(default = "default_visible")]
    pub is_visible:  bool,
}

/// Dependencies are visible unless stated otherwise.
fn default_visible() -> bool {
    true
}

impl fmt::Display for AnswerPlaceholderDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(section) = &self.section {
            write!(f, "{section}#")?;
        }
        write!(f, "{}#{}#{}#{}", self.lesson, self.task, self.file, self.placeholder)
    }
}

/// Error returned when a dependency string is not `[section#]lesson#task#file#index`.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("`{0}` is not a placeholder dependency, expected [section#]lesson#task#file#index")]
pub struct ParseDependencyError(pub String);

/// Matches `[section#]lesson#task#file#index`.
fn dependency_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(?:([^#]+)#)?([^#]+)#([^#]+)#([^#]+)#(\d+)$")
            .expect("dependency pattern is valid")
    })
}

impl FromStr for AnswerPlaceholderDependency {
    type Err = ParseDependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = dependency_regex()
            .captures(s.trim())
            .ok_or_else(|| ParseDependencyError(s.to_string()))?;
        let placeholder = caps[5]
            .parse()
            .map_err(|_| ParseDependencyError(s.to_string()))?;

        Ok(Self {
            section: caps.get(1).map(|m| m.as_str().to_string()),
            lesson: caps[2].to_string(),
            task: caps[3].to_string(),
            file: caps[4].to_string(),
            placeholder,
            is_visible: true,
        })
    }
}
