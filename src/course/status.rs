#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of the last check of a task or placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Never checked, or the remote solution was empty.
    #[default]
    Unchecked,
    /// The last check passed.
    Solved,
    /// The last check failed.
    Failed,
}

impl CheckStatus {
    /// Maps a remote "is passed" flag to a status.
    pub fn from_solved(solved: bool) -> Self {
        if solved { Self::Solved } else { Self::Failed }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckStatus::Unchecked => "Unchecked",
            CheckStatus::Solved => "Solved",
            CheckStatus::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}

/// Tracks which parts of an item changed since the last upload to Stepik.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepikChangeStatus {
    /// Nothing changed.
    #[default]
    UpToDate,
    /// Both metadata and content changed.
    InfoAndContent,
    /// Only metadata (names, order) changed.
    Info,
    /// Only content changed.
    Content,
}

/// Markup used by a task description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DescriptionFormat {
    /// HTML markup.
    #[default]
    #[serde(alias = "html")]
    Html,
    /// Markdown markup.
    #[serde(alias = "md")]
    Md,
}

/// Where the "leave feedback" link of a task points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackLinkType {
    /// The platform default.
    #[default]
    Default,
    /// The step's Stepik comments page.
    Stepik,
    /// A link chosen by the course author.
    Custom,
    /// No feedback link is shown.
    None,
}

/// Feedback link of a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackLink {
    /// Kind of link.
    #[serde(rename = "link_type", default)]
    pub kind: FeedbackLinkType,
    /// Target URL, only meaningful for [`FeedbackLinkType::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl FeedbackLink {
    /// A custom link pointing at `link`.
    pub fn custom(link: impl Into<String>) -> Self {
        Self {
            kind: FeedbackLinkType::Custom,
            link: Some(link.into()),
        }
    }
}
