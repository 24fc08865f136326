#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Hyperskill connector: project stages, their topics and the OAuth account.

/// REST client.
pub mod connector;

pub use connector::HyperskillConnector;
use serde::{Deserialize, Serialize};

use crate::auth::OAuthAccount;

/// A stage of a Hyperskill project; each stage becomes a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HyperskillStage {
    /// Stage id.
    pub id:    u64,
    /// Stage name.
    #[serde(default)]
    pub title: String,
}

/// A topic of the knowledge map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HyperskillTopic {
    /// Topic id.
    pub id:       u64,
    /// Topic name.
    #[serde(default)]
    pub title:    String,
    /// Ids of subtopics; leaf topics have none.
    #[serde(default)]
    pub children: Vec<String>,
}

/// The project a user is working on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HyperskillProject {
    /// Project id.
    pub id:          u64,
    /// Project name.
    #[serde(default)]
    pub title:       String,
    /// Project description.
    #[serde(default)]
    pub description: String,
    /// Lesson holding the project.
    #[serde(default)]
    pub lesson:      u64,
    /// Template repository.
    #[serde(default)]
    pub repo_url:    String,
}

/// A Hyperskill user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HyperskillUserInfo {
    /// User id.
    pub id:       u64,
    /// E-mail address.
    #[serde(default)]
    pub email:    String,
    /// Display name.
    #[serde(default)]
    pub fullname: String,
    /// Current stage.
    #[serde(default)]
    pub stage:    Option<HyperskillStage>,
    /// Current project.
    #[serde(default)]
    pub project:  Option<HyperskillProject>,
}

/// A logged-in Hyperskill user.
pub type HyperskillAccount = OAuthAccount<HyperskillUserInfo>;
