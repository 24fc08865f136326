//! # edutools
//!
//! Course format, format migration and remote synchronization core for
//! EduTools courses: the course tree, its JSON and YAML serializations, OAuth
//! plumbing, and connectors to Stepik, CheckiO and Hyperskill.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// OAuth tokens, accounts, grants and the redirect listener
pub mod auth;
/// CheckiO connectors
pub mod checkio;
/// Environment-driven configuration
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// The course tree
pub mod course;
/// Course serialization and migration
pub mod format;
/// Hyperskill connector
pub mod hyperskill;
/// Persisted accounts and notifier state
pub mod settings;
/// Stepik connector and solution sync
pub mod stepik;
/// New course announcements
pub mod updates;

pub use course::{Course, Lesson, Section, StudyItem, Task, TaskFile};
pub use format::{FormatError, JSON_FORMAT_VERSION};
