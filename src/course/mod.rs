#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! In-memory course tree: course, sections, lessons, tasks, task files and
//! answer placeholders.

/// The course root and tree navigation.
#[allow(clippy::module_inception)]
pub mod course;
/// Lenient `update_date` parsing.
pub mod dates;
/// Lessons, sections and top-level items.
pub mod lesson;
/// Answer placeholders and their dependencies.
pub mod placeholder;
/// Status and formatting enums.
pub mod status;
/// Tasks.
pub mod task;
/// Task files and the ordered task-file map.
pub mod task_file;

pub use course::{Author, Course, CourseKind, CourseMode, LessonLocation, TaskLocation};
pub use lesson::{Lesson, LessonKind, Section, StudyItem};
pub use placeholder::{AnswerPlaceholder, AnswerPlaceholderDependency, ParseDependencyError};
pub use status::{CheckStatus, DescriptionFormat, FeedbackLink, FeedbackLinkType, StepikChangeStatus};
pub use task::{AdditionalFile, Task, TaskKind};
pub use task_file::{TaskFile, TaskFiles};

/// A structural problem found while validating a course.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A placeholder span runs past the end of its file.
    #[error(
        "placeholder #{placeholder} in `{file}` ends at {end}, past the end of the text ({text_len} \
         characters)"
    )]
    PlaceholderOutOfBounds {
        /// Task file name.
        file:        String,
        /// 1-based placeholder index.
        placeholder: usize,
        /// Exclusive end offset of the placeholder.
        end:         usize,
        /// Length of the file text in characters.
        text_len:    usize,
    },
}
