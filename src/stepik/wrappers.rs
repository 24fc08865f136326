#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Shapes of the Stepik REST API payloads. Every list endpoint wraps its
//! objects in a field named after the resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Stepik user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepikUser {
    /// User id.
    pub id:         u64,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name:  String,
    /// Whether the user is an anonymous guest.
    #[serde(default)]
    pub is_guest:   bool,
}

/// `users` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersList {
    /// Users in response order.
    #[serde(default)]
    pub users: Vec<StepikUser>,
}

/// Pagination info of list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageMeta {
    /// Current page, from 1.
    #[serde(default)]
    pub page:     u32,
    /// Whether another page follows.
    #[serde(default)]
    pub has_next: bool,
}

/// A course as Stepik describes it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteCourse {
    /// Course id.
    pub id:                 u64,
    /// Course name.
    #[serde(default)]
    pub title:              String,
    /// Short description.
    #[serde(default)]
    pub summary:            String,
    /// Course type string, e.g. `pycharm11 Python`.
    #[serde(default)]
    pub course_format:      String,
    /// Human language code.
    #[serde(default)]
    pub language:           String,
    /// Whether the course is listed publicly.
    #[serde(default)]
    pub is_public:          bool,
    /// Whether tasks are recommended adaptively.
    #[serde(default)]
    pub is_adaptive:        bool,
    /// Whether the course can be opened in an IDE.
    #[serde(default)]
    pub is_idea_compatible: bool,
    /// Section ids in order.
    #[serde(default)]
    pub sections:           Vec<u64>,
    /// Author ids.
    #[serde(default)]
    pub authors:            Vec<u64>,
    /// Last modification.
    #[serde(default)]
    pub update_date:        DateTime<Utc>,
}

/// `courses` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CoursesList {
    /// Courses of the page.
    #[serde(default)]
    pub courses: Vec<RemoteCourse>,
    /// Pagination.
    #[serde(default)]
    pub meta:    PageMeta,
}

/// A Stepik section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepikSection {
    /// Section id.
    pub id:          u64,
    /// Section name.
    #[serde(default)]
    pub title:       String,
    /// Unit ids in order.
    #[serde(default)]
    pub units:       Vec<u64>,
    /// 1-based position in the course.
    #[serde(default)]
    pub position:    usize,
    /// Last modification.
    #[serde(default)]
    pub update_date: DateTime<Utc>,
}

/// `sections` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionsList {
    /// Sections in response order.
    #[serde(default)]
    pub sections: Vec<StepikSection>,
}

/// A unit binds a lesson to a section.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StepikUnit {
    /// Unit id.
    pub id:       u64,
    /// Owning section.
    #[serde(default)]
    pub section:  u64,
    /// Wrapped lesson.
    #[serde(default)]
    pub lesson:   u64,
    /// 1-based position in the section.
    #[serde(default)]
    pub position: usize,
}

/// `units` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitsList {
    /// Units in response order.
    #[serde(default)]
    pub units: Vec<StepikUnit>,
}

/// A Stepik lesson.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepikLesson {
    /// Lesson id.
    pub id:          u64,
    /// Lesson name.
    #[serde(default)]
    pub title:       String,
    /// Step ids in order.
    #[serde(default)]
    pub steps:       Vec<u64>,
    /// Last modification.
    #[serde(default)]
    pub update_date: DateTime<Utc>,
}

/// `lessons` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonsList {
    /// Lessons in response order.
    #[serde(default)]
    pub lessons: Vec<StepikLesson>,
}

/// Content of a step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    /// Block kind: `pycharm`, `text`, `choice`, `code` and others.
    #[serde(default)]
    pub name:    String,
    /// HTML text of the step.
    #[serde(default)]
    pub text:    String,
    /// Kind-specific options, left raw until the kind is known.
    #[serde(default)]
    pub options: Option<Value>,
}

/// A Stepik step; EduTools tasks are steps with a `pycharm` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepikStep {
    /// Step id.
    pub id:          u64,
    /// Owning lesson.
    #[serde(default)]
    pub lesson:      u64,
    /// 1-based position in the lesson.
    #[serde(default)]
    pub position:    usize,
    /// Content.
    #[serde(default)]
    pub block:       Block,
    /// Last modification.
    #[serde(default)]
    pub update_date: DateTime<Utc>,
}

/// `steps` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StepsList {
    /// Steps in response order.
    #[serde(default)]
    pub steps: Vec<StepikStep>,
}

/// Whether a user passed a step.
#[derive(Debug, Clone, Deserialize)]
pub struct Progress {
    /// Progress id, `77-<step id>` for steps.
    pub id:        String,
    /// Whether the step is solved.
    #[serde(default)]
    pub is_passed: bool,
}

/// `progresses` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressesList {
    /// Progresses in response order.
    #[serde(default)]
    pub progresses: Vec<Progress>,
}

/// One submitted attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    /// Submission id.
    #[serde(default)]
    pub id:     u64,
    /// `correct`, `wrong` or `evaluation`.
    #[serde(default)]
    pub status: String,
    /// Step the attempt was made on.
    #[serde(default)]
    pub step:   u64,
    /// Raw reply; migrated before it is read.
    #[serde(default)]
    pub reply:  Option<Value>,
}

/// `submissions` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionsList {
    /// Submissions, newest first when ordered so.
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

/// A named file of a submission or step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SolutionFile {
    /// File path relative to the task directory.
    #[serde(default)]
    pub name: String,
    /// File text.
    #[serde(default)]
    pub text: String,
}

/// Body of a submission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reply {
    /// Student files of an edu submission.
    #[serde(default)]
    pub solution: Option<Vec<SolutionFile>>,
    /// Serialized `{"task": {...}}` the submission was made from.
    #[serde(default)]
    pub edu_task: Option<String>,
    /// Course format version the reply was written with.
    #[serde(default = "first_version")]
    pub version:  u32,
    /// Code of a code-challenge submission.
    #[serde(default)]
    pub code:     Option<String>,
    /// Language of a code-challenge submission.
    #[serde(default)]
    pub language: Option<String>,
}

/// Replies without a version predate versioning.
fn first_version() -> u32 {
    crate::format::DEFAULT_FORMAT_VERSION
}

impl Reply {
    /// Whether the reply carries at least one solution file.
    pub fn has_solution(&self) -> bool {
        self.solution.as_ref().is_some_and(|files| !files.is_empty())
    }

    /// Whether the reply carries non-blank code.
    pub fn has_code(&self) -> bool {
        self.code.as_ref().is_some_and(|code| !code.is_empty())
    }
}
