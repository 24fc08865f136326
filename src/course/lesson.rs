#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use super::{status::StepikChangeStatus, task::Task};

/// Flavour of a lesson, stored as the item `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    /// Independent tasks.
    #[default]
    Lesson,
    /// Tasks that build on each other in a single set of files.
    Framework,
}

/// An ordered group of tasks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Lesson {
    /// Stepik lesson id, 0 for local lessons.
    #[serde(default)]
    pub id:            u64,
    /// Lesson name, also its directory name.
    #[serde(rename = "title", default)]
    pub name:          String,
    /// Flavour of the lesson.
    #[serde(rename = "type", default)]
    pub kind:          LessonKind,
    /// Last modification on the remote side.
    #[serde(default, deserialize_with = "super::dates::deserialize")]
    pub update_date:   DateTime<Utc>,
    /// Tasks in order.
    #[serde(rename = "task_list", default)]
    pub tasks:         Vec<Task>,
    /// 1-based position among its siblings.
    #[serde(skip)]
    pub index:         usize,
    /// Stepik unit wrapping the lesson.
    #[serde(skip)]
    pub unit_id:       u64,
    /// Pending Stepik upload state.
    #[serde(skip)]
    pub change_status: StepikChangeStatus,
}

impl Lesson {
    /// A plain lesson named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether this is a framework lesson.
    pub fn is_framework(&self) -> bool {
        self.kind == LessonKind::Framework
    }

    /// Task named `name`.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Mutable task named `name`.
    pub fn task_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.name == name)
    }
}

/// Serialized `type` of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionMarker {
    /// The only value.
    #[default]
    Section,
}

/// An ordered group of lessons.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    /// Stepik section id, 0 for local sections.
    #[serde(default)]
    pub id:            u64,
    /// Section name, also its directory name.
    #[serde(rename = "title", default)]
    pub name:          String,
    /// Always `section`.
    #[serde(rename = "type", default)]
    pub marker:        SectionMarker,
    /// Last modification on the remote side.
    #[serde(default, deserialize_with = "super::dates::deserialize")]
    pub update_date:   DateTime<Utc>,
    /// Lessons in order.
    #[serde(rename = "items", default)]
    pub lessons:       Vec<Lesson>,
    /// 1-based position among its siblings.
    #[serde(skip)]
    pub index:         usize,
    /// Pending Stepik upload state.
    #[serde(skip)]
    pub change_status: StepikChangeStatus,
}

impl Section {
    /// An empty section named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Lesson named `name`.
    pub fn lesson(&self, name: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.name == name)
    }
}

/// A top-level course item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StudyItem {
    /// A lesson or framework lesson.
    Lesson(Lesson),
    /// A section of lessons.
    Section(Section),
}

impl StudyItem {
    /// Item name.
    pub fn name(&self) -> &str {
        match self {
            StudyItem::Lesson(lesson) => &lesson.name,
            StudyItem::Section(section) => &section.name,
        }
    }

    /// The lesson, if this item is one.
    pub fn as_lesson(&self) -> Option<&Lesson> {
        match self {
            StudyItem::Lesson(lesson) => Some(lesson),
            StudyItem::Section(_) => None,
        }
    }

    /// The section, if this item is one.
    pub fn as_section(&self) -> Option<&Section> {
        match self {
            StudyItem::Section(section) => Some(section),
            StudyItem::Lesson(_) => None,
        }
    }

    /// Sets the 1-based position among siblings.
    pub(crate) fn set_index(&mut self, index: usize) {
        match self {
            StudyItem::Lesson(lesson) => lesson.index = index,
            StudyItem::Section(section) => section.index = index,
        }
    }
}

impl<'de> Deserialize<'de> for StudyItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("lesson")
            .to_owned();

        match kind.as_str() {
            "lesson" | "framework" => serde_json::from_value(value)
                .map(StudyItem::Lesson)
                .map_err(D::Error::custom),
            "section" => serde_json::from_value(value)
                .map(StudyItem::Section)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("Unsupported lesson type: {other}"))),
        }
    }
}

impl From<Lesson> for StudyItem {
    fn from(lesson: Lesson) -> Self {
        StudyItem::Lesson(lesson)
    }
}

impl From<Section> for StudyItem {
    fn from(section: Section) -> Self {
        StudyItem::Section(section)
    }
}
