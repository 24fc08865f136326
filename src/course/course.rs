#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::BTreeMap;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ValidationError,
    lesson::{Lesson, Section, StudyItem},
    task::Task,
};
use crate::hyperskill::{HyperskillStage, HyperskillTopic};

/// Who the course is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CourseMode {
    /// A student taking the course.
    #[default]
    Study,
    /// An author editing the course.
    #[serde(rename = "Course Creator")]
    CourseCreator,
}

/// A course author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name:  String,
}

/// Where the course came from. Kept in memory only.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CourseKind {
    /// Created locally.
    #[default]
    Local,
    /// Loaded from Stepik.
    Stepik {
        /// Whether the course is listed publicly.
        is_public:   bool,
        /// Whether tasks are recommended adaptively.
        is_adaptive: bool,
    },
    /// A CheckiO mission set.
    CheckiO,
    /// A Hyperskill project.
    Hyperskill {
        /// Project stages in order.
        stages:         Vec<HyperskillStage>,
        /// Leaf topics by task index.
        task_to_topics: BTreeMap<usize, Vec<HyperskillTopic>>,
    },
}

/// Position of a lesson in the course tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LessonLocation {
    /// Index of the top-level item.
    pub item:   usize,
    /// Index of the lesson inside the item when the item is a section.
    pub nested: Option<usize>,
}

/// Position of a task in the course tree; stands in for a parent pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskLocation {
    /// Lesson holding the task.
    pub lesson: LessonLocation,
    /// Index of the task inside the lesson.
    pub task:   usize,
}

/// Root of the course tree.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct Course {
    /// Stepik course id, 0 for local courses.
    #[serde(default)]
    #[builder(default)]
    pub id:                   u64,
    /// Course name.
    #[serde(rename = "title")]
    pub name:                 String,
    /// Short description.
    #[serde(rename = "summary", default)]
    #[builder(default)]
    pub description:          String,
    /// Programming language id, e.g. `Python` or `kotlin`.
    #[serde(default)]
    #[builder(default)]
    pub programming_language: String,
    /// Human language code, e.g. `en`.
    #[serde(default = "default_language")]
    #[builder(default = default_language())]
    pub language:             String,
    /// Platform type string, `PyCharm` for EduTools courses.
    #[serde(default = "default_course_type")]
    #[builder(default = default_course_type())]
    pub course_type:          String,
    /// Study or course-creator mode.
    #[serde(default)]
    #[builder(default)]
    pub course_mode:          CourseMode,
    /// Authors in display order.
    #[serde(default)]
    #[builder(default)]
    pub authors:              Vec<Author>,
    /// Last modification on the remote side.
    #[serde(default, deserialize_with = "super::dates::deserialize")]
    #[builder(default)]
    pub update_date:          DateTime<Utc>,
    /// Lessons and sections in order.
    #[serde(default)]
    #[builder(default)]
    pub items:                Vec<StudyItem>,
    /// Remote origin.
    #[serde(skip)]
    #[builder(default)]
    pub kind:                 CourseKind,
}

/// Courses are in English unless stated otherwise.
fn default_language() -> String {
    "en".to_string()
}

/// Type string of courses authored with EduTools.
fn default_course_type() -> String {
    "PyCharm".to_string()
}

impl Course {
    /// Renumbers the 1-based `index` of every item, lesson and task.
    pub fn init(&mut self) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.set_index(i + 1);
            match item {
                StudyItem::Lesson(lesson) => init_lesson(lesson),
                StudyItem::Section(section) => {
                    for (j, lesson) in section.lessons.iter_mut().enumerate() {
                        lesson.index = j + 1;
                        init_lesson(lesson);
                    }
                }
            }
        }
    }

    /// Top-level sections.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.items.iter().filter_map(StudyItem::as_section)
    }

    /// Every lesson with its location, in tree order.
    pub fn lessons(&self) -> Vec<(LessonLocation, &Lesson)> {
        let mut lessons = Vec::new();
        for (item, entry) in self.items.iter().enumerate() {
            match entry {
                StudyItem::Lesson(lesson) => {
                    lessons.push((LessonLocation { item, nested: None }, lesson))
                }
                StudyItem::Section(section) => {
                    for (nested, lesson) in section.lessons.iter().enumerate() {
                        lessons.push((
                            LessonLocation {
                                item,
                                nested: Some(nested),
                            },
                            lesson,
                        ));
                    }
                }
            }
        }
        lessons
    }

    /// Every task with its location, in tree order.
    pub fn tasks(&self) -> Vec<(TaskLocation, &Task)> {
        self.lessons()
            .into_iter()
            .flat_map(|(lesson_loc, lesson)| {
                lesson.tasks.iter().enumerate().map(move |(task, t)| {
                    (
                        TaskLocation {
                            lesson: lesson_loc,
                            task,
                        },
                        t,
                    )
                })
            })
            .collect()
    }

    /// Lesson at `loc`.
    pub fn lesson_at(&self, loc: LessonLocation) -> Option<&Lesson> {
        match (self.items.get(loc.item)?, loc.nested) {
            (StudyItem::Lesson(lesson), None) => Some(lesson),
            (StudyItem::Section(section), Some(nested)) => section.lessons.get(nested),
            _ => None,
        }
    }

    /// Mutable lesson at `loc`.
    pub fn lesson_at_mut(&mut self, loc: LessonLocation) -> Option<&mut Lesson> {
        match (self.items.get_mut(loc.item)?, loc.nested) {
            (StudyItem::Lesson(lesson), None) => Some(lesson),
            (StudyItem::Section(section), Some(nested)) => section.lessons.get_mut(nested),
            _ => None,
        }
    }

    /// Task at `loc`.
    pub fn task_at(&self, loc: TaskLocation) -> Option<&Task> {
        self.lesson_at(loc.lesson)?.tasks.get(loc.task)
    }

    /// Mutable task at `loc`.
    pub fn task_at_mut(&mut self, loc: TaskLocation) -> Option<&mut Task> {
        self.lesson_at_mut(loc.lesson)?.tasks.get_mut(loc.task)
    }

    /// Human-readable `section/lesson/task` path of `loc`.
    pub fn task_path(&self, loc: TaskLocation) -> Option<String> {
        let task = self.task_at(loc)?;
        let lesson = self.lesson_at(loc.lesson)?;
        let mut path = String::new();
        if let Some(StudyItem::Section(section)) = self.items.get(loc.lesson.item) {
            path.push_str(&section.name);
            path.push('/');
        }
        path.push_str(&lesson.name);
        path.push('/');
        path.push_str(&task.name);
        Some(path)
    }

    /// Placeholder bound violations across the whole course.
    pub fn validate(&self) -> Vec<(TaskLocation, ValidationError)> {
        self.tasks()
            .into_iter()
            .flat_map(|(loc, task)| task.validate().into_iter().map(move |e| (loc, e)))
            .collect()
    }
}

/// Numbers the tasks of `lesson` from 1.
fn init_lesson(lesson: &mut Lesson) {
    for (i, task) in lesson.tasks.iter_mut().enumerate() {
        task.index = i + 1;
    }
}
