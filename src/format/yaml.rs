//! YAML configuration files a course author keeps next to course content.
//!
//! Course, section and lesson configs only list their children by name; the
//! task config carries the task files and placeholders.

use serde::{Deserialize, Serialize};

use super::FormatError;
use crate::course::{
    AnswerPlaceholder, AnswerPlaceholderDependency, Course, FeedbackLink, FeedbackLinkType, Lesson,
    Section, StudyItem, Task, TaskFile, TaskKind,
};

/// `course-info.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Course name.
    pub title:                String,
    /// Human language.
    #[serde(default)]
    pub language:             String,
    /// Short description.
    #[serde(default)]
    pub summary:              String,
    /// Programming language.
    #[serde(default)]
    pub programming_language: String,
    /// Item names in order.
    #[serde(default)]
    pub content:              Vec<String>,
}

/// `section-info.yaml` and `lesson-info.yaml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Child names in order.
    #[serde(default)]
    pub content: Vec<String>,
}

/// One placeholder of a task file in `task-info.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    /// Start in the file text, in characters.
    pub offset:           usize,
    /// Length of the author's answer.
    pub length:           usize,
    /// Text shown in place of the answer.
    #[serde(default)]
    pub placeholder_text: String,
    /// Placeholder the answer is taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency:       Option<AnswerPlaceholderDependency>,
}

/// One task file in `task-info.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFileConfig {
    /// Path relative to the task directory.
    pub name:         String,
    /// Whether the file is shown to students.
    #[serde(default = "visible")]
    pub visible:      bool,
    /// Placeholders in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholders: Vec<PlaceholderConfig>,
}

/// Files are visible unless stated otherwise.
fn visible() -> bool {
    true
}

/// `task-info.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Task kind.
    #[serde(rename = "type")]
    pub kind:          TaskKind,
    /// Student files.
    #[serde(default)]
    pub task_files:    Vec<TaskFileConfig>,
    /// Custom feedback URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_link: Option<String>,
}

/// Reads a course config. Items come back as empty lessons named after the
/// `content` entries.
pub fn course(text: &str) -> Result<Course, FormatError> {
    let config: CourseConfig = serde_yaml::from_str(text)?;
    let items = config
        .content
        .into_iter()
        .map(|name| StudyItem::Lesson(Lesson::new(name)))
        .collect();

    let mut course = Course::builder()
        .name(config.title)
        .description(config.summary)
        .programming_language(config.programming_language)
        .items(items)
        .build();
    if !config.language.is_empty() {
        course.language = config.language;
    }
    course.init();
    Ok(course)
}

/// Reads a section config.
pub fn section(text: &str) -> Result<Section, FormatError> {
    let config: ContentConfig = serde_yaml::from_str(text)?;
    Ok(Section {
        lessons: config.content.into_iter().map(Lesson::new).collect(),
        ..Section::default()
    })
}

/// Reads a lesson config. Tasks come back empty, named after the entries.
pub fn lesson(text: &str) -> Result<Lesson, FormatError> {
    let config: ContentConfig = serde_yaml::from_str(text)?;
    Ok(Lesson {
        tasks: config
            .content
            .into_iter()
            .map(|name| Task::builder().name(name).build())
            .collect(),
        ..Lesson::default()
    })
}

/// Reads a task config without file texts.
pub fn task(text: &str) -> Result<Task, FormatError> {
    task_with_texts(text, |_| None)
}

/// Reads a task config, looking file texts up through `text_of`.
///
/// A placeholder's YAML `length` spans the author's answer in the file text.
/// After loading, the answer moves to `possible_answer` and the file text shows
/// the placeholder text in its place, so the placeholder's length becomes the
/// placeholder text length. Without a file text the answer is blank.
pub fn task_with_texts(
    text: &str,
    text_of: impl Fn(&str) -> Option<String>,
) -> Result<Task, FormatError> {
    let config: TaskConfig = serde_yaml::from_str(text)?;
    let mut task = Task::builder().name("").kind(config.kind).build();

    for file_config in config.task_files {
        let file_text = text_of(&file_config.name).unwrap_or_default();
        let (student_text, placeholders) = student_view(&file_text, file_config.placeholders);
        let mut file = TaskFile::new(file_config.name, student_text);
        file.is_visible = file_config.visible;
        file.placeholders = placeholders;
        task.add_file(file);
    }

    if let Some(link) = config.feedback_link {
        task.feedback_link = FeedbackLink::custom(link);
    }
    Ok(task)
}

/// Swaps each answer span of `author_text` for its placeholder text.
///
/// Returns the resulting text with placeholders shifted to match it. When the
/// text does not contain an answer span, the text is left alone and the answer
/// is blank.
fn student_view(author_text: &str, configs: Vec<PlaceholderConfig>) -> (String, Vec<AnswerPlaceholder>) {
    let chars: Vec<char> = author_text.chars().collect();
    let mut order: Vec<usize> = (0..configs.len()).collect();
    order.sort_by_key(|&i| configs[i].offset);

    let mut text = String::with_capacity(author_text.len());
    let mut placeholders = vec![AnswerPlaceholder::default(); configs.len()];
    let mut cursor = 0;
    let mut shift: isize = 0;

    for i in order {
        let config = &configs[i];
        let end = config.offset + config.length;
        let has_answer = config.offset >= cursor && end <= chars.len();
        let possible_answer = if has_answer {
            text.extend(&chars[cursor..config.offset]);
            text.push_str(&config.placeholder_text);
            cursor = end;
            chars[config.offset..end].iter().collect()
        } else {
            " ".repeat(config.length)
        };

        let placeholder_len = config.placeholder_text.chars().count();
        placeholders[i] = AnswerPlaceholder {
            offset: config.offset.saturating_add_signed(shift),
            length: placeholder_len,
            possible_answer,
            placeholder_text: config.placeholder_text.clone(),
            dependency: config.dependency.clone(),
            ..AnswerPlaceholder::default()
        };
        if has_answer {
            shift += placeholder_len as isize - config.length as isize;
        }
    }
    if cursor < chars.len() {
        text.extend(&chars[cursor..]);
    }

    (text, placeholders)
}

/// Writes the config of `course`.
pub fn write_course(course: &Course) -> Result<String, FormatError> {
    let config = CourseConfig {
        title:                course.name.clone(),
        language:             course.language.clone(),
        summary:              course.description.clone(),
        programming_language: course.programming_language.clone(),
        content:              course.items.iter().map(|i| i.name().to_string()).collect(),
    };
    Ok(serde_yaml::to_string(&config)?)
}

/// Writes the config of `task`.
///
/// Offsets and lengths are given in the author's text, where every placeholder
/// holds its possible answer.
pub fn write_task(task: &Task) -> Result<String, FormatError> {
    let task_files = task
        .task_files
        .iter()
        .map(|file| TaskFileConfig {
            name:         file.name.clone(),
            visible:      file.is_visible,
            placeholders: author_view(&file.placeholders),
        })
        .collect();

    let feedback_link = match task.feedback_link.kind {
        FeedbackLinkType::Custom => task.feedback_link.link.clone(),
        _ => None,
    };

    let config = TaskConfig {
        kind: task.kind,
        task_files,
        feedback_link,
    };
    Ok(serde_yaml::to_string(&config)?)
}

/// Placeholder configs with offsets moved back into the author's text.
fn author_view(placeholders: &[AnswerPlaceholder]) -> Vec<PlaceholderConfig> {
    let mut order: Vec<usize> = (0..placeholders.len()).collect();
    order.sort_by_key(|&i| placeholders[i].offset);

    let mut offsets = vec![0; placeholders.len()];
    let mut shift: isize = 0;
    for i in order {
        let p = &placeholders[i];
        offsets[i] = p.offset.saturating_add_signed(shift);
        shift += p.possible_answer.chars().count() as isize - p.length as isize;
    }

    placeholders
        .iter()
        .zip(offsets)
        .map(|(p, offset)| PlaceholderConfig {
            offset,
            length: p.possible_answer.chars().count(),
            placeholder_text: p.placeholder_text.clone(),
            dependency: p.dependency.clone(),
        })
        .collect()
}
