#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use super::{ValidationError, placeholder::AnswerPlaceholder, status::CheckStatus};

/// A student-facing file of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFile {
    /// Path of the file relative to the task directory.
    #[serde(default)]
    pub name:         String,
    /// File contents.
    #[serde(default)]
    pub text:         String,
    /// Placeholders in document order.
    #[serde(default)]
    pub placeholders: Vec<AnswerPlaceholder>,
    /// Whether the file is shown in the project view.
    #[serde(default = "visible_by_default")]
    pub is_visible:   bool,
}

/// Task files are visible unless marked otherwise.
fn visible_by_default() -> bool {
    true
}

impl TaskFile {
    /// Creates a visible file without placeholders.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name:         name.into(),
            text:         text.into(),
            placeholders: Vec::new(),
            is_visible:   true,
        }
    }

    /// Number of characters in the file text; placeholder offsets count these.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Sets the status of every placeholder in the file.
    pub fn set_status(&mut self, status: CheckStatus) {
        for placeholder in &mut self.placeholders {
            placeholder.status = status;
        }
    }

    /// Reports every placeholder whose span does not fit into the text.
    pub fn validate(&self) -> Vec<ValidationError> {
        let text_len = self.char_len();
        self.placeholders
            .iter()
            .enumerate()
            .filter(|(_, p)| p.end_offset() > text_len)
            .map(|(index, p)| ValidationError::PlaceholderOutOfBounds {
                file: self.name.clone(),
                placeholder: index + 1,
                end: p.end_offset(),
                text_len,
            })
            .collect()
    }
}

/// Task files keyed by name, iterated in insertion order.
///
/// Serialized as a JSON object; on deserialization the object key wins over
/// the `name` stored inside the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFiles(Vec<TaskFile>);

impl TaskFiles {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no files.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts `file` under its name. Replacing an existing entry keeps its
    /// position and returns the old file.
    pub fn insert(&mut self, file: TaskFile) -> Option<TaskFile> {
        match self.0.iter_mut().find(|f| f.name == file.name) {
            Some(slot) => Some(std::mem::replace(slot, file)),
            None => {
                self.0.push(file);
                None
            }
        }
    }

    /// File named `name`.
    pub fn get(&self, name: &str) -> Option<&TaskFile> {
        self.0.iter().find(|f| f.name == name)
    }

    /// Mutable file named `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TaskFile> {
        self.0.iter_mut().find(|f| f.name == name)
    }

    /// Removes and returns the file named `name`.
    pub fn remove(&mut self, name: &str) -> Option<TaskFile> {
        let pos = self.0.iter().position(|f| f.name == name)?;
        Some(self.0.remove(pos))
    }

    /// File names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|f| f.name.as_str())
    }

    /// Files in order.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskFile> {
        self.0.iter()
    }

    /// Mutable files in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TaskFile> {
        self.0.iter_mut()
    }
}

impl FromIterator<TaskFile> for TaskFiles {
    fn from_iter<I: IntoIterator<Item = TaskFile>>(iter: I) -> Self {
        let mut files = Self::new();
        for file in iter {
            files.insert(file);
        }
        files
    }
}

impl IntoIterator for TaskFiles {
    type IntoIter = std::vec::IntoIter<TaskFile>;
    type Item = TaskFile;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TaskFiles {
    type IntoIter = std::slice::Iter<'a, TaskFile>;
    type Item = &'a TaskFile;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for TaskFiles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for file in &self.0 {
            map.serialize_entry(&file.name, file)?;
        }
        map.end()
    }
}

/// Visits a JSON object, keeping entry order.
struct TaskFilesVisitor;

impl<'de> Visitor<'de> for TaskFilesVisitor {
    type Value = TaskFiles;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of task file names to task files")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut files = TaskFiles::new();
        while let Some((name, mut file)) = access.next_entry::<String, TaskFile>()? {
            file.name = name;
            files.insert(file);
        }
        Ok(files)
    }
}

impl<'de> Deserialize<'de> for TaskFiles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TaskFilesVisitor)
    }
}
