//! Language-specific directories that task and test files live under.

/// Directories task and test files are placed in for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRoots {
    /// Directory of student files.
    pub task_files_root: &'static str,
    /// Directory of test files.
    pub test_files_root: &'static str,
}

impl TaskRoots {
    /// `name` placed under the task files root.
    pub fn task_file(&self, name: &str) -> String {
        prefixed(self.task_files_root, name)
    }

    /// `name` placed under the test files root.
    pub fn test_file(&self, name: &str) -> String {
        prefixed(self.test_files_root, name)
    }
}

/// Joins `root` and `name`.
fn prefixed(root: &str, name: &str) -> String {
    format!("{root}/{name}")
}

/// Gradle-style layout shared by the JVM languages.
const GRADLE: TaskRoots = TaskRoots {
    task_files_root: "src",
    test_files_root: "test",
};

/// Android module layout.
const ANDROID: TaskRoots = TaskRoots {
    task_files_root: "src/main",
    test_files_root: "src/test",
};

/// Task roots of `language`, or `None` when files stay in the task directory.
pub fn task_roots(language: &str) -> Option<TaskRoots> {
    match language.to_ascii_lowercase().as_str() {
        "java" | "kotlin" | "scala" => Some(GRADLE),
        "android" => Some(ANDROID),
        _ => None,
    }
}
