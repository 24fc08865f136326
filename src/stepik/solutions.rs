#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Brings the student's latest Stepik submissions into a course.
//!
//! Syncing happens in three passes: ask Stepik which steps are solved and pick
//! the tasks whose local state is behind, fetch the newest submission of each
//! picked task concurrently, then apply the submissions to the course in tree
//! order and write the resulting files.

use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::Context;
use futures::{StreamExt, stream};
use tokio::{
    sync::Semaphore,
    task::{AbortHandle, JoinSet},
};
use tracing::{debug, info, warn};

use super::{
    StepikError,
    options::reply_task,
    parsers::{set_placeholders_from_tags, strip_tags},
    wrappers::Reply,
};
use crate::{
    constants::{EDU_TOOLS_COMMENT, line_comment_prefix},
    course::{CheckStatus, Course, StudyItem, Task, TaskKind, TaskLocation},
    format::JSON_FORMAT_VERSION,
};

/// Where submissions come from.
pub trait SolutionSource: Send + Sync {
    /// Whether each step is solved, `None` where nothing is known.
    fn task_statuses(
        &self,
        step_ids: &[u64],
    ) -> impl Future<Output = Result<Vec<Option<bool>>, StepikError>> + Send;

    /// Reply of the newest submission on a step with the given outcome.
    fn last_submission(
        &self,
        step_id: u64,
        is_solved: bool,
        language: &str,
    ) -> impl Future<Output = Result<Option<Reply>, StepikError>> + Send;
}

/// Where loaded solution files go.
pub trait SolutionSink {
    /// Writes the files of the task at `loc`, keyed by task file name.
    fn write_files(
        &mut self,
        course: &Course,
        loc: TaskLocation,
        files: &BTreeMap<String, String>,
    ) -> anyhow::Result<()>;
}

/// Writes solutions into a course directory laid out as
/// `[section<K>/]lesson<N>/task<M>/<file>`.
#[derive(Debug, Clone)]
pub struct FsSolutionSink {
    /// Course directory.
    root: PathBuf,
}

impl FsSolutionSink {
    /// A sink writing under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory of the task at `loc`.
    pub fn task_dir(&self, course: &Course, loc: TaskLocation) -> Option<PathBuf> {
        let lesson = course.lesson_at(loc.lesson)?;
        let task = course.task_at(loc)?;
        let mut dir = self.root.clone();
        if let Some(StudyItem::Section(section)) = course.items.get(loc.lesson.item) {
            dir.push(format!("section{}", section.index));
        }
        dir.push(format!("lesson{}", lesson.index));
        dir.push(format!("task{}", task.index));
        Some(dir)
    }

    /// Course directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SolutionSink for FsSolutionSink {
    fn write_files(
        &mut self,
        course: &Course,
        loc: TaskLocation,
        files: &BTreeMap<String, String>,
    ) -> anyhow::Result<()> {
        let dir = self
            .task_dir(course, loc)
            .context("Task location is outside the course")?;
        for (name, text) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create {}", parent.display()))?;
            }
            std::fs::write(&path, text)
                .with_context(|| format!("Could not write {}", path.display()))?;
        }
        Ok(())
    }
}

/// Files loaded for one task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskSolutions {
    /// File texts by task file name.
    pub files:        BTreeMap<String, String>,
    /// Whether the submission was written by a newer format.
    pub incompatible: bool,
}

impl TaskSolutions {
    /// Nothing to load.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A submission this build cannot read.
    pub fn incompatible() -> Self {
        Self {
            files:        BTreeMap::new(),
            incompatible: true,
        }
    }

    /// Whether there is something to write.
    pub fn has_files(&self) -> bool {
        !self.incompatible && !self.files.is_empty()
    }
}

/// Outcome of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Tasks whose files were written.
    pub updated:                    usize,
    /// Tasks whose submission could not be fetched or applied.
    pub failed:                     usize,
    /// Whether a submission needs a newer version of this tool.
    pub needs_update_notification: bool,
}

/// Loads submissions from a [`SolutionSource`] into a course.
pub struct SolutionsLoader<S> {
    /// Submission source.
    source:      Arc<S>,
    /// Submissions fetched at once.
    concurrency: usize,
    /// Fetches of the sync in flight.
    in_flight:   Mutex<Vec<AbortHandle>>,
}

impl<S: SolutionSource + 'static> SolutionsLoader<S> {
    /// A loader fetching up to `concurrency` submissions at once.
    pub fn new(source: Arc<S>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Aborts fetches left over from an earlier sync.
    pub fn cancel_unfinished(&self) {
        let handles = match self.in_flight.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles.iter().filter(|h| !h.is_finished()) {
            debug!("Cancelling an unfinished solution fetch");
            handle.abort();
        }
    }

    /// Picks the tasks whose remote state is ahead of the local one and sets
    /// their status from Stepik.
    ///
    /// Section lessons are visited before top-level lessons. Theory tasks and
    /// steps without progress are skipped. At most `concurrency` submission
    /// checks run at once.
    pub async fn tasks_to_update(&self, course: &mut Course) -> Result<Vec<TaskLocation>, StepikError> {
        let language = course.programming_language.clone();
        let mut candidates: Vec<TaskLocation> = course
            .tasks()
            .into_iter()
            .map(|(loc, _)| loc)
            .collect();
        candidates.sort_by_key(|loc| loc.lesson.nested.is_none());

        let step_ids: Vec<u64> = candidates
            .iter()
            .filter_map(|&loc| course.task_at(loc).map(|t| t.step_id))
            .collect();
        let statuses = self.source.task_statuses(&step_ids).await?;

        let checks = candidates.iter().zip(statuses).filter_map(|(&loc, solved)| {
            let task = course.task_at(loc)?;
            let solved = solved?;
            (task.kind != TaskKind::Theory).then(|| {
                let source = Arc::clone(&self.source);
                let task = task.clone();
                let language = language.clone();
                async move {
                    let to_update = is_to_update(source.as_ref(), &task, solved, &language).await;
                    (loc, solved, to_update)
                }
            })
        });
        let checked: Vec<_> = stream::iter(checks).buffered(self.concurrency).collect().await;

        let mut selected = Vec::new();
        for (loc, solved, to_update) in checked {
            if !to_update {
                continue;
            }
            if let Some(task) = course.task_at_mut(loc) {
                task.set_status(CheckStatus::from_solved(solved));
                selected.push(loc);
            }
        }
        Ok(selected)
    }

    /// Syncs every task whose remote state is ahead and writes the loaded
    /// files through `sink`.
    ///
    /// Fetches still running from an earlier call are aborted first.
    pub async fn load_solutions(
        &self,
        course: &mut Course,
        sink: &mut impl SolutionSink,
    ) -> Result<SyncReport, StepikError> {
        self.cancel_unfinished();
        let selected = self.tasks_to_update(course).await?;
        info!("Loading solutions of {} tasks", selected.len());

        let language = course.programming_language.clone();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut fetches = JoinSet::new();
        let mut handles = Vec::with_capacity(selected.len());
        for (order, &loc) in selected.iter().enumerate() {
            let Some(task) = course.task_at(loc) else {
                continue;
            };
            if task.kind == TaskKind::Theory {
                continue;
            }
            let source = Arc::clone(&self.source);
            let permits = Arc::clone(&permits);
            let step_id = task.step_id;
            let is_solved = task.status == CheckStatus::Solved;
            let language = language.clone();
            handles.push(fetches.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let reply = source.last_submission(step_id, is_solved, &language).await;
                (order, reply)
            }));
        }
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.extend(handles);
        }

        let mut replies = Vec::with_capacity(selected.len());
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok(reply) => replies.push(reply),
                Err(e) if e.is_cancelled() => debug!("Solution fetch was cancelled"),
                Err(e) => warn!("Solution fetch panicked: {e}"),
            }
        }
        replies.sort_by_key(|(order, _)| *order);

        let mut report = SyncReport::default();
        for (order, reply) in replies {
            let loc = selected[order];
            let Some(task) = course.task_at_mut(loc) else {
                continue;
            };
            let is_solved = task.status == CheckStatus::Solved;
            let solutions = match reply {
                Ok(reply) => apply_reply(task, reply, is_solved, &language),
                Err(e) => {
                    warn!("Failed to load the solution of step {}: {e}", task.step_id);
                    report.failed += 1;
                    continue;
                }
            };
            if solutions.incompatible {
                report.needs_update_notification = true;
            }
            if !solutions.has_files() {
                continue;
            }
            for (name, text) in &solutions.files {
                if let Some(file) = task.task_files.get_mut(name) {
                    file.text = text.clone();
                }
            }
            match sink.write_files(course, loc, &solutions.files) {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!("Failed to write the solution of {loc:?}: {e:#}");
                    report.failed += 1;
                }
            }
        }

        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.clear();
        }
        if report.needs_update_notification {
            warn!("Some solutions were submitted by a newer version and were not loaded");
        }
        Ok(report)
    }

    /// Fetches and applies the newest submission of a single task.
    pub async fn load_solution(
        &self,
        task: &mut Task,
        is_solved: bool,
        language: &str,
    ) -> Result<TaskSolutions, StepikError> {
        let reply = self
            .source
            .last_submission(task.step_id, is_solved, language)
            .await?;
        Ok(apply_reply(task, reply, is_solved, language))
    }
}

/// Whether the remote state of `task` is ahead of the local one.
///
/// A solved step is ahead unless the task is already solved. An unsolved step
/// is ahead when its newest wrong submission has something to load.
async fn is_to_update<S: SolutionSource>(source: &S, task: &Task, solved: bool, language: &str) -> bool {
    if solved {
        return task.status != CheckStatus::Solved;
    }
    match source.last_submission(task.step_id, false, language).await {
        Ok(Some(reply)) if task.is_to_submit_to_stepik() => reply.has_solution(),
        Ok(Some(reply)) => reply.has_code(),
        Ok(None) => false,
        Err(e) => {
            warn!("Failed to check the submissions of step {}: {e}", task.step_id);
            false
        }
    }
}

/// Applies a submission reply to `task`, returning the files to write.
pub fn apply_reply(task: &mut Task, reply: Option<Reply>, is_solved: bool, language: &str) -> TaskSolutions {
    if task.is_to_submit_to_stepik() {
        apply_edu_reply(task, reply, is_solved, language)
    } else {
        apply_code_reply(task, reply, is_solved, language)
    }
}

/// Loads an edu submission: its files and, when the submission embeds the
/// task, its placeholders.
fn apply_edu_reply(task: &mut Task, reply: Option<Reply>, is_solved: bool, language: &str) -> TaskSolutions {
    let Some(reply) = reply.filter(Reply::has_solution) else {
        task.set_status(CheckStatus::Unchecked);
        return TaskSolutions::empty();
    };
    if reply.version > JSON_FORMAT_VERSION {
        warn!(
            "The solution of step {} has format version {}, newer than {JSON_FORMAT_VERSION}",
            task.step_id, reply.version
        );
        return TaskSolutions::incompatible();
    }

    if reply.edu_task.is_none() {
        task.set_status(CheckStatus::from_solved(is_solved));
        return files_from_tags(task, &reply);
    }

    let updated = match reply_task(&reply, language) {
        Ok(Some(updated)) => updated,
        Ok(None) => return TaskSolutions::empty(),
        Err(e) => {
            warn!("Failed to read the task of step {}: {e}", task.step_id);
            return TaskSolutions::empty();
        }
    };
    task.set_status(CheckStatus::from_solved(is_solved));

    let mut files = BTreeMap::new();
    for solution in reply.solution.iter().flatten() {
        let (Some(local), Some(remote)) = (
            task.task_files.get_mut(&solution.name),
            updated.task_files.get(&solution.name),
        ) else {
            continue;
        };
        for (placeholder, from) in local.placeholders.iter_mut().zip(&remote.placeholders) {
            placeholder.hints = from.hints.clone();
            placeholder.possible_answer = from.possible_answer.clone();
            placeholder.placeholder_text = from.placeholder_text.clone();
            placeholder.status = from.status;
            placeholder.offset = from.offset;
            placeholder.length = from.length;
            placeholder.selected = from.selected;
        }
        files.insert(solution.name.clone(), strip_tags(&solution.text));
    }
    TaskSolutions { files, incompatible: false }
}

/// Loads an old submission whose answers are wrapped in placeholder tags.
fn files_from_tags(task: &mut Task, reply: &Reply) -> TaskSolutions {
    let mut files = BTreeMap::new();
    for solution in reply.solution.iter().flatten() {
        let Some(file) = task.task_files.get_mut(&solution.name) else {
            continue;
        };
        let text = match set_placeholders_from_tags(file, &solution.text) {
            Ok(()) => strip_tags(&solution.text),
            Err(e) => {
                debug!("{e}");
                solution.text.clone()
            }
        };
        files.insert(solution.name.clone(), text);
    }
    TaskSolutions { files, incompatible: false }
}

/// Loads a code challenge submission into the task's single file.
fn apply_code_reply(task: &mut Task, reply: Option<Reply>, is_solved: bool, language: &str) -> TaskSolutions {
    let Some(code) = reply.and_then(|r| r.code).filter(|c| !c.is_empty()) else {
        return TaskSolutions::empty();
    };
    let Some(name) = task.task_files.names().next().map(str::to_string) else {
        return TaskSolutions::empty();
    };
    task.set_status(CheckStatus::from_solved(is_solved));
    let marker = format!("{}{EDU_TOOLS_COMMENT}", line_comment_prefix(language));
    let mut files = BTreeMap::new();
    files.insert(name, code.replace(&marker, ""));
    TaskSolutions { files, incompatible: false }
}
