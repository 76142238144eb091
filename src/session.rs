//! Optimistic mutation coordination for one open list.
//!
//! A [`Session`] owns the in-memory replica of a list and gives every
//! mutating action the same transaction shape: snapshot the task set, apply
//! the change locally, issue the request, then either fold the authoritative
//! response back in (refreshing the snapshot cache) or restore the snapshot
//! and hand the error to the caller for surfacing. The remote store is
//! authoritative throughout; the replica exists so the UI can render the
//! change before the round-trip completes.

use tracing::warn;

use crate::api::{
    with_retry, ApiError, ApiResult, Remote, TaskPatch, FETCH_ATTEMPTS, FETCH_BASE_DELAY,
};
use crate::bridge::{NotificationSink, TaskAction};
use crate::fields::Status;
use crate::ordering;
use crate::state::ClientState;
use crate::task::{Comment, ListSnapshot, Task, TaskList, DEFAULT_PRIORITY};

/// Outcome of a gated mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gated {
    /// The mutation ran (and succeeded, since errors return `Err`).
    Done,
    /// No actor name is recorded; the action is parked until
    /// [`Session::resume_with_name`] supplies one.
    NeedsName,
}

/// A mutation suspended by the attribution gate. One slot only: a second
/// gated action overwrites the first.
#[derive(Debug, Clone)]
pub enum PendingAction {
    SetStatus { task_id: String, status: Status },
    SetCompleted { task_id: String, completed: bool },
    SetProgress { task_id: String, percent: u8 },
}

pub struct Session {
    list_id: String,
    pub list: TaskList,
    pub tasks: Vec<Task>,
    remote: Box<dyn Remote>,
    state: ClientState,
    sink: Box<dyn NotificationSink>,
    user_name: String,
    pending: Option<PendingAction>,
}

impl Session {
    /// Open a list: serve the cached snapshot when it is fresh (unless
    /// `force_refresh`), otherwise fetch with bounded backoff. Successful
    /// loads are recorded in the recently-opened history.
    pub fn open(
        list_id: &str,
        remote: Box<dyn Remote>,
        state: ClientState,
        sink: Box<dyn NotificationSink>,
        force_refresh: bool,
    ) -> ApiResult<Self> {
        let cached = if force_refresh {
            None
        } else {
            state.fresh_snapshot(list_id)
        };
        let snapshot = match cached {
            Some(snapshot) => snapshot,
            None => {
                let fetched = with_retry(
                    || remote.fetch_list(list_id),
                    FETCH_ATTEMPTS,
                    FETCH_BASE_DELAY,
                );
                match fetched {
                    Ok(snapshot) => {
                        let snapshot = snapshot.normalise();
                        state.store_snapshot(list_id, &snapshot);
                        snapshot
                    }
                    Err(err) => {
                        if matches!(err, ApiError::NotFound) {
                            state.evict_snapshot(list_id);
                        }
                        return Err(err);
                    }
                }
            }
        };
        state.touch_history(list_id, &snapshot.task_list.title);
        let user_name = state.user_name();
        Ok(Session {
            list_id: list_id.to_string(),
            list: snapshot.task_list,
            tasks: snapshot.tasks,
            remote,
            state,
            sink,
            user_name,
            pending: None,
        })
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Forced re-fetch, bypassing the freshness window.
    pub fn refresh(&mut self) -> ApiResult<()> {
        let snapshot = with_retry(
            || self.remote.fetch_list(&self.list_id),
            FETCH_ATTEMPTS,
            FETCH_BASE_DELAY,
        )?
        .normalise();
        self.state.store_snapshot(&self.list_id, &snapshot);
        self.list = snapshot.task_list;
        self.tasks = snapshot.tasks;
        Ok(())
    }

    // --- gated mutations --------------------------------------------------

    /// Change a task's status, attributing the change to the recorded actor.
    pub fn set_status(&mut self, task_id: &str, status: Status) -> ApiResult<Gated> {
        if self.user_name.is_empty() {
            self.park(PendingAction::SetStatus {
                task_id: task_id.to_string(),
                status,
            });
            return Ok(Gated::NeedsName);
        }
        self.apply_status(task_id, status).map(|_| Gated::Done)
    }

    /// Toggle completion. Completing forces progress to 100 in the same
    /// request; un-completing leaves progress untouched.
    pub fn set_completed(&mut self, task_id: &str, completed: bool) -> ApiResult<Gated> {
        if self.user_name.is_empty() {
            self.park(PendingAction::SetCompleted {
                task_id: task_id.to_string(),
                completed,
            });
            return Ok(Gated::NeedsName);
        }
        self.apply_completed(task_id, completed).map(|_| Gated::Done)
    }

    /// Commit a progress value. Debouncing of rapid slider movement is the
    /// input layer's concern; this receives only settled values.
    pub fn set_progress(&mut self, task_id: &str, percent: u8) -> ApiResult<Gated> {
        if self.user_name.is_empty() {
            self.park(PendingAction::SetProgress {
                task_id: task_id.to_string(),
                percent,
            });
            return Ok(Gated::NeedsName);
        }
        self.apply_progress(task_id, percent).map(|_| Gated::Done)
    }

    /// Record the actor name and replay the parked action, if any.
    pub fn resume_with_name(&mut self, name: &str) -> ApiResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("name must not be empty".into()));
        }
        self.user_name = name.to_string();
        if let Err(err) = self.state.set_user_name(name) {
            warn!(error = %err, "failed to persist user name");
        }
        match self.pending.take() {
            None => Ok(()),
            Some(PendingAction::SetStatus { task_id, status }) => {
                self.apply_status(&task_id, status)
            }
            Some(PendingAction::SetCompleted { task_id, completed }) => {
                self.apply_completed(&task_id, completed)
            }
            Some(PendingAction::SetProgress { task_id, percent }) => {
                self.apply_progress(&task_id, percent)
            }
        }
    }

    fn park(&mut self, action: PendingAction) {
        if let Some(dropped) = self.pending.replace(action) {
            warn!(?dropped, "pending action overwritten before a name was supplied");
        }
    }

    fn apply_status(&mut self, task_id: &str, status: Status) -> ApiResult<()> {
        let name = self.user_name.clone();
        let snapshot = self.tasks.clone();
        self.tasks = ordering::move_across_status(&self.tasks, task_id, status);
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.assigned_to = name.clone();
        }
        let patch = TaskPatch {
            status: Some(status),
            assigned_to: Some(name),
            ..TaskPatch::default()
        };
        self.commit_patch(task_id, snapshot, &patch)
    }

    fn apply_completed(&mut self, task_id: &str, completed: bool) -> ApiResult<()> {
        let name = self.user_name.clone();
        let snapshot = self.tasks.clone();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.completed = completed;
            if completed {
                task.progress_percentage = 100;
            }
            task.assigned_to = name.clone();
        }
        let patch = TaskPatch {
            completed: Some(completed),
            progress_percentage: completed.then_some(100),
            assigned_to: Some(name),
            ..TaskPatch::default()
        };
        self.commit_patch(task_id, snapshot, &patch)
    }

    fn apply_progress(&mut self, task_id: &str, percent: u8) -> ApiResult<()> {
        let name = self.user_name.clone();
        let percent = percent.min(100);
        let snapshot = self.tasks.clone();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.progress_percentage = percent;
            task.assigned_to = name.clone();
        }
        let patch = TaskPatch {
            progress_percentage: Some(percent),
            assigned_to: Some(name),
            ..TaskPatch::default()
        };
        self.commit_patch(task_id, snapshot, &patch)
    }

    // --- ungated mutations ------------------------------------------------

    /// Overwrite the assignee with an explicit name.
    pub fn set_assignee(&mut self, task_id: &str, assignee: &str) -> ApiResult<()> {
        let snapshot = self.tasks.clone();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.assigned_to = assignee.to_string();
        }
        let patch = TaskPatch {
            assigned_to: Some(assignee.to_string()),
            ..TaskPatch::default()
        };
        self.commit_patch(task_id, snapshot, &patch)
    }

    pub fn set_priority(&mut self, task_id: &str, priority: f64) -> ApiResult<()> {
        let snapshot = self.tasks.clone();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.priority = Some(priority);
        }
        let patch = TaskPatch {
            priority: Some(priority),
            ..TaskPatch::default()
        };
        self.commit_patch(task_id, snapshot, &patch)
    }

    /// Edit title/description. Relayed to the notification host on success.
    pub fn edit_task(
        &mut self,
        task_id: &str,
        title: &str,
        description: &str,
    ) -> ApiResult<()> {
        let snapshot = self.tasks.clone();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.title = title.to_string();
            task.description = if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            };
        }
        let patch = TaskPatch {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            ..TaskPatch::default()
        };
        self.commit_patch(task_id, snapshot, &patch)?;
        self.sink.notify(task_id, TaskAction::Updated);
        Ok(())
    }

    /// Create a task. Ids and positions are server-assigned, so the record is
    /// appended from the response rather than applied optimistically.
    pub fn add_task(
        &mut self,
        title: &str,
        description: &str,
        priority: Option<f64>,
    ) -> ApiResult<Task> {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("task title must not be empty".into()));
        }
        let mut task = self
            .remote
            .create_task(&self.list_id, title, description, priority)?;
        if task.priority.is_none() {
            task.priority = Some(DEFAULT_PRIORITY);
        }
        self.tasks.push(task.clone());
        self.refresh_cache();
        self.sink.notify(&task.id, TaskAction::Created);
        Ok(task)
    }

    pub fn delete_task(&mut self, task_id: &str) -> ApiResult<()> {
        let snapshot = self.tasks.clone();
        self.tasks.retain(|t| t.id != task_id);
        match self.remote.delete_task(&self.list_id, task_id) {
            Ok(()) => {
                self.refresh_cache();
                self.sink.notify(task_id, TaskAction::Deleted);
                Ok(())
            }
            Err(err) => {
                self.tasks = snapshot;
                Err(err)
            }
        }
    }

    /// Update list title/description.
    pub fn update_list(&mut self, title: &str, description: &str) -> ApiResult<()> {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("list title must not be empty".into()));
        }
        let snapshot = self.list.clone();
        self.list.title = title.to_string();
        self.list.description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
        match self.remote.update_list(&self.list_id, title, description) {
            Ok(authoritative) => {
                self.list = authoritative;
                self.refresh_cache();
                Ok(())
            }
            Err(err) => {
                self.list = snapshot;
                Err(err)
            }
        }
    }

    /// Drag-and-drop reorder within one status column: the whole reordered
    /// set is applied optimistically, then a single batched request carries
    /// every `{id, position}` pair. The batch rolls back atomically on
    /// failure; items the server individually skipped are simply not folded.
    pub fn reorder(&mut self, status: Status, from: usize, to: usize) -> ApiResult<()> {
        let snapshot = self.tasks.clone();
        self.tasks = ordering::reorder_within_status(&self.tasks, status, from, to);
        let payload = ordering::reorder_payload(&self.tasks);
        match self.remote.reorder(&self.list_id, &payload) {
            Ok(updated) => {
                for task in updated {
                    self.fold_task(task);
                }
                self.refresh_cache();
                Ok(())
            }
            Err(err) => {
                self.tasks = snapshot;
                Err(err)
            }
        }
    }

    // --- comments ---------------------------------------------------------

    pub fn comments(&self, task_id: &str) -> ApiResult<Vec<Comment>> {
        self.remote.comments(task_id)
    }

    /// Append a comment. The service substitutes "anonymous" when no name is
    /// recorded.
    pub fn add_comment(&self, task_id: &str, content: &str) -> ApiResult<Comment> {
        if content.trim().is_empty() {
            return Err(ApiError::Validation("comment must not be empty".into()));
        }
        let name = (!self.user_name.is_empty()).then_some(self.user_name.as_str());
        self.remote.add_comment(task_id, content, name)
    }

    // --- internals --------------------------------------------------------

    /// Send a patch for a task already mutated locally; reconcile or roll
    /// back to `snapshot`.
    fn commit_patch(
        &mut self,
        task_id: &str,
        snapshot: Vec<Task>,
        patch: &TaskPatch,
    ) -> ApiResult<()> {
        match self.remote.update_task(&self.list_id, task_id, patch) {
            Ok(authoritative) => {
                self.fold_task(authoritative);
                self.refresh_cache();
                Ok(())
            }
            Err(err) => {
                self.tasks = snapshot;
                Err(err)
            }
        }
    }

    /// Replace the local record with the server's, which is the source of
    /// truth for `updatedAt` and any coerced defaults.
    fn fold_task(&mut self, mut authoritative: Task) {
        if authoritative.priority.is_none() {
            authoritative.priority = Some(DEFAULT_PRIORITY);
        }
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == authoritative.id) {
            *slot = authoritative;
        }
    }

    fn refresh_cache(&self) {
        let snapshot = ListSnapshot {
            task_list: self.list.clone(),
            tasks: self.tasks.clone(),
        };
        self.state.store_snapshot(&self.list_id, &snapshot);
    }
}
