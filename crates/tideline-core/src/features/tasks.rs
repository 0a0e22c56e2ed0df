use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use tideline_shared::{Task, TaskCreate, TaskPatch, TaskPriority, TaskQuery};
use tracing::{debug, instrument, warn};

use crate::api;
use crate::error::ApiError;
use crate::http::{ApiClient, Transport};
use crate::optimistic::{Outcome, ViewState};
use crate::sequence::QuerySequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TaskTab {
    /// Everything not archived, open tasks first.
    #[default]
    Active,
    Completed,
    Archived,
}

impl TaskTab {
    pub fn query(self) -> TaskQuery {
        match self {
            TaskTab::Active => TaskQuery {
                archived: Some(false),
                ..TaskQuery::default()
            },
            TaskTab::Completed => TaskQuery {
                complete: Some(true),
                archived: Some(false),
                ..TaskQuery::default()
            },
            TaskTab::Archived => TaskQuery {
                archived: Some(true),
                ..TaskQuery::default()
            },
        }
    }
}

/// Narrows whichever tab is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn query(&self, tab: TaskTab) -> TaskQuery {
        TaskQuery {
            priority: self.priority,
            search: self.search.clone(),
            ..tab.query()
        }
    }
}

pub struct TaskBoard<T> {
    client: ApiClient<T>,
    view: ViewState<Task>,
    sequence: QuerySequence,
    tab: Mutex<TaskTab>,
    filter: Mutex<TaskFilter>,
}

impl<T: Transport> TaskBoard<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self {
            client,
            view: ViewState::new(),
            sequence: QuerySequence::new(),
            tab: Mutex::new(TaskTab::default()),
            filter: Mutex::new(TaskFilter::default()),
        }
    }

    pub fn view(&self) -> &ViewState<Task> {
        &self.view
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.view.items()
    }

    pub fn tab(&self) -> TaskTab {
        *self.tab.lock()
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter.lock().clone()
    }

    pub fn set_filter(&self, filter: TaskFilter) {
        *self.filter.lock() = filter;
    }

    /// Swaps the filter and reloads the current tab.
    #[instrument(skip(self))]
    pub async fn apply_filter(&self, filter: TaskFilter) -> Result<bool, ApiError> {
        self.set_filter(filter);
        self.refresh(self.tab()).await
    }

    /// Loads `tab` under the current filter. Returns false when a newer refresh was issued while this
    /// one was in flight; its result is then thrown away.
    #[instrument(skip(self))]
    pub async fn refresh(&self, tab: TaskTab) -> Result<bool, ApiError> {
        *self.tab.lock() = tab;
        let query = self.filter().query(tab);
        let ticket = self.sequence.begin();

        match api::tasks::list(&self.client, query).await {
            Ok(tasks) => match self.sequence.accept(ticket, tasks) {
                Some(tasks) => {
                    debug!(count = tasks.len(), "tasks loaded");
                    self.view.replace_all(order_for_view(tasks));
                    self.view.clear_error();
                    Ok(true)
                }
                None => Ok(false),
            },
            Err(err) => {
                if self.sequence.is_latest(ticket) {
                    self.view.report(&err, "Failed to load tasks");
                }
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_complete(&self, id: i64) -> Result<Outcome, ApiError> {
        let client = &self.client;
        self.view
            .mutate(
                id,
                |task| predict_toggle(task, &now_iso()),
                |task| {
                    let was_complete = task.is_complete;
                    async move {
                        if was_complete {
                            api::tasks::uncomplete(client, id).await
                        } else {
                            api::tasks::complete(client, id).await
                        }
                    }
                },
                || api::tasks::get(client, id),
                "Failed to toggle task",
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: i64, title: &str) -> Result<Outcome, ApiError> {
        let wanted = TaskPatch {
            title: Some(title.to_string()),
            ..TaskPatch::default()
        };
        self.patch(id, wanted, "Failed to rename task").await
    }

    /// PATCHes the fields of `wanted` that differ from the loaded task, then
    /// rereads it. Blank titles are dropped.
    #[instrument(skip(self, wanted))]
    pub async fn edit(&self, id: i64, wanted: TaskPatch) -> Result<Outcome, ApiError> {
        self.patch(id, wanted, "Failed to update task").await
    }

    async fn patch(&self, id: i64, wanted: TaskPatch, failure_message: &str) -> Result<Outcome, ApiError> {
        let Some(current) = self.view.get(id) else {
            return Ok(Outcome::NotLoaded);
        };
        let patch = changed_fields(&current, wanted);
        if patch == TaskPatch::default() {
            return Ok(Outcome::Unchanged);
        }

        let client = &self.client;
        let predicted = apply_patch(&current, &patch);
        self.view
            .mutate(
                id,
                |_| predicted,
                |_| async move { api::tasks::update(client, id, &patch).await.map(|_| ()) },
                || api::tasks::get(client, id),
                failure_message,
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn archive(&self, id: i64) -> Result<Outcome, ApiError> {
        let Some(_guard) = self.view.busy().try_acquire(id) else {
            return Ok(Outcome::Busy);
        };
        match api::tasks::archive(&self.client, id).await {
            Ok(()) => {
                if self.tab() != TaskTab::Archived {
                    self.view.remove(id);
                }
                Ok(Outcome::Applied)
            }
            Err(err) => {
                self.view.report(&err, "Failed to archive task");
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<Outcome, ApiError> {
        let Some(_guard) = self.view.busy().try_acquire(id) else {
            return Ok(Outcome::Busy);
        };
        match api::tasks::delete(&self.client, id).await {
            Ok(()) => {
                self.view.remove(id);
                Ok(Outcome::Applied)
            }
            Err(err) => {
                self.view.report(&err, "Failed to delete task");
                Err(err)
            }
        }
    }

    /// Creates a task and reloads the current tab. Blank titles are ignored.
    /// A failed reload is left on the view; the task still exists.
    #[instrument(skip(self, create), fields(title_len = create.title.len()))]
    pub async fn create(&self, create: TaskCreate) -> Result<Outcome, ApiError> {
        if create.title.trim().is_empty() {
            return Ok(Outcome::Unchanged);
        }
        if let Err(err) = api::tasks::create(&self.client, &create).await {
            self.view.report(&err, "Could not create task");
            return Err(err);
        }
        if let Err(err) = self.refresh(self.tab()).await {
            warn!(error = %err, "task created but the list did not reload");
        }
        Ok(Outcome::Applied)
    }
}

/// Open tasks before completed ones, each group by ascending priority value.
fn order_for_view(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| (task.is_complete, task.priority));
    tasks
}

fn changed_fields(current: &Task, wanted: TaskPatch) -> TaskPatch {
    TaskPatch {
        title: wanted
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty() && *title != current.title),
        description: wanted
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| current.description.as_deref().unwrap_or_default() != text.as_str()),
        priority: wanted.priority.filter(|priority| *priority != current.priority),
        due_date: wanted
            .due_date
            .map(|due| due.trim().to_string())
            .filter(|due| !due.is_empty() && !same_day(current.due_date.as_deref(), due)),
    }
}

/// The backend stores full timestamps; the CLI speaks in days.
fn same_day(stored: Option<&str>, wanted: &str) -> bool {
    stored.is_some_and(|stored| stored == wanted || stored.get(..10) == Some(wanted))
}

fn apply_patch(task: &Task, patch: &TaskPatch) -> Task {
    Task {
        title: patch.title.clone().unwrap_or_else(|| task.title.clone()),
        description: patch.description.clone().or_else(|| task.description.clone()),
        priority: patch.priority.unwrap_or(task.priority),
        due_date: patch.due_date.clone().or_else(|| task.due_date.clone()),
        ..task.clone()
    }
}

fn predict_toggle(task: &Task, now: &str) -> Task {
    let is_complete = !task.is_complete;
    Task {
        is_complete,
        completed_at: is_complete.then(|| now.to_string()),
        ..task.clone()
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use tideline_shared::TaskPriority;

    use super::*;

    fn task(id: i64, is_complete: bool, priority: TaskPriority) -> Task {
        Task {
            id,
            user_id: None,
            title: format!("task {id}"),
            description: None,
            is_complete,
            is_archived: false,
            priority,
            due_date: None,
            completed_at: None,
            archived_at: None,
            tags: vec![],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn tabs_map_to_backend_filters() {
        assert_eq!(TaskTab::Active.query().to_query_string(), "?archived=false");
        assert_eq!(
            TaskTab::Completed.query().to_query_string(),
            "?complete=true&archived=false"
        );
        assert_eq!(TaskTab::Archived.query().to_query_string(), "?archived=true");
    }

    #[test]
    fn filter_narrows_the_tab() {
        let filter = TaskFilter {
            priority: Some(TaskPriority::Low),
            search: Some("gym bag".to_string()),
        };
        assert_eq!(
            filter.query(TaskTab::Completed).to_query_string(),
            "?complete=true&archived=false&priority=1&search=gym%20bag"
        );
    }

    #[test]
    fn only_changed_fields_are_patched() {
        let mut current = task(1, false, TaskPriority::Medium);
        current.description = Some("old".to_string());
        current.due_date = Some("2026-10-20T00:00:00.000Z".to_string());

        let patch = changed_fields(
            &current,
            TaskPatch {
                title: Some(" task 1 ".to_string()),
                description: Some("new".to_string()),
                priority: Some(TaskPriority::Medium),
                due_date: Some("2026-10-20".to_string()),
            },
        );
        assert_eq!(
            patch,
            TaskPatch {
                description: Some("new".to_string()),
                ..TaskPatch::default()
            }
        );

        let predicted = apply_patch(&current, &patch);
        assert_eq!(predicted.description.as_deref(), Some("new"));
        assert_eq!(predicted.title, "task 1");
    }

    #[test]
    fn open_tasks_sort_before_completed_ones() {
        let ordered = order_for_view(vec![
            task(1, true, TaskPriority::Low),
            task(2, false, TaskPriority::High),
            task(3, false, TaskPriority::Low),
        ]);
        let ids: Vec<i64> = ordered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn predicted_toggle_stamps_completion_time() {
        let done = predict_toggle(&task(1, false, TaskPriority::Medium), "2026-10-19T12:00:00.000Z");
        assert!(done.is_complete);
        assert_eq!(done.completed_at.as_deref(), Some("2026-10-19T12:00:00.000Z"));

        let reopened = predict_toggle(&done, "ignored");
        assert!(!reopened.is_complete);
        assert_eq!(reopened.completed_at, None);
    }
}
