use std::panic;
use std::thread;

use crate::client::TaskApi;
use crate::error::CliError;
use crate::models::{Notice, Profile, TaskInfo};

/// Case-insensitive substring match on the title. An empty term keeps
/// everything.
pub fn filter_tasks<'a>(tasks: &'a [TaskInfo], term: &str) -> Vec<&'a TaskInfo> {
    let needle = term.to_lowercase();
    tasks
        .iter()
        .filter(|task| task.title.to_lowercase().contains(&needle))
        .collect()
}

/// The task list screen. The local collection only changes after the
/// server confirms an action.
///
/// Add, save and delete take `&mut self` and hold it until the request
/// returns, so a second submission cannot start while one is in flight.
pub struct Dashboard<A: TaskApi> {
    api: A,
    profile: Option<Profile>,
    tasks: Vec<TaskInfo>,
    search: String,
    editing: Option<String>,
    session_expired: bool,
}

impl<A: TaskApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            profile: None,
            tasks: Vec::new(),
            search: String::new(),
            editing: None,
            session_expired: false,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Set once the server rejects the stored credential.
    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    pub fn visible(&self) -> Vec<&TaskInfo> {
        filter_tasks(&self.tasks, &self.search)
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Fetches profile and tasks at the same time.
    pub fn load(&mut self) -> Option<Notice> {
        let api = &self.api;
        let (profile, tasks) = thread::scope(|scope| {
            let profile = scope.spawn(|| api.profile());
            let tasks = api.list_tasks();
            let profile = profile
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            (profile, tasks)
        });
        match (profile, tasks) {
            (Ok(profile), Ok(tasks)) => {
                tracing::debug!(count = tasks.len(), "dashboard loaded");
                self.profile = Some(profile);
                self.tasks = tasks;
                None
            }
            (Err(err), _) | (_, Err(err)) => Some(self.failure("Failed to fetch data", err)),
        }
    }

    /// Maps a task reference typed by the user, either a 1-based position
    /// in the visible list or a raw id, to an id.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let visible = self.visible();
        if let Ok(pos) = reference.parse::<usize>() {
            if pos >= 1 && pos <= visible.len() {
                return Some(visible[pos - 1].id.clone());
            }
        }
        self.tasks
            .iter()
            .find(|task| task.id == reference)
            .map(|task| task.id.clone())
    }

    pub fn add(&mut self, title: &str) -> Notice {
        let title = title.trim();
        if title.is_empty() {
            return Notice::error("Title cannot be empty");
        }
        match self.api.create_task(title) {
            Ok(task) => {
                self.tasks.push(task);
                Notice::success("Task added successfully")
            }
            Err(err) => self.failure("Failed to add task", err),
        }
    }

    /// Enters edit mode for `id` and returns the current title.
    pub fn start_edit(&mut self, id: &str) -> Result<String, Notice> {
        let task = self
            .tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| Notice::error(format!("No task with id {}", id)))?;
        self.editing = Some(task.id.clone());
        Ok(task.title.clone())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn save_edit(&mut self, title: &str) -> Notice {
        let id = match &self.editing {
            Some(id) => id.clone(),
            None => return Notice::error("Not editing a task"),
        };
        let title = title.trim();
        if title.is_empty() {
            return Notice::error("Title cannot be empty");
        }
        match self.api.update_task(&id, title) {
            Ok(updated) => {
                if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == id) {
                    *slot = updated;
                }
                self.editing = None;
                Notice::success("Task updated")
            }
            Err(err) => self.failure("Failed to update task", err),
        }
    }

    pub fn delete(&mut self, id: &str) -> Notice {
        match self.api.delete_task(id) {
            Ok(()) => {
                self.tasks.retain(|task| task.id != id);
                if self.editing.as_deref() == Some(id) {
                    self.editing = None;
                }
                Notice::success("Task deleted")
            }
            Err(err) => self.failure("Failed to delete task", err),
        }
    }

    fn failure(&mut self, action: &str, err: CliError) -> Notice {
        if err.is_unauthorized() {
            self.session_expired = true;
        }
        tracing::warn!(error = %err, "{}", action);
        Notice::error(format!("{}: {}", action, err))
    }
}
