use std::path::PathBuf;
use std::sync::RwLock;

use super::types::{Task, TaskPatch, UserId};
use crate::error::StoreError;
use crate::persist::{load_json, write_json_atomic};

/// Document collection of tasks. Every lookup takes the owner alongside the
/// id and matches both inside one call, so ownership is never checked
/// separately from the fetch.
pub trait TaskRepository: Send + Sync {
    fn insert(&self, task: Task) -> Result<Task, StoreError>;

    /// All tasks of `owner`, in insertion order.
    fn find(&self, owner: &UserId) -> Result<Vec<Task>, StoreError>;

    fn find_one(&self, id: &str, owner: &UserId) -> Result<Option<Task>, StoreError>;

    fn find_one_and_update(
        &self,
        id: &str,
        owner: &UserId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError>;

    fn find_one_and_delete(&self, id: &str, owner: &UserId) -> Result<Option<Task>, StoreError>;
}

pub struct TaskStore {
    path: Option<PathBuf>,
    tasks: RwLock<Vec<Task>>,
}

impl TaskStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tasks: RwLock::new(Vec::new()),
        }
    }

    /// Opens a store persisted at `path`, loading whatever is already there.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let tasks: Vec<Task> = load_json(&path)?.unwrap_or_default();
        tracing::info!(path = %path.display(), count = tasks.len(), "loaded task store");
        Ok(Self {
            path: Some(path),
            tasks: RwLock::new(tasks),
        })
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => write_json_atomic(path, tasks),
            None => Ok(()),
        }
    }
}

fn owned_by<'a>(id: &'a str, owner: &'a UserId) -> impl Fn(&Task) -> bool + 'a {
    move |task: &Task| task.id == id && &task.owner == owner
}

impl TaskRepository for TaskStore {
    fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| StoreError::Poisoned)?;
        tasks.push(task.clone());
        if let Err(err) = self.save(&tasks) {
            tasks.pop();
            return Err(err);
        }
        Ok(task)
    }

    fn find(&self, owner: &UserId) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tasks
            .iter()
            .filter(|task| &task.owner == owner)
            .cloned()
            .collect())
    }

    fn find_one(&self, id: &str, owner: &UserId) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tasks
            .iter()
            .position(owned_by(id, owner))
            .map(|idx| tasks[idx].clone()))
    }

    fn find_one_and_update(
        &self,
        id: &str,
        owner: &UserId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| StoreError::Poisoned)?;
        let idx = match tasks.iter().position(owned_by(id, owner)) {
            Some(idx) => idx,
            None => return Ok(None),
        };
        let previous = tasks[idx].clone();
        patch.apply(&mut tasks[idx]);
        if let Err(err) = self.save(&tasks) {
            tasks[idx] = previous;
            return Err(err);
        }
        Ok(Some(tasks[idx].clone()))
    }

    fn find_one_and_delete(&self, id: &str, owner: &UserId) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| StoreError::Poisoned)?;
        let idx = match tasks.iter().position(owned_by(id, owner)) {
            Some(idx) => idx,
            None => return Ok(None),
        };
        let removed = tasks.remove(idx);
        if let Err(err) = self.save(&tasks) {
            tasks.insert(idx, removed);
            return Err(err);
        }
        Ok(Some(removed))
    }
}
