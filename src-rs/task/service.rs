use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::store::TaskRepository;
use super::types::{NewTask, Task, TaskPatch, UserId};
use crate::error::ApiError;

/// Owner-scoped CRUD over a [`TaskRepository`]. Callers are already
/// authenticated; every operation only ever sees the caller's records, and
/// a record owned by someone else looks exactly like a missing one.
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub fn create(&self, caller: &UserId, new: NewTask) -> Result<Task, ApiError> {
        let now = Utc::now();
        let task = Task {
            id: next_id(),
            owner: caller.clone(),
            title: new.title,
            description: new.description,
            status: new.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        let task = self.repo.insert(task)?;
        tracing::debug!(owner = %caller, id = %task.id, "task created");
        Ok(task)
    }

    pub fn list(&self, caller: &UserId) -> Result<Vec<Task>, ApiError> {
        let tasks = self.repo.find(caller)?;
        tracing::debug!(owner = %caller, count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    pub fn get_one(&self, caller: &UserId, id: &str) -> Result<Task, ApiError> {
        self.repo.find_one(id, caller)?.ok_or(ApiError::NotFound)
    }

    pub fn update(&self, caller: &UserId, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let task = self
            .repo
            .find_one_and_update(id, caller, patch)?
            .ok_or(ApiError::NotFound)?;
        tracing::debug!(owner = %caller, id, "task updated");
        Ok(task)
    }

    pub fn delete(&self, caller: &UserId, id: &str) -> Result<Task, ApiError> {
        let task = self
            .repo
            .find_one_and_delete(id, caller)?
            .ok_or(ApiError::NotFound)?;
        tracing::debug!(owner = %caller, id, "task deleted");
        Ok(task)
    }
}

fn next_id() -> String {
    format!("task_{}", Uuid::new_v4().simple())
}
