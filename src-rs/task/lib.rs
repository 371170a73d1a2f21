pub mod service;
pub mod store;
pub mod types;

pub use service::TaskService;
pub use store::{TaskRepository, TaskStore};
pub use types::{NewTask, Patch, Task, TaskPatch, TaskStatus, UserId};
