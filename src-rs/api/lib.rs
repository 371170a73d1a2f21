pub use crate::auth::{CurrentUser, UserStore};
pub use crate::config::ServerConfig;
pub use crate::error::ApiError;
pub use crate::task::{Task, TaskService, TaskStore};

pub mod handlers;
pub mod server;

pub use server::{build_router, serve, AppState, TaskServer};
