pub mod config;
pub mod error;
pub mod persist;

#[path = "task/lib.rs"]
pub mod task;
#[path = "auth/lib.rs"]
pub mod auth;
#[path = "api/lib.rs"]
pub mod api;

pub use api::{build_router, serve, AppState, TaskServer};
pub use config::ServerConfig;
pub use error::{ApiError, StoreError};
