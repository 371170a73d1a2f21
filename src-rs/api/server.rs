use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    handle_create_task, handle_delete_task, handle_get_task, handle_health, handle_list_tasks,
    handle_login, handle_logout, handle_profile, handle_signup, handle_update_task,
};
use crate::auth::UserStore;
use crate::config::ServerConfig;
use crate::error::StoreError;
use crate::task::{TaskRepository, TaskService, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub users: Arc<UserStore>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TaskRepository>, users: Arc<UserStore>) -> Self {
        Self {
            tasks: TaskService::new(repo),
            users,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(TaskStore::in_memory()), Arc::new(UserStore::in_memory()))
    }

    pub fn from_config(cfg: &ServerConfig) -> Result<Self, StoreError> {
        match (cfg.tasks_path(), cfg.users_path()) {
            (Some(tasks), Some(users)) => Ok(Self::new(
                Arc::new(TaskStore::open(tasks)?),
                Arc::new(UserStore::open(users)?),
            )),
            _ => Ok(Self::in_memory()),
        }
    }
}

impl FromRef<AppState> for Arc<UserStore> {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/auth/signup", post(handle_signup))
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/logout", post(handle_logout))
        .route("/api/auth/profile", get(handle_profile))
        .route("/api/tasks", get(handle_list_tasks).post(handle_create_task))
        .route(
            "/api/tasks/:id",
            get(handle_get_task)
                .put(handle_update_task)
                .delete(handle_delete_task),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub struct TaskServer {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl TaskServer {
    pub fn new(cfg: &ServerConfig) -> Result<Self, StoreError> {
        Ok(Self {
            addr: cfg.addr(),
            state: AppState::from_config(cfg)?,
        })
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr)?;
        serve(listener, self.state.clone()).await
    }
}

/// Serves the API on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "task tracker listening");
    axum::Server::from_tcp(listener)?
        .serve(build_router(state).into_make_service())
        .await?;
    Ok(())
}
