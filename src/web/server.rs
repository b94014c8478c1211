//! HTTP server implementation.
//!
//! Serves the index page (rendered once per store generation and kept in the
//! [`PageCache`]) and a JSON API mapping one-to-one onto the gateway
//! operations.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::templates;
use crate::cache::PageCache;
use crate::error::{ErrorCode, TaskError};
use crate::gateway::TaskGateway;
use crate::types::{Filter, NewTask, Task, TaskEdit};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct WebState {
    gateway: Arc<dyn TaskGateway>,
    cache: Arc<PageCache>,
}

impl WebState {
    /// `cache` should be the invalidator the gateway reports writes to.
    pub fn new(gateway: Arc<dyn TaskGateway>, cache: Arc<PageCache>) -> Self {
        Self { gateway, cache }
    }

    pub fn gateway(&self) -> &Arc<dyn TaskGateway> {
        &self.gateway
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let status = match self.code {
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::WriteFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(self)).into_response()
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Query parameters for the task list.
#[derive(Debug, serde::Deserialize)]
struct TaskListParams {
    filter: Option<String>,
}

/// Index page, served from cache when the store has not changed since the
/// last render.
async fn index(State(state): State<WebState>) -> Result<Html<String>, TaskError> {
    if let Some(page) = state.cache().get() {
        debug!("Serving cached index page");
        return Ok(Html(page));
    }

    let generation = state.cache().generation();
    let tasks = state.gateway().list().await?;
    let page = render_index(&tasks);
    if !state.cache().store(generation, page.clone()) {
        debug!("Index page went stale while rendering; not cached");
    }
    Ok(Html(page))
}

/// List tasks, optionally filtered.
async fn list_tasks(
    State(state): State<WebState>,
    Query(params): Query<TaskListParams>,
) -> Result<Json<Vec<Task>>, TaskError> {
    let filter: Filter = params
        .filter
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|reason: String| {
            TaskError::new(ErrorCode::InvalidInput, reason).with_field("filter")
        })?;

    let tasks = state.gateway().list().await?;
    Ok(Json(tasks.into_iter().filter(|t| filter.matches(t)).collect()))
}

async fn create_task(
    State(state): State<WebState>,
    Json(input): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), TaskError> {
    let task = state.gateway().create(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn toggle_task(
    State(state): State<WebState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, TaskError> {
    let task = state.gateway().toggle_completion(id).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<WebState>,
    Path(id): Path<i64>,
    Json(edit): Json<TaskEdit>,
) -> Result<Json<Task>, TaskError> {
    let task = state.gateway().update(id, edit).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<WebState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, TaskError> {
    state.gateway().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Escape text for HTML element content and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Serialize tasks for embedding in a `<script type="application/json">` block.
fn tasks_json_for_script(tasks: &[Task]) -> String {
    // `<` only occurs inside JSON strings, where \u003c is equivalent
    serde_json::to_string(tasks)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c")
}

fn render_task_item(task: &Task) -> String {
    let class = if task.completed { "task done" } else { "task" };
    let description = match task.description.as_deref() {
        Some(d) if !d.is_empty() => format!(r#"<p class="task-desc">{}</p>"#, html_escape(d)),
        _ => String::new(),
    };
    format!(
        r#"<li class="{class}" data-id="{id}"><h3 class="task-title">{title}</h3>{description}</li>"#,
        class = class,
        id = task.id,
        title = html_escape(&task.title),
        description = description,
    )
}

/// Render the index page with the task list inlined.
pub fn render_index(tasks: &[Task]) -> String {
    let items: String = if tasks.is_empty() {
        r#"<li class="empty-state">No tasks found</li>"#.to_string()
    } else {
        tasks.iter().map(render_task_item).collect()
    };

    // Fill both placeholders from the template text only, so task content
    // that spells a placeholder is never substituted.
    let json = tasks_json_for_script(tasks);
    templates::INDEX_TEMPLATE
        .split("{{TASK_ITEMS}}")
        .map(|part| part.replace("{{INITIAL_TASKS}}", &json))
        .collect::<Vec<_>>()
        .join(items.as_str())
}

/// Build the application router.
pub fn build_router(state: WebState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", axum::routing::put(update_task).delete(delete_task))
        .route("/api/tasks/{id}/toggle", post(toggle_task))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::error!("Server task failed: {}", e);
        }
    }
}

/// Bind `addr` and serve the router in a background task.
pub async fn start_server(state: WebState, addr: &str) -> anyhow::Result<ServerHandle> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task list available at http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
