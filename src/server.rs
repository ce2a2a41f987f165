use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Form, Json, Path, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, TodoWebError};
use crate::flash::{self, FlashMessage, FlashSigner};
use crate::todo::TodoStore;
use crate::views::{self, EditPage, IndexPage};

const TITLE_REQUIRED: &str = "Title is required.";
const TASK_NOT_FOUND: &str = "Task not found.";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TodoStore>,
    pub flash: Arc<FlashSigner>,
}

impl AppState {
    pub fn new(store: TodoStore, secret_key: &str) -> Self {
        Self {
            store: Arc::new(store),
            flash: Arc::new(FlashSigner::new(secret_key)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TodoForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl TodoForm {
    /// Trimmed `(title, description)`, or `None` when the title is blank.
    fn validated(&self) -> Option<(&str, &str)> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        Some((title, self.description.trim()))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add", post(add))
        .route("/edit/{id}", get(edit).post(update))
        .route("/toggle/{id}", post(toggle))
        .route("/delete/{id}", post(delete))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: format!(
            "{}+{}",
            env!("CARGO_PKG_VERSION"),
            env!("TODO_WEB_GIT_SHA")
        ),
    })
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let flashes = pending_flashes(&state, &headers);
    let todos = state.store.list_all().await?;
    let body = views::render(&IndexPage {
        flashes: &flashes,
        todos: &todos,
    })?;
    Ok(page_response(body, &headers))
}

async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TodoForm>,
) -> Result<Response> {
    let Some((title, description)) = form.validated() else {
        tracing::warn!("Rejected todo with empty title");
        return Ok(redirect_with_flash(
            &state,
            &headers,
            "/",
            FlashMessage::error(TITLE_REQUIRED),
        ));
    };
    state.store.create(title, description).await?;
    Ok(redirect_with_flash(
        &state,
        &headers,
        "/",
        FlashMessage::success("Task added."),
    ))
}

async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    let Some(todo) = state.store.get(id).await? else {
        tracing::warn!(todo_id = id, "Edit requested for missing todo");
        return Ok(redirect_with_flash(
            &state,
            &headers,
            "/",
            FlashMessage::error(TASK_NOT_FOUND),
        ));
    };
    let flashes = pending_flashes(&state, &headers);
    let body = views::render(&EditPage {
        flashes: &flashes,
        todo: &todo,
    })?;
    Ok(page_response(body, &headers))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Form(form): Form<TodoForm>,
) -> Result<Response> {
    let Some((title, description)) = form.validated() else {
        tracing::warn!(todo_id = id, "Rejected update with empty title");
        return Ok(redirect_with_flash(
            &state,
            &headers,
            &format!("/edit/{id}"),
            FlashMessage::error(TITLE_REQUIRED),
        ));
    };
    let message = if state.store.update(id, title, description).await? {
        FlashMessage::success("Task updated.")
    } else {
        tracing::warn!(todo_id = id, "Update requested for missing todo");
        FlashMessage::error(TASK_NOT_FOUND)
    };
    Ok(redirect_with_flash(&state, &headers, "/", message))
}

async fn toggle(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Response> {
    if !state.store.toggle(id, None).await? {
        tracing::debug!(todo_id = id, "Toggle ignored for missing todo");
    }
    Ok(Redirect::to("/").into_response())
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response> {
    if !state.store.delete(id).await? {
        tracing::debug!(todo_id = id, "Delete ignored for missing todo");
    }
    Ok(redirect_with_flash(
        &state,
        &headers,
        "/",
        FlashMessage::success("Task deleted."),
    ))
}

/// Messages from the request's flash cookie. Invalid signatures read as empty.
fn pending_flashes(state: &AppState, headers: &HeaderMap) -> Vec<FlashMessage> {
    flash::read_cookie(headers)
        .and_then(|value| state.flash.decode(value))
        .unwrap_or_default()
}

/// Renders a page and consumes any flash cookie the request carried.
fn page_response(body: String, headers: &HeaderMap) -> Response {
    let mut response = Html(body).into_response();
    if flash::read_cookie(headers).is_some() {
        append_cookie(&mut response, &flash::clear_cookie());
    }
    response
}

/// 303 redirect carrying `message` on top of any not-yet-shown messages.
fn redirect_with_flash(
    state: &AppState,
    headers: &HeaderMap,
    to: &str,
    message: FlashMessage,
) -> Response {
    let mut messages = pending_flashes(state, headers);
    messages.push(message);
    let mut response = Redirect::to(to).into_response();
    append_cookie(&mut response, &flash::set_cookie(&state.flash.encode(&messages)));
    response
}

fn append_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => tracing::warn!("Dropping unencodable cookie: {}", err),
    }
}

pub async fn run(config: &Config) -> Result<()> {
    run_with_shutdown(config, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    if config.uses_insecure_secret() {
        tracing::warn!("Using the development secret key; set TODO_SECRET_KEY outside development");
    }

    let store = TodoStore::new(&config.db_path)?;
    store.init_schema().await?;
    tracing::info!(db_path = %store.db_path(), "Todo store ready");

    let app = build_router(AppState::new(store, &config.secret_key));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TodoWebError::Runtime(e.to_string()))?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TodoWebError::Runtime(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::TodoForm;

    fn form(title: &str, description: &str) -> TodoForm {
        TodoForm {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn validated_trims_both_fields() {
        let form = form("  Buy milk \n", "  2 liters  ");
        assert_eq!(form.validated(), Some(("Buy milk", "2 liters")));
    }

    #[test]
    fn validated_rejects_blank_title() {
        assert_eq!(form("   ", "desc").validated(), None);
        assert_eq!(TodoForm::default().validated(), None);
    }
}
