use std::path::Path;

use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Result, TodoWebError};

mod schema;
use schema::todos;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
const BUSY_TIMEOUT_PRAGMA: &str = "PRAGMA busy_timeout = 5000;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub done: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable)]
struct TodoRow {
    id: i32,
    title: String,
    description: Option<String>,
    done: bool,
    created_at: NaiveDateTime,
}

/// Data access for the `todos` table.
///
/// Every operation opens its own connection on a blocking worker and drops it
/// before returning, so nothing is held between calls.
#[derive(Debug, Clone)]
pub struct TodoStore {
    db_path: String,
}

impl TodoStore {
    pub fn new(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref().trim();
        if sqlite_path.is_empty() {
            return Err(TodoWebError::Config(
                "database path must not be empty".to_string(),
            ));
        }
        ensure_parent_dir(sqlite_path)?;
        Ok(Self {
            db_path: sqlite_path.to_string(),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Creates the `todos` table if it does not exist yet. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(storage_error)?;
            if !applied.is_empty() {
                tracing::info!(migrations = applied.len(), "Applied pending migrations");
            }
            Ok(())
        })
        .await
    }

    pub async fn create(&self, title: &str, description: &str) -> Result<i32> {
        let title = title.to_string();
        let description = description.to_string();
        let id = self
            .with_conn(move |conn| {
                diesel::insert_into(todos::table)
                    .values((
                        todos::title.eq(&title),
                        todos::description.eq(&description),
                    ))
                    .returning(todos::id)
                    .get_result::<i32>(conn)
                    .map_err(storage_error)
            })
            .await?;
        tracing::info!(todo_id = id, "Created todo");
        Ok(id)
    }

    pub async fn list_all(&self) -> Result<Vec<Todo>> {
        let rows = self
            .with_conn(|conn| {
                todos::table
                    .order((todos::created_at.desc(), todos::id.desc()))
                    .load::<TodoRow>(conn)
                    .map_err(storage_error)
            })
            .await?;
        tracing::debug!(count = rows.len(), "Listed todos");
        Ok(rows.into_iter().map(map_row).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Todo>> {
        let row = self
            .with_conn(move |conn| {
                todos::table
                    .find(id)
                    .first::<TodoRow>(conn)
                    .optional()
                    .map_err(storage_error)
            })
            .await?;
        Ok(row.map(map_row))
    }

    /// Overwrites title and description. Returns `false` when no row has `id`.
    pub async fn update(&self, id: i32, title: &str, description: &str) -> Result<bool> {
        let title = title.to_string();
        let description = description.to_string();
        let count = self
            .with_conn(move |conn| {
                diesel::update(todos::table.find(id))
                    .set((
                        todos::title.eq(&title),
                        todos::description.eq(&description),
                    ))
                    .execute(conn)
                    .map_err(storage_error)
            })
            .await?;
        if count > 0 {
            tracing::info!(todo_id = id, "Updated todo");
        }
        Ok(count > 0)
    }

    /// Sets `done` to `explicit_done`, or flips the stored value when `None`.
    ///
    /// The flip reads then writes without a transaction, so two concurrent
    /// toggles of the same row can cancel out to a single flip.
    pub async fn toggle(&self, id: i32, explicit_done: Option<bool>) -> Result<bool> {
        let updated = self
            .with_conn(move |conn| {
                let new_done = match explicit_done {
                    Some(done) => done,
                    None => {
                        let current = todos::table
                            .find(id)
                            .select(todos::done)
                            .first::<bool>(conn)
                            .optional()
                            .map_err(storage_error)?;
                        match current {
                            Some(done) => !done,
                            None => return Ok(None),
                        }
                    }
                };
                let count = diesel::update(todos::table.find(id))
                    .set(todos::done.eq(new_done))
                    .execute(conn)
                    .map_err(storage_error)?;
                Ok((count > 0).then_some(new_done))
            })
            .await?;
        match updated {
            Some(done) => {
                tracing::info!(todo_id = id, done, "Toggled todo");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let count = self
            .with_conn(move |conn| {
                diesel::delete(todos::table.find(id))
                    .execute(conn)
                    .map_err(storage_error)
            })
            .await?;
        if count > 0 {
            tracing::info!(todo_id = id, "Deleted todo");
        }
        Ok(count > 0)
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let database_url = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&database_url).map_err(storage_error)?;
            conn.batch_execute(BUSY_TIMEOUT_PRAGMA).map_err(storage_error)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| TodoWebError::Runtime(e.to_string()))?
    }
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(storage_error)?;
    }
    Ok(())
}

fn storage_error(err: impl std::fmt::Display) -> TodoWebError {
    TodoWebError::Storage(err.to_string())
}

fn map_row(row: TodoRow) -> Todo {
    Todo {
        id: row.id,
        title: row.title,
        description: row.description.unwrap_or_default(),
        done: row.done,
        created_at: row.created_at,
    }
}
