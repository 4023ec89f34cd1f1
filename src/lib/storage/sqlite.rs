use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, Sqlite, SqlitePool};

use crate::domain::{NewTodo, SeqId, Todo, TodoPatch};
use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

const COLUMNS: &str = "id, task, completed";

/// Relational store. Ids come from an `AUTOINCREMENT` sequence so a deleted
/// id is never handed out again.
pub struct SQLiteStorage {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct TodoRow {
    id: i64,
    task: String,
    completed: bool,
}

impl TryFrom<TodoRow> for Todo<SeqId> {
    type Error = anyhow::Error;

    fn try_from(row: TodoRow) -> Result<Self> {
        let id = SeqId::new(row.id).with_context(|| format!("invalid todo id {}", row.id))?;
        Ok(Todo {
            id,
            task: row.task,
            completed: row.completed,
            created_at: None,
            updated_at: None,
        })
    }
}

impl SQLiteStorage {
    /// Opens the database at `url`, creating the file and schema if needed.
    pub async fn connect(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            #[cfg(feature = "tracing")]
            info!(url = %url, "Creating database");
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("failed to create database {url}"))?;
        }
        let pool = SqlitePool::connect(url)
            .await
            .with_context(|| format!("failed to connect to {url}"))?;
        Self::with_pool(pool).await
    }

    /// A private in-memory database, mostly useful for tests.
    pub async fn new_memory() -> Result<Self> {
        // Each connection to `sqlite::memory:` is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task TEXT NOT NULL CHECK (task <> ''),
                completed BOOLEAN NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await
        .context("failed to create todos table")?;
        #[cfg(feature = "tracing")]
        debug!("todos table ready");
        Ok(())
    }
}

fn into_todos(rows: Vec<TodoRow>) -> Result<Vec<Todo<SeqId>>> {
    rows.into_iter().map(Todo::<SeqId>::try_from).collect()
}

#[async_trait]
impl Storage for SQLiteStorage {
    type Key = SeqId;

    async fn find_all(&self) -> Result<Vec<Todo<SeqId>>> {
        let rows: Vec<TodoRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM todos ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        into_todos(rows)
    }

    async fn find_by_id(&self, id: &SeqId) -> Result<Option<Todo<SeqId>>> {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?"))
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Todo::<SeqId>::try_from).transpose()
    }

    async fn insert(&self, todo: NewTodo) -> Result<Todo<SeqId>> {
        let row: TodoRow = sqlx::query_as(&format!(
            "INSERT INTO todos (task, completed) VALUES (?, ?) RETURNING {COLUMNS}"
        ))
        .bind(todo.task)
        .bind(todo.completed)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn insert_many(&self, todos: Vec<NewTodo>) -> Result<Vec<Todo<SeqId>>> {
        let mut tx = self.pool.begin().await?;
        let mut rows = Vec::with_capacity(todos.len());
        for todo in todos {
            let row: TodoRow = sqlx::query_as(&format!(
                "INSERT INTO todos (task, completed) VALUES (?, ?) RETURNING {COLUMNS}"
            ))
            .bind(todo.task)
            .bind(todo.completed)
            .fetch_one(&mut *tx)
            .await?;
            rows.push(row);
        }
        tx.commit().await?;
        into_todos(rows)
    }

    async fn update_by_id(&self, id: &SeqId, patch: TodoPatch) -> Result<Option<Todo<SeqId>>> {
        let row: Option<TodoRow> = sqlx::query_as(&format!(
            "UPDATE todos
             SET task = COALESCE(?, task), completed = COALESCE(?, completed)
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(patch.task)
        .bind(patch.completed)
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Todo::<SeqId>::try_from).transpose()
    }

    async fn delete_by_id(&self, id: &SeqId) -> Result<Option<Todo<SeqId>>> {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("DELETE FROM todos WHERE id = ? RETURNING {COLUMNS}"))
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Todo::<SeqId>::try_from).transpose()
    }

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM todos").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
