pub mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;
#[cfg(feature = "storage")]
pub mod sqlite;

pub use memory::MemoryStorage;
#[cfg(feature = "mongo")]
pub use mongo::MongoStorage;
#[cfg(feature = "storage")]
pub use sqlite::SQLiteStorage;

use async_trait::async_trait;

use crate::domain::{NewTodo, Todo, TodoKey, TodoPatch};

/// Persistence port for todos. Lookups that match nothing return `None`;
/// every other failure is surfaced as an error and never retried.
#[async_trait]
pub trait Storage: Send + Sync {
    type Key: TodoKey;

    async fn find_all(&self) -> anyhow::Result<Vec<Todo<Self::Key>>>;
    async fn find_by_id(&self, id: &Self::Key) -> anyhow::Result<Option<Todo<Self::Key>>>;
    async fn insert(&self, todo: NewTodo) -> anyhow::Result<Todo<Self::Key>>;
    async fn insert_many(&self, todos: Vec<NewTodo>) -> anyhow::Result<Vec<Todo<Self::Key>>>;
    async fn update_by_id(
        &self,
        id: &Self::Key,
        patch: TodoPatch,
    ) -> anyhow::Result<Option<Todo<Self::Key>>>;
    async fn delete_by_id(&self, id: &Self::Key) -> anyhow::Result<Option<Todo<Self::Key>>>;
    /// Removes every todo, returning how many were deleted.
    async fn clear(&self) -> anyhow::Result<u64>;
}
