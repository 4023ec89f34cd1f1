use std::sync::Arc;

use crate::domain::error::AppError;
use crate::domain::{NewTodo, Todo, TodoId, TodoPatch};
use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

/// Runs validated todo operations against the injected store. Each call is
/// exactly one store round-trip; a store miss becomes [`AppError::NotFound`]
/// naming the id as the caller wrote it.
pub struct TodoService<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Clone for TodoService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage> TodoService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn get_all(&self) -> Result<Vec<Todo<S::Key>>, AppError> {
        let todos = self.storage.find_all().await?;
        #[cfg(feature = "tracing")]
        debug!(count = todos.len(), "Listed todos");
        Ok(todos)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn get_by_id(&self, id: &TodoId<S::Key>) -> Result<Todo<S::Key>, AppError> {
        self.storage
            .find_by_id(id.key())
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn create(&self, todo: NewTodo) -> Result<Todo<S::Key>, AppError> {
        let todo = self.storage.insert(todo).await?;
        #[cfg(feature = "tracing")]
        debug!(id = %todo.id, "Created todo");
        Ok(todo)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn update(
        &self,
        id: &TodoId<S::Key>,
        patch: TodoPatch,
    ) -> Result<Todo<S::Key>, AppError> {
        let todo = self
            .storage
            .update_by_id(id.key(), patch)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        #[cfg(feature = "tracing")]
        debug!(id = %todo.id, "Updated todo");
        Ok(todo)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn delete(&self, id: &TodoId<S::Key>) -> Result<Todo<S::Key>, AppError> {
        let todo = self
            .storage
            .delete_by_id(id.key())
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        #[cfg(feature = "tracing")]
        debug!(id = %todo.id, "Deleted todo");
        Ok(todo)
    }
}
