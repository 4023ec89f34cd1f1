use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{NewTodo, ObjectId, Todo, TodoPatch};

use super::Storage;

/// In-process document store. Documents are kept in insertion order and
/// carry `createdAt`/`updatedAt` timestamps.
#[derive(Default)]
pub struct MemoryStorage {
    todos: RwLock<Vec<Todo<ObjectId>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn document(todo: NewTodo) -> Todo<ObjectId> {
        let now = Utc::now();
        Todo {
            id: ObjectId::new(),
            task: todo.task,
            completed: todo.completed,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Key = ObjectId;

    async fn find_all(&self) -> anyhow::Result<Vec<Todo<ObjectId>>> {
        Ok(self.todos.read().await.clone())
    }

    async fn find_by_id(&self, id: &ObjectId) -> anyhow::Result<Option<Todo<ObjectId>>> {
        let todos = self.todos.read().await;
        Ok(todos.iter().find(|todo| todo.id == *id).cloned())
    }

    async fn insert(&self, todo: NewTodo) -> anyhow::Result<Todo<ObjectId>> {
        let document = Self::document(todo);
        self.todos.write().await.push(document.clone());
        Ok(document)
    }

    async fn insert_many(&self, todos: Vec<NewTodo>) -> anyhow::Result<Vec<Todo<ObjectId>>> {
        let documents: Vec<_> = todos.into_iter().map(Self::document).collect();
        self.todos.write().await.extend(documents.iter().cloned());
        Ok(documents)
    }

    async fn update_by_id(
        &self,
        id: &ObjectId,
        patch: TodoPatch,
    ) -> anyhow::Result<Option<Todo<ObjectId>>> {
        let mut todos = self.todos.write().await;
        let Some(todo) = todos.iter_mut().find(|todo| todo.id == *id) else {
            return Ok(None);
        };
        patch.apply_to(todo);
        todo.updated_at = Some(Utc::now());
        Ok(Some(todo.clone()))
    }

    async fn delete_by_id(&self, id: &ObjectId) -> anyhow::Result<Option<Todo<ObjectId>>> {
        let mut todos = self.todos.write().await;
        let position = todos.iter().position(|todo| todo.id == *id);
        Ok(position.map(|index| todos.remove(index)))
    }

    async fn clear(&self) -> anyhow::Result<u64> {
        let mut todos = self.todos.write().await;
        let removed = todos.len() as u64;
        todos.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_ids_and_timestamps() {
        let storage = MemoryStorage::new();
        let todo = storage.insert(NewTodo::new("Climb")).await.unwrap();

        assert_eq!(todo.task, "Climb");
        assert!(!todo.completed);
        assert!(todo.created_at.is_some());
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(storage.find_by_id(&todo.id).await.unwrap(), Some(todo));
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let storage = MemoryStorage::new();
        storage
            .insert_many(vec![NewTodo::new("Eat"), NewTodo::new("Sleep")])
            .await
            .unwrap();
        storage.insert(NewTodo::new("Pray")).await.unwrap();

        let tasks: Vec<_> = storage
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|todo| todo.task)
            .collect();
        assert_eq!(tasks, ["Eat", "Sleep", "Pray"]);
    }

    #[tokio::test]
    async fn update_merges_and_touches_updated_at() {
        let storage = MemoryStorage::new();
        let todo = storage
            .insert(NewTodo::with_status("Sleep", false))
            .await
            .unwrap();

        let patch = TodoPatch {
            task: None,
            completed: Some(true),
        };
        let updated = storage.update_by_id(&todo.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.task, "Sleep");
        assert!(updated.completed);
        assert_eq!(updated.created_at, todo.created_at);
        assert!(updated.updated_at >= todo.updated_at);
    }

    #[tokio::test]
    async fn missing_ids_return_none() {
        let storage = MemoryStorage::new();
        let id = ObjectId::new();

        assert_eq!(storage.find_by_id(&id).await.unwrap(), None);
        assert_eq!(
            storage
                .update_by_id(&id, TodoPatch::default())
                .await
                .unwrap(),
            None
        );
        assert_eq!(storage.delete_by_id(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_the_document_once() {
        let storage = MemoryStorage::new();
        let todo = storage.insert(NewTodo::new("Pray")).await.unwrap();

        assert_eq!(storage.delete_by_id(&todo.id).await.unwrap(), Some(todo.clone()));
        assert_eq!(storage.delete_by_id(&todo.id).await.unwrap(), None);
        assert!(storage.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_reports_removed_count() {
        let storage = MemoryStorage::new();
        storage
            .insert_many(vec![NewTodo::new("Eat"), NewTodo::new("Sleep")])
            .await
            .unwrap();

        assert_eq!(storage.clear().await.unwrap(), 2);
        assert_eq!(storage.clear().await.unwrap(), 0);
    }
}
