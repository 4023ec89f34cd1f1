use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::{DateTime, Document, doc, oid};
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::{Client, Collection, options::ReturnDocument};
use serde::{Deserialize, Serialize};

use crate::domain::{NewTodo, ObjectId, Todo, TodoPatch};
use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tracing::info;

const COLLECTION: &str = "todos";

/// Document store backed by a MongoDB collection. Documents carry
/// `createdAt`/`updatedAt` timestamps kept by the store.
pub struct MongoStorage {
    todos: Collection<TodoDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoDocument {
    #[serde(rename = "_id")]
    id: oid::ObjectId,
    task: String,
    completed: bool,
    created_at: DateTime,
    updated_at: DateTime,
}

impl TodoDocument {
    fn new(todo: NewTodo) -> Self {
        let now = DateTime::now();
        Self {
            id: oid::ObjectId::new(),
            task: todo.task,
            completed: todo.completed,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<TodoDocument> for Todo<ObjectId> {
    fn from(document: TodoDocument) -> Self {
        Todo {
            id: document.id.into(),
            task: document.task,
            completed: document.completed,
            created_at: to_chrono(document.created_at),
            updated_at: to_chrono(document.updated_at),
        }
    }
}

fn to_chrono(time: DateTime) -> Option<chrono::DateTime<Utc>> {
    chrono::DateTime::<Utc>::from_timestamp_millis(time.timestamp_millis())
}

fn by_id(id: &ObjectId) -> Document {
    doc! { "_id": oid::ObjectId::from(*id) }
}

/// `$set` body for a patch; `updatedAt` is always touched.
fn set_fields(patch: TodoPatch) -> Document {
    let mut set = doc! { "updatedAt": DateTime::now() };
    if let Some(task) = patch.task {
        set.insert("task", task);
    }
    if let Some(completed) = patch.completed {
        set.insert("completed", completed);
    }
    doc! { "$set": set }
}

impl MongoStorage {
    /// Connects to `uri` and checks the server answers before returning.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("failed to parse MongoDB connection string")?;
        let database = client.database(database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .with_context(|| format!("unable to connect to MongoDB database {}", database.name()))?;
        #[cfg(feature = "tracing")]
        info!(database = %database.name(), "Connected to MongoDB");
        Ok(Self {
            todos: database.collection(COLLECTION),
        })
    }
}

#[async_trait]
impl Storage for MongoStorage {
    type Key = ObjectId;

    async fn find_all(&self) -> Result<Vec<Todo<ObjectId>>> {
        let documents: Vec<TodoDocument> = self
            .todos
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(documents.into_iter().map(Todo::from).collect())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Todo<ObjectId>>> {
        let document = self.todos.find_one(by_id(id)).await?;
        Ok(document.map(Todo::from))
    }

    async fn insert(&self, todo: NewTodo) -> Result<Todo<ObjectId>> {
        let document = TodoDocument::new(todo);
        self.todos.insert_one(&document).await?;
        Ok(document.into())
    }

    async fn insert_many(&self, todos: Vec<NewTodo>) -> Result<Vec<Todo<ObjectId>>> {
        if todos.is_empty() {
            return Ok(Vec::new());
        }
        let documents: Vec<_> = todos.into_iter().map(TodoDocument::new).collect();
        self.todos.insert_many(&documents).await?;
        Ok(documents.into_iter().map(Todo::from).collect())
    }

    async fn update_by_id(
        &self,
        id: &ObjectId,
        patch: TodoPatch,
    ) -> Result<Option<Todo<ObjectId>>> {
        let document = self
            .todos
            .find_one_and_update(by_id(id), set_fields(patch))
            .return_document(ReturnDocument::After)
            .await?;
        Ok(document.map(Todo::from))
    }

    async fn delete_by_id(&self, id: &ObjectId) -> Result<Option<Todo<ObjectId>>> {
        let document = self.todos.find_one_and_delete(by_id(id)).await?;
        Ok(document.map(Todo::from))
    }

    async fn clear(&self) -> Result<u64> {
        let result = self.todos.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_convert_to_wire_todos() {
        let document = TodoDocument::new(NewTodo::with_status("Eat", true));
        let todo = Todo::from(document.clone());

        assert_eq!(todo.id.to_string(), document.id.to_hex());
        assert_eq!(todo.task, "Eat");
        assert!(todo.completed);
        assert_eq!(
            todo.created_at.map(|t| t.timestamp_millis()),
            Some(document.created_at.timestamp_millis())
        );
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[test]
    fn documents_use_mongo_field_names() {
        let document = TodoDocument::new(NewTodo::new("Sleep"));
        let stored = bson::serialize_to_document(&document).unwrap();

        assert_eq!(stored.get_object_id("_id").unwrap(), document.id);
        assert_eq!(stored.get_str("task").unwrap(), "Sleep");
        assert!(!stored.get_bool("completed").unwrap());
        assert!(stored.get_datetime("createdAt").is_ok());
        assert!(stored.get_datetime("updatedAt").is_ok());
    }

    #[test]
    fn set_fields_only_touches_sent_properties() {
        let update = set_fields(TodoPatch {
            task: None,
            completed: Some(true),
        });
        let set = update.get_document("$set").unwrap();

        assert!(set.get_bool("completed").unwrap());
        assert!(!set.contains_key("task"));
        assert!(set.get_datetime("updatedAt").is_ok());

        let update = set_fields(TodoPatch {
            task: Some("Dream".into()),
            completed: None,
        });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("task").unwrap(), "Dream");
        assert!(!set.contains_key("completed"));
    }

    #[test]
    fn id_filter_matches_on_the_object_id() {
        let id = ObjectId::new();
        let filter = by_id(&id);
        assert_eq!(
            filter.get_object_id("_id").unwrap(),
            oid::ObjectId::from(id)
        );
    }
}
