use crate::domain::{NewTodo, Todo, TodoKey};
use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tracing::info;

pub const SEED_TODOS: [(&str, bool); 3] = [("Eat", true), ("Sleep", false), ("Pray", false)];

pub fn seed_data() -> Vec<NewTodo> {
    SEED_TODOS
        .iter()
        .map(|(task, completed)| NewTodo::with_status(*task, *completed))
        .collect()
}

/// Outcome of a seeding run.
#[derive(Debug)]
pub struct Seeded<K: TodoKey> {
    /// Todos deleted before the seed set went in.
    pub removed: u64,
    /// The seed todos as stored, in seed order.
    pub todos: Vec<Todo<K>>,
}

/// Replaces everything in `storage` with the seed todos.
pub async fn seed_todos<S: Storage>(storage: &S) -> anyhow::Result<Seeded<S::Key>> {
    let removed = storage.clear().await?;
    let todos = storage.insert_many(seed_data()).await?;
    let seeded = Seeded { removed, todos };
    #[cfg(feature = "tracing")]
    info!(
        removed = seeded.removed,
        inserted = seeded.todos.len(),
        "Todo seeding completed"
    );
    Ok(seeded)
}
