use anyhow::Context;
use todo_api::config::Config;
use todo_api::seed::seed_todos;
use todo_api::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    #[cfg(feature = "tracing")]
    {
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
            .init();
    }

    #[cfg(feature = "mongo")]
    if let Some(uri) = config.mongodb_uri.as_deref() {
        let storage = todo_api::storage::MongoStorage::connect(uri, &config.mongodb_database).await?;
        return seed(&storage).await;
    }

    #[cfg(feature = "storage")]
    if let Some(url) = config.database_url.as_deref() {
        let storage = todo_api::storage::SQLiteStorage::connect(url).await?;
        return seed(&storage).await;
    }

    anyhow::bail!("set MONGODB_URI or DATABASE_URL to the database to seed")
}

async fn seed<S: Storage>(storage: &S) -> anyhow::Result<()> {
    let seeded = seed_todos(storage).await.context("Todo seeding failed")?;
    println!("Removed {} existing todos", seeded.removed);
    for todo in &seeded.todos {
        println!("{} {} (completed: {})", todo.id, todo.task, todo.completed);
    }
    println!("Todo seeding completed successfully");
    Ok(())
}
