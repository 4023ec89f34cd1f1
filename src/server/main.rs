use std::sync::Arc;

use anyhow::Context;
use todo_api::adapters::HttpServer;
use todo_api::config::Config;
use todo_api::seed::seed_todos;
use todo_api::services::TodoService;
use todo_api::storage::{MemoryStorage, Storage};
#[cfg(feature = "mongo")]
use todo_api::storage::MongoStorage;

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
        let storage = MongoStorage::connect(uri, &config.mongodb_database).await?;
        return serve(storage, &config).await;
    }
    #[cfg(all(not(feature = "mongo"), feature = "tracing"))]
    if config.mongodb_uri.is_some() {
        tracing::warn!("MONGODB_URI is set but the mongo feature is off; ignoring it");
    }

    match config.database_url.clone() {
        #[cfg(feature = "storage")]
        Some(url) => {
            let storage = todo_api::storage::SQLiteStorage::connect(&url).await?;
            serve(storage, &config).await
        }
        #[cfg(not(feature = "storage"))]
        Some(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("DATABASE_URL is set but the storage feature is off; keeping todos in memory");
            serve(MemoryStorage::new(), &config).await
        }
        None => serve(MemoryStorage::new(), &config).await,
    }
}

async fn serve<S: Storage + 'static>(storage: S, config: &Config) -> anyhow::Result<()> {
    if config.seed_todos {
        seed_todos(&storage).await.context("failed to seed todos")?;
    }
    let todo_service = TodoService::new(Arc::new(storage));
    let http_server = HttpServer::new(todo_service, config).await?;
    http_server.run().await
}
