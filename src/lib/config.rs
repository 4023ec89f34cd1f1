use std::env;

#[cfg(feature = "tracing")]
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MONGODB_DATABASE: &str = "todo_DEV";

/// Process settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// MongoDB connection string. Takes precedence over `database_url`.
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    /// SQLite URL such as `sqlite://todos.db`. Without it (or a MongoDB URI)
    /// the server keeps todos in memory.
    pub database_url: Option<String>,
    /// Single allowed CORS origin; any origin is allowed when unset.
    pub cors_origin: Option<String>,
    /// Reset the store to the seed todos on start-up.
    pub seed_todos: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            mongodb_uri: None,
            mongodb_database: DEFAULT_MONGODB_DATABASE.to_string(),
            database_url: None,
            cors_origin: None,
            seed_todos: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                #[cfg(feature = "tracing")]
                warn!(port = %raw, "Invalid PORT, falling back to {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        let seed_todos = non_empty("SEED_TODOS")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            port,
            mongodb_uri: non_empty("MONGODB_URI"),
            mongodb_database: non_empty("MONGODB_DATABASE_NAME")
                .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
            database_url: non_empty("DATABASE_URL"),
            cors_origin: non_empty("CORS_ORIGIN"),
            seed_todos,
        }
    }
}
