use std::env;

/// Persistence backend, decided once at process start. Presence of
/// `PROOFY_USE_DATABASE=true` selects the SQLite backend; everything else
/// keeps the flat-file backend.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    File { data_path: String },
    Database { db_path: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub backend: StorageBackend,
    /// Bearer token required on write routes. None leaves writes open
    /// (single-operator dev mode).
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let data_path = env::var("PROOFY_DATA_PATH").unwrap_or_else(|_| "./data".to_string());

        let use_database = env::var("PROOFY_USE_DATABASE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let backend = if use_database {
            StorageBackend::Database {
                db_path: env::var("PROOFY_DB_PATH")
                    .unwrap_or_else(|_| format!("{}/proofy.db", data_path)),
            }
        } else {
            StorageBackend::File { data_path }
        };

        Ok(Config {
            port: env::var("PROOFY_PORT")
                .unwrap_or_else(|_| "8470".to_string())
                .parse()?,
            host: env::var("PROOFY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            backend,
            admin_token: env::var("PROOFY_ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }
}
