use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Storage configuration: where the booklet directory tree lives and how
/// often the scan watcher polls it.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory holding `rawScans/`, `accepted/`, `rejected/`,
    /// `extractedPages/`, `archive/`, and `reports/`.
    pub data_root: PathBuf,
    /// Scan watcher poll interval in seconds (default: `2`).
    pub watch_interval_secs: u64,
}

impl StorageConfig {
    /// Load from environment variables with defaults.
    ///
    /// | Env Var               | Default  |
    /// |-----------------------|----------|
    /// | `DATA_ROOT`           | `./data` |
    /// | `WATCH_INTERVAL_SECS` | `2`      |
    pub fn from_env() -> Self {
        let data_root = std::env::var("DATA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let watch_interval_secs: u64 = std::env::var("WATCH_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("WATCH_INTERVAL_SECS must be a valid u64");

        Self {
            data_root,
            watch_interval_secs,
        }
    }
}
