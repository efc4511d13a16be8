use std::path::PathBuf;

use planserve_core::history::DEFAULT_HISTORY_CAPACITY;
use planserve_core::launcher::ConverterContext;

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
    /// Directory relative upload paths are resolved against.
    pub upload_dir: PathBuf,
    /// Directory converted drawings are written to and served from.
    pub output_dir: PathBuf,
    /// Path to the OSM-to-DXF converter script.
    pub converter_script: PathBuf,
    /// Runtime candidates probed before each conversion, in order.
    pub runtime_candidates: Vec<String>,
    /// Number of completed conversions kept in the history log.
    pub history_capacity: usize,
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
    /// | `UPLOAD_DIR`           | `data/uploads`             |
    /// | `OUTPUT_DIR`           | `data/output`              |
    /// | `CONVERTER_SCRIPT`     | `scripts/osm_to_dxf.py`    |
    /// | `CONVERTER_RUNTIMES`   | `python3,python`           |
    /// | `HISTORY_CAPACITY`     | `50`                       |
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

        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/uploads".into()));

        let output_dir =
            PathBuf::from(std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "data/output".into()));

        let converter_script = PathBuf::from(
            std::env::var("CONVERTER_SCRIPT").unwrap_or_else(|_| "scripts/osm_to_dxf.py".into()),
        );

        let runtime_candidates: Vec<String> = std::env::var("CONVERTER_RUNTIMES")
            .unwrap_or_else(|_| "python3,python".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let history_capacity: usize = std::env::var("HISTORY_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_HISTORY_CAPACITY.to_string())
            .parse()
            .expect("HISTORY_CAPACITY must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_dir,
            output_dir,
            converter_script,
            runtime_candidates,
            history_capacity,
        }
    }

    /// Build the launcher context from this configuration.
    pub fn converter_context(&self) -> ConverterContext {
        ConverterContext {
            script_path: self.converter_script.clone(),
            output_dir: self.output_dir.clone(),
            runtime_candidates: self.runtime_candidates.clone(),
        }
    }
}
