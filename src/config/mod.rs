// Configuration module entry point
// Loads layered configuration and holds the per-process application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, PluginConfig, StoreBackend, StoreConfig};

/// Environment variable prefix, e.g. `DOCSWRITER_STORE__FOLDER_ID`
const ENV_PREFIX: &str = "DOCSWRITER";

/// Startup configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from the path given as first CLI argument,
    /// falling back to `config` (any extension the config crate knows)
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence: defaults < file < `DOCSWRITER_*` environment < `PORT`.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let port_override = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .map(i64::from);

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default(
                "http.server_name",
                concat!("docswriter/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 65_536)?
            .set_default("plugin.name", "DocsWriter")?
            .set_default(
                "plugin.description",
                "A ChatGPT plugin that allows you to create and edit Google Docs",
            )?
            .set_default("plugin.base_url", "http://localhost:8080")?
            .set_default("store.backend", "google")?
            .set_default("store.folder_id", "")?
            .set_default("store.drive_base_url", "https://www.googleapis.com/drive/v3")?
            .set_default("store.docs_base_url", "https://docs.googleapis.com/v1")?
            .set_default("store.request_timeout", 30)?
            .set_default("store.lookup_cache_ttl", 30)?
            .set_default("store.reject_duplicates", false)?
            .set_override_option("server.port", port_override)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.folder_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store.folder_id must be set".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Google && self.store.credentials_file.is_none() {
            return Err(ConfigError::Validation(
                "store.credentials_file is required for the google backend".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::types::{HealthConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};
    use super::*;

    /// Configuration equivalent to the defaults with the memory backend
    pub fn memory_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            http: HttpConfig {
                server_name: "docswriter/test".to_string(),
                enable_cors: false,
                max_body_size: 1024,
            },
            health: HealthConfig::default(),
            plugin: PluginConfig {
                name: "DocsWriter".to_string(),
                description: "Create and edit documents".to_string(),
                base_url: "https://docs.example.test".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                credentials_file: None,
                folder_id: "folder-1".to_string(),
                drive_base_url: "https://www.googleapis.com/drive/v3".to_string(),
                docs_base_url: "https://docs.googleapis.com/v1".to_string(),
                request_timeout: 30,
                lookup_cache_ttl: 0,
                reject_duplicates: false,
            },
        }
    }

    #[test]
    fn test_validate_requires_folder() {
        let mut cfg = memory_config();
        cfg.store.folder_id = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_google_requires_credentials() {
        let mut cfg = memory_config();
        cfg.store.backend = StoreBackend::Google;
        assert!(cfg.validate().is_err());

        cfg.store.credentials_file = Some("creds.json".to_string());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        assert!(memory_config().validate().is_ok());
    }

    #[test]
    fn test_load_from_file_applies_defaults() {
        let path = std::env::temp_dir().join(format!("docswriter-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[store]\nbackend = \"memory\"\nfolder_id = \"abc\"\nreject_duplicates = true\n",
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.store.folder_id, "abc");
        assert!(cfg.store.reject_duplicates);
        assert_eq!(cfg.store.lookup_cache_ttl, 30);
        assert_eq!(cfg.plugin.name, "DocsWriter");
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.health.enabled);
    }

    #[test]
    fn test_load_without_folder_fails() {
        let err = Config::load_from("/nonexistent/docswriter-config").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_socket_addr() {
        let cfg = memory_config();
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:8080");

        let mut bad = memory_config();
        bad.server.host = "not a host".to_string();
        assert!(bad.get_socket_addr().is_err());
    }
}
