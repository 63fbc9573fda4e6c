//! Configuration for the search service.
//!
//! Layered configuration:
//! - Default values
//! - TOML configuration file (`.thesis-search/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TS_` and use double
//! underscores to separate nested levels:
//! - `TS_SOURCE__BASE_URL=http://backend:5000` sets `source.base_url`
//! - `TS_SERVER__BIND=0.0.0.0:8087` sets `server.bind`
//! - `TS_EMBEDDING__MODEL=bge-small-en-v1.5` sets `embedding.model`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory holding the settings file and, by default, the index.
pub const CONFIG_DIR: &str = ".thesis-search";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory where the index pair is persisted
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Thesis store settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Query settings
    #[serde(default)]
    pub query: QueryConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    /// Base URL of the thesis repository backend
    #[serde(default = "default_source_base_url")]
    pub base_url: String,

    /// Request timeout in seconds for store fetches
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Cache directory for downloaded model files
    /// (defaults to the user cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    /// Number of results returned when the caller does not ask for a count
    #[serde(default = "default_result_limit")]
    pub default_limit: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_version() -> u32 {
    1
}

fn default_index_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("index")
}

fn default_false() -> bool {
    false
}

fn default_source_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_source_timeout_secs() -> u64 {
    10
}

fn default_embedding_model() -> String {
    "all-minilm-l6-v2".to_string()
}

fn default_result_limit() -> usize {
    5
}

fn default_bind() -> String {
    "127.0.0.1:8087".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            debug: false,
            source: SourceConfig::default(),
            embedding: EmbeddingConfig::default(),
            query: QueryConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_source_base_url(),
            timeout_secs: default_source_timeout_secs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_result_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with TS_ prefix
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed("TS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for the config directory,
    /// searching from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# thesis-search configuration file

# Version of the configuration schema
version = 1

# Directory where the index pair (theses.vec + catalog.json) is persisted
index_path = ".thesis-search/index"

# Global debug mode
debug = false

[source]
# Base URL of the thesis repository backend
base_url = "http://localhost:5000"

# Request timeout in seconds for store fetches
timeout_secs = 10

[embedding]
# Model to use for embeddings.
# Supported: all-minilm-l6-v2, bge-small-en-v1.5
# Changing the model requires re-running ingestion: a persisted index
# only answers queries embedded by the model that built it.
model = "all-minilm-l6-v2"

# Cache directory for downloaded model files (defaults to the user cache dir)
# cache_dir = ".thesis-search/models"

[query]
# Number of results returned when the caller does not ask for a count
default_limit = 5

[server]
# HTTP server bind address
bind = "127.0.0.1:8087"
"#;

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }

    pub fn source_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.source.timeout_secs)
    }
}
