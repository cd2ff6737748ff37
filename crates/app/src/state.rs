use std::{fs, path::PathBuf};

use blob_store::BlobStoreConfig;
use common::config::{KvConfig, StoreConfig};

pub const APP_NAME: &str = "folio";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const OBJECTS_DIR_NAME: &str = "objects";
pub const SESSIONS_FILE_NAME: &str = "sessions.json";

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the folio directory (~/.folio)
    pub folio_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: StoreConfig,
}

impl AppState {
    /// Get the folio directory path (custom or default ~/.folio)
    pub fn folio_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Default configuration for a fresh directory: documents as local
    /// files, sessions in a file next to them.
    pub fn default_config(folio_dir: &std::path::Path) -> StoreConfig {
        StoreConfig {
            blob: BlobStoreConfig::Local {
                path: folio_dir.join(OBJECTS_DIR_NAME),
            },
            kv: KvConfig::File {
                path: folio_dir.join(SESSIONS_FILE_NAME),
            },
            ..Default::default()
        }
    }

    /// Initialize a new folio state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<StoreConfig>,
    ) -> Result<Self, StateError> {
        let folio_dir = Self::folio_dir(custom_path)?;

        if folio_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&folio_dir)?;

        let config = config.unwrap_or_else(|| Self::default_config(&folio_dir));
        if let BlobStoreConfig::Local { path } = &config.blob {
            fs::create_dir_all(path)?;
        }

        let config_path = folio_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            folio_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the folio directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let folio_dir = Self::folio_dir(custom_path)?;

        if !folio_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = folio_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: StoreConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            folio_dir,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("folio directory not initialized. Run 'folio init' first")]
    NotInitialized,

    #[error("folio directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
