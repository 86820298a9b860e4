use std::{fs, path::Path, path::PathBuf};

use common::crypto::{UserKeypair, RSA_KEY_BITS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "hearth";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYPAIR_FILE_NAME: &str = "keypair.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Id this identity is known by in conversation key sets
    pub participant_id: String,
    /// Default log level (RUST_LOG overrides)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Modulus size used when generating identity keys
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_key_bits() -> usize {
    RSA_KEY_BITS
}

impl AppConfig {
    pub fn new(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            log_level: default_log_level(),
            key_bits: default_key_bits(),
        }
    }

    /// Parsed log level, falling back to INFO on anything unrecognised
    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the hearth directory (~/.hearth)
    pub hearth_dir: PathBuf,
    /// Path to the stored identity keypair
    pub keypair_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the hearth directory path (custom or default ~/.hearth)
    pub fn hearth_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new hearth state directory around a freshly generated keypair
    pub fn init(
        custom_path: Option<PathBuf>,
        config: AppConfig,
        keypair: &UserKeypair,
    ) -> Result<Self, StateError> {
        let hearth_dir = Self::hearth_dir(custom_path)?;

        if hearth_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&hearth_dir)?;

        let keypair_path = hearth_dir.join(KEYPAIR_FILE_NAME);
        write_private(&keypair_path, &serde_json::to_string_pretty(keypair)?)?;

        let config_path = hearth_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            hearth_dir,
            keypair_path,
            config_path,
            config,
        })
    }

    /// Load existing state from hearth directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let hearth_dir = Self::hearth_dir(custom_path)?;

        if !hearth_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let keypair_path = hearth_dir.join(KEYPAIR_FILE_NAME);
        let config_path = hearth_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        if !keypair_path.exists() {
            return Err(StateError::MissingFile(KEYPAIR_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            hearth_dir,
            keypair_path,
            config_path,
            config,
        })
    }

    /// Load the identity keypair from the keypair file
    pub fn load_keypair(&self) -> Result<UserKeypair, StateError> {
        read_json(&self.keypair_path)
    }

    /// Replace the stored keypair (after a passphrase change)
    pub fn save_keypair(&self, keypair: &UserKeypair) -> Result<(), StateError> {
        write_private(&self.keypair_path, &serde_json::to_string_pretty(keypair)?)
    }
}

/// Read and parse a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StateError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Serialize a value as pretty JSON into a file
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Write a file readable only by its owner
fn write_private(path: &Path, contents: &str) -> Result<(), StateError> {
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("hearth directory not initialized. Run 'hearth init' first")]
    NotInitialized,

    #[error("hearth directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keypair() -> UserKeypair {
        UserKeypair {
            public_key: "cHVibGlj".to_string(),
            encrypted_private_key: "c2VhbGVk".to_string(),
        }
    }

    #[test]
    fn test_init_then_load() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("hearth");

        let state = AppState::init(Some(dir.clone()), AppConfig::new("alice"), &keypair()).unwrap();
        assert_eq!(state.hearth_dir, dir);

        let loaded = AppState::load(Some(dir)).unwrap();
        assert_eq!(loaded.config, AppConfig::new("alice"));
        assert_eq!(loaded.load_keypair().unwrap(), keypair());
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = TempDir::new().unwrap();
        let dir = Some(temp.path().to_path_buf());

        AppState::init(dir.clone(), AppConfig::new("alice"), &keypair()).unwrap();
        assert!(matches!(
            AppState::init(dir, AppConfig::new("alice"), &keypair()),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
        assert!(matches!(
            AppState::load(Some(temp.path().to_path_buf())),
            Err(StateError::MissingFile(_))
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = toml::from_str("participant_id = \"bob\"").unwrap();
        assert_eq!(config.log_level(), tracing::Level::INFO);
        assert_eq!(config.key_bits, RSA_KEY_BITS);

        let config: AppConfig =
            toml::from_str("participant_id = \"bob\"\nlog_level = \"debug\"").unwrap();
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_save_keypair_replaces() {
        let temp = TempDir::new().unwrap();
        let state = AppState::init(
            Some(temp.path().to_path_buf()),
            AppConfig::new("alice"),
            &keypair(),
        )
        .unwrap();

        let replaced = UserKeypair {
            encrypted_private_key: "bmV3".to_string(),
            ..keypair()
        };
        state.save_keypair(&replaced).unwrap();
        assert_eq!(state.load_keypair().unwrap(), replaced);
    }

    #[cfg(unix)]
    #[test]
    fn test_keypair_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let state = AppState::init(
            Some(temp.path().to_path_buf()),
            AppConfig::new("alice"),
            &keypair(),
        )
        .unwrap();
        let mode = fs::metadata(&state.keypair_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
