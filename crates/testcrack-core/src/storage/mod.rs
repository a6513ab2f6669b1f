mod config;
pub mod credentials;

pub use config::{ApiConfig, AssessmentConfig, Config, CredentialBackend, LoggingConfig};
pub use credentials::{
    CredentialStore, Credentials, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore, Preferences, UserProfile,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/testcrack[-dev]/` based on TESTCRACK_ENV.
///
/// Set TESTCRACK_ENV=dev to use development data directory.
/// TESTCRACK_HOME, when set, is used as-is instead.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TESTCRACK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TESTCRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("testcrack-dev")
            } else {
                base_dir.join("testcrack")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
