//! Per-user settings and credentials.
//!
//! Everything lives in one directory (`~/.smartgpt` by default):
//!
//! ```text
//! ~/.smartgpt/
//!   ├── settings.yaml   UserSettings
//!   ├── credentials     API key, one line
//!   ├── history.txt     REPL history
//!   └── prompts/        optional prompt template overrides
//! ```

pub mod credentials;
pub mod user;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub use credentials::{Credentials, PLACEHOLDER_KEY};
pub use user::UserSettings;

/// Name of the user directory under `$HOME`.
pub const USER_DIR_NAME: &str = ".smartgpt";
/// Settings filename.
pub const SETTINGS_FILENAME: &str = "settings.yaml";
/// Credentials filename.
pub const CREDENTIALS_FILENAME: &str = "credentials";
/// REPL history filename.
pub const HISTORY_FILENAME: &str = "history.txt";
/// Environment variable overriding the user directory.
pub const HOME_ENV: &str = "SMARTGPT_HOME";

/// Location of the smartgpt user directory and the files inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDir {
    root: PathBuf,
}

impl UserDir {
    /// Wraps an explicit directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the user directory: `explicit`, then `$SMARTGPT_HOME`,
    /// then `~/.smartgpt`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] when none of those can be determined.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(dir) = explicit {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        dirs::home_dir()
            .map(|home| Self::new(home.join(USER_DIR_NAME)))
            .ok_or(ConfigError::NoHomeDir)
    }

    /// The directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `settings.yaml` inside the directory.
    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILENAME)
    }

    /// `credentials` inside the directory.
    pub fn credentials_path(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILENAME)
    }

    /// `history.txt` inside the directory.
    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILENAME)
    }

    /// Prompt template override directory.
    pub fn prompt_dir(&self) -> PathBuf {
        crate::agent::PromptSet::default_dir(&self.root)
    }

    /// Creates the directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the directory cannot be created.
    pub fn ensure(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.root).map_err(|source| ConfigError::Io {
            path: self.root.clone(),
            source,
        })
    }
}
