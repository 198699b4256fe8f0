//! API key storage.
//!
//! The credentials file holds the key on a single line. On first run it is
//! created with [`PLACEHOLDER_KEY`], which must be replaced before use.

use std::fmt;
use std::path::{Path, PathBuf};

use super::UserDir;
use crate::error::ConfigError;

/// Written to a fresh credentials file.
pub const PLACEHOLDER_KEY: &str = "XXXXXX";

/// Environment variable that overrides the credentials file.
const KEY_ENV: &str = "OPENAI_API_KEY";

/// An API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
}

impl Credentials {
    /// Wraps a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The placeholder credentials.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_KEY)
    }

    /// The raw key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this is still the placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.key == PLACEHOLDER_KEY
    }

    /// The key with everything but the first and last four characters hidden.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.is_placeholder() {
            return self.key.clone();
        }
        let chars: Vec<char> = self.key.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}****{tail}")
    }

    /// Writes the key to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the write fails.
    pub fn save(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        std::fs::write(path, &self.key).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(path.to_path_buf())
    }

    /// Reads a key from `path`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` is not a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(text.trim()))
    }

    /// Writes placeholder credentials if the file does not exist yet.
    /// Returns `true` when the file was created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the directory or file cannot be written.
    pub fn ensure_file(dir: &UserDir) -> Result<bool, ConfigError> {
        dir.ensure()?;
        let path = dir.credentials_path();
        if path.exists() {
            return Ok(false);
        }
        Self::placeholder().save(&path)?;
        Ok(true)
    }

    /// Ensures the credentials file exists and holds a real key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PlaceholderKey`] while the file still holds
    /// the placeholder.
    pub fn check(dir: &UserDir) -> Result<Self, ConfigError> {
        Self::ensure_file(dir)?;
        let path = dir.credentials_path();
        let credentials = Self::load(&path)?;
        if credentials.is_placeholder() || credentials.key.is_empty() {
            return Err(ConfigError::PlaceholderKey {
                path,
                placeholder: PLACEHOLDER_KEY.to_string(),
            });
        }
        Ok(credentials)
    }

    /// Resolves the key: `$OPENAI_API_KEY` when set, else the checked file.
    ///
    /// # Errors
    ///
    /// See [`check`](Self::check).
    pub fn resolve(dir: &UserDir) -> Result<Self, ConfigError> {
        match std::env::var(KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Self::check(dir),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.masked())
            .finish()
    }
}
