//! User settings stored as YAML.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::UserDir;
use crate::agent::config::{DEFAULT_MODEL, OrchestratorConfigBuilder};
use crate::agent::mode::{Mode, Verbosity};
use crate::error::ConfigError;

/// Persisted per-user preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// One temperature per generator agent.
    pub generator_temps: Vec<f32>,
    /// Researcher temperature.
    pub researcher_temp: f32,
    /// Resolver (and main agent) temperature.
    pub resolver_temp: f32,
    /// Model identifier.
    pub model: String,
    /// Interaction mode.
    pub mode: Mode,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Vi key bindings in the REPL.
    pub vi_mode: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::fallback()
    }
}

impl UserSettings {
    /// Settings written on first run.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            generator_temps: vec![0.7, 0.7, 0.7],
            researcher_temp: 0.5,
            resolver_temp: 0.5,
            model: DEFAULT_MODEL.to_string(),
            mode: Mode::Resolver,
            verbosity: Verbosity::Some,
            vi_mode: false,
        }
    }

    /// Number of generator agents.
    #[must_use]
    pub fn num_agents(&self) -> usize {
        self.generator_temps.len()
    }

    /// Creates the user directory and writes fallback settings if the
    /// settings file does not exist yet. Returns the settings path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the directory or file cannot be written.
    pub fn check(dir: &UserDir) -> Result<PathBuf, ConfigError> {
        dir.ensure()?;
        let path = dir.settings_path();
        if !path.exists() {
            Self::fallback().save(&path)?;
        }
        Ok(path)
    }

    /// Runs [`check`](Self::check) and loads the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be created, read or parsed.
    pub fn default_for(dir: &UserDir) -> Result<Self, ConfigError> {
        let path = Self::check(dir)?;
        Self::load(&path)
    }

    /// Reads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` is not a file and
    /// [`ConfigError::Parse`] if it is not valid settings YAML.
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
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes settings as YAML, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        let text = serde_yaml::to_string(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(path.to_path_buf())
    }

    /// Applies these settings to an orchestrator config builder.
    #[must_use]
    pub fn apply(&self, builder: OrchestratorConfigBuilder) -> OrchestratorConfigBuilder {
        builder
            .model(self.model.clone())
            .mode(self.mode)
            .generator_temperatures(self.generator_temps.clone())
            .researcher_temperature(self.researcher_temp)
            .resolver_temperature(self.resolver_temp)
            .verbosity(self.verbosity)
    }

    fn fields(&self) -> [(&'static str, String); 7] {
        [
            ("generator_temps", format!("{:?}", self.generator_temps)),
            ("researcher_temp", self.researcher_temp.to_string()),
            ("resolver_temp", self.resolver_temp.to_string()),
            ("model", self.model.clone()),
            ("mode", self.mode.to_string()),
            ("verbosity", self.verbosity.to_string()),
            ("vi_mode", self.vi_mode.to_string()),
        ]
    }
}

/// Renders the settings as a tree:
///
/// ```text
///     Settings
///     ├── generator_temps = [0.7, 0.7, 0.7]
///     ...
///     └── vi_mode         = false
/// ```
impl fmt::Display for UserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MARGIN: &str = "    ";
        let fields = self.fields();
        let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        writeln!(f)?;
        writeln!(f, "{MARGIN}Settings")?;
        for (idx, (name, value)) in fields.iter().enumerate() {
            let branch = if idx + 1 == fields.len() { "└── " } else { "├── " };
            writeln!(f, "{MARGIN}{branch}{name:<width$} = {value}")?;
        }
        Ok(())
    }
}
