//! Path management for gemchat configuration, state and logs.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/gemchat/           # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/                    # Application logs
//!     └── gemchat.log.YYYY-MM-DD
//!
//! ~/.local/share/gemchat/      # State directory
//! └── gemini-storage.json      # Persisted app snapshot
//! ```

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "gemchat";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform has no config or data directory for this user.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolved directories for one gemchat process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemchatPaths {
    config_dir: PathBuf,
    state_dir: PathBuf,
}

impl GemchatPaths {
    /// Resolves platform defaults, applying any explicit overrides.
    pub fn resolve(
        config_dir: Option<PathBuf>,
        state_dir: Option<PathBuf>,
    ) -> Result<Self, PathError> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => Self::default_config_dir()?,
        };
        let state_dir = match state_dir {
            Some(dir) => dir,
            None => Self::default_state_dir()?,
        };
        Ok(Self {
            config_dir,
            state_dir,
        })
    }

    /// Both directories rooted under `base`. Used by tests.
    pub fn under(base: &Path) -> Self {
        Self {
            config_dir: base.join("config"),
            state_dir: base.join("state"),
        }
    }

    pub fn default_config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn default_state_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    /// Replaces the state directory, e.g. from `[storage] state_dir`.
    pub fn with_state_dir(mut self, state_dir: PathBuf) -> Self {
        self.state_dir = state_dir;
        self
    }
}
