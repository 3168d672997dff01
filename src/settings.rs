use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Viewer settings persisted between sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folder the folder browser starts in
    pub dicom_path: PathBuf,
    pub save_last_path: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dicom_path: home_dir(),
            save_last_path: true,
        }
    }
}

impl Settings {
    /// Settings file in the user's home directory
    pub fn default_location() -> PathBuf {
        home_dir().join(SETTINGS_FILE_NAME)
    }

    /// Reads settings from `path`; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let text = toml::to_string(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Records the last opened folder when remembering it is enabled
    pub fn remember_folder(&mut self, folder: impl Into<PathBuf>) -> bool {
        if !self.save_last_path {
            return false;
        }
        self.dicom_path = folder.into();
        true
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
