//! Persistent editor preferences (`settings.json` in the platform config
//! directory).

use crate::codec::to_pretty_json;
use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";
const APP_DIR: &str = "dash-builder";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// User preferences. Missing keys take their defaults so older files keep
/// loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Where open/save dialogs start.
    pub default_dir: PathBuf,
    pub autosave: bool,
    pub show_grid: bool,
    /// Arrow keys nudge the selection.
    pub kbd_control: bool,
    pub theme: Theme,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_dir: dirs_next::document_dir().unwrap_or_else(|| PathBuf::from(".")),
            autosave: true,
            show_grid: true,
            kbd_control: false,
            theme: Theme::Light,
        }
    }
}

/// Platform config directory for this application.
///
/// - Linux: ~/.config/dash-builder
/// - macOS: ~/Library/Application Support/dash-builder
/// - Windows: %APPDATA%\dash-builder
pub fn config_dir() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl EditorSettings {
    pub fn default_path() -> PathBuf {
        config_dir().join(SETTINGS_FILE)
    }

    /// Load from the default location.
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// A missing file yields defaults; an unreadable one is logged and
    /// also yields defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("cannot read {}: {e}; using default settings", path.display());
                return Self::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            log::warn!("corrupt settings in {}: {e}; using defaults", path.display());
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), CodecError> {
        self.save_to(Self::default_path())
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, to_pretty_json(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EditorSettings::load_from(dir.path().join(SETTINGS_FILE));
        assert_eq!(settings, EditorSettings::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ theme: ").unwrap();
        assert_eq!(EditorSettings::load_from(&path), EditorSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = EditorSettings {
            theme: Theme::Dark,
            kbd_control: true,
            ..EditorSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(EditorSettings::load_from(&path), settings);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"show_grid": false}"#).unwrap();
        let settings = EditorSettings::load_from(&path);
        assert!(!settings.show_grid);
        assert!(settings.autosave);
    }
}
