//! Configuration module for lumenbind
//!
//! This module handles:
//! - Engine configuration (`lumenbind.toml`): frame rate, logging, script modifiers
//! - Profile files (`.lumenprofile`): the saved bindings of a lighting profile
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.hxyulin.lumenbind/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.lumenbind/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.lumenbind\`
//!
//! # Example
//!
//! ```ignore
//! use lumenbind::config::{EngineConfig, ProfileFile};
//!
//! let config = EngineConfig::load_or_default(None);
//! let profile = ProfileFile::load("desk.lumenprofile")?;
//! for binding in &profile.bindings {
//!     println!("{}", binding.identifier);
//! }
//! ```

use crate::error::{BindingError, Result};
use crate::storage::DataBindingEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.hxyulin.lumenbind";

/// Engine config filename
pub const CONFIG_FILE: &str = "lumenbind.toml";

/// Profile file extension
pub const PROFILE_FILE_EXTENSION: &str = "lumenprofile";

/// Default render rate in Hz
pub const DEFAULT_FRAME_RATE_HZ: u32 = 60;

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,lumenbind=debug";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        BindingError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            BindingError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the engine config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Engine Config ====================

/// A user-defined script modifier, registered at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptModifierConfig {
    /// Name shown in the modifier list
    pub name: String,
    /// Rhai expression over `value` and `param`
    pub source: String,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Frames per second of the player loop
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,

    /// Number of frames to play, `0` runs until interrupted
    #[serde(default)]
    pub frames: u64,

    /// Log filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Directory for daily rolling log files, if file logging is wanted
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Easing time given to bindings created without one
    #[serde(default)]
    pub default_easing_ms: u64,

    /// Script modifiers to register
    #[serde(default)]
    pub script_modifiers: Vec<ScriptModifierConfig>,
}

fn default_frame_rate_hz() -> u32 {
    DEFAULT_FRAME_RATE_HZ
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            frames: 0,
            log_filter: default_log_filter(),
            log_dir: None,
            default_easing_ms: 0,
            script_modifiers: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load the engine config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BindingError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            BindingError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })
    }

    /// Load from `path`, or from the app data directory when `None`.
    /// Returns defaults on any error.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match config_path() {
                Some(path) if path.exists() => path,
                _ => return Self::default(),
            },
        };
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the engine config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BindingError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BindingError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            BindingError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }

    /// Frame period derived from `frame_rate_hz`
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.frame_rate_hz.max(1) as f64)
    }
}

// ==================== Profile File ====================

/// A saved lighting profile: one record per bound layer property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFile {
    /// Version for future migration support
    #[serde(default = "default_profile_version")]
    pub version: u32,

    /// Profile name
    pub name: String,

    /// When the profile was last saved
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,

    /// Bindings of the profile's layer properties
    #[serde(default)]
    pub bindings: Vec<DataBindingEntity>,
}

fn default_profile_version() -> u32 {
    1
}

impl ProfileFile {
    /// Create an empty profile
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            saved_at: Utc::now(),
            bindings: Vec::new(),
        }
    }

    pub fn with_bindings(mut self, bindings: Vec<DataBindingEntity>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Find the binding record for a layer property
    pub fn binding(&self, identifier: &str) -> Option<&DataBindingEntity> {
        self.bindings.iter().find(|b| b.identifier == identifier)
    }

    /// Load a profile file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BindingError::Config(format!("Failed to read profile {:?}: {}", path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            BindingError::Config(format!("Failed to parse profile {:?}: {}", path, e))
        })
    }

    /// Save the profile as JSON, stamping `saved_at`
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BindingError::Config(format!("Failed to create profile directory: {}", e))
            })?;
        }

        self.saved_at = Utc::now();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BindingError::Config(format!("Failed to serialize profile: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            BindingError::Config(format!("Failed to write profile {:?}: {}", path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Easing;
    use crate::storage::{DataBindingModeEntity, DirectDataBindingEntity};

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.frame_rate_hz, DEFAULT_FRAME_RATE_HZ);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(config.script_modifiers.is_empty());
    }

    #[test]
    fn test_engine_config_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            frame_rate_hz = 30

            [[script_modifiers]]
            name = "Invert"
            source = "1.0 - value"
            "#,
        )
        .unwrap();
        assert_eq!(config.frame_rate_hz, 30);
        assert_eq!(config.frames, 0);
        assert_eq!(config.script_modifiers[0].name, "Invert");
    }

    #[test]
    fn test_engine_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = EngineConfig {
            frames: 120,
            log_dir: Some(dir.path().join("logs")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_engine_config_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "frame_rate_hz = \"fast\"").unwrap();
        assert!(EngineConfig::load(&path).is_err());
        assert_eq!(EngineConfig::load_or_default(Some(&path)), EngineConfig::default());
    }

    #[test]
    fn test_frame_interval() {
        let config = EngineConfig {
            frame_rate_hz: 50,
            ..Default::default()
        };
        assert_eq!(config.frame_interval().as_millis(), 20);
    }

    #[test]
    fn test_profile_file_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk").with_extension(PROFILE_FILE_EXTENSION);
        let mut profile = ProfileFile::new("Desk").with_bindings(vec![DataBindingEntity {
            identifier: "brush.color".to_string(),
            mode: Some(DataBindingModeEntity::Direct(DirectDataBindingEntity::default())),
            easing_time_ms: 200,
            easing: Easing::EaseIn,
        }]);
        profile.save(&path).unwrap();

        let loaded = ProfileFile::load(&path).unwrap();
        assert_eq!(loaded, profile);
        assert!(loaded.binding("brush.color").is_some());
        assert!(loaded.binding("brush.size").is_none());
    }

    #[test]
    fn test_profile_missing_file() {
        let err = ProfileFile::load("/nonexistent/profile.lumenprofile").unwrap_err();
        assert!(matches!(err, BindingError::Config(_)));
    }
}
