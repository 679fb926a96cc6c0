// SPDX-License-Identifier: MPL-2.0
//! This module handles the crate's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use video_viewport::config::{self, Config};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.view.max_resolution = Some(4.0);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::error::Result;
use crate::viewport::ViewOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "VideoViewport";

/// View section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub min_resolution: Option<f64>,
    #[serde(default)]
    pub max_resolution: Option<f64>,
    #[serde(default)]
    pub zoom_factor: Option<f64>,
    #[serde(default)]
    pub zoom_duration_ms: Option<u64>,
}

/// Playback section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub loop_enabled: Option<bool>,
}

/// Host section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub viewport_width: Option<u32>,
    #[serde(default)]
    pub viewport_height: Option<u32>,
    #[serde(default)]
    pub pixel_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl Config {
    /// Builds validated view options, falling back to defaults for unset fields.
    pub fn view_options(&self) -> Result<ViewOptions> {
        let mut options = ViewOptions::default();
        if let Some(min) = self.view.min_resolution {
            options.min_resolution = min;
        }
        if let Some(max) = self.view.max_resolution {
            options.max_resolution = max;
        }
        if let Some(factor) = self.view.zoom_factor {
            options.zoom_factor = factor;
        }
        if let Some(ms) = self.view.zoom_duration_ms {
            options.zoom_duration = std::time::Duration::from_millis(ms);
        }
        options.validate()?;
        Ok(options)
    }

    pub fn loop_enabled(&self) -> bool {
        self.playback.loop_enabled.unwrap_or(DEFAULT_LOOP)
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (
            self.host.viewport_width.unwrap_or(DEFAULT_VIEWPORT_WIDTH),
            self.host.viewport_height.unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
        )
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.host.pixel_ratio.unwrap_or(DEFAULT_PIXEL_RATIO)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads settings from `path`. A malformed file yields the defaults.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring malformed settings: {err}");
            Ok(Config::default())
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_sections() {
        let config = Config {
            view: ViewConfig {
                min_resolution: Some(0.25),
                max_resolution: Some(4.0),
                zoom_factor: None,
                zoom_duration_ms: Some(100),
            },
            playback: PlaybackConfig {
                loop_enabled: Some(false),
            },
            host: HostConfig::default(),
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[host]\nviewport_width = 320\n").expect("failed to write toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded.viewport_size(), (320, DEFAULT_VIEWPORT_HEIGHT));
        assert!(loaded.loop_enabled());
    }

    #[test]
    fn view_options_apply_overrides() {
        let config = Config {
            view: ViewConfig {
                min_resolution: Some(0.5),
                max_resolution: Some(8.0),
                ..ViewConfig::default()
            },
            ..Config::default()
        };

        let options = config.view_options().expect("options should be valid");
        assert_eq!(options.min_resolution, 0.5);
        assert_eq!(options.max_resolution, 8.0);
        assert_eq!(options.zoom_factor, DEFAULT_ZOOM_FACTOR);
    }

    #[test]
    fn view_options_reject_inverted_bounds() {
        let config = Config {
            view: ViewConfig {
                min_resolution: Some(5.0),
                max_resolution: Some(1.0),
                ..ViewConfig::default()
            },
            ..Config::default()
        };

        assert!(config.view_options().is_err());
    }
}
