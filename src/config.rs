use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// First day of the semester (YYYY-MM-DD), used for the progress gauge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester_end: Option<String>,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_quick_add")]
    pub quick_add: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_grab")]
    pub grab: String,
    #[serde(default = "default_toggle")]
    pub toggle: String,
    #[serde(default = "default_prev_week")]
    pub prev_week: String,
    #[serde(default = "default_next_week")]
    pub next_week: String,
    #[serde(default = "default_today")]
    pub today: String,
    #[serde(default = "default_class_preset")]
    pub class_preset: String,
    #[serde(default = "default_assignment_preset")]
    pub assignment_preset: String,
    #[serde(default = "default_exam_preset")]
    pub exam_preset: String,
    #[serde(default = "default_study_preset")]
    pub study_preset: String,
    #[serde(default = "default_cycle_priority")]
    pub cycle_priority: String,
    #[serde(default = "default_cycle_status")]
    pub cycle_status: String,
    #[serde(default = "default_cycle_sort")]
    pub cycle_sort: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_tab_1")]
    pub tab_1: String,
    #[serde(default = "default_tab_2")]
    pub tab_2: String,
    #[serde(default = "default_tab_3")]
    pub tab_3: String,
    #[serde(default = "default_tab_4")]
    pub tab_4: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_tab_bg")]
    pub tab_bg: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut themes = HashMap::new();

        // Example custom theme for users to see how to define themes
        themes.insert("lilac".to_string(), Theme {
            fg: "lavender".to_string(),
            bg: "black".to_string(),
            highlight_bg: "purple".to_string(),
            highlight_fg: "white".to_string(),
            tab_bg: "darkgray".to_string(),
        });

        Self {
            storage_path: default_storage_path(),
            log_level: default_log_level(),
            refresh_interval_secs: default_refresh_interval_secs(),
            semester_start: None,
            semester_end: None,
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes,
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            quick_add: default_quick_add(),
            edit: default_edit(),
            delete: default_delete(),
            grab: default_grab(),
            toggle: default_toggle(),
            prev_week: default_prev_week(),
            next_week: default_next_week(),
            today: default_today(),
            class_preset: default_class_preset(),
            assignment_preset: default_assignment_preset(),
            exam_preset: default_exam_preset(),
            study_preset: default_study_preset(),
            cycle_priority: default_cycle_priority(),
            cycle_status: default_cycle_status(),
            cycle_sort: default_cycle_sort(),
            search: default_search(),
            help: default_help(),
            tab_1: default_tab_1(),
            tab_2: default_tab_2(),
            tab_3: default_tab_3(),
            tab_4: default_tab_4(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            tab_bg: default_tab_bg(),
        }
    }
}

impl Theme {
    /// Get preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("dark".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "purple".to_string(),
            highlight_fg: "white".to_string(),
            tab_bg: "darkgray".to_string(),
        });

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            highlight_bg: "lavender".to_string(),
            highlight_fg: "".to_string(),
            tab_bg: "gray".to_string(),
        });

        themes.insert("monochrome".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "white".to_string(),
            highlight_fg: "black".to_string(),
            tab_bg: "gray".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_storage_path() -> String {
    // This is a fallback - actual profile will be determined at load time
    Config::default_storage_path_for_profile(utils::Profile::Prod)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_quick_add() -> String {
    "a".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_grab() -> String {
    "g".to_string()
}

fn default_toggle() -> String {
    "Space".to_string()
}

fn default_prev_week() -> String {
    "[".to_string()
}

fn default_next_week() -> String {
    "]".to_string()
}

fn default_today() -> String {
    "t".to_string()
}

fn default_class_preset() -> String {
    "C".to_string()
}

fn default_assignment_preset() -> String {
    "A".to_string()
}

fn default_exam_preset() -> String {
    "X".to_string()
}

fn default_study_preset() -> String {
    "S".to_string()
}

fn default_cycle_priority() -> String {
    "p".to_string()
}

fn default_cycle_status() -> String {
    "f".to_string()
}

fn default_cycle_sort() -> String {
    "o".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_tab_1() -> String {
    "1".to_string()
}

fn default_tab_2() -> String {
    "2".to_string()
}

fn default_tab_3() -> String {
    "3".to_string()
}

fn default_tab_4() -> String {
    "4".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "lavender".to_string()
}

fn default_highlight_fg() -> String {
    "black".to_string()
}

fn default_tab_bg() -> String {
    "darkgray".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid semester date '{0}', expected YYYY-MM-DD")]
    InvalidSemesterDate(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and storage paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let mut config = Self::load_from_path(&config_path)?;
            // A config copied between profiles must not share storage
            if config.storage_path == default_storage_path() {
                config.storage_path = Self::default_storage_path_for_profile(profile);
            }
            Ok(config)
        } else {
            let mut config = Config {
                storage_path: Self::default_storage_path_for_profile(profile),
                ..Config::default()
            };
            config.save_to_path(&config_path)?;
            Ok(config)
        }
    }

    /// Load an explicit config file (`--config PATH`); it must exist
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default storage path for a specific profile
    fn default_storage_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("planner.db").to_string_lossy().to_string()
        } else {
            format!("~/.local/share/{}/planner.db", profile.app_name())
        }
    }

    /// Get the expanded storage path (with ~ expansion)
    pub fn get_storage_path(&self) -> PathBuf {
        utils::expand_path(&self.storage_path)
    }

    /// Directory holding the rolling log files, next to the storage file
    pub fn get_log_dir(&self) -> PathBuf {
        self.get_storage_path()
            .parent()
            .map(|dir| dir.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    /// Configured semester window, if both ends are set
    pub fn semester(&self) -> Option<(chrono::NaiveDate, chrono::NaiveDate)> {
        let start = utils::parse_date(self.semester_start.as_deref()?).ok()?;
        let end = utils::parse_date(self.semester_end.as_deref()?).ok()?;
        Some((start, end))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for date in [&self.semester_start, &self.semester_end].into_iter().flatten() {
            utils::parse_date(date).map_err(|_| ConfigError::InvalidSemesterDate(date.clone()))?;
        }
        Ok(())
    }

    /// Get the currently active theme
    /// If highlight_fg is not set (empty string), it will be calculated from highlight_bg
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = if let Some(theme) = self.themes.get(&self.current_theme) {
            theme.clone()
        } else if let Some(theme) = Theme::get_preset_themes().get(&self.current_theme) {
            theme.clone()
        } else {
            Theme::default()
        };

        if theme.highlight_fg.is_empty() {
            let highlight_bg_color = parse_color(&theme.highlight_bg);
            let calculated_fg = get_contrast_text_color(highlight_bg_color);
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }

        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            log_level = "debug"
            semester_start = "2024-01-15"
            semester_end = "2024-05-10"

            [key_bindings]
            quit = "Ctrl+q"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.key_bindings.quit, "Ctrl+q");
        assert_eq!(config.key_bindings.grab, "g");
        assert!(config.semester().is_some());
    }

    #[test]
    fn explicit_path_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config {
            refresh_interval_secs: 5,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.refresh_interval_secs, 5);
        assert_eq!(loaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn bad_semester_date_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "semester_start = \"Jan 15\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::InvalidSemesterDate(_))
        ));
    }

    #[test]
    fn unknown_theme_falls_back_and_fills_highlight_fg() {
        let config = Config {
            current_theme: "light".to_string(),
            ..Config::default()
        };
        assert!(!config.get_active_theme().highlight_fg.is_empty());

        let config = Config {
            current_theme: "nope".to_string(),
            ..Config::default()
        };
        assert_eq!(config.get_active_theme().highlight_bg, "lavender");
    }
}
