use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{DEFAULT_DUE_SOON_DAYS, TaskFilter};
use crate::utils::{self, Profile};

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Empty means the profile's default location
    #[serde(default)]
    pub database_path: String,
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width_percent: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub default_task_filter: TaskFilter,
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
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
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_toggle_task")]
    pub toggle_task: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_switch_focus")]
    pub switch_focus: String,
    #[serde(default = "default_toggle_sidebar")]
    pub toggle_sidebar: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_help")]
    pub help: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    /// Empty means "pick a readable color for highlight_bg"
    #[serde(default)]
    pub highlight_fg: String,
    #[serde(default = "default_accent")]
    pub accent: String,
    #[serde(default = "default_warning")]
    pub warning: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: String::new(),
            sidebar_width_percent: default_sidebar_width(),
            log_level: default_log_level(),
            default_task_filter: TaskFilter::default(),
            due_soon_days: default_due_soon_days(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes: HashMap::new(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            edit: default_edit(),
            delete: default_delete(),
            toggle_task: default_toggle_task(),
            search: default_search(),
            filter: default_filter(),
            switch_focus: default_switch_focus(),
            toggle_sidebar: default_toggle_sidebar(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            save: default_save(),
            help: default_help(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: String::new(),
            accent: default_accent(),
            warning: default_warning(),
        }
    }
}

impl Theme {
    /// Themes that are always available
    pub fn presets() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert(
            "light".to_string(),
            Theme {
                fg: "black".to_string(),
                bg: "white".to_string(),
                highlight_bg: "blue".to_string(),
                highlight_fg: "white".to_string(),
                accent: "blue".to_string(),
                warning: "red".to_string(),
            },
        );

        themes.insert(
            "monochrome".to_string(),
            Theme {
                fg: "white".to_string(),
                bg: "black".to_string(),
                highlight_bg: "white".to_string(),
                highlight_fg: "black".to_string(),
                accent: "white".to_string(),
                warning: "white".to_string(),
            },
        );

        themes
    }
}

fn default_sidebar_width() -> u16 {
    35
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_due_soon_days() -> i64 {
    DEFAULT_DUE_SOON_DAYS
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_toggle_task() -> String {
    "Space".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_filter() -> String {
    "f".to_string()
}

fn default_switch_focus() -> String {
    "Tab".to_string()
}

fn default_toggle_sidebar() -> String {
    "b".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_help() -> String {
    "F1".to_string()
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
    "blue".to_string()
}

fn default_accent() -> String {
    "green".to_string()
}

fn default_warning() -> String {
    "yellow".to_string()
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
    #[error("Invalid key binding for {action}: {reason}")]
    InvalidKeyBinding { action: &'static str, reason: String },
}

impl Config {
    /// Load configuration for a profile, creating the default file if missing
    pub fn load_with_profile(profile: Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path, profile)
    }

    /// Load configuration from an explicit file, creating it with defaults if missing.
    /// `profile` only decides where the database lives when the file doesn't say.
    pub fn load_from_path(path: &Path, profile: Profile) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents =
                fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
            toml::from_str::<Config>(&contents)?
        } else {
            let mut config = Config::default();
            config.save_to_path(path)?;
            config
        };

        if config.database_path.trim().is_empty() {
            config.database_path = Self::default_database_path_for_profile(profile);
        }
        config.validate_key_bindings()?;

        Ok(config)
    }

    /// Save configuration to an explicit file
    pub fn save_to_path(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: Profile) -> String {
        match utils::get_data_dir(profile) {
            Some(data_dir) => data_dir.join("goalpost.db").to_string_lossy().to_string(),
            None => format!("~/.local/share/{}/goalpost.db", profile.app_name()),
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Directory for the log file, next to the database
    pub fn get_log_dir(&self) -> PathBuf {
        self.get_database_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Reject unparsable bindings up front rather than ignoring keys later
    fn validate_key_bindings(&self) -> Result<(), ConfigError> {
        let kb = &self.key_bindings;
        let bindings: [(&'static str, &str); 13] = [
            ("quit", &kb.quit),
            ("new", &kb.new),
            ("edit", &kb.edit),
            ("delete", &kb.delete),
            ("toggle_task", &kb.toggle_task),
            ("search", &kb.search),
            ("filter", &kb.filter),
            ("switch_focus", &kb.switch_focus),
            ("toggle_sidebar", &kb.toggle_sidebar),
            ("list_up", &kb.list_up),
            ("list_down", &kb.list_down),
            ("save", &kb.save),
            ("help", &kb.help),
        ];
        for (action, binding) in bindings {
            utils::parse_key_binding(binding)
                .map_err(|reason| ConfigError::InvalidKeyBinding { action, reason })?;
        }
        Ok(())
    }

    /// Get the currently active theme; an empty highlight_fg is derived from highlight_bg
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = self
            .themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::presets().remove(&self.current_theme))
            .unwrap_or_default();

        if theme.highlight_fg.is_empty() {
            let calculated = get_contrast_text_color(parse_color(&theme.highlight_bg));
            theme.highlight_fg = format_color_for_display(&calculated);
        }

        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from_path(&path, Profile::Dev).unwrap();
        assert!(path.exists());
        assert_eq!(config.key_bindings.quit, "q");
        assert_eq!(config.due_soon_days, DEFAULT_DUE_SOON_DAYS);
        assert!(!config.database_path.is_empty());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "database_path = \"/tmp/goals.db\"\ndefault_task_filter = \"pending\"\n\n[key_bindings]\nquit = \"x\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path, Profile::Prod).unwrap();
        assert_eq!(config.get_database_path(), PathBuf::from("/tmp/goals.db"));
        assert_eq!(config.default_task_filter, TaskFilter::Pending);
        assert_eq!(config.key_bindings.quit, "x");
        assert_eq!(config.key_bindings.new, "n");
        assert_eq!(config.get_log_dir(), PathBuf::from("/tmp"));
    }

    #[test]
    fn bad_key_binding_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[key_bindings]\nsearch = \"Hyper+x\"\n").unwrap();

        let err = Config::load_from_path(&path, Profile::Prod).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKeyBinding { action: "search", .. }));
    }

    #[test]
    fn saved_config_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.due_soon_days = 7;
        config.current_theme = "light".to_string();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path, Profile::Prod).unwrap();
        assert_eq!(loaded.due_soon_days, 7);
        assert_eq!(loaded.current_theme, "light");
    }

    #[test]
    fn themes_resolve_with_fallbacks() {
        let mut config = Config::default();
        config.current_theme = "nope".to_string();

        let theme = config.get_active_theme();
        assert_eq!(theme.highlight_bg, "blue");
        assert_eq!(theme.highlight_fg, "white");

        config.themes.insert(
            "ocean".to_string(),
            Theme { accent: "cyan".to_string(), ..Theme::default() },
        );
        config.current_theme = "ocean".to_string();
        assert_eq!(config.get_active_theme().accent, "cyan");
    }
}
