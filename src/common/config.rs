use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::sys::event::ModifierName;

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ledge")
        .join("ledge.toml")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub focus: FocusSettings,
    pub mouse: MouseSettings,
    pub decoration: DecorationSettings,
    pub geometry: GeometryConfig,
    pub root: RootSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FocusPolicy {
    /// Focus follows the pointer as it enters windows.
    #[default]
    Enter,
    /// Focus changes only when a window is clicked.
    Click,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FocusSettings {
    pub policy: FocusPolicy,
    /// Two pointer entries closer together than this defer the focus change.
    pub delay_ms: u64,
}

impl Default for FocusSettings {
    fn default() -> Self {
        FocusSettings {
            policy: FocusPolicy::Enter,
            delay_ms: 50,
        }
    }
}

impl FocusSettings {
    pub fn delay(&self) -> Duration { Duration::from_millis(self.delay_ms) }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MouseSettings {
    pub move_button: u8,
    pub resize_button: u8,
    pub hide_button: u8,
    /// Held while releasing the hide button to lower the window instead.
    pub lower_modifier: ModifierName,
}

impl Default for MouseSettings {
    fn default() -> Self {
        MouseSettings {
            move_button: 2,
            resize_button: 1,
            hide_button: 3,
            lower_modifier: ModifierName::Shift,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DecorationSettings {
    pub border_width: i32,
    pub title_height: i32,
    pub focused_color: String,
    pub unfocused_color: String,
    pub font: String,
}

impl Default for DecorationSettings {
    fn default() -> Self {
        DecorationSettings {
            border_width: 3,
            title_height: 18,
            focused_color: "#3a5f8a".to_string(),
            unfocused_color: "#8a8a8a".to_string(),
            font: "fixed".to_string(),
        }
    }
}

impl DecorationSettings {
    pub fn focused_pixel(&self) -> u32 {
        parse_color(&self.focused_color).unwrap_or(0x3a5f8a)
    }

    pub fn unfocused_pixel(&self) -> u32 {
        parse_color(&self.unfocused_color).unwrap_or(0x8a8a8a)
    }
}

fn parse_color(s: &str) -> Option<u32> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeometryConfig {
    /// Pixels a moved window may cross a monitor edge before it stops resisting.
    pub edge_resistance: i32,
}

impl Default for GeometryConfig {
    fn default() -> Self { GeometryConfig { edge_resistance: 16 } }
}

/// What a button press on the background does.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RootAction {
    #[default]
    None,
    /// Pop up the menu of hidden windows.
    Menu,
    /// Run a shell command.
    Command(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RootSettings {
    pub button1: RootAction,
    pub button2: RootAction,
    pub button3: RootAction,
}

impl Default for RootSettings {
    fn default() -> Self {
        RootSettings {
            button1: RootAction::Command("xterm".to_string()),
            button2: RootAction::Menu,
            button3: RootAction::Menu,
        }
    }
}

impl RootSettings {
    pub fn action_for(&self, button: u8) -> &RootAction {
        static NO_ACTION: RootAction = RootAction::None;
        match button {
            1 => &self.button1,
            2 => &self.button2,
            3 => &self.button3,
            _ => &NO_ACTION,
        }
    }
}

impl Config {
    /// Reads and validates the configuration at `path`.
    pub fn read(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate();
        Ok(config)
    }

    /// Loads the configuration, falling back to defaults on any error.
    pub fn load(path: Option<&Path>) -> Config {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_file);
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Config::default();
        }
        match Config::read(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Config::default()
            }
        }
    }

    /// Replaces out-of-range values with their defaults.
    pub fn validate(&mut self) {
        let defaults = Settings::default();
        let s = &mut self.settings;

        let valid_button = |b: u8| (1..=5).contains(&b);
        if !valid_button(s.mouse.move_button) {
            warn!(value = s.mouse.move_button, "invalid mouse.move_button");
            s.mouse.move_button = defaults.mouse.move_button;
        }
        if !valid_button(s.mouse.resize_button) {
            warn!(value = s.mouse.resize_button, "invalid mouse.resize_button");
            s.mouse.resize_button = defaults.mouse.resize_button;
        }
        if !valid_button(s.mouse.hide_button) {
            warn!(value = s.mouse.hide_button, "invalid mouse.hide_button");
            s.mouse.hide_button = defaults.mouse.hide_button;
        }
        if s.decoration.border_width < 0 {
            warn!(value = s.decoration.border_width, "invalid decoration.border_width");
            s.decoration.border_width = defaults.decoration.border_width;
        }
        if s.decoration.title_height < 0 {
            warn!(value = s.decoration.title_height, "invalid decoration.title_height");
            s.decoration.title_height = defaults.decoration.title_height;
        }
        if parse_color(&s.decoration.focused_color).is_none() {
            warn!(value = %s.decoration.focused_color, "invalid decoration.focused_color");
            s.decoration.focused_color = defaults.decoration.focused_color.clone();
        }
        if parse_color(&s.decoration.unfocused_color).is_none() {
            warn!(value = %s.decoration.unfocused_color, "invalid decoration.unfocused_color");
            s.decoration.unfocused_color = defaults.decoration.unfocused_color.clone();
        }
        if s.geometry.edge_resistance < 0 {
            warn!(value = s.geometry.edge_resistance, "invalid geometry.edge_resistance");
            s.geometry.edge_resistance = defaults.geometry.edge_resistance;
        }
        if s.focus.delay_ms == 0 || s.focus.delay_ms > 10_000 {
            warn!(value = s.focus.delay_ms, "invalid focus.delay_ms");
            s.focus.delay_ms = defaults.focus.delay_ms;
        }
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
