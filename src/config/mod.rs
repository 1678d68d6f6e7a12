//! Configuration management for Ledge
//!
//! This module handles loading, parsing, and validating the panel
//! configuration from TOML files: strip geometry, the row layout
//! constants, the host cursor, and the plugins launched into the
//! embedded display.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/ledge/ledge.toml";

/// Main configuration struct containing all panel settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PanelConfig {
    /// Panel strip settings
    #[serde(default)]
    pub panel: StripConfig,

    /// Row layout of plugin windows
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Host cursor settings
    #[serde(default)]
    pub cursor: CursorConfig,

    /// Plugin clients
    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// The layer-shell strip anchored to the bottom edge of the host output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StripConfig {
    /// Strip height in pixels, also used as the exclusive zone
    pub height: u32,

    /// Layer-shell namespace announced to the host
    pub namespace: String,

    /// Clear colour behind the plugin windows (RGBA, 0.0-1.0)
    pub background: [f32; 4],
}

/// Fixed spacing of the horizontal window row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance of the first window from the strip's top-left corner
    pub margin: i32,

    /// Gap between neighbouring windows
    pub padding: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CursorConfig {
    /// Cursor theme name; `None` defers to `XCURSOR_THEME` or the system default
    pub theme: Option<String>,

    /// Cursor size in pixels
    pub size: u32,

    /// Cursor image shown while the pointer is over the panel
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PluginsConfig {
    /// Shell commands started once the embedded display is listening
    pub commands: Vec<String>,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            height: 40,
            namespace: "ledge".to_string(),
            background: [0.1, 0.1, 0.12, 1.0],
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 3,
            padding: 3,
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            theme: None,
            size: 24,
            image: "default".to_string(),
        }
    }
}

/// Expand a leading `~` to `$HOME`
pub fn expand_home<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.to_string_lossy().starts_with('~') {
        let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
        Ok(Path::new(&home).join(path.strip_prefix("~").unwrap_or(path)))
    } else {
        Ok(path.to_path_buf())
    }
}

impl PanelConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_home(path)?;

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: PanelConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.panel.height == 0 {
            anyhow::bail!("Invalid panel height: must be greater than 0");
        }

        if self.panel.namespace.is_empty() {
            anyhow::bail!("Invalid panel namespace: must not be empty");
        }

        if self
            .panel
            .background
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            anyhow::bail!("Invalid background colour: components must be between 0.0 and 1.0");
        }

        if self.layout.margin < 0 || self.layout.padding < 0 {
            anyhow::bail!(
                "Invalid layout: margin ({}) and padding ({}) must not be negative",
                self.layout.margin,
                self.layout.padding
            );
        }

        if self.cursor.size == 0 {
            anyhow::bail!("Invalid cursor size: must be greater than 0");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;

#[cfg(test)]
mod property_tests;
