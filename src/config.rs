//! Application configuration.
//!
//! The configuration is loaded from a JSON file at
//! `$XDG_CONFIG_HOME/smallwm/config.json`.  The top-level schema groups
//! settings into sections so the file can be extended later without
//! breaking backward compatibility.
//!
//! # Example
//!
//! ```json
//! {
//!   "icons": {
//!     "width": 75,
//!     "height": 20,
//!     "label_chars": 10
//!   },
//!   "decoration": {
//!     "border_width": 3
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Icon row geometry and labelling.
    #[serde(default)]
    pub icons: IconConfig,

    /// Decoration applied to every managed window.
    #[serde(default)]
    pub decoration: DecorationConfig,
}

/// Icon row settings.
///
/// Icons are packed left-to-right, top-to-bottom from the top-left corner
/// of the screen.  A maximized window is placed below one icon row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Width of one icon in pixels.  Default: `75`.
    pub width: u32,
    /// Height of one icon (and of the reserved icon row) in pixels.
    /// Default: `20`.
    pub height: u32,
    /// Maximum number of title characters drawn on an icon.  Default: `10`.
    pub label_chars: usize,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            width: 75,
            height: 20,
            label_chars: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Border width set on every managed window.  Default: `3`.
    pub border_width: u32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self { border_width: 3 }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the icon layout cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.icons.width == 0 || self.icons.height == 0 {
            return Err(ConfigError(format!(
                "icon size must be non-zero, got {}x{}",
                self.icons.width, self.icons.height
            )));
        }
        Ok(())
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
