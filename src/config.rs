//! Startup configuration
//!
//! Filled in by the game's `configure` hook, optionally overlaid from a JSON
//! file, then read-only for the rest of the process.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::display::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::memory::megabytes;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config i/o error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "hammer".to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    /// Bytes reserved for state that lives as long as the process
    pub permanent_memory_size: usize,
    /// Bytes of per-frame scratch, reset before every update
    pub transient_memory_size: usize,
    pub exit_on_escape: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            permanent_memory_size: megabytes(64),
            transient_memory_size: megabytes(128),
            exit_on_escape: true,
        }
    }
}

impl Config {
    /// Load a config file; fields it leaves out take their default
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Apply the fields present in a JSON file on top of `self`.
    /// Fields the file does not mention keep their current value.
    pub fn overlay_file(&self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        self.overlay_str(&json)
    }

    pub fn overlay_str(&self, json: &str) -> Result<Self, ConfigError> {
        let patch: Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(self)?;
        merge_json(&mut merged, patch);
        Ok(serde_json::from_value(merged)?)
    }
}

fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    },
                }
            }
        },
        (slot, value) => *slot = value,
    }
}
