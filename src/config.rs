use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout direction. The four orthogonal directions map onto the layered
/// algorithm; `Radial` spreads branches around the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Down,
    Up,
    Right,
    Left,
    Radial,
}

impl Direction {
    pub fn is_radial(self) -> bool {
        matches!(self, Direction::Radial)
    }

    /// Token used in the backend's textual option protocol.
    pub fn option_token(self) -> &'static str {
        match self {
            Direction::Down => "DOWN",
            Direction::Up => "UP",
            Direction::Right => "RIGHT",
            Direction::Left => "LEFT",
            Direction::Radial => "RADIAL",
        }
    }
}

/// Options for a single layout invocation. Immutable once passed in; the
/// engine never sees a config that changes mid-computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub direction: Direction,
    /// Minimum gap between sibling nodes.
    pub node_spacing: f32,
    /// Gap between consecutive layers (ranks).
    pub layer_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Down,
            node_spacing: 32.0,
            layer_spacing: 64.0,
        }
    }
}

/// Lifecycle options for the computation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Wall-clock budget for one layout call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk configuration: layout defaults plus backend options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub backend: BackendConfig,
}

impl Config {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"layout": {"direction": "RADIAL"}}"#).expect("parse");
        assert_eq!(config.layout.direction, Direction::Radial);
        assert_eq!(config.layout.node_spacing, LayoutConfig::default().node_spacing);
        assert_eq!(config.backend.timeout_ms, 10_000);
    }

    #[test]
    fn direction_tokens() {
        assert_eq!(Direction::Down.option_token(), "DOWN");
        assert_eq!(Direction::Radial.option_token(), "RADIAL");
        assert!(Direction::Radial.is_radial());
        assert!(!Direction::Left.is_radial());
    }
}
