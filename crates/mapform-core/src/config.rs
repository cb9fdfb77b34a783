use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub map: MapConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            map: MapConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Pointer travel required before a press becomes a drag.
    #[serde(default = "default_drag_activation_px")]
    pub drag_activation_px: f32,
    /// Quiet window for coalescing title and viewport edits.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_activation_px: default_drag_activation_px(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl EditorConfig {
    #[must_use]
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub default_center_lng: f64,
    #[serde(default = "default_center_lat")]
    pub default_center_lat: f64,
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center_lng: 0.0,
            default_center_lat: default_center_lat(),
            default_zoom: default_zoom(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Preferred output mode: `pretty`, `text`, or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

/// Load `.mapform/config.toml`, falling back to defaults when absent.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig> {
    let path = paths::config_path(root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the user-level config, falling back to defaults when absent.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("mapform/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write the default project config next to a freshly initialized store.
pub fn write_default_project_config(root: &Path) -> Result<()> {
    let path = paths::config_path(root);
    let content = toml::to_string_pretty(&ProjectConfig::default())
        .context("serialize default project config")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
}

const fn default_drag_activation_px() -> f32 {
    crate::gesture::DEFAULT_ACTIVATION_DISTANCE
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_center_lat() -> f64 {
    20.0
}

const fn default_zoom() -> f64 {
    2.0
}

#[cfg(test)]
mod tests {
    use super::{ProjectConfig, load_project_config, write_default_project_config};

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.editor.drag_activation_px, 8.0);
        assert_eq!(cfg.editor.debounce_ms, 500);
        assert_eq!(cfg.map.default_zoom, 2.0);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_dir = dir.path().join(".mapform");
        std::fs::create_dir_all(&config_dir).expect("create .mapform");
        std::fs::write(
            config_dir.join("config.toml"),
            "[editor]\ndebounce_ms = 200\n",
        )
        .expect("write config");

        let cfg = load_project_config(dir.path()).expect("load");
        assert_eq!(cfg.editor.debounce_ms, 200);
        assert_eq!(cfg.editor.drag_activation_px, 8.0);
    }

    #[test]
    fn default_config_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join(".mapform")).expect("create .mapform");
        write_default_project_config(dir.path()).expect("write default");
        let cfg = load_project_config(dir.path()).expect("reload");
        let default = ProjectConfig::default();
        assert_eq!(cfg.editor.debounce_ms, default.editor.debounce_ms);
        assert_eq!(cfg.map.default_center_lat, default.map.default_center_lat);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_dir = dir.path().join(".mapform");
        std::fs::create_dir_all(&config_dir).expect("create .mapform");
        std::fs::write(config_dir.join("config.toml"), "editor = \"nope\"").expect("write");
        assert!(load_project_config(dir.path()).is_err());
    }
}
