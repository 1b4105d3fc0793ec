use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::style::Rgba;

const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    pub capture_area: String,
    pub capture_fullscreen: String,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            capture_area: "ctrl+shift+a".to_string(),
            capture_fullscreen: "ctrl+shift+s".to_string(),
        }
    }
}

/// User settings. Missing keys fall back to defaults so old files keep loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_save_folder: PathBuf,
    pub auto_copy_to_clipboard: bool,
    pub auto_save: bool,
    pub hotkeys: Hotkeys,
    pub capture_delay_ms: u64,
    pub caret_blink_ms: u64,
    pub eraser_color: Rgba,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_save_folder: default_save_folder(),
            auto_copy_to_clipboard: true,
            auto_save: false,
            hotkeys: Hotkeys::default(),
            capture_delay_ms: 150,
            caret_blink_ms: 500,
            eraser_color: Rgba::WHITE,
        }
    }
}

fn default_save_folder() -> PathBuf {
    let Some(dirs) = UserDirs::new() else {
        return PathBuf::from(".");
    };
    dirs.picture_dir()
        .unwrap_or_else(|| dirs.home_dir())
        .join("SnapNote")
}

impl AppConfig {
    pub fn file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "snapnote", "snapnote").ok_or(EditorError::NoConfigDirectory)?;
        Ok(dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Reads `path`, falling back to defaults. A corrupt file is replaced
    /// with the defaults so the next start is clean.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(EditorError::ConfigIo(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                log::warn!("cannot read config {}: {err}; restoring defaults", path.display());
                let config = Self::default();
                if let Err(err) = config.save(path) {
                    log::warn!("cannot rewrite config {}: {err}", path.display());
                }
                config
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    pub fn caret_blink(&self) -> Duration {
        Duration::from_millis(self.caret_blink_ms.max(1))
    }
}

/// Configuration handed to the editor explicitly instead of read globally.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorContext {
    pub config: AppConfig,
}

impl EditorContext {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snapnote-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "auto_save": true, "hotkeys": { "capture_area": "f1" } }"#)
                .expect("config");
        assert!(config.auto_save);
        assert_eq!(config.hotkeys.capture_area, "f1");
        assert_eq!(config.hotkeys.capture_fullscreen, "ctrl+shift+s");
        assert_eq!(config.capture_delay_ms, 150);
        assert_eq!(config.eraser_color, Rgba::WHITE);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("nested").join(CONFIG_FILE);
        let config = AppConfig {
            caret_blink_ms: 300,
            eraser_color: Rgba::BLACK,
            ..AppConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(AppConfig::load(&path).expect("load"), config);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_is_replaced_with_defaults() {
        let dir = scratch_dir("corrupt");
        let path = dir.join(CONFIG_FILE);
        fs::create_dir_all(&dir).expect("dir");
        fs::write(&path, "{ not json").expect("write");
        let config = AppConfig::load_or_default(&path);
        assert_eq!(config, AppConfig::default());
        assert_eq!(AppConfig::load(&path).expect("rewritten"), AppConfig::default());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = scratch_dir("missing");
        assert_eq!(AppConfig::load_or_default(&dir.join(CONFIG_FILE)), AppConfig::default());
        assert!(!dir.exists());
    }
}
