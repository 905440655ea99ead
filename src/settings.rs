use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::viewer::state::{DEFAULT_SCALE, ViewerState};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "pagemark.yaml";

/// Engine and CLI defaults, loaded from a versioned YAML file.
///
/// Every field has a serde default so configs written by older versions
/// keep loading; a malformed file logs a warning and falls back to the
/// defaults instead of failing the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Zoom factor documents open at
    #[serde(default = "default_scale")]
    pub default_scale: f32,

    /// Start with the PII-only overlay filter enabled
    #[serde(default)]
    pub pii_only: bool,

    /// Where annotation sidecar files live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations_dir: Option<PathBuf>,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_scale() -> f32 {
    DEFAULT_SCALE
}

fn default_log_file() -> PathBuf {
    PathBuf::from("pagemark.log")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_scale: default_scale(),
            pii_only: false,
            annotations_dir: None,
            log_file: default_log_file(),
        }
    }
}

impl Settings {
    /// Resolve the config path: `PAGEMARK_CONFIG` wins, otherwise
    /// `pagemark.yaml` in the working directory.
    fn config_path() -> PathBuf {
        std::env::var("PAGEMARK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(SETTINGS_FILENAME))
    }

    #[must_use]
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };

        match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                settings.default_scale = ViewerState::clamp_scale(settings.default_scale);
                settings
            }
            Err(err) => {
                warn!("malformed settings file {}: {err}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;
        let yaml = serde_yaml::to_string(self).context("Failed to serialize settings")?;
        fs::write(path, yaml).context("Failed to write settings file")
    }
}
