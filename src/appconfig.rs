use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// displayed pixels per source pixel
    pub scale: f64,
    pub output_path: PathBuf,
    pub marker_radius: f32,
    /// distance from the click to the left edge of the coordinate label
    pub label_offset: f32,
    /// file picker filter
    pub extensions: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            scale: 1.0,
            output_path: PathBuf::from("image_points.csv"),
            marker_radius: 5.0,
            label_offset: 10.0,
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
        }
    }
}

impl AppSettings {
    pub fn from_toml(s: &str) -> Result<Self> {
        let settings: AppSettings =
            toml::from_str(s).context("Failed to parse AppSettings from TOML")?;
        ensure!(
            settings.scale.is_finite() && settings.scale > 0.,
            "scale must be a positive number, got {}",
            settings.scale
        );
        Ok(settings)
    }
}

pub fn read_settings_from_file<P: AsRef<Path>>(path: P) -> Result<AppSettings> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    AppSettings::from_toml(&s)
}

/// Missing file means defaults, a broken one is logged and ignored.
pub fn load_settings<P: AsRef<Path>>(path: P) -> AppSettings {
    let path = path.as_ref();
    if !path.exists() {
        info!("No {} found, using default settings", path.display());
        return AppSettings::default();
    }

    match read_settings_from_file(path) {
        Ok(settings) => {
            debug!("Loaded settings: {:?}", settings);
            settings
        }
        Err(e) => {
            error!("Failed to read options from file: {:#}", e);
            AppSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = AppSettings::from_toml("").unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.output_path, PathBuf::from("image_points.csv"));
        assert_eq!(settings.scale, 1.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = AppSettings::from_toml("scale = 2.5\nmarker_radius = 8.0\n").unwrap();
        assert_eq!(settings.scale, 2.5);
        assert_eq!(settings.marker_radius, 8.0);
        assert_eq!(settings.label_offset, 10.0);
        assert_eq!(settings.extensions, vec!["png", "jpg", "jpeg"]);
    }

    #[test]
    fn rejects_non_positive_scale() {
        assert!(AppSettings::from_toml("scale = 0.0").is_err());
        assert!(AppSettings::from_toml("scale = -1.0").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("point_labeler_no_such_config.toml");
        let _ = std::fs::remove_file(&path);
        assert_eq!(load_settings(&path), AppSettings::default());
    }
}
