//! Persisted tool state
//!
//! A flat JSON record remembering where the user last worked plus the
//! calibration derived for that terrain. Missing or unreadable files fall
//! back to defaults so a fresh checkout just works.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use relief::Calibration;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lng: f64,
    pub lat: f64,
    pub zoom: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub height_contours: bool,
    pub water_contours: bool,
    /// Calibration from the last auto-calibration run, if any
    pub calibration: Option<Calibration>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            lng: -122.43877,
            lat: 37.75152,
            zoom: 11.0,
            min_height: 0.0,
            max_height: 0.0,
            height_contours: false,
            water_contours: false,
            calibration: None,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is absent
    /// or malformed.
    pub fn load(path: &Path) -> Settings {
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(path = %path.display(), %err, "ignoring malformed settings file");
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)
            .with_context(|| format!("writing settings to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.lng, -122.43877);
        assert_eq!(settings.lat, 37.75152);
        assert_eq!(settings.zoom, 11.0);
        assert!(settings.calibration.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"lng": 10.5, "lat": 59.9}"#).unwrap();
        assert_eq!(settings.lng, 10.5);
        assert_eq!(settings.lat, 59.9);
        assert_eq!(settings.zoom, 11.0);
    }

    #[test]
    fn test_roundtrip_with_calibration() {
        let mut settings = Settings::default();
        settings.calibration = Some(Calibration {
            base_level: 2.5,
            water_depth: 5.0,
            height_scale: 180.0,
            sea_level: 2.0,
        });
        let text = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&text).unwrap();
        assert_eq!(back.calibration, settings.calibration);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/settings.json"));
        assert_eq!(settings.lng, -122.43877);
    }
}
