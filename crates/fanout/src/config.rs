use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const MENU_RADIUS: f64 = 96.0; // distance from press point to button centers
pub const BUTTON_RADIUS: f64 = 28.0;
pub const ANGLE_SPACING: f64 = 50.0; // degrees between neighbouring buttons
pub const CENTER_BAND_RATIO: f64 = 0.1; // of half-width
pub const TOP_BAND_RATIO: f64 = 0.25; // of height
pub const ACTIVATION_FACTOR: f64 = 1.4; // x button radius
pub const PROXIMITY_FACTOR: f64 = 2.0; // x button radius
pub const PROXIMITY_BOOST: f64 = 0.4;
pub const LONG_PRESS_MS: u64 = 500;
pub const LONG_PRESS_MAX_TRAVEL: f64 = 25.0;
pub const OVERLAY_SHOW_MS: u64 = 300;
pub const OVERLAY_HIDE_MS: u64 = 200;

/// Far-side base angles, in the "0° = up, counter-clockwise" convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarAngles {
    pub bottom_left: f64,
    pub bottom_right: f64,
    pub top_left: f64,
    pub top_right: f64,
}

impl Default for FarAngles {
    fn default() -> Self {
        Self {
            bottom_left: 300.0,
            bottom_right: 60.0,
            top_left: 240.0,
            top_right: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 260.0,
            damping: 20.0,
            mass: 1.0,
        }
    }
}

/// Tunables for the radial gesture overlay. Every field has a default so a
/// partial TOML table is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialConfig {
    pub menu_radius: f64,
    pub button_radius: f64,
    pub angle_spacing: f64,
    pub center_band_ratio: f64,
    pub top_band_ratio: f64,
    pub far_angles: FarAngles,
    pub activation_factor: f64,
    pub proximity_factor: f64,
    pub proximity_boost: f64,
    pub long_press_ms: u64,
    pub long_press_max_travel: f64,
    pub overlay_show_ms: u64,
    pub overlay_hide_ms: u64,
    pub spring: SpringConfig,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            menu_radius: MENU_RADIUS,
            button_radius: BUTTON_RADIUS,
            angle_spacing: ANGLE_SPACING,
            center_band_ratio: CENTER_BAND_RATIO,
            top_band_ratio: TOP_BAND_RATIO,
            far_angles: FarAngles::default(),
            activation_factor: ACTIVATION_FACTOR,
            proximity_factor: PROXIMITY_FACTOR,
            proximity_boost: PROXIMITY_BOOST,
            long_press_ms: LONG_PRESS_MS,
            long_press_max_travel: LONG_PRESS_MAX_TRAVEL,
            overlay_show_ms: OVERLAY_SHOW_MS,
            overlay_hide_ms: OVERLAY_HIDE_MS,
            spring: SpringConfig::default(),
        }
    }
}

impl RadialConfig {
    pub fn long_press_duration(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn show_duration(&self) -> Duration {
        Duration::from_millis(self.overlay_show_ms)
    }

    pub fn hide_duration(&self) -> Duration {
        Duration::from_millis(self.overlay_hide_ms)
    }

    pub fn activation_distance(&self) -> f64 {
        self.activation_factor * self.button_radius
    }

    pub fn proximity_distance(&self) -> f64 {
        self.proximity_factor * self.button_radius
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "fanout", "fanout").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("radial.toml"))
}

/// Reads radial tunables from `path` (a missing file is fine), with
/// `FANOUT__<FIELD>` environment variables taking precedence.
pub fn load_radial(path: &Path) -> Result<RadialConfig, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("FANOUT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}
