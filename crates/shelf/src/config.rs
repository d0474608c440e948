use crate::events::AppEvent;
use async_channel::Sender;
use directories::ProjectDirs;
use fanout::RadialConfig;
use fanout::services::{CollectionId, ItemId};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::path::PathBuf;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

pub const STARRED: &str = "starred";
pub const BOOKMARKS: &str = "bookmarks";

/// Placeholder colour for cards without cover art.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Tint {
    #[default]
    #[strum(to_string = "slate", serialize = "grey", serialize = "gray")]
    Slate,
    #[strum(to_string = "sand", serialize = "yellow")]
    Sand,
    #[strum(to_string = "moss", serialize = "green")]
    Moss,
    #[strum(to_string = "rust", serialize = "red")]
    Rust,
    #[strum(to_string = "sky", serialize = "blue")]
    Sky,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub cover: Option<PathBuf>,
    #[serde(default)]
    pub tint: Tint,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedCollection {
    pub id: CollectionId,
    pub title: String,
    #[serde(default)]
    pub cover: Option<PathBuf>,
    #[serde(default)]
    pub tint: Tint,
    #[serde(default)]
    pub items: Vec<SeedItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub latency_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { latency_ms: 250 }
    }
}

impl StoreConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub radial: RadialConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub collections: Vec<SeedCollection>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "fanout", "shelf").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("SHELF")
        .separator("__")
        .try_parsing(true)
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(environment())
        .build()?;

    Ok(s.try_deserialize()?)
}

/// The bundled default configuration.
pub fn builtin() -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
        .build()?;
    Ok(s.try_deserialize()?)
}

/// User config when it loads, the bundled one otherwise. A user config
/// without collections borrows the bundled seed data.
pub fn load_or_default() -> Config {
    let fallback = builtin().unwrap_or_else(|e| {
        log::error!("Bundled config is invalid: {}", e);
        Config::default()
    });

    match load_config() {
        Ok(mut c) => {
            if c.collections.is_empty() {
                c.collections = fallback.collections;
            }
            c
        }
        Err(e) => {
            log::warn!("Failed to load config, using defaults: {}", e);
            fallback
        }
    }
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", ConfigError::from(e));
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let touches_config = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) && event.paths.iter().any(|p| p == &config_path);

                if touches_config {
                    log::debug!("config file changed: {:?}", event.kind);
                    if tx.send(AppEvent::ConfigReload).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_deserialization() {
        let cases = vec![
            ("\"sand\"", Tint::Sand),
            ("\"SAND\"", Tint::Sand),
            ("\"yellow\"", Tint::Sand),
            ("\"gray\"", Tint::Slate),
            ("\"Sky\"", Tint::Sky),
        ];

        for (json, expected) in cases {
            let deserialized: Tint = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
        assert!(serde_json::from_str::<Tint>("\"plaid\"").is_err());
    }

    #[test]
    fn bundled_config_parses() {
        let cfg = builtin().unwrap();
        assert_eq!(cfg.radial, RadialConfig::default());
        assert_eq!(cfg.store.latency(), Duration::from_millis(250));

        let ids: Vec<&str> = cfg.collections.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&STARRED));
        assert!(ids.contains(&BOOKMARKS));

        let reading = &cfg.collections[0];
        assert_eq!(reading.tint, Tint::Sand);
        assert_eq!(reading.items[1].subtitle, "Ursula K. Le Guin");
    }

    #[test]
    fn partial_radial_table() {
        let cfg: Config = serde_json::from_str(r#"{ "radial": { "button_radius": 32.0 } }"#).unwrap();
        assert_eq!(cfg.radial.button_radius, 32.0);
        assert_eq!(cfg.radial.menu_radius, RadialConfig::default().menu_radius);
        assert!(cfg.collections.is_empty());
    }
}
