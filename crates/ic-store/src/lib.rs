//! Local persistence for InspiCode: key-value stores, favorites,
//! preferences, and client configuration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ic_core::{CoreError, CoreResult, Favorite, KeyValueStore, Project, Theme};

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "inspicode";

/// Storage key holding the JSON array of favorites.
pub const FAVORITES_KEY: &str = "inspicode_favorites";
/// Storage key holding the theme preference.
pub const THEME_KEY: &str = "theme";
/// Storage key set once the welcome message has been shown.
pub const WELCOMED_KEY: &str = "inspicode_welcomed";

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Filesystem-backed key-value store, one file per key.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn key_path(&self, key: &str) -> CoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(CoreError::Validation(format!("invalid storage key: {key:?}")));
        }
        Ok(self.root.join("storage").join(key))
    }
}

impl KeyValueStore for FsStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| CoreError::Storage(err.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| CoreError::Storage(err.to_string()))?;
        }
        fs::write(path, value).map_err(|err| CoreError::Storage(err.to_string()))
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(path).map_err(|err| CoreError::Storage(err.to_string()))
    }
}

/// In-memory key-value store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_values<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> CoreResult<T> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        Ok(f(&mut values))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        self.with_values(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.with_values(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.with_values(|values| {
            values.remove(key);
        })
    }
}

/// Direction of a favorite toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    /// The project was appended to the favorites.
    Added,
    /// The project was removed from the favorites.
    Removed,
}

/// Result of toggling a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// What happened to the list.
    pub change: FavoriteChange,
    /// False when the rewritten list could not be saved.
    pub persisted: bool,
}

/// Favorites persisted as a JSON array under [`FAVORITES_KEY`].
///
/// Every change rewrites the whole array. Concurrent writers are not
/// coordinated; the last write wins.
#[derive(Debug, Clone)]
pub struct FavoritesStore<S> {
    store: S,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Wrap a key-value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read the persisted favorites.
    ///
    /// Missing, unreadable, or corrupted values read as an empty list.
    pub fn list(&self) -> Vec<Favorite> {
        let raw = match self.store.get(FAVORITES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read favorites");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "favorites are corrupted, treating as empty");
            Vec::new()
        })
    }

    /// Check whether a title is favorited.
    pub fn contains(&self, title: &str) -> bool {
        self.list().iter().any(|favorite| favorite.title == title)
    }

    /// Remove the favorite with the project's title, or append a new one
    /// stamped with `now`.
    pub fn toggle(&self, project: &Project, now: DateTime<Utc>) -> ToggleOutcome {
        let mut favorites = self.list();
        let change = match favorites
            .iter()
            .position(|favorite| favorite.title == project.title)
        {
            Some(index) => {
                favorites.remove(index);
                FavoriteChange::Removed
            }
            None => {
                favorites.push(Favorite::from_project(project, now));
                FavoriteChange::Added
            }
        };
        let persisted = match self.save(&favorites) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, title = %project.title, "failed to save favorites");
                false
            }
        };
        debug!(title = %project.title, ?change, persisted, "favorite toggled");
        ToggleOutcome { change, persisted }
    }

    fn save(&self, favorites: &[Favorite]) -> CoreResult<()> {
        let json =
            serde_json::to_string(favorites).map_err(|err| CoreError::Storage(err.to_string()))?;
        self.store.set(FAVORITES_KEY, &json)
    }
}

/// Theme preference and first-visit flag.
#[derive(Debug, Clone)]
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    /// Wrap a key-value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored theme, light when unset or unreadable.
    pub fn theme(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(value) => Theme::from_stored(value.as_deref().map(str::trim)),
            Err(err) => {
                warn!(error = %err, "failed to read theme");
                Theme::Light
            }
        }
    }

    /// Persist a theme.
    pub fn set_theme(&self, theme: Theme) -> CoreResult<()> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// True once the welcome message has been shown.
    pub fn is_welcomed(&self) -> bool {
        matches!(self.store.get(WELCOMED_KEY), Ok(Some(_)))
    }

    /// Record that the welcome message has been shown.
    pub fn mark_welcomed(&self) -> CoreResult<()> {
        self.store.set(WELCOMED_KEY, "true")
    }
}

/// Client configuration persisted as YAML.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the catalog backend.
    pub api_url: Option<String>,
    /// Directory holding local storage and logs.
    pub data_dir: Option<String>,
}

/// Location of the config file.
pub fn config_path() -> CoreResult<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        return Ok(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    Err(CoreError::Storage(
        "unable to determine config directory".into(),
    ))
}

/// Load the config file, defaulting when it does not exist.
pub fn load_config() -> CoreResult<ClientConfig> {
    load_config_from(&config_path()?)
}

/// Load a config file from an explicit path.
pub fn load_config_from(path: &Path) -> CoreResult<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| CoreError::Storage(err.to_string()))?;
    serde_yaml::from_str(&contents).map_err(|err| CoreError::Storage(err.to_string()))
}

/// Save the config file.
pub fn save_config(config: &ClientConfig) -> CoreResult<()> {
    save_config_to(&config_path()?, config)
}

/// Save a config file to an explicit path.
pub fn save_config_to(path: &Path, config: &ClientConfig) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| CoreError::Storage(err.to_string()))?;
    }
    let contents =
        serde_yaml::to_string(config).map_err(|err| CoreError::Storage(err.to_string()))?;
    fs::write(path, contents).map_err(|err| CoreError::Storage(err.to_string()))
}

/// Resolve the backend URL: `INSPICODE_API_URL`, then config, then default.
pub fn resolve_api_url(config: &ClientConfig) -> String {
    first_non_blank([std::env::var("INSPICODE_API_URL").ok(), config.api_url.clone()])
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Resolve the data directory: `INSPICODE_DATA_DIR`, then config, then
/// the platform data directory.
pub fn resolve_data_dir(config: &ClientConfig) -> CoreResult<PathBuf> {
    if let Some(dir) =
        first_non_blank([std::env::var("INSPICODE_DATA_DIR").ok(), config.data_dir.clone()])
    {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = dirs::data_dir() {
        return Ok(dir.join(APP_DIR_NAME));
    }
    Err(CoreError::Storage(
        "unable to determine a default data directory".into(),
    ))
}

fn first_non_blank<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}
