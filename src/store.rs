//! Synchronous key-value persistence for favorites and the theme.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::StoreError;
use crate::weather::CityLocation;

pub const FAVORITES_KEY: &str = "meteo-favorites";
pub const THEME_KEY: &str = "meteo-theme";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value under `key`. Readers never observe a partial write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// All keys live in one JSON object file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut all = match self.read_all() {
            Ok(all) => all,
            Err(StoreError::Json(e)) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt storage file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        all.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&all)?).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore(pub std::collections::HashMap<String, String>);

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Favorites and theme on top of any [`KeyValueStore`]. Reads fail open.
#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn load_favorites(&self) -> Vec<CityLocation> {
        let raw = match self.store.get(FAVORITES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "cannot read favorites");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(favorites) => favorites,
            Err(e) => {
                warn!(error = %e, "stored favorites are corrupt, ignoring");
                Vec::new()
            }
        }
    }

    pub fn save_favorites(&mut self, favorites: &[CityLocation]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(favorites)?;
        self.store.set(FAVORITES_KEY, &raw)
    }

    /// Appends `city` unless a favorite with the exact same name exists.
    /// Returns whether the list changed.
    pub fn add_favorite(&mut self, city: &CityLocation) -> Result<bool, StoreError> {
        let mut favorites = self.load_favorites();
        if favorites.iter().any(|f| f.name == city.name) {
            return Ok(false);
        }
        favorites.push(city.clone());
        self.save_favorites(&favorites)?;
        Ok(true)
    }

    pub fn load_theme(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(raw)) if raw == Theme::Dark.as_str() => Theme::Dark,
            Ok(_) => Theme::Light,
            Err(e) => {
                warn!(error = %e, "cannot read theme");
                Theme::Light
            }
        }
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        let theme = self.load_theme().toggled();
        self.save_theme(theme)?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str) -> CityLocation {
        CityLocation {
            name: name.to_string(),
            latitude: 1.0,
            longitude: 2.0,
        }
    }

    #[test]
    fn test_add_favorite_twice_keeps_one() {
        let mut prefs = Preferences::new(MemoryStore::default());
        assert!(prefs.add_favorite(&city("Paris, Île-de-France, France")).unwrap());
        assert!(!prefs.add_favorite(&city("Paris, Île-de-France, France")).unwrap());
        assert_eq!(prefs.load_favorites().len(), 1);
    }

    #[test]
    fn test_favorite_identity_is_exact_name() {
        let mut prefs = Preferences::new(MemoryStore::default());
        prefs.add_favorite(&city("Paris")).unwrap();
        prefs.add_favorite(&city("paris")).unwrap();
        let names: Vec<_> = prefs.load_favorites().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Paris", "paris"]);
    }

    #[test]
    fn test_corrupt_favorites_fail_open() {
        let mut store = MemoryStore::default();
        store.set(FAVORITES_KEY, "[{\"name\": ").unwrap();
        let prefs = Preferences::new(store);
        assert!(prefs.load_favorites().is_empty());
    }

    #[test]
    fn test_unset_favorites_are_empty() {
        let prefs = Preferences::new(MemoryStore::default());
        assert!(prefs.load_favorites().is_empty());
    }

    #[test]
    fn test_theme_round_trip() {
        let mut prefs = Preferences::new(MemoryStore::default());
        assert_eq!(prefs.load_theme(), Theme::Light);
        prefs.save_theme(Theme::Dark).unwrap();
        assert_eq!(prefs.load_theme(), Theme::Dark);
        assert_eq!(prefs.store().get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_unknown_theme_is_light() {
        let mut store = MemoryStore::default();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(Preferences::new(store).load_theme(), Theme::Light);
    }

    #[test]
    fn test_toggle_theme() {
        let mut prefs = Preferences::new(MemoryStore::default());
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Light);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut prefs = Preferences::new(FileStore::new(&path));
        prefs.add_favorite(&city("Lyon, Auvergne-Rhône-Alpes, France")).unwrap();
        prefs.save_theme(Theme::Dark).unwrap();

        let reopened = Preferences::new(FileStore::new(&path));
        assert_eq!(reopened.load_favorites(), vec![city("Lyon, Auvergne-Rhône-Alpes, France")]);
        assert_eq!(reopened.load_theme(), Theme::Dark);
    }

    #[test]
    fn test_file_store_corrupt_file_fails_open_and_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json at all").unwrap();

        let mut prefs = Preferences::new(FileStore::new(&path));
        assert!(prefs.load_favorites().is_empty());
        assert_eq!(prefs.load_theme(), Theme::Light);

        prefs.save_theme(Theme::Dark).unwrap();
        assert_eq!(prefs.load_theme(), Theme::Dark);
    }
}
