//! Device-local persistence: one JSON document per [`StorageKey`].
//!
//! Documents carry no schema version. Loading tolerates absent and unknown fields, and
//! an unreadable document falls back to its default rather than failing start-up. The
//! unreadable document is kept aside as `<name>.json.corrupt`.

use crate::error::DataError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Persisted documents.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StorageKey {
    Favorites,
    Portfolio,
    Settings,
}

impl StorageKey {
    pub fn file_name(&self) -> &'static str {
        match self {
            StorageKey::Favorites => "favorites.json",
            StorageKey::Portfolio => "portfolio.json",
            StorageKey::Settings => "settings.json",
        }
    }
}

/// Colour scheme of the terminal screens.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// User interface preferences.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
}

/// JSON document store rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: StorageKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Load the document for `key`, falling back to `T::default()` when it is absent
    /// or cannot be read.
    pub fn load<T>(&self, key: StorageKey) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(key);

        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored document, using default");
                return T::default();
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read stored document, using default");
                return T::default();
            }
        };

        match serde_json::from_slice(&contents) {
            Ok(document) => document,
            Err(error) => {
                warn!(path = %path.display(), %error, "corrupt stored document, using default");
                if let Err(error) = fs::write(path.with_extension("json.corrupt"), &contents) {
                    warn!(path = %path.display(), %error, "failed to keep corrupt document aside");
                }
                T::default()
            }
        }
    }

    /// Load the array document for `key` element by element, skipping elements that
    /// cannot be read instead of discarding the whole document.
    pub fn load_each<T>(&self, key: StorageKey) -> Vec<T>
    where
        T: DeserializeOwned,
    {
        self.load::<Vec<serde_json::Value>>(key)
            .into_iter()
            .enumerate()
            .filter_map(|(index, element)| match serde_json::from_value(element) {
                Ok(element) => Some(element),
                Err(error) => {
                    warn!(?key, index, %error, "skipping unreadable stored element");
                    None
                }
            })
            .collect()
    }

    /// Persist `document` for `key`, replacing the previous document atomically.
    pub fn save<T>(&self, key: StorageKey, document: &T) -> Result<(), DataError>
    where
        T: Serialize,
    {
        fs::create_dir_all(&self.root)?;

        let path = self.path(key);
        let temp = path.with_extension("json.tmp");

        fs::write(&temp, serde_json::to_vec_pretty(document)?)?;
        fs::rename(&temp, &path)?;

        debug!(path = %path.display(), "saved document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{favorites::FavoriteSet, portfolio::PortfolioPosition};
    use rust_decimal_macros::dec;

    fn temp_store() -> LocalStore {
        LocalStore::new(std::env::temp_dir().join(format!("tickerboard-storage-{}", uuid::Uuid::new_v4())))
    }

    #[test]
    fn test_load_absent_document_is_default() {
        let store = temp_store();

        assert_eq!(store.load::<FavoriteSet>(StorageKey::Favorites), FavoriteSet::new());
        assert_eq!(store.load::<Settings>(StorageKey::Settings), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = temp_store();
        let favorites = ["BTCUSDT", "TONUSDT"].into_iter().collect::<FavoriteSet>();

        store.save(StorageKey::Favorites, &favorites).unwrap();

        assert_eq!(store.load::<FavoriteSet>(StorageKey::Favorites), favorites);
        assert!(!store.path(StorageKey::Favorites).with_extension("json.tmp").exists());

        fs::remove_dir_all(store.root()).unwrap();
    }

    #[test]
    fn test_load_tolerates_corrupt_and_unknown_fields() {
        struct TestCase {
            input: &'static str,
            expected: Settings,
        }

        let tests = vec![
            TestCase {
                // TC0: corrupt document
                input: "{ not json",
                expected: Settings::default(),
            },
            TestCase {
                // TC1: unknown fields are ignored
                input: r#"{"theme":"light","fontSize":14}"#,
                expected: Settings { theme: Theme::Light },
            },
            TestCase {
                // TC2: absent fields take their default
                input: "{}",
                expected: Settings::default(),
            },
        ];

        let store = temp_store();
        fs::create_dir_all(store.root()).unwrap();

        for (index, test) in tests.into_iter().enumerate() {
            fs::write(store.path(StorageKey::Settings), test.input).unwrap();
            let actual = store.load::<Settings>(StorageKey::Settings);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }

        fs::remove_dir_all(store.root()).unwrap();
    }

    #[test]
    fn test_load_each_skips_unreadable_elements() {
        let store = temp_store();
        fs::create_dir_all(store.root()).unwrap();
        fs::write(
            store.path(StorageKey::Portfolio),
            r#"[
                {"id":"6f1c1f8e-3c1a-4c55-9a3e-1f2f7d0d8a11","symbol":"BTCUSDT","amount":"1","buy_price":"50000"},
                {"symbol":"ETHUSDT","amount":"2","buyPrice":"50"},
                {"symbol":"SOLUSDT","amount":"not a number","buyPrice":"100"},
                "garbage"
            ]"#,
        )
        .unwrap();

        let positions = store.load_each::<PortfolioPosition>(StorageKey::Portfolio);

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].symbol, "BTCUSDT");
        assert_eq!(positions[1].symbol, "ETHUSDT");
        assert_eq!(positions[1].buy_price, dec!(50));

        fs::remove_dir_all(store.root()).unwrap();
    }

    #[test]
    fn test_load_corrupt_document_is_kept_aside() {
        let store = temp_store();
        fs::create_dir_all(store.root()).unwrap();
        fs::write(store.path(StorageKey::Portfolio), "[{ truncated").unwrap();

        let positions = store.load_each::<PortfolioPosition>(StorageKey::Portfolio);

        assert!(positions.is_empty());
        let kept = store.path(StorageKey::Portfolio).with_extension("json.corrupt");
        assert_eq!(fs::read_to_string(kept).unwrap(), "[{ truncated");

        fs::remove_dir_all(store.root()).unwrap();
    }
}
