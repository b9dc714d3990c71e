//! Theme preference persistence over localStorage.

use std::rc::Rc;

use super::{Theme, ThemePreference};
use crate::host::KeyValueStore;

/// Reads and writes the single theme preference key. Storage failures
/// never surface: reads degrade to `Unset`, writes are dropped.
#[derive(Clone)]
pub struct PreferenceStore {
    storage: Rc<dyn KeyValueStore>,
    key: String,
}

impl PreferenceStore {
    pub fn new(storage: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn load(&self) -> ThemePreference {
        match self.storage.get_item(&self.key) {
            Ok(Some(value)) => ThemePreference::parse(&value),
            Ok(None) => ThemePreference::Unset,
            Err(e) => {
                tracing::debug!("Theme preference unreadable, using system: {}", e);
                ThemePreference::Unset
            }
        }
    }

    pub fn save(&self, theme: Theme) {
        if let Err(e) = self.storage.set_item(&self.key, theme.as_str()) {
            tracing::debug!("Theme preference not persisted: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimStorage;

    #[test]
    fn test_save_then_load_in_fresh_session() {
        let storage = SimStorage::new();
        PreferenceStore::new(storage.clone(), "theme").save(Theme::Light);

        let reloaded = PreferenceStore::new(storage.clone(), "theme");
        assert_eq!(reloaded.load(), ThemePreference::Light);
        assert_eq!(storage.item("theme").as_deref(), Some("light"));
    }

    #[test]
    fn test_absent_or_empty_is_unset() {
        let storage = SimStorage::new();
        let store = PreferenceStore::new(storage.clone(), "theme");
        assert_eq!(store.load(), ThemePreference::Unset);

        storage.set_item("theme", "").unwrap();
        assert_eq!(store.load(), ThemePreference::Unset);
    }

    #[test]
    fn test_unknown_value_reads_as_dark() {
        let storage = SimStorage::new();
        let store = PreferenceStore::new(storage.clone(), "theme");

        storage.set_item("theme", "sepia").unwrap();
        assert_eq!(store.load(), ThemePreference::Dark);
    }

    #[test]
    fn test_unavailable_storage_degrades() {
        let storage = SimStorage::new();
        storage.set_unavailable(true);
        let store = PreferenceStore::new(storage.clone(), "theme");

        store.save(Theme::Dark);
        assert_eq!(store.load(), ThemePreference::Unset);

        storage.set_unavailable(false);
        assert_eq!(store.load(), ThemePreference::Unset);
    }
}
