//! Entity directory mapping ids to display names.

use std::collections::HashMap;
use std::sync::RwLock;

use domain::services::EntityDirectory;

use crate::metrics::record_store_size;

pub struct InMemoryDirectory {
    names: RwLock<HashMap<String, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Registers or replaces a display name. Returns the previous name
    /// when the entity was already registered.
    pub fn register(&self, entity_id: &str, display_name: &str) -> Option<String> {
        let mut names = self.names.write().unwrap();
        let previous = names.insert(entity_id.to_string(), display_name.to_string());
        record_store_size("directory", names.len());
        previous
    }

    /// All registered entries sorted by entity id.
    pub fn list(&self) -> Vec<(String, String)> {
        let names = self.names.read().unwrap();
        let mut entries: Vec<(String, String)> = names
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.read().unwrap().is_empty()
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntityDirectory for InMemoryDirectory {
    async fn lookup_name(&self, entity_id: &str) -> Option<String> {
        self.names.read().unwrap().get(entity_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_returns_registered_name() {
        let directory = InMemoryDirectory::new();
        assert!(directory.register("tourist-1", "Asha Verma").is_none());
        assert_eq!(
            directory.lookup_name("tourist-1").await,
            Some("Asha Verma".to_string())
        );
        assert_eq!(directory.lookup_name("tourist-2").await, None);
    }

    #[tokio::test]
    async fn re_registering_returns_the_previous_name() {
        let directory = InMemoryDirectory::new();
        directory.register("tourist-1", "Asha Verma");
        let previous = directory.register("tourist-1", "A. Verma");
        assert_eq!(previous, Some("Asha Verma".to_string()));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn lookup_misses_before_registration() {
        let directory = InMemoryDirectory::new();
        assert!(tokio_test::block_on(directory.lookup_name("tourist-1")).is_none());
        assert!(directory.is_empty());
    }

    #[test]
    fn listing_is_sorted_by_entity_id() {
        let directory = InMemoryDirectory::new();
        directory.register("zeta", "Last");
        directory.register("alpha", "First");
        let entries = directory.list();
        assert_eq!(entries[0].0, "alpha");
        assert_eq!(entries[1].0, "zeta");
    }
}
