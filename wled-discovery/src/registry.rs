//! Announcement cache feeding the pairing UI

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::Announcement;

/// Outcome of recording an announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryUpdate {
    /// First announcement for this id
    New,
    /// Existing entry replaced
    Updated,
    /// Dropped because it carried no address
    Ignored,
}

/// Thread-safe map of announcements keyed by id
#[derive(Debug, Default)]
pub struct DiscoveryRegistry {
    entries: RwLock<HashMap<String, Announcement>>,
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an announcement, replacing any previous entry with the same id
    pub fn announce(&self, announcement: Announcement) -> RegistryUpdate {
        if announcement.address.trim().is_empty() {
            tracing::debug!(id = %announcement.id, "Skipping discovery result without address");
            return RegistryUpdate::Ignored;
        }

        let mut entries = self.entries.write();
        let update = if entries.contains_key(&announcement.id) {
            tracing::debug!(id = %announcement.id, address = %announcement.address, "Updated discovery entry");
            RegistryUpdate::Updated
        } else {
            tracing::info!(id = %announcement.id, address = %announcement.address, "New WLED device discovered");
            RegistryUpdate::New
        };
        entries.insert(announcement.id.clone(), announcement);
        tracing::debug!(total = entries.len(), "Discovered devices");

        update
    }

    /// Forget an entry, returning it if it existed
    pub fn remove(&self, id: &str) -> Option<Announcement> {
        self.entries.write().remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Announcement> {
        self.entries.read().get(id).cloned()
    }

    /// All current entries, ordered by id
    pub fn snapshot(&self) -> Vec<Announcement> {
        let mut entries: Vec<Announcement> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_then_updated() {
        let registry = DiscoveryRegistry::new();

        let first = Announcement::new("a1", "192.168.1.10", Some("Desk".to_string()));
        assert_eq!(registry.announce(first), RegistryUpdate::New);

        let moved = Announcement::new("a1", "192.168.1.11", Some("Desk Strip".to_string()));
        assert_eq!(registry.announce(moved), RegistryUpdate::Updated);

        let entry = registry.get("a1").unwrap();
        assert_eq!(entry.address, "192.168.1.11");
        assert_eq!(entry.name.as_deref(), Some("Desk Strip"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_announcement_without_address_is_ignored() {
        let registry = DiscoveryRegistry::new();
        let update = registry.announce(Announcement::new("a2", "  ", None));
        assert_eq!(update, RegistryUpdate::Ignored);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_sorted_and_detached() {
        let registry = DiscoveryRegistry::new();
        registry.announce(Announcement::new("c", "10.0.0.3", None));
        registry.announce(Announcement::new("a", "10.0.0.1", None));
        registry.announce(Announcement::new("b", "10.0.0.2", None));

        let snapshot = registry.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        registry.remove("a");
        assert_eq!(snapshot.len(), 3);
        assert_eq!(registry.len(), 2);
    }
}
