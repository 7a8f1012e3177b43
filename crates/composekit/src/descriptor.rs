//! The in-memory descriptor: services and networks keyed by name.

use crate::types::{Network, Service};

/// A name-keyed map that iterates in insertion order until sorted.
///
/// Inserting an existing key replaces the value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for NamedMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> NamedMap<T> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Look up an entry mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Whether the key is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace. Returns the replaced value.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        match self.get_mut(&name) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Remove an entry, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let pos = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Sort entries by key.
    pub fn sort_by_name(&mut self) {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
    }

    /// Keys in iteration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries sorted by key, without reordering the map itself.
    pub fn sorted(&self) -> Vec<(&str, &T)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A compose descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    /// Services by name
    pub services: NamedMap<Service>,
    /// Networks by name
    pub networks: NamedMap<Network>,
}

impl Descriptor {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a service.
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Insert or replace a service.
    pub fn set_service(&mut self, name: impl Into<String>, service: Service) -> Option<Service> {
        self.services.insert(name, service)
    }

    /// Remove a service.
    pub fn remove_service(&mut self, name: &str) -> Option<Service> {
        self.services.remove(name)
    }

    /// Look up a network.
    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.get(name)
    }

    /// Insert or replace a network.
    pub fn set_network(&mut self, name: impl Into<String>, network: Network) -> Option<Network> {
        self.networks.insert(name, network)
    }

    /// Remove a network.
    pub fn remove_network(&mut self, name: &str) -> Option<Network> {
        self.networks.remove(name)
    }

    /// Sort both mappings by name.
    pub fn canonicalize(&mut self) {
        self.services.sort_by_name();
        self.networks.sort_by_name();
    }

    /// Whether the descriptor defines neither services nor networks.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces_in_place() {
        let mut map = NamedMap::new();
        map.insert("b", 1);
        map.insert("a", 2);
        map.insert("c", 3);
        assert_eq!(map.insert("a", 20), Some(2));

        assert_eq!(map.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(map.get("a"), Some(&20));
    }

    #[test]
    fn test_remove_and_sort() {
        let mut map = NamedMap::new();
        map.insert("zeta", ());
        map.insert("alpha", ());
        map.insert("mid", ());

        assert!(map.remove("mid").is_some());
        assert!(map.remove("missing").is_none());
        assert_eq!(
            map.sorted().iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec!["alpha", "zeta"]
        );
        // sorted() leaves the map untouched
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);

        map.sort_by_name();
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_descriptor_accessors() {
        let mut doc = Descriptor::new();
        assert!(doc.is_empty());

        doc.set_service("web", Service::default());
        doc.set_network("proxy", Network::external("proxy"));
        assert!(doc.service("web").is_some());
        assert!(doc.network("proxy").is_some_and(Network::is_external));

        doc.remove_service("web");
        doc.remove_network("proxy");
        assert!(doc.is_empty());
    }
}
