//! Synthetic in-memory backend.

use regex::Regex;

use super::backend::ConfigBackend;
use super::store::EntryStore;
use super::Result;

/// A backend that lives only in memory. Refreshing it is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: EntryStore,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a backend pre-populated with `entries`. Repeated names become
    /// multivars.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut store = EntryStore::new();
        for (name, value) in entries {
            store.append(name, value)?;
        }
        Ok(Self { store })
    }
}

impl ConfigBackend for MemoryBackend {
    fn get(&self, name: &str) -> Result<Option<String>> {
        self.store.get(name)
    }

    fn get_all(&self, name: &str) -> Result<Vec<String>> {
        self.store.get_all(name)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.store.set(name, value)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        self.store.delete(name)
    }

    fn set_multivar(&mut self, name: &str, pattern: &Regex, value: &str) -> Result<()> {
        self.store.set_multivar(name, pattern, value)
    }

    fn delete_multivar(&mut self, name: &str, pattern: &Regex) -> Result<()> {
        self.store.delete_multivar(name, pattern)
    }

    fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .store
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_builds_multivars() {
        let backend = MemoryBackend::from_entries([
            ("remote.origin.fetch", "a"),
            ("remote.origin.fetch", "b"),
            ("core.bare", "false"),
        ])
        .unwrap();

        assert_eq!(backend.get_all("remote.origin.fetch").unwrap(), vec!["a", "b"]);
        assert_eq!(backend.entries().unwrap().len(), 3);
    }

    #[test]
    fn test_refresh_keeps_contents() {
        let mut backend = MemoryBackend::new();
        backend.set("core.bare", "true").unwrap();
        backend.refresh().unwrap();
        assert_eq!(backend.get("core.bare").unwrap().as_deref(), Some("true"));
    }
}
