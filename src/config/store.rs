//! In-memory entry storage shared by the bundled backends.

use std::collections::BTreeMap;

use regex::Regex;

use super::name::normalize;
use super::{ConfigError, Result};

/// Compiles a value pattern for the multivar operations.
///
/// The empty pattern matches every value.
pub fn value_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Ordered map from canonical name to the list of values stored for it.
///
/// Names iterate in sorted order; the values of a multivar keep insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStore {
    values: BTreeMap<String, Vec<String>>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last value stored for `name`, if any.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let name = normalize(name)?;
        Ok(self
            .values
            .get(&name)
            .and_then(|values| values.last())
            .cloned())
    }

    pub fn get_all(&self, name: &str) -> Result<Vec<String>> {
        let name = normalize(name)?;
        Ok(self.values.get(&name).cloned().unwrap_or_default())
    }

    /// Sets a single-valued entry, inserting it if absent.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let name = normalize(name)?;
        let values = self.values.entry(name.clone()).or_default();
        if values.len() > 1 {
            return Err(ConfigError::MultivarNotUnique(name));
        }
        values.clear();
        values.push(value.to_string());
        Ok(())
    }

    /// Appends another value for `name`.
    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        let name = normalize(name)?;
        self.values.entry(name).or_default().push(value.to_string());
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let name = normalize(name)?;
        match self.values.get(&name).map(Vec::len) {
            None | Some(0) => Err(ConfigError::NotFound(name)),
            Some(1) => {
                self.values.remove(&name);
                Ok(())
            }
            Some(_) => Err(ConfigError::MultivarNotUnique(name)),
        }
    }

    /// Replaces every value of `name` matching `pattern` with `value`, in
    /// place. Appends `value` when nothing matches.
    pub fn set_multivar(&mut self, name: &str, pattern: &Regex, value: &str) -> Result<()> {
        let name = normalize(name)?;
        let values = self.values.entry(name).or_default();

        let mut replaced = false;
        for existing in values.iter_mut().filter(|v| pattern.is_match(v)) {
            *existing = value.to_string();
            replaced = true;
        }
        if !replaced {
            values.push(value.to_string());
        }
        Ok(())
    }

    /// Removes every value of `name` matching `pattern`.
    pub fn delete_multivar(&mut self, name: &str, pattern: &Regex) -> Result<()> {
        let name = normalize(name)?;
        let values = self
            .values
            .get_mut(&name)
            .ok_or_else(|| ConfigError::NotFound(name.clone()))?;

        let before = values.len();
        values.retain(|v| !pattern.is_match(v));
        if values.len() == before {
            return Err(ConfigError::NotFound(name));
        }
        if values.is_empty() {
            self.values.remove(&name);
        }
        Ok(())
    }

    /// Every (name, value) pair, multivars expanded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Names with the values stored for each.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with(name: &str, values: &[&str]) -> EntryStore {
        let mut store = EntryStore::new();
        for value in values {
            store.append(name, value).unwrap();
        }
        store
    }

    #[test]
    fn test_get_returns_last_value() {
        let store = store_with("remote.origin.fetch", &["a", "b"]);
        assert_eq!(store.get("remote.origin.fetch").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let mut store = EntryStore::new();
        store.set("Core.Bare", "true").unwrap();
        assert_eq!(store.get("core.BARE").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_set_replaces_single_value() {
        let mut store = store_with("core.editor", &["vi"]);
        store.set("core.editor", "emacs").unwrap();
        assert_eq!(store.get_all("core.editor").unwrap(), vec!["emacs"]);
    }

    #[test]
    fn test_set_rejects_multivar() {
        let mut store = store_with("k.v", &["a", "b"]);
        assert!(matches!(
            store.set("k.v", "c"),
            Err(ConfigError::MultivarNotUnique(_))
        ));
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut store = EntryStore::new();
        assert!(matches!(store.delete("core.bare"), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_set_multivar_replaces_matches_in_place() {
        let mut store = store_with("k.v", &["x1", "x2", "z"]);
        store
            .set_multivar("k.v", &value_pattern("^x").unwrap(), "y")
            .unwrap();
        assert_eq!(store.get_all("k.v").unwrap(), vec!["y", "y", "z"]);
    }

    #[test]
    fn test_set_multivar_appends_without_match() {
        let mut store = store_with("k.v", &["a"]);
        store
            .set_multivar("k.v", &value_pattern("^nomatch$").unwrap(), "b")
            .unwrap();
        assert_eq!(store.get_all("k.v").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_pattern_replaces_all() {
        let mut store = store_with("k.v", &["a", "b"]);
        store.set_multivar("k.v", &value_pattern("").unwrap(), "c").unwrap();
        assert_eq!(store.get_all("k.v").unwrap(), vec!["c", "c"]);
    }

    #[test]
    fn test_delete_multivar() {
        let mut store = store_with("k.v", &["x1", "z", "x2"]);
        store.delete_multivar("k.v", &value_pattern("^x").unwrap()).unwrap();
        assert_eq!(store.get_all("k.v").unwrap(), vec!["z"]);

        let err = store
            .delete_multivar("k.v", &value_pattern("^x").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));

        store.delete_multivar("k.v", &value_pattern("").unwrap()).unwrap();
        assert!(store.get_all("k.v").unwrap().is_empty());
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            value_pattern("("),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}
