use std::path::Path;

use regex::Regex;

use super::{ConfigLevel, Result};

/// A single resolved config value together with the level it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub name: String,
    pub value: String,
    pub level: ConfigLevel,
}

impl ConfigEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>, level: ConfigLevel) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            level,
        }
    }
}

/// One opened storage unit bound at a level.
///
/// Names passed in may use any case for the section and variable parts;
/// implementations fold them to canonical form. Values are text.
pub trait ConfigBackend: Send + std::fmt::Debug {
    /// The last value stored for `name`.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Every value stored for `name`, in order.
    fn get_all(&self, name: &str) -> Result<Vec<String>>;

    fn set(&mut self, name: &str, value: &str) -> Result<()>;

    /// Removes a single-valued entry. Absent names are `NotFound`.
    fn delete(&mut self, name: &str) -> Result<()>;

    fn set_multivar(&mut self, name: &str, pattern: &Regex, value: &str) -> Result<()>;

    fn delete_multivar(&mut self, name: &str, pattern: &Regex) -> Result<()>;

    /// Every (name, value) pair, multivars expanded.
    fn entries(&self) -> Result<Vec<(String, String)>>;

    /// Re-reads the backing medium, discarding anything held in memory.
    fn refresh(&mut self) -> Result<()>;

    /// The file behind this backend, if there is one.
    fn path(&self) -> Option<&Path> {
        None
    }
}
