use std::path::Path;

use tracing::debug;

use super::backend::{ConfigBackend, ConfigEntry};
use super::file::FileBackend;
use super::name::normalize;
use super::registry::LevelRegistry;
use super::store::value_pattern;
use super::value::{parse_bool, parse_i32, parse_i64, render_bool, render_int};
use super::{ConfigError, ConfigLevel, Result};

/// A layered configuration.
///
/// Backends are bound at [`ConfigLevel`]s. Lookups consult the most specific
/// bound level first (`App`, `Local`, `Global`, `Xdg`, `System`) and return
/// the first value found. Writes go to the most specific bound level.
///
/// Values are stored as text; the typed accessors convert on every call.
///
/// ## Example
///
/// ```no_run
/// use layerconf::{Config, ConfigLevel};
///
/// let mut config = Config::new();
/// config.add_file("/etc/appconfig", ConfigLevel::System, false)?;
/// config.add_file("/home/me/.appconfig", ConfigLevel::Global, false)?;
///
/// let bare = config.get_bool("core.bare")?;
///
/// // Write only to the user's file.
/// let mut global = config.open_level(ConfigLevel::Global)?;
/// global.set_string("user.name", "Jane")?;
/// # Ok::<(), layerconf::ConfigError>(())
/// ```
///
/// ## Ownership
///
/// A config owns the backends it attached and releases them when dropped or
/// passed to [`free`](Self::free). Views created with
/// [`open_level`](Self::open_level) only refer to their parent's backend; once
/// the parent is released, every call on the view fails with
/// [`ConfigError::Closed`].
#[derive(Debug, Default)]
pub struct Config {
    registry: LevelRegistry,
    view: bool,
}

impl Config {
    /// Creates a configuration with no levels bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a standalone configuration over a single file, bound at
    /// [`ConfigLevel::Local`].
    pub fn open_ondisk(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::new();
        config.add_file(path, ConfigLevel::Local, false)?;
        Ok(config)
    }

    /// Opens the file at `path` and binds it at `level`.
    ///
    /// If `level` is already bound, `force` replaces the existing backend.
    /// Without `force`, re-adding the same file is a no-op and adding a
    /// different one fails with [`ConfigError::LevelOccupied`].
    pub fn add_file(&mut self, path: impl AsRef<Path>, level: ConfigLevel, force: bool) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidArgument(
                "config file path must not be empty".to_string(),
            ));
        }
        self.ensure_not_view("add_file")?;
        if level.is_highest() {
            return Err(ConfigError::InvalidArgument(
                "cannot bind a config file at the 'highest' level".to_string(),
            ));
        }

        if !force && self.registry.is_bound_to(level, path)? {
            return Ok(());
        }

        let backend = FileBackend::open(path)?;
        self.registry.attach(Box::new(backend), level, force)
    }

    /// Binds an already opened backend at `level`, with the same rules as
    /// [`add_file`](Self::add_file).
    pub fn add_backend(
        &mut self,
        backend: Box<dyn ConfigBackend>,
        level: ConfigLevel,
        force: bool,
    ) -> Result<()> {
        self.ensure_not_view("add_backend")?;
        self.registry.attach(backend, level, force)
    }

    /// Bound levels, least specific first.
    pub fn levels(&self) -> Vec<ConfigLevel> {
        self.registry.levels()
    }

    /// Whether this config is a single-level view of another one.
    pub fn is_view(&self) -> bool {
        self.view
    }

    /// Looks up `name`, returning the value and the level it was found at.
    pub fn get_entry(&self, name: &str) -> Result<ConfigEntry> {
        let name = normalize(name)?;
        self.registry
            .find_map(|level, backend| {
                Ok(backend
                    .get(&name)?
                    .map(|value| ConfigEntry::new(name.as_str(), value, level)))
            })?
            .ok_or(ConfigError::NotFound(name))
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        self.get_entry(name).map(|entry| entry.value)
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        let entry = self.get_entry(name)?;
        parse_i32(&entry.name, &entry.value)
    }

    pub fn get_i64(&self, name: &str) -> Result<i64> {
        let entry = self.get_entry(name)?;
        parse_i64(&entry.name, &entry.value)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        let entry = self.get_entry(name)?;
        parse_bool(&entry.name, &entry.value)
    }

    /// Every value of `name` across all levels, least specific first.
    ///
    /// With a `pattern`, only values matching the regular expression are
    /// returned. Fails with [`ConfigError::NotFound`] when nothing is left.
    pub fn get_multivar(&self, name: &str, pattern: Option<&str>) -> Result<Vec<String>> {
        let name = normalize(name)?;
        let pattern = pattern.map(value_pattern).transpose()?;

        let mut values = Vec::new();
        self.registry.for_each(|_, backend| {
            values.extend(
                backend
                    .get_all(&name)?
                    .into_iter()
                    .filter(|v| pattern.as_ref().map_or(true, |re| re.is_match(v))),
            );
            Ok(())
        })?;

        if values.is_empty() {
            return Err(ConfigError::NotFound(name));
        }
        Ok(values)
    }

    /// Every entry of every level, least specific first.
    pub fn entries(&self) -> Result<Vec<ConfigEntry>> {
        let mut entries = Vec::new();
        self.registry.for_each(|level, backend| {
            entries.extend(
                backend
                    .entries()?
                    .into_iter()
                    .map(|(name, value)| ConfigEntry::new(name, value, level)),
            );
            Ok(())
        })?;
        Ok(entries)
    }

    pub fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.registry.with_write_target(|level, backend| {
            debug!(%level, name, "setting config value");
            backend.set(name, value)
        })
    }

    pub fn set_i32(&mut self, name: &str, value: i32) -> Result<()> {
        self.set_string(name, &render_int(value))
    }

    pub fn set_i64(&mut self, name: &str, value: i64) -> Result<()> {
        self.set_string(name, &render_int(value))
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.set_string(name, &render_bool(value))
    }

    /// Replaces every value of `name` matching `pattern` with `value`,
    /// keeping their positions. If nothing matches, `value` is appended.
    /// The empty pattern matches every value.
    pub fn set_multivar(&mut self, name: &str, pattern: &str, value: &str) -> Result<()> {
        let pattern = value_pattern(pattern)?;
        self.registry.with_write_target(|level, backend| {
            debug!(%level, name, pattern = pattern.as_str(), "setting config multivar");
            backend.set_multivar(name, &pattern, value)
        })
    }

    /// Removes the single-valued entry `name` from the write target.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.registry.with_write_target(|level, backend| {
            debug!(%level, name, "deleting config value");
            backend.delete(name)
        })
    }

    /// Removes every value of `name` matching `pattern` from the write
    /// target.
    pub fn delete_multivar(&mut self, name: &str, pattern: &str) -> Result<()> {
        let pattern = value_pattern(pattern)?;
        self.registry.with_write_target(|level, backend| {
            debug!(%level, name, pattern = pattern.as_str(), "deleting config multivar");
            backend.delete_multivar(name, &pattern)
        })
    }

    /// Returns a view of the single backend bound at `level`.
    ///
    /// The view shares the backend with this config: writes through it are
    /// visible here. [`ConfigLevel::Highest`] selects the most specific bound
    /// level.
    pub fn open_level(&self, level: ConfigLevel) -> Result<Config> {
        let level = self.registry.resolve(level)?;
        let backend = self.registry.share(level)?;
        debug!(%level, "opened config level view");
        Ok(Config {
            registry: LevelRegistry::borrowing(level, backend),
            view: true,
        })
    }

    /// Re-reads every bound backend.
    pub fn refresh(&mut self) -> Result<()> {
        self.registry.for_each(|level, backend| {
            debug!(%level, "refreshing config level");
            backend.refresh()
        })
    }

    /// Releases this config and every backend it owns.
    pub fn free(self) {
        drop(self);
    }

    fn ensure_not_view(&self, operation: &str) -> Result<()> {
        if self.view {
            return Err(ConfigError::InvalidArgument(format!(
                "{operation} is not available on a single-level view"
            )));
        }
        Ok(())
    }
}
