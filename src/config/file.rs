//! File-backed config storage.
//!
//! Files are TOML documents. Each top-level table is a section header
//! (`section` or `section.subsection`) holding variables whose values are
//! strings or arrays of strings (multivars):
//!
//! ```toml
//! [core]
//! bare = "true"
//!
//! ["remote.origin"]
//! url = "https://example.com/repo"
//! fetch = ["+refs/heads/*:refs/remotes/origin/*", "+refs/tags/*:refs/tags/*"]
//! ```
//!
//! Reading is lenient: nested tables are flattened with `.` and non-string
//! scalars are kept as their textual form.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use regex::Regex;
use tempfile::NamedTempFile;
use toml::{Table, Value};
use tracing::{debug, trace};

use super::backend::ConfigBackend;
use super::name::split;
use super::store::EntryStore;
use super::{ConfigError, Result};

/// A config backend stored in a single file.
///
/// A missing file reads as empty and is created on the first write. Every
/// mutation re-reads the file, applies the change and replaces the file
/// atomically, so edits made by other writers since the last read are kept.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    store: EntryStore,
}

impl FileBackend {
    /// Opens the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidArgument(
                "config file path must not be empty".to_string(),
            ));
        }

        let store = load_config_file(path)?;
        debug!(path = %path.display(), "opened config file");
        Ok(Self {
            path: path.to_path_buf(),
            store,
        })
    }

    fn mutate<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut EntryStore) -> Result<()>,
    {
        let mut store = load_config_file(&self.path)?;
        change(&mut store)?;
        write_config_file(&self.path, &store)?;
        self.store = store;
        Ok(())
    }
}

impl ConfigBackend for FileBackend {
    fn get(&self, name: &str) -> Result<Option<String>> {
        self.store.get(name)
    }

    fn get_all(&self, name: &str) -> Result<Vec<String>> {
        self.store.get_all(name)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.mutate(|store| store.set(name, value))
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        self.mutate(|store| store.delete(name))
    }

    fn set_multivar(&mut self, name: &str, pattern: &Regex, value: &str) -> Result<()> {
        self.mutate(|store| store.set_multivar(name, pattern, value))
    }

    fn delete_multivar(&mut self, name: &str, pattern: &Regex) -> Result<()> {
        self.mutate(|store| store.delete_multivar(name, pattern))
    }

    fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .store
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    fn refresh(&mut self) -> Result<()> {
        self.store = load_config_file(&self.path)?;
        debug!(path = %self.path.display(), "refreshed config file");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Loads and parses a config file.
///
/// A file that doesn't exist loads as an empty store.
fn load_config_file(path: &Path) -> Result<EntryStore> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let table: Table =
                toml::from_str(&contents).map_err(|e| ConfigError::MalformedFile {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            let mut store = EntryStore::new();
            flatten_table(path, "", table, &mut store)?;
            Ok(store)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            trace!(path = %path.display(), "config file does not exist yet");
            Ok(EntryStore::new())
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Walks a parsed document, appending every scalar under its dotted name.
fn flatten_table(path: &Path, prefix: &str, table: Table, store: &mut EntryStore) -> Result<()> {
    for (key, value) in table {
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Table(nested) => flatten_table(path, &name, nested, store)?,
            Value::Array(items) => {
                for item in &items {
                    let text = scalar_to_string(path, &name, item)?;
                    append(path, store, &name, &text)?;
                }
            }
            scalar => {
                let text = scalar_to_string(path, &name, &scalar)?;
                append(path, store, &name, &text)?;
            }
        }
    }
    Ok(())
}

fn append(path: &Path, store: &mut EntryStore, name: &str, value: &str) -> Result<()> {
    store.append(name, value).map_err(|_| ConfigError::InvalidContent {
        path: path.to_path_buf(),
        message: format!("invalid config name '{name}'"),
    })
}

/// Converts a TOML scalar to the text stored for it.
fn scalar_to_string(path: &Path, name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) | Value::Table(_) => Err(ConfigError::InvalidContent {
            path: path.to_path_buf(),
            message: format!("'{name}' holds a nested value"),
        }),
    }
}

/// Renders a store as a document with one table per section header.
fn render_document(store: &EntryStore) -> Table {
    let mut document = Table::new();
    for (name, values) in store.groups() {
        let (header, variable) = split(name);
        let section = document
            .entry(header.to_string())
            .or_insert(Value::Table(Table::new()));

        let value = match values {
            [single] => Value::String(single.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        };
        if let Value::Table(section) = section {
            section.insert(variable.to_string(), value);
        }
    }
    document
}

/// Writes a store to `path` by writing a uniquely named sibling temp file
/// and renaming it over the target. The temp file is removed on any failure.
fn write_config_file(path: &Path, store: &EntryStore) -> Result<()> {
    let write_error = |source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let contents =
        toml::to_string(&render_document(store)).map_err(|e| ConfigError::SerializeError {
            path: path.to_path_buf(),
            source: e,
        })?;

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(write_error)?;
            parent
        }
        None => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp_file
        .write_all(contents.as_bytes())
        .and_then(|_| temp_file.as_file().sync_all())
        .map_err(write_error)?;
    temp_file
        .persist(path)
        .map_err(|e| write_error(e.error))?;

    debug!(path = %path.display(), "wrote config file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::store::value_pattern;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_file_backend_loads_sections_and_subsections() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
            [core]
            bare = "false"

            ["remote.origin"]
            url = "https://example.com/repo"
            fetch = ["a", "b"]
            "#,
        );

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.get("core.bare").unwrap().as_deref(), Some("false"));
        assert_eq!(
            backend.get("remote.origin.url").unwrap().as_deref(),
            Some("https://example.com/repo")
        );
        assert_eq!(backend.get_all("remote.origin.fetch").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_file_backend_accepts_nested_tables_and_scalars() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
            [remote.origin]
            prune = true
            depth = 50
            "#,
        );

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.get("remote.origin.prune").unwrap().as_deref(), Some("true"));
        assert_eq!(backend.get("remote.origin.depth").unwrap().as_deref(), Some("50"));
    }

    #[test]
    fn test_file_backend_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path().join("nope")).unwrap();
        assert!(backend.entries().unwrap().is_empty());
    }

    #[test]
    fn test_file_backend_rejects_empty_path() {
        assert!(matches!(
            FileBackend::open(""),
            Err(ConfigError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_file_backend_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[core\nbare = ");
        assert!(matches!(
            FileBackend::open(&path),
            Err(ConfigError::MalformedFile { .. })
        ));
    }

    #[test]
    fn test_file_backend_rejects_unsectioned_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bare = true\n");
        assert!(matches!(
            FileBackend::open(&path),
            Err(ConfigError::InvalidContent { .. })
        ));
    }

    #[test]
    fn test_file_backend_writes_are_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.set("core.bare", "true").unwrap();
        backend
            .set_multivar("remote.origin.fetch", &value_pattern("^$").unwrap(), "a")
            .unwrap();
        backend
            .set_multivar("remote.origin.fetch", &value_pattern("^b").unwrap(), "b")
            .unwrap();

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("core.bare").unwrap().as_deref(), Some("true"));
        assert_eq!(
            reopened.get_all("remote.origin.fetch").unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(reopened.entries().unwrap(), backend.entries().unwrap());
    }

    #[test]
    fn test_file_backend_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");

        let mut first = FileBackend::open(&path).unwrap();
        let mut second = FileBackend::open(&path).unwrap();
        first.set("core.bare", "true").unwrap();
        second.set("user.name", "Jane").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("config")]);

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("core.bare").unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get("user.name").unwrap().as_deref(), Some("Jane"));
    }

    #[test]
    fn test_file_backend_refresh_sees_external_edits() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[core]\nbare = \"true\"\n");

        let mut backend = FileBackend::open(&path).unwrap();
        fs::write(&path, "[core]\nbare = \"false\"\n").unwrap();
        assert_eq!(backend.get("core.bare").unwrap().as_deref(), Some("true"));

        backend.refresh().unwrap();
        assert_eq!(backend.get("core.bare").unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn test_file_backend_write_keeps_external_edits() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[core]\nbare = \"true\"\n");

        let mut backend = FileBackend::open(&path).unwrap();
        fs::write(&path, "[core]\nbare = \"true\"\neditor = \"vi\"\n").unwrap();
        backend.set("user.name", "Jane").unwrap();

        assert_eq!(backend.get("core.editor").unwrap().as_deref(), Some("vi"));
        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("user.name").unwrap().as_deref(), Some("Jane"));
        assert_eq!(reopened.get("core.editor").unwrap().as_deref(), Some("vi"));
    }
}
