//! Level-to-backend bindings.
//!
//! A slot either owns its backend or borrows one owned by another registry.
//! Borrowed slots hold a [`Weak`] reference; once the owner drops the
//! backend, every operation through the borrowed slot fails with
//! [`ConfigError::Closed`].

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, trace};

use super::backend::ConfigBackend;
use super::{ConfigError, ConfigLevel, Result};

type SharedBackend = Arc<Mutex<Box<dyn ConfigBackend>>>;
type BorrowedBackend = Weak<Mutex<Box<dyn ConfigBackend>>>;

#[derive(Debug)]
enum BackendRef {
    Owned(SharedBackend),
    Borrowed(BorrowedBackend),
}

impl BackendRef {
    fn upgrade(&self) -> Result<SharedBackend> {
        match self {
            Self::Owned(shared) => Ok(Arc::clone(shared)),
            Self::Borrowed(weak) => weak.upgrade().ok_or(ConfigError::Closed),
        }
    }
}

#[derive(Debug)]
struct LevelSlot {
    level: ConfigLevel,
    backend: BackendRef,
}

/// Ordered set of bound levels, least specific first.
#[derive(Debug, Default)]
pub(crate) struct LevelRegistry {
    slots: Vec<LevelSlot>,
}

impl LevelRegistry {
    /// A registry holding a single non-owning reference to `backend`.
    pub(crate) fn borrowing(level: ConfigLevel, backend: BorrowedBackend) -> Self {
        Self {
            slots: vec![LevelSlot {
                level,
                backend: BackendRef::Borrowed(backend),
            }],
        }
    }

    pub(crate) fn levels(&self) -> Vec<ConfigLevel> {
        self.slots.iter().map(|slot| slot.level).collect()
    }

    /// Whether `level` already holds a backend reading from `path`.
    pub(crate) fn is_bound_to(&self, level: ConfigLevel, path: &std::path::Path) -> Result<bool> {
        match self.slot(level) {
            Some(slot) => {
                let shared = slot.backend.upgrade()?;
                let backend = lock(&shared)?;
                Ok(backend.path() == Some(path))
            }
            None => Ok(false),
        }
    }

    /// Binds `backend` at `level`.
    ///
    /// An occupied level is replaced when `force` is set. Otherwise the call
    /// is a no-op if the existing backend reads the same file, and an error if
    /// it does not.
    pub(crate) fn attach(
        &mut self,
        backend: Box<dyn ConfigBackend>,
        level: ConfigLevel,
        force: bool,
    ) -> Result<()> {
        if level.is_highest() {
            return Err(ConfigError::InvalidArgument(
                "cannot bind a backend at the 'highest' level".to_string(),
            ));
        }

        let new_slot = LevelSlot {
            level,
            backend: BackendRef::Owned(Arc::new(Mutex::new(backend))),
        };

        match self.slots.binary_search_by_key(&level, |slot| slot.level) {
            Ok(idx) if force => {
                debug!(%level, "replacing config backend");
                self.slots[idx] = new_slot;
                Ok(())
            }
            Ok(idx) => {
                let same_file = {
                    let existing = self.slots[idx].backend.upgrade()?;
                    let existing = lock(&existing)?;
                    let incoming = new_slot.backend.upgrade()?;
                    let incoming = lock(&incoming)?;
                    existing.path().is_some() && existing.path() == incoming.path()
                };
                if same_file {
                    trace!(%level, "config backend already bound");
                    Ok(())
                } else {
                    Err(ConfigError::LevelOccupied(level))
                }
            }
            Err(idx) => {
                debug!(%level, "binding config backend");
                self.slots.insert(idx, new_slot);
                Ok(())
            }
        }
    }

    /// Maps `Highest` to the most specific bound level and checks that any
    /// other level is bound.
    pub(crate) fn resolve(&self, level: ConfigLevel) -> Result<ConfigLevel> {
        if level.is_highest() {
            return self
                .slots
                .last()
                .map(|slot| slot.level)
                .ok_or(ConfigError::LevelNotFound(level));
        }
        self.slot(level)
            .map(|slot| slot.level)
            .ok_or(ConfigError::LevelNotFound(level))
    }

    /// A non-owning reference to the backend at `level`.
    pub(crate) fn share(&self, level: ConfigLevel) -> Result<BorrowedBackend> {
        let slot = self.slot(level).ok_or(ConfigError::LevelNotFound(level))?;
        let shared = slot.backend.upgrade()?;
        Ok(Arc::downgrade(&shared))
    }

    /// Runs `f` against the most specific backend, the target of writes.
    pub(crate) fn with_write_target<T>(
        &self,
        f: impl FnOnce(ConfigLevel, &mut dyn ConfigBackend) -> Result<T>,
    ) -> Result<T> {
        let slot = self.slots.last().ok_or(ConfigError::NoWritableLevel)?;
        let level = slot.level;
        with_slot(slot, |backend| f(level, backend))
    }

    /// Visits every bound level, most specific first, stopping at the first
    /// `Some` returned by `f`.
    pub(crate) fn find_map<T>(
        &self,
        mut f: impl FnMut(ConfigLevel, &dyn ConfigBackend) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        for slot in self.slots.iter().rev() {
            let shared = slot.backend.upgrade()?;
            let backend = lock(&shared)?;
            if let Some(found) = f(slot.level, &**backend)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Visits every bound level, least specific first.
    pub(crate) fn for_each(
        &self,
        mut f: impl FnMut(ConfigLevel, &mut dyn ConfigBackend) -> Result<()>,
    ) -> Result<()> {
        for slot in &self.slots {
            let level = slot.level;
            with_slot(slot, |backend| f(level, backend))?;
        }
        Ok(())
    }

    fn slot(&self, level: ConfigLevel) -> Option<&LevelSlot> {
        self.slots
            .binary_search_by_key(&level, |slot| slot.level)
            .ok()
            .map(|idx| &self.slots[idx])
    }
}

impl Drop for LevelRegistry {
    fn drop(&mut self) {
        for slot in &self.slots {
            if let BackendRef::Owned(_) = slot.backend {
                trace!(level = %slot.level, "releasing config backend");
            }
        }
    }
}

fn with_slot<T>(slot: &LevelSlot, f: impl FnOnce(&mut dyn ConfigBackend) -> Result<T>) -> Result<T> {
    let shared = slot.backend.upgrade()?;
    let mut backend = lock(&shared)?;
    f(&mut **backend)
}

fn lock(shared: &SharedBackend) -> Result<MutexGuard<'_, Box<dyn ConfigBackend>>> {
    shared
        .lock()
        .map_err(|_| ConfigError::Backend("config backend lock poisoned".to_string()))
}
