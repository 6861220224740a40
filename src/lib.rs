//! A layered, typed key-value configuration store.
//!
//! Several backends (files or in-memory stores) are bound at precedence
//! levels, `System < Xdg < Global < Local < App`, and read as one logical
//! configuration in which the most specific level wins.
//!
//! ```no_run
//! use layerconf::{Config, ConfigLevel};
//!
//! let mut config = Config::new();
//! config.add_file("/tmp/a.cfg", ConfigLevel::Local, true)?;
//! config.set_string("core.bare", "true")?;
//! assert!(config.get_bool("core.bare")?);
//! config.free();
//! # Ok::<(), layerconf::ConfigError>(())
//! ```

pub mod config;

pub use config::{
    Config, ConfigBackend, ConfigEntry, ConfigError, ConfigLevel, ErrorKind, FileBackend,
    MemoryBackend, Result,
};
