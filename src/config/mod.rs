//! Layered configuration: levels, backends and the aggregate that resolves
//! across them.

mod aggregate;
mod backend;
mod error;
mod file;
mod level;
mod memory;
mod name;
mod registry;
mod store;
mod value;

pub use aggregate::Config;
pub use backend::{ConfigBackend, ConfigEntry};
pub use error::{ConfigError, ErrorKind, Result};
pub use file::FileBackend;
pub use level::ConfigLevel;
pub use memory::MemoryBackend;
pub use value::{parse_bool, parse_i32, parse_i64};
