//! Precedence levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// The precedence level a config backend is bound at.
///
/// Levels are totally ordered from least to most specific:
/// `System < Xdg < Global < Local < App`. Lookups consult the most specific
/// bound level first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLevel {
    /// System-wide configuration, e.g. `/etc/gitconfig`.
    System,
    /// XDG configuration, e.g. `~/.config/git/config`.
    Xdg,
    /// Per-user configuration, e.g. `~/.gitconfig`.
    Global,
    /// Repository configuration.
    Local,
    /// Application-defined configuration.
    App,
    /// The most specific level currently bound. Only meaningful as an
    /// argument; never stored in a registry.
    Highest,
}

impl ConfigLevel {
    /// The bindable levels, least specific first.
    pub const ALL: [ConfigLevel; 5] = [
        ConfigLevel::System,
        ConfigLevel::Xdg,
        ConfigLevel::Global,
        ConfigLevel::Local,
        ConfigLevel::App,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Xdg => "xdg",
            Self::Global => "global",
            Self::Local => "local",
            Self::App => "app",
            Self::Highest => "highest",
        }
    }

    pub fn is_highest(&self) -> bool {
        matches!(self, Self::Highest)
    }
}

impl fmt::Display for ConfigLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "xdg" => Ok(Self::Xdg),
            "global" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            "app" => Ok(Self::App),
            "highest" => Ok(Self::Highest),
            _ => Err(ConfigError::InvalidArgument(format!(
                "unknown config level '{s}'"
            ))),
        }
    }
}
