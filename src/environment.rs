//! Explicit process environment for discovery and credential lookup.
//!
//! Home directory, working directory, and config overrides are threaded
//! through an `Environment` value instead of read ad hoc from `std::env`,
//! so discovery is deterministic and testable without mutating real
//! environment state.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Environment variable pointing at an extra config file to scan.
pub const CONFIG_OVERRIDE_VAR: &str = "MCPSCAN_TEST_CONFIG";

/// Environment variable holding the registry API key.
pub const API_KEY_VAR: &str = "MCPSCAN_API_KEY";

/// Ambient paths the scanner reads from.
#[derive(Debug, Clone)]
pub struct Environment {
    /// User home directory. Editor config candidates are relative to this.
    pub home: PathBuf,
    /// Current working directory. Project-local configs are relative to this.
    pub cwd: PathBuf,
    /// XDG-style config base (`~/.config` unless overridden).
    pub config_dir: PathBuf,
    /// Extra config file to include as a discovery candidate.
    pub config_override: Option<PathBuf>,
    /// Registry API key from the process environment, when set.
    pub api_key: Option<String>,
}

impl Environment {
    /// Build from the real process environment.
    pub fn from_process() -> Self {
        let base = BaseDirs::new();
        let home = base
            .as_ref()
            .map(|b| b.home_dir().to_path_buf())
            .unwrap_or_default();
        let config_dir = base
            .as_ref()
            .map(|b| b.config_dir().to_path_buf())
            .unwrap_or_else(|| home.join(".config"));
        let cwd = std::env::current_dir().unwrap_or_default();
        let config_override = std::env::var_os(CONFIG_OVERRIDE_VAR).map(PathBuf::from);
        let api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());

        Self {
            home,
            cwd,
            config_dir,
            config_override,
            api_key,
        }
    }

    /// Build a fixed environment rooted at the given directories.
    pub fn rooted<P: AsRef<Path>>(home: P, cwd: P) -> Self {
        let home = home.as_ref().to_path_buf();
        Self {
            config_dir: home.join(".config"),
            cwd: cwd.as_ref().to_path_buf(),
            home,
            config_override: None,
            api_key: None,
        }
    }

    /// Set the extra config candidate path.
    pub fn with_config_override<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_override = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the registry API key.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }
}
