//! Discovery of MCP configuration files across AI editors.
//!
//! Each known editor keeps its server list in a JSON config at a fixed
//! location under the home directory. Every candidate yields exactly one
//! [`ConfigSource`]; a missing file or a parse failure is recorded as a
//! status, never raised as an error.

use std::path::PathBuf;

use serde::Serialize;

use crate::environment::Environment;

/// Parse status of one candidate config location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigStatus {
    Found,
    NotFound,
    ParseError,
}

impl std::fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStatus::Found => write!(f, "found"),
            ConfigStatus::NotFound => write!(f, "not found"),
            ConfigStatus::ParseError => write!(f, "parse error"),
        }
    }
}

/// One candidate config location, read once per run.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub platform: &'static str,
    pub path: PathBuf,
    pub status: ConfigStatus,
    /// Parsed JSON when status is `Found`.
    pub config: Option<serde_json::Value>,
}

impl ConfigSource {
    pub fn is_found(&self) -> bool {
        self.status == ConfigStatus::Found
    }
}

/// Known editor config locations, relative to the home directory.
const HOME_CANDIDATES: &[(&str, &[&str])] = &[
    ("Claude Desktop", &[".claude", "mcp.json"]),
    (
        "Claude Desktop",
        &["Library", "Application Support", "Claude", "claude_desktop_config.json"],
    ),
    (
        "Claude Desktop",
        &["AppData", "Roaming", "Claude", "claude_desktop_config.json"],
    ),
    ("Claude Desktop", &[".config", "claude", "claude_desktop_config.json"]),
    ("Cursor", &[".cursor", "mcp.json"]),
    ("Windsurf", &[".codeium", "windsurf", "mcp_config.json"]),
    ("VS Code", &[".vscode", "mcp.json"]),
    ("Continue", &[".continue", "config.json"]),
];

/// Project-local config locations, relative to the working directory.
const CWD_CANDIDATES: &[(&str, &[&str])] = &[
    ("Cursor (project)", &[".cursor", "mcp.json"]),
    ("VS Code (project)", &[".vscode", "mcp.json"]),
];

fn candidate_paths(env: &Environment) -> Vec<(&'static str, PathBuf)> {
    let mut out = Vec::new();
    for (platform, parts) in HOME_CANDIDATES {
        let mut path = env.home.clone();
        path.extend(parts.iter());
        out.push((*platform, path));
    }
    if let Some(override_path) = &env.config_override {
        out.push(("Test Config", override_path.clone()));
    }
    for (platform, parts) in CWD_CANDIDATES {
        let mut path = env.cwd.clone();
        path.extend(parts.iter());
        out.push((*platform, path));
    }
    out
}

/// Enumerate all candidate config locations and parse those that exist.
pub fn locate_configs(env: &Environment) -> Vec<ConfigSource> {
    candidate_paths(env)
        .into_iter()
        .map(|(platform, path)| read_candidate(platform, path))
        .collect()
}

fn read_candidate(platform: &'static str, path: PathBuf) -> ConfigSource {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => {
            return ConfigSource {
                platform,
                path,
                status: ConfigStatus::NotFound,
                config: None,
            }
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => ConfigSource {
            platform,
            path,
            status: ConfigStatus::Found,
            config: Some(value),
        },
        Err(_) => ConfigSource {
            platform,
            path,
            status: ConfigStatus::ParseError,
            config: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_configs_reported_not_found() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let env = Environment::rooted(home.path(), cwd.path());

        let sources = locate_configs(&env);
        assert_eq!(sources.len(), HOME_CANDIDATES.len() + CWD_CANDIDATES.len());
        assert!(sources.iter().all(|s| s.status == ConfigStatus::NotFound));
    }

    #[test]
    fn test_found_config_is_parsed() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let cursor_dir = home.path().join(".cursor");
        std::fs::create_dir_all(&cursor_dir).unwrap();
        std::fs::write(
            cursor_dir.join("mcp.json"),
            r#"{"mcpServers": {"demo": {"command": "npx", "args": ["-y", "left-pad"]}}}"#,
        )
        .unwrap();

        let env = Environment::rooted(home.path(), cwd.path());
        let sources = locate_configs(&env);
        let cursor = sources
            .iter()
            .find(|s| s.platform == "Cursor")
            .expect("cursor candidate present");
        assert_eq!(cursor.status, ConfigStatus::Found);
        assert!(cursor.config.as_ref().unwrap().get("mcpServers").is_some());
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let claude_dir = home.path().join(".claude");
        std::fs::create_dir_all(&claude_dir).unwrap();
        std::fs::write(claude_dir.join("mcp.json"), "{not json").unwrap();

        let env = Environment::rooted(home.path(), cwd.path());
        let sources = locate_configs(&env);
        let claude = sources
            .iter()
            .find(|s| s.path.ends_with(".claude/mcp.json"))
            .unwrap();
        assert_eq!(claude.status, ConfigStatus::ParseError);
        assert!(claude.config.is_none());
    }

    #[test]
    fn test_override_candidate_included() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let extra = cwd.path().join("extra.json");
        std::fs::write(&extra, r#"{"servers": {}}"#).unwrap();

        let env = Environment::rooted(home.path(), cwd.path()).with_config_override(&extra);
        let sources = locate_configs(&env);
        let test_cfg = sources.iter().find(|s| s.platform == "Test Config").unwrap();
        assert_eq!(test_cfg.status, ConfigStatus::Found);
    }
}
