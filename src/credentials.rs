//! Read-only API key lookup.
//!
//! The key from the process environment wins; otherwise it is read from
//! `credentials.json` under the config directory carried by
//! [`Environment`]. Key registration happens out of band, so nothing here
//! ever writes.

use std::path::Path;

use crate::environment::Environment;

/// Environment variable holding the registry API key.
pub use crate::environment::API_KEY_VAR;

/// The API key, if configured anywhere.
pub fn api_key(env: &Environment) -> Option<String> {
    if let Some(key) = &env.api_key {
        return Some(key.clone());
    }
    let path = env.config_dir.join("mcpscan").join("credentials.json");
    key_from_file(&path)
}

fn key_from_file(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&raw).ok()?;
    parsed
        .get("api_key")
        .and_then(|v| v.as_str())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_read_through_environment() {
        let home = TempDir::new().unwrap();
        let cred_dir = home.path().join(".config").join("mcpscan");
        std::fs::create_dir_all(&cred_dir).unwrap();
        std::fs::write(
            cred_dir.join("credentials.json"),
            r#"{"api_key": "aa_test_key"}"#,
        )
        .unwrap();

        let env = Environment::rooted(home.path(), home.path());
        assert_eq!(api_key(&env).as_deref(), Some("aa_test_key"));
    }

    #[test]
    fn test_environment_key_wins_over_file() {
        let home = TempDir::new().unwrap();
        let cred_dir = home.path().join(".config").join("mcpscan");
        std::fs::create_dir_all(&cred_dir).unwrap();
        std::fs::write(
            cred_dir.join("credentials.json"),
            r#"{"api_key": "from_file"}"#,
        )
        .unwrap();

        let env = Environment::rooted(home.path(), home.path()).with_api_key("from_env");
        assert_eq!(api_key(&env).as_deref(), Some("from_env"));
    }

    #[test]
    fn test_missing_key_yields_none() {
        let home = TempDir::new().unwrap();
        let env = Environment::rooted(home.path(), home.path());
        assert_eq!(api_key(&env), None);
    }

    #[test]
    fn test_malformed_or_empty_file() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert_eq!(key_from_file(&bad), None);

        let empty = temp.path().join("empty.json");
        std::fs::write(&empty, r#"{"api_key": ""}"#).unwrap();
        assert_eq!(key_from_file(&empty), None);
    }
}
