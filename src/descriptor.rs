//! Normalized server descriptors extracted from editor configs.
//!
//! A config's server map comes in several shapes (`mcpServers` or `servers`,
//! command-launched or URL-based entries). Extraction flattens each entry
//! into a [`ServerDescriptor`] and heuristically infers a package identity
//! from the invocation string. No network access happens here.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::environment::Environment;
use crate::resolve::normalize_repo_url;

/// One configured server entry, normalized.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerDescriptor {
    pub name: String,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub url: Option<String>,
    pub npm_package: Option<String>,
    pub py_package: Option<String>,
    pub remote_service: Option<String>,
    /// Canonical source repository, when already known from a local manifest.
    /// Otherwise filled in exactly once by the resolver.
    pub source_url: Option<String>,
}

impl ServerDescriptor {
    /// Human-readable source hint for display.
    pub fn source_label(&self) -> String {
        if let Some(pkg) = &self.npm_package {
            return format!("npm:{}", pkg);
        }
        if let Some(pkg) = &self.py_package {
            return format!("pip:{}", pkg);
        }
        if let Some(url) = &self.url {
            return url.clone();
        }
        let mut parts = Vec::new();
        if let Some(cmd) = &self.command {
            parts.push(cmd.clone());
        }
        parts.extend(self.args.iter().take(2).cloned());
        parts.join(" ")
    }
}

lazy_static! {
    /// `npx [-y] <package>` invocations.
    static ref NPX_RE: Regex = Regex::new(r"(?i)npx\s+(?:-y\s+)?(@?[a-z0-9][\w./-]*)").unwrap();

    /// `uvx <pkg>`, `pip run <pkg>`, `python -m <pkg>` invocations.
    static ref PY_RE: Regex =
        Regex::new(r"(?i)(?:uvx|pip run|python -m)\s+(@?[a-z0-9][\w./-]*)").unwrap();

    /// `node <path>` invocations.
    static ref NODE_RE: Regex = Regex::new(r#"node\s+["']?([^"'\s]+)"#).unwrap();
}

/// How many parent directories to search for a package manifest.
const MANIFEST_WALK_LIMIT: usize = 5;

/// Read every server entry from a parsed config.
///
/// The map is taken from `mcpServers` or `servers`, first present wins;
/// neither present yields an empty list.
pub fn extract_servers(config: &serde_json::Value, env: &Environment) -> Vec<ServerDescriptor> {
    let map = config
        .get("mcpServers")
        .or_else(|| config.get("servers"))
        .and_then(|v| v.as_object());
    let Some(map) = map else {
        return Vec::new();
    };

    map.iter()
        .map(|(name, entry)| extract_one(name, entry, env))
        .collect()
}

fn extract_one(name: &str, entry: &serde_json::Value, env: &Environment) -> ServerDescriptor {
    let command = entry
        .get("command")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let args: Vec<String> = entry
        .get("args")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let url = entry.get("url").and_then(|v| v.as_str()).map(str::to_string);

    let mut desc = ServerDescriptor {
        name: name.to_string(),
        command,
        args,
        url,
        ..Default::default()
    };

    let invocation: String = desc
        .command
        .iter()
        .chain(desc.args.iter())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(m) = NPX_RE.captures(&invocation) {
        desc.npm_package = Some(m[1].to_string());
    }

    if let Some(m) = NODE_RE.captures(&invocation) {
        if let Some(manifest) = find_manifest(Path::new(&m[1]), &env.cwd) {
            if let Some(repo) = manifest.repository_url {
                desc.source_url = Some(repo);
            }
            if let Some(pkg) = manifest.name {
                desc.npm_package = Some(pkg);
            }
        }
    }

    if let Some(m) = PY_RE.captures(&invocation) {
        desc.py_package = Some(m[1].to_string());
    }

    if desc.npm_package.is_none() && desc.py_package.is_none() {
        if let Some(raw_url) = &desc.url {
            desc.remote_service = service_name(raw_url);
        }
    }

    desc
}

struct Manifest {
    name: Option<String>,
    repository_url: Option<String>,
}

/// Walk up from a `node` script path looking for a package manifest.
fn find_manifest(script: &Path, cwd: &Path) -> Option<Manifest> {
    let absolute: PathBuf = if script.is_absolute() {
        script.to_path_buf()
    } else {
        cwd.join(script)
    };
    let mut dir = absolute.parent()?.to_path_buf();

    for _ in 0..MANIFEST_WALK_LIMIT {
        let candidate = dir.join("package.json");
        if candidate.exists() {
            let raw = std::fs::read_to_string(&candidate).ok()?;
            let pkg: serde_json::Value = serde_json::from_str(&raw).ok()?;
            let name = pkg.get("name").and_then(|v| v.as_str()).map(str::to_string);
            let repository_url = pkg
                .get("repository")
                .and_then(|r| r.get("url"))
                .and_then(|v| v.as_str())
                .map(normalize_repo_url);
            return Some(Manifest {
                name,
                repository_url,
            });
        }
        let Some(parent) = dir.parent() else { break };
        if parent == dir {
            break;
        }
        dir = parent.to_path_buf();
    }
    None
}

/// Derive a service name from a remote server URL's hostname.
///
/// `mcp.supabase.com` yields `supabase`; a two-label host yields its first
/// label. Single-label hosts produce nothing.
fn service_name(raw_url: &str) -> Option<String> {
    let parsed = Url::parse(raw_url).ok()?;
    let host = parsed.host_str()?;
    let labels: Vec<&str> = host.split('.').collect();
    match labels.len() {
        0 | 1 => None,
        3 => Some(labels[1].to_string()),
        _ => Some(labels[0].to_string()),
    }
}
