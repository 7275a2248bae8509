//! Client for the audit registry: record lookup, report upload, and the
//! slug derivations that key both.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials;
use crate::descriptor::ServerDescriptor;
use crate::environment::Environment;
use crate::resolve::{encode_package_name, HttpFetch};

/// Default registry endpoint.
pub const DEFAULT_REGISTRY: &str = "https://agentaudit.dev";
/// Environment override for the registry base URL.
pub const REGISTRY_URL_VAR: &str = "MCPSCAN_REGISTRY_URL";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Registry base URL, honoring the environment override.
pub fn registry_base() -> String {
    std::env::var(REGISTRY_URL_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_REGISTRY.to_string())
}

/// Human-facing registry page for a slug.
pub fn skill_page(slug: &str) -> String {
    format!("{}/skills/{}", registry_base(), slug)
}

/// A prior audit record, as returned by the registry.
///
/// Older records carry `latest_risk_score` instead of `risk_score`; the
/// accessor papers over the difference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryRecord {
    #[serde(default)]
    pub risk_score: Option<u32>,
    #[serde(default)]
    pub latest_risk_score: Option<u32>,
    #[serde(default)]
    pub has_official_audit: bool,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl RegistryRecord {
    pub fn score(&self) -> u32 {
        self.risk_score.or(self.latest_risk_score).unwrap_or(0)
    }
}

/// Fetch the audit record for a slug. Misses (404, timeouts, bad JSON)
/// yield `None`.
pub async fn lookup<F: HttpFetch>(fetch: &F, slug: &str) -> Option<RegistryRecord> {
    let url = format!("{}/api/skills/{}", registry_base(), encode_package_name(slug));
    let value = fetch.get_json(&url, LOOKUP_TIMEOUT).await?;
    serde_json::from_value(value).ok()
}

/// Upload failures, reported to the user verbatim.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no API key configured; set {} or add credentials.json", credentials::API_KEY_VAR)]
    NoApiKey,
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("registry rejected the report (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Upload response on success.
#[derive(Debug, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub report_id: Option<String>,
}

/// POST a validated report to the registry. The report must already have
/// been through [`crate::report::normalize_report`].
pub async fn upload(
    client: &reqwest::Client,
    env: &Environment,
    report: &serde_json::Value,
) -> Result<UploadReceipt, UploadError> {
    let Some(api_key) = credentials::api_key(env) else {
        return Err(UploadError::NoApiKey);
    };

    let response = client
        .post(format!("{}/api/reports", registry_base()))
        .bearer_auth(api_key)
        .json(report)
        .timeout(UPLOAD_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await.unwrap_or(UploadReceipt { report_id: None }))
}

lazy_static! {
    static ref GITHUB_RE: Regex = Regex::new(r"github\.com/([^/]+)/([^/.\s]+)").unwrap();
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9-]").unwrap();
}

/// Registry slug for a source URL: the GitHub repository name when the URL
/// points at GitHub, otherwise the whole URL sanitized and truncated.
pub fn slug_from_url(url: &str) -> String {
    if let Some(captures) = GITHUB_RE.captures(url) {
        let repo = captures[2].to_lowercase();
        return NON_SLUG.replace_all(&repo, "-").into_owned();
    }
    let sanitized = NON_SLUG.replace_all(&url.to_lowercase(), "-").into_owned();
    sanitized.chars().take(60).collect()
}

/// Registry slug for a configured server, from its package identity when
/// present, otherwise its config name.
pub fn server_slug(server: &ServerDescriptor) -> String {
    if let Some(pkg) = &server.npm_package {
        return pkg.trim_start_matches('@').replace('/', "-");
    }
    if let Some(pkg) = &server.py_package {
        return NON_SLUG.replace_all(&pkg.to_lowercase(), "-").into_owned();
    }
    NON_SLUG
        .replace_all(&server.name.to_lowercase(), "-")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_github_url() {
        assert_eq!(
            slug_from_url("https://github.com/acme/Widget_Server"),
            "widget-server"
        );
        assert_eq!(
            slug_from_url("https://github.com/acme/acme-mcp/tree/main"),
            "acme-mcp"
        );
    }

    #[test]
    fn test_slug_from_non_github_url() {
        let slug = slug_from_url("https://pypi.org/project/mcp-server-git/");
        assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert!(slug.len() <= 60);
    }

    #[test]
    fn test_server_slug_prefers_npm_package() {
        let server = ServerDescriptor {
            name: "My Server".into(),
            npm_package: Some("@acme/mcp-server".into()),
            ..Default::default()
        };
        assert_eq!(server_slug(&server), "acme-mcp-server");
    }

    #[test]
    fn test_server_slug_falls_back_to_name() {
        let server = ServerDescriptor {
            name: "My Server!".into(),
            ..Default::default()
        };
        assert_eq!(server_slug(&server), "my-server-");
    }

    #[test]
    fn test_record_score_fallbacks() {
        let record = RegistryRecord {
            risk_score: Some(12),
            latest_risk_score: Some(40),
            ..Default::default()
        };
        assert_eq!(record.score(), 12);

        let record = RegistryRecord {
            latest_risk_score: Some(40),
            ..Default::default()
        };
        assert_eq!(record.score(), 40);

        assert_eq!(RegistryRecord::default().score(), 0);
    }
}
