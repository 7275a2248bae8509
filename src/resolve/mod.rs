//! Source repository resolution for server descriptors.
//!
//! An ordered, short-circuiting chain of strategies tries to pin each server
//! to a canonical upstream URL: a source URL already known locally, npm or
//! PyPI registry metadata, a GitHub repository search, registry package
//! pages, and finally a search link for remote services. Every strategy
//! degrades to "no result" on timeout, non-success status, or unparseable
//! JSON; resolution itself never fails.

mod npm;
mod pypi;
mod search;

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::descriptor::ServerDescriptor;

/// Timeout for registry metadata and search requests.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for speculative package-name probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Minimal async HTTP surface the resolver depends on.
///
/// The production implementation wraps [`reqwest::Client`]; tests substitute
/// canned responses without touching the network.
pub trait HttpFetch {
    /// GET `url` and parse the body as JSON. Any failure (transport,
    /// timeout, non-2xx status, invalid JSON) yields `None`.
    fn get_json(&self, url: &str, timeout: Duration) -> impl Future<Output = Option<Value>> + Send;
}

/// [`HttpFetch`] backed by a shared [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mcpscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetch for ReqwestFetch {
    async fn get_json(&self, url: &str, timeout: Duration) -> Option<Value> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        response.json().await.ok()
    }
}

/// Strip VCS decoration from a manifest repository URL.
///
/// `git+https://github.com/a/b.git` and `ssh://git@github.com/a/b` both
/// normalize to `https://github.com/a/b`.
pub fn normalize_repo_url(raw: &str) -> String {
    let mut url = raw.trim().to_string();
    if let Some(stripped) = url.strip_prefix("git+") {
        url = stripped.to_string();
    }
    if let Some(stripped) = url.strip_prefix("ssh://git@github.com") {
        url = format!("https://github.com{}", stripped);
    }
    if let Some(stripped) = url.strip_suffix(".git") {
        url = stripped.to_string();
    }
    url
}

fn is_http(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Resolves descriptors to source URLs over an injected fetcher.
pub struct SourceResolver<F: HttpFetch> {
    fetch: F,
}

impl SourceResolver<ReqwestFetch> {
    pub fn new() -> Self {
        Self {
            fetch: ReqwestFetch::new(),
        }
    }
}

impl Default for SourceResolver<ReqwestFetch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: HttpFetch> SourceResolver<F> {
    pub fn with_fetch(fetch: F) -> Self {
        Self { fetch }
    }

    /// The underlying fetcher. Tests use this to inspect recorded calls.
    pub fn fetcher(&self) -> &F {
        &self.fetch
    }

    /// Fill `descriptor.source_url` using the first strategy that produces
    /// a URL. A descriptor that already carries one is left untouched.
    pub async fn resolve(&self, descriptor: &mut ServerDescriptor) {
        if descriptor.source_url.is_some() {
            return;
        }
        descriptor.source_url = self.resolve_url(descriptor).await;
    }

    async fn resolve_url(&self, descriptor: &ServerDescriptor) -> Option<String> {
        if let Some(pkg) = &descriptor.npm_package {
            if let Some(repo) = npm::repository(&self.fetch, pkg).await {
                return Some(repo);
            }
            if let Some(repo) = search::github_repository(&self.fetch, pkg).await {
                return Some(repo);
            }
            return Some(npm::package_page(pkg));
        }

        if let Some(pkg) = &descriptor.py_package {
            if let Some(repo) = pypi::repository(&self.fetch, pkg).await {
                return Some(repo);
            }
            if let Some(repo) = search::github_repository(&self.fetch, pkg).await {
                return Some(repo);
            }
            return Some(pypi::project_page(pkg));
        }

        if let Some(service) = &descriptor.remote_service {
            for candidate in npm::service_candidates(service) {
                if let Some(repo) = npm::probe_repository(&self.fetch, &candidate).await {
                    return Some(repo);
                }
            }
        }

        if let Some(url) = &descriptor.url {
            if let Ok(parsed) = url::Url::parse(url) {
                if let Some(host) = parsed.host_str() {
                    return Some(search::search_page(host));
                }
            }
        }

        None
    }
}

pub(crate) use npm::encode_package_name;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_repo_url() {
        assert_eq!(
            normalize_repo_url("git+https://github.com/acme/acme-mcp.git"),
            "https://github.com/acme/acme-mcp"
        );
        assert_eq!(
            normalize_repo_url("ssh://git@github.com/acme/acme-mcp"),
            "https://github.com/acme/acme-mcp"
        );
        assert_eq!(
            normalize_repo_url("https://github.com/acme/acme-mcp"),
            "https://github.com/acme/acme-mcp"
        );
    }

    #[test]
    fn test_is_http() {
        assert!(is_http("https://github.com/a/b"));
        assert!(is_http("http://example.com"));
        assert!(!is_http("git://github.com/a/b"));
        assert!(!is_http("file:///tmp/x"));
    }
}
