//! npm registry strategy helpers.

use super::{is_http, normalize_repo_url, HttpFetch, METADATA_TIMEOUT, PROBE_TIMEOUT};

const NPM_REGISTRY: &str = "https://registry.npmjs.org";

/// Percent-encode a package name for a registry path segment.
pub(crate) fn encode_package_name(name: &str) -> String {
    // Scoped packages need the whole name encoded: @ -> %40, / -> %2f
    if name.starts_with('@') {
        name.replace('@', "%40").replace('/', "%2f")
    } else {
        name.to_string()
    }
}

/// Repository URL from npm metadata, if the package exists and declares one.
pub(super) async fn repository<F: HttpFetch>(fetch: &F, package: &str) -> Option<String> {
    let url = format!("{}/{}", NPM_REGISTRY, encode_package_name(package));
    let metadata = fetch.get_json(&url, METADATA_TIMEOUT).await?;
    repository_from_metadata(&metadata)
}

/// Like [`repository`] but with the short probe timeout, for speculative
/// candidate names derived from a remote service.
pub(super) async fn probe_repository<F: HttpFetch>(fetch: &F, package: &str) -> Option<String> {
    let url = format!("{}/{}", NPM_REGISTRY, encode_package_name(package));
    let metadata = fetch.get_json(&url, PROBE_TIMEOUT).await?;
    repository_from_metadata(&metadata)
}

fn repository_from_metadata(metadata: &serde_json::Value) -> Option<String> {
    let raw = metadata
        .get("repository")
        .and_then(|r| {
            if r.is_string() {
                r.as_str()
            } else {
                r.get("url").and_then(|u| u.as_str())
            }
        })?;
    let normalized = normalize_repo_url(raw);
    is_http(&normalized).then_some(normalized)
}

/// Package page on npmjs.com, the last-resort URL for a known npm package.
pub(super) fn package_page(package: &str) -> String {
    format!("https://www.npmjs.com/package/{}", package)
}

/// Candidate npm package names for a remote service, most specific first.
pub(super) fn service_candidates(service: &str) -> Vec<String> {
    vec![
        format!("@{}/mcp-server-{}", service, service),
        format!("{}-mcp", service),
        format!("mcp-server-{}", service),
        service.to_string(),
    ]
}
