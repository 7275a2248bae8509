//! PyPI strategy helpers.

use super::{is_http, normalize_repo_url, HttpFetch, METADATA_TIMEOUT};

/// project_urls keys checked in order before falling back to home_page.
const PROJECT_URL_KEYS: &[&str] = &["Source", "Repository", "Homepage", "Source Code"];

/// Repository URL from PyPI metadata, if the project exists and declares one.
pub(super) async fn repository<F: HttpFetch>(fetch: &F, package: &str) -> Option<String> {
    let url = format!("https://pypi.org/pypi/{}/json", package);
    let metadata = fetch.get_json(&url, METADATA_TIMEOUT).await?;
    repository_from_metadata(&metadata)
}

fn repository_from_metadata(metadata: &serde_json::Value) -> Option<String> {
    let info = metadata.get("info")?;

    if let Some(urls) = info.get("project_urls").and_then(|v| v.as_object()) {
        for key in PROJECT_URL_KEYS {
            if let Some(raw) = urls.get(*key).and_then(|v| v.as_str()) {
                let normalized = normalize_repo_url(raw);
                if is_http(&normalized) {
                    return Some(normalized);
                }
            }
        }
    }

    let home = info.get("home_page").and_then(|v| v.as_str())?;
    let normalized = normalize_repo_url(home);
    is_http(&normalized).then_some(normalized)
}

/// Project page on pypi.org, the last-resort URL for a known PyPI package.
pub(super) fn project_page(package: &str) -> String {
    format!("https://pypi.org/project/{}/", package)
}
