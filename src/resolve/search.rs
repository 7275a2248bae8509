//! GitHub repository search fallback.

use url::form_urlencoded;

use super::{HttpFetch, METADATA_TIMEOUT};

/// Top repository hit for a package name, via the GitHub search API.
pub(super) async fn github_repository<F: HttpFetch>(fetch: &F, package: &str) -> Option<String> {
    let query: String = form_urlencoded::byte_serialize(package.as_bytes()).collect();
    let url = format!(
        "https://api.github.com/search/repositories?q={}&per_page=1",
        query
    );
    let results = fetch.get_json(&url, METADATA_TIMEOUT).await?;
    results
        .get("items")?
        .get(0)?
        .get("html_url")?
        .as_str()
        .map(str::to_string)
}

/// Human-facing GitHub search page for a remote host. No request is made;
/// the link itself is the result.
pub(super) fn search_page(host: &str) -> String {
    let query: String = form_urlencoded::byte_serialize(format!("{} MCP", host).as_bytes()).collect();
    format!("https://github.com/search?q={}&type=repositories", query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_page_encodes_host() {
        assert_eq!(
            search_page("mcp.linear.app"),
            "https://github.com/search?q=mcp.linear.app+MCP&type=repositories"
        );
    }
}
