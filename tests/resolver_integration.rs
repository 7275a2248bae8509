//! Integration tests for the source-resolution strategy chain.
//!
//! A fake `HttpFetch` records every requested URL, so these tests pin both
//! the outcome of resolution and the order in which strategies fire.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};

use mcpscan::descriptor::ServerDescriptor;
use mcpscan::resolve::{HttpFetch, SourceResolver};

/// Canned-response fetcher that logs every request.
#[derive(Default)]
struct FakeFetch {
    responses: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetch {
    fn with_response(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl HttpFetch for FakeFetch {
    async fn get_json(&self, url: &str, _timeout: Duration) -> Option<Value> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses.get(url).cloned()
    }
}

fn npm_server(package: &str) -> ServerDescriptor {
    ServerDescriptor {
        name: "test".into(),
        npm_package: Some(package.into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_existing_source_url_short_circuits() {
    let fetch = FakeFetch::default();
    let resolver = SourceResolver::with_fetch(fetch);
    let mut server = ServerDescriptor {
        name: "local".into(),
        source_url: Some("https://github.com/acme/known".into()),
        npm_package: Some("acme-pkg".into()),
        ..Default::default()
    };

    resolver.resolve(&mut server).await;

    assert_eq!(server.source_url.as_deref(), Some("https://github.com/acme/known"));
}

#[tokio::test]
async fn test_npm_metadata_wins() {
    let fetch = FakeFetch::default().with_response(
        "https://registry.npmjs.org/left-pad",
        json!({"repository": {"url": "git+https://github.com/left-pad/left-pad.git"}}),
    );
    let resolver = SourceResolver::with_fetch(fetch);
    let mut server = npm_server("left-pad");

    resolver.resolve(&mut server).await;

    assert_eq!(
        server.source_url.as_deref(),
        Some("https://github.com/left-pad/left-pad")
    );
}

#[tokio::test]
async fn test_npm_miss_falls_through_to_code_search() {
    let fetch = FakeFetch::default().with_response(
        "https://api.github.com/search/repositories?q=ghost-pkg&per_page=1",
        json!({"items": [{"html_url": "https://github.com/someone/ghost-pkg"}]}),
    );
    let resolver = SourceResolver::with_fetch(fetch);
    let mut server = npm_server("ghost-pkg");

    resolver.resolve(&mut server).await;

    assert_eq!(
        server.source_url.as_deref(),
        Some("https://github.com/someone/ghost-pkg")
    );
}

#[tokio::test]
async fn test_npm_chain_order_and_page_fallback() {
    let resolver = SourceResolver::with_fetch(FakeFetch::default());
    let mut server = npm_server("ghost-pkg");

    resolver.resolve(&mut server).await;

    // Both strategies missed, so the package page is the answer of record.
    assert_eq!(
        server.source_url.as_deref(),
        Some("https://www.npmjs.com/package/ghost-pkg")
    );
}

#[tokio::test]
async fn test_npm_strategies_fire_in_order() {
    let fetch = FakeFetch::default();
    let resolver = SourceResolver::with_fetch(fetch);
    let mut server = npm_server("ghost-pkg");

    resolver.resolve(&mut server).await;

    let calls = resolver_calls(&resolver);
    assert_eq!(
        calls,
        vec![
            "https://registry.npmjs.org/ghost-pkg".to_string(),
            "https://api.github.com/search/repositories?q=ghost-pkg&per_page=1".to_string(),
        ]
    );
}

fn resolver_calls(resolver: &SourceResolver<FakeFetch>) -> Vec<String> {
    resolver.fetcher().calls()
}

#[tokio::test]
async fn test_scoped_npm_package_is_encoded() {
    let fetch = FakeFetch::default().with_response(
        "https://registry.npmjs.org/%40acme%2fmcp-server",
        json!({"repository": {"url": "https://github.com/acme/mcp-server"}}),
    );
    let resolver = SourceResolver::with_fetch(fetch);
    let mut server = npm_server("@acme/mcp-server");

    resolver.resolve(&mut server).await;

    assert_eq!(
        server.source_url.as_deref(),
        Some("https://github.com/acme/mcp-server")
    );
}

#[tokio::test]
async fn test_pypi_project_urls_then_page_fallback() {
    let fetch = FakeFetch::default().with_response(
        "https://pypi.org/pypi/mcp-server-git/json",
        json!({"info": {"project_urls": {"Source": "https://github.com/mcp/git-server"}}}),
    );
    let resolver = SourceResolver::with_fetch(fetch);
    let mut server = ServerDescriptor {
        name: "git".into(),
        py_package: Some("mcp-server-git".into()),
        ..Default::default()
    };
    resolver.resolve(&mut server).await;
    assert_eq!(
        server.source_url.as_deref(),
        Some("https://github.com/mcp/git-server")
    );

    let resolver = SourceResolver::with_fetch(FakeFetch::default());
    let mut server = ServerDescriptor {
        name: "git".into(),
        py_package: Some("unknown-pkg".into()),
        ..Default::default()
    };
    resolver.resolve(&mut server).await;
    assert_eq!(
        server.source_url.as_deref(),
        Some("https://pypi.org/project/unknown-pkg/")
    );
}

#[tokio::test]
async fn test_remote_service_probe_order() {
    // Only the third candidate exists.
    let fetch = FakeFetch::default().with_response(
        "https://registry.npmjs.org/mcp-server-linear",
        json!({"repository": {"url": "https://github.com/linear/mcp-server"}}),
    );
    let resolver = SourceResolver::with_fetch(fetch);
    let mut server = ServerDescriptor {
        name: "linear".into(),
        url: Some("https://mcp.linear.app/sse".into()),
        remote_service: Some("linear".into()),
        ..Default::default()
    };

    resolver.resolve(&mut server).await;

    assert_eq!(
        server.source_url.as_deref(),
        Some("https://github.com/linear/mcp-server")
    );
    let calls = resolver_calls(&resolver);
    assert_eq!(
        calls,
        vec![
            "https://registry.npmjs.org/%40linear%2fmcp-server-linear".to_string(),
            "https://registry.npmjs.org/linear-mcp".to_string(),
            "https://registry.npmjs.org/mcp-server-linear".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_raw_url_yields_search_page() {
    let resolver = SourceResolver::with_fetch(FakeFetch::default());
    let mut server = ServerDescriptor {
        name: "local".into(),
        url: Some("http://localhost:3000/mcp".into()),
        ..Default::default()
    };

    resolver.resolve(&mut server).await;

    assert_eq!(
        server.source_url.as_deref(),
        Some("https://github.com/search?q=localhost+MCP&type=repositories")
    );
}

#[tokio::test]
async fn test_unresolvable_descriptor_stays_none() {
    let resolver = SourceResolver::with_fetch(FakeFetch::default());
    let mut server = ServerDescriptor {
        name: "mystery".into(),
        command: Some("/opt/custom/bin/server".into()),
        ..Default::default()
    };

    resolver.resolve(&mut server).await;

    assert!(server.source_url.is_none());
    assert!(resolver_calls(&resolver).is_empty());
}
