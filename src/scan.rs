//! Per-target scan orchestration: shallow clone, bounded collection,
//! pattern detection, and registry lookup.
//!
//! Targets are processed strictly one at a time. A failure on one target is
//! reported and the next target proceeds; only the clone step can fail,
//! everything downstream degrades instead.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

use crate::collect::{collect_files, CollectMode, CollectedFile};
use crate::detect::{self, Finding};
use crate::inspect::{self, PackageInfo};
use crate::registry::{self, RegistryRecord};
use crate::resolve::HttpFetch;

/// Upper bound on a shallow clone.
const CLONE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("clone of {url} failed: {detail}")]
    CloneFailed { url: String, detail: String },
    #[error("clone of {url} timed out after {}s", CLONE_TIMEOUT.as_secs())]
    CloneTimeout { url: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A cloned working tree. Dropping it removes the checkout.
#[derive(Debug)]
pub struct Checkout {
    tempdir: TempDir,
}

impl Checkout {
    pub fn path(&self) -> PathBuf {
        self.tempdir.path().join("repo")
    }
}

/// Shallow-clone `url` into a temporary directory.
pub async fn clone_repo(url: &str) -> Result<Checkout, ScanError> {
    let tempdir = tempfile::Builder::new().prefix("mcpscan-").tempdir()?;
    let target = tempdir.path().join("repo");

    let mut child = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg(url)
        .arg(&target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ScanError::CloneFailed {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    let waited = tokio::time::timeout(CLONE_TIMEOUT, async {
        let mut stderr = String::new();
        if let Some(pipe) = child.stderr.take() {
            use tokio::io::AsyncReadExt;
            let mut pipe = pipe;
            let _ = pipe.read_to_string(&mut stderr).await;
        }
        let status = child.wait().await;
        (status, stderr)
    })
    .await;

    match waited {
        Err(_) => {
            let _ = child.kill().await;
            Err(ScanError::CloneTimeout {
                url: url.to_string(),
            })
        }
        Ok((Err(e), _)) => Err(ScanError::CloneFailed {
            url: url.to_string(),
            detail: e.to_string(),
        }),
        Ok((Ok(status), stderr)) if !status.success() => Err(ScanError::CloneFailed {
            url: url.to_string(),
            detail: last_line(&stderr),
        }),
        Ok((Ok(_), _)) => Ok(Checkout { tempdir }),
    }
}

fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("git exited with an error")
        .trim()
        .to_string()
}

/// Everything learned about one scanned target.
pub struct ScanOutcome {
    pub slug: String,
    pub url: String,
    pub info: PackageInfo,
    pub files_scanned: usize,
    pub findings: Vec<Finding>,
    pub registry: Option<RegistryRecord>,
    pub duration: Duration,
}

/// Clone and scan a single repository URL.
pub async fn scan_target<F: HttpFetch>(fetch: &F, url: &str) -> Result<ScanOutcome, ScanError> {
    let started = Instant::now();
    let slug = registry::slug_from_url(url);

    let checkout = clone_repo(url).await?;
    let files = collect_files(&checkout.path(), CollectMode::Scan);
    let info = inspect::inspect(&files);
    let findings = detect::run(&files);
    let registry = registry::lookup(fetch, &slug).await;

    Ok(ScanOutcome {
        slug,
        url: url.to_string(),
        info,
        files_scanned: files.len(),
        findings,
        registry,
        duration: started.elapsed(),
    })
}

/// Scan several targets sequentially; one failed clone never aborts the rest.
pub async fn scan_targets<F: HttpFetch>(
    fetch: &F,
    urls: &[String],
) -> Vec<(String, Result<ScanOutcome, ScanError>)> {
    let mut results = Vec::with_capacity(urls.len());
    for url in urls {
        let outcome = scan_target(fetch, url).await;
        results.push((url.clone(), outcome));
    }
    results
}

/// Clone a repository and collect its files for an audit payload.
pub async fn collect_for_audit(url: &str) -> Result<Vec<CollectedFile>, ScanError> {
    let checkout = clone_repo(url).await?;
    Ok(collect_files(&checkout.path(), CollectMode::AuditPayload))
}
