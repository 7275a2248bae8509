//! Command-line interface for mcpscan.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::audit;
use crate::descriptor::{self, ServerDescriptor};
use crate::detect::{Finding, Severity};
use crate::discover::{self, ConfigStatus};
use crate::environment::Environment;
use crate::registry;
use crate::report::{self, RiskBadge};
use crate::resolve::{ReqwestFetch, SourceResolver};
use crate::scan::{self, ScanOutcome};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Security scanner for MCP servers and agent packages.
///
/// mcpscan finds the MCP servers configured in your editors, resolves each
/// one to its source repository, checks the audit registry for prior
/// reports, and can clone and scan a repository for dangerous patterns.
#[derive(Parser)]
#[command(name = "mcpscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured MCP servers and their audit status (default)
    Discover(DiscoverArgs),
    /// Clone and scan one or more repositories
    Scan(ScanArgs),
    /// Look up packages in the audit registry
    Lookup(LookupArgs),
    /// Prepare a repository for a deep LLM-driven audit
    Audit(AuditArgs),
    /// Upload a completed audit report to the registry
    Submit(SubmitArgs),
}

#[derive(Parser, Default)]
pub struct DiscoverArgs {
    /// Also scan every server with a resolvable source repository
    #[arg(long)]
    pub quick: bool,
}

#[derive(Parser)]
pub struct ScanArgs {
    /// Repository URLs to scan
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Emit machine-readable JSON instead of the tree view
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct LookupArgs {
    /// Package names or registry slugs
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[derive(Parser)]
pub struct AuditArgs {
    /// Repository URL to audit
    pub url: String,

    /// Write the audit payload to audit-<slug>.md
    #[arg(long)]
    pub export: bool,
}

#[derive(Parser)]
pub struct SubmitArgs {
    /// Path to the report JSON produced by the audit step
    pub report: PathBuf,
}

fn severity_painted(severity: Severity) -> String {
    let label = severity.to_string().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.blue().to_string(),
        Severity::None => label.dimmed().to_string(),
    }
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// `discover`: locate editor configs, list every server, check the registry.
pub async fn run_discover(args: &DiscoverArgs) -> anyhow::Result<i32> {
    let env = Environment::from_process();
    let fetch = ReqwestFetch::new();
    let resolver = SourceResolver::with_fetch(fetch.clone());

    let sources = discover::locate_configs(&env);
    let mut scannable: Vec<String> = Vec::new();
    let mut total_servers = 0usize;
    let mut audited = 0usize;

    if sources.is_empty() {
        println!("{}", "No MCP configuration files found.".yellow());
        return Ok(EXIT_SUCCESS);
    }

    for source in &sources {
        match source.status {
            ConfigStatus::ParseError => {
                println!(
                    "{}  {}  {}",
                    "✗".red(),
                    source.platform.bold(),
                    format!("{} (parse error)", source.path.display()).dimmed()
                );
                continue;
            }
            ConfigStatus::NotFound => continue,
            ConfigStatus::Found => {}
        }
        let Some(config) = &source.config else { continue };
        let servers = descriptor::extract_servers(config, &env);
        if servers.is_empty() {
            continue;
        }

        println!(
            "{}  {}  {}",
            "●".cyan(),
            source.platform.bold(),
            source.path.display().to_string().dimmed()
        );

        for mut server in servers {
            total_servers += 1;
            resolver.resolve(&mut server).await;
            let hit = lookup_server(&fetch, &server).await;
            if hit.is_some() {
                audited += 1;
            }
            print_server(&server, hit.as_ref());
            if let Some(url) = &server.source_url {
                if is_cloneable(url) && !scannable.contains(url) {
                    scannable.push(url.clone());
                }
            }
        }
        println!();
    }

    if total_servers == 0 {
        println!("{}", "No MCP servers configured.".yellow());
        return Ok(EXIT_SUCCESS);
    }

    println!(
        "{}",
        format!(
            "{} servers found, {} audited, {} not audited",
            total_servers,
            audited,
            total_servers - audited
        )
        .dimmed()
    );

    if args.quick && !scannable.is_empty() {
        println!();
        println!("{}", format!("Scanning {} resolved repositories...", scannable.len()).bold());
        let results = scan::scan_targets(&fetch, &scannable).await;
        return Ok(report_scan_results(&results, false));
    }

    Ok(EXIT_SUCCESS)
}

/// Hosts worth handing to `git clone` during a quick scan. Package pages
/// and search links resolve too, but only these are checkouts.
const CLONEABLE_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

fn is_cloneable(url: &str) -> bool {
    CLONEABLE_HOSTS.iter().any(|host| {
        url.strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .map_or(false, |rest| rest.starts_with(&format!("{}/", host)))
    })
}

/// Registry lookup for a configured server, trying the derived slug first
/// and the raw server name second.
async fn lookup_server(
    fetch: &ReqwestFetch,
    server: &ServerDescriptor,
) -> Option<registry::RegistryRecord> {
    let slug = registry::server_slug(server);
    if let Some(record) = registry::lookup(fetch, &slug).await {
        return Some(record);
    }
    let name = server.name.to_lowercase();
    if name != slug {
        return registry::lookup(fetch, &name).await;
    }
    None
}

fn print_server(server: &ServerDescriptor, record: Option<&registry::RegistryRecord>) {
    println!(
        "├─ {}    {}",
        server.name.bold(),
        server.source_label().dimmed()
    );
    match record {
        Some(record) => {
            let score = record.score();
            let official = if record.has_official_audit {
                format!("{}  ", "✔ official".green())
            } else {
                String::new()
            };
            println!(
                "│    {} Risk {}  {}{}",
                RiskBadge::from_score(score).painted(),
                score,
                official,
                registry::skill_page(&registry::server_slug(server)).dimmed()
            );
        }
        None => match &server.source_url {
            Some(url) => println!(
                "│    {}  {}",
                "⚠ not audited".yellow(),
                format!("Run: mcpscan audit {}", url).dimmed()
            ),
            None => println!(
                "│    {}  {}",
                "⚠ not audited".yellow(),
                "Source URL unknown — check the package's GitHub/npm page".dimmed()
            ),
        },
    }
}

/// `scan`: clone, collect, and pattern-check each URL.
pub async fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let fetch = ReqwestFetch::new();
    let mut deduped: Vec<String> = Vec::new();
    let mut seen = BTreeSet::new();
    for url in &args.urls {
        if seen.insert(url.clone()) {
            deduped.push(url.clone());
        }
    }

    let mut results = Vec::with_capacity(deduped.len());
    for url in &deduped {
        let bar = if args.json {
            None
        } else {
            Some(spinner(format!("Scanning {}", registry::slug_from_url(url))))
        };
        let outcome = scan::scan_target(&fetch, url).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        results.push((url.clone(), outcome));
    }

    if args.json {
        let rendered: Vec<serde_json::Value> = results
            .iter()
            .map(|(url, result)| match result {
                Ok(outcome) => outcome_json(outcome),
                Err(e) => serde_json::json!({ "url": url, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        let code = results.iter().fold(EXIT_SUCCESS, |code, (_, r)| match r {
            Ok(o) if !o.findings.is_empty() => code.max(EXIT_FAILED),
            Ok(_) => code,
            Err(_) => code.max(EXIT_ERROR),
        });
        return Ok(code);
    }

    Ok(report_scan_results(&results, true))
}

fn outcome_json(outcome: &ScanOutcome) -> serde_json::Value {
    serde_json::json!({
        "slug": outcome.slug,
        "url": outcome.url,
        "package_type": outcome.info.package_type,
        "language": outcome.info.language,
        "tools": outcome.info.tools,
        "prompts": outcome.info.prompts,
        "entrypoint": outcome.info.entrypoint,
        "files_scanned": outcome.files_scanned,
        "findings": outcome.findings,
        "findings_count": outcome.findings.len(),
        "registry": outcome.registry.as_ref().map(|r| serde_json::json!({
            "risk_score": r.score(),
            "has_official_audit": r.has_official_audit,
        })),
        "duration_ms": outcome.duration.as_millis() as u64,
    })
}

/// Print scan results and derive the process exit code.
fn report_scan_results(results: &[(String, Result<ScanOutcome, scan::ScanError>)], verbose: bool) -> i32 {
    let mut any_findings = false;
    let mut all_failed = !results.is_empty();

    for (url, result) in results {
        match result {
            Err(e) => {
                println!("{}  {}  {}", "✗".red(), url.bold(), e.to_string().red());
            }
            Ok(outcome) => {
                all_failed = false;
                if !outcome.findings.is_empty() {
                    any_findings = true;
                }
                print_outcome(outcome, verbose);
            }
        }
    }

    print_summary(results);

    if all_failed {
        EXIT_ERROR
    } else if any_findings {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

fn print_outcome(outcome: &ScanOutcome, verbose: bool) {
    println!(
        "{}  {}  {}",
        "◉".cyan(),
        outcome.slug.bold(),
        outcome.url.dimmed()
    );
    println!(
        "│  {} · {} · {} files · {:.1}s",
        outcome.info.package_type,
        outcome.info.language,
        outcome.files_scanned,
        outcome.duration.as_secs_f64()
    );

    if verbose {
        print_tools(outcome);
    }

    if outcome.findings.is_empty() {
        println!("│  {}", "✔ no findings".green());
    } else {
        println!(
            "│  {}  {}",
            format!("Findings ({})", outcome.findings.len()).bold(),
            "static analysis — may include false positives".dimmed()
        );
        for finding in &outcome.findings {
            print_finding(finding);
        }
    }

    match &outcome.registry {
        Some(record) => {
            let score = record.score();
            println!(
                "└─ {}  {} Risk {}  {}",
                "registry".dimmed(),
                RiskBadge::from_score(score).painted(),
                score,
                registry::skill_page(&outcome.slug).dimmed()
            );
        }
        None => println!("└─ {}  {}", "registry".dimmed(), "not audited yet".dimmed()),
    }
    println!();
}

fn print_tools(outcome: &ScanOutcome) {
    let items: Vec<(&str, &String)> = outcome
        .info
        .tools
        .iter()
        .map(|t| ("tool", t))
        .chain(outcome.info.prompts.iter().map(|p| ("prompt", p)))
        .collect();
    if items.is_empty() {
        println!("│  {}", "(no tools or prompts detected)".dimmed());
        return;
    }
    for (kind, name) in items {
        match crate::inspect::flagged_finding(name, &outcome.findings) {
            Some(finding) => println!(
                "│  {:<6} {:<28} {} — {}",
                kind.dimmed(),
                name.bold(),
                format!("⚠ flagged ({})", severity_painted(finding.severity)),
                finding.title
            ),
            None => println!("│  {:<6} {:<28} {}", kind.dimmed(), name.bold(), "✔ ok".green()),
        }
    }
}

fn print_finding(finding: &Finding) {
    println!(
        "│    {} {}  {}",
        severity_painted(finding.severity),
        finding.title,
        format!("{}:{}", finding.file, finding.line).dimmed()
    );
    if !finding.snippet.is_empty() {
        println!("│      {}", finding.snippet.dimmed());
    }
}

fn print_summary(results: &[(String, Result<ScanOutcome, scan::ScanError>)]) {
    let scanned: Vec<&ScanOutcome> = results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
    if scanned.len() < 2 {
        return;
    }
    let clean = scanned.iter().filter(|o| o.findings.is_empty()).count();
    let total_findings: usize = scanned.iter().map(|o| o.findings.len()).sum();

    println!("{}", "─".repeat(60).dimmed());
    println!("  {}  {} packages scanned", "Summary".bold(), scanned.len());
    if clean > 0 {
        println!("  {}", format!("{} clean", clean).green());
    }
    if total_findings > 0 {
        println!(
            "  {}",
            format!("{} with findings ({} total)", scanned.len() - clean, total_findings).yellow()
        );
    }
}

/// `lookup`: query the registry for each package name.
pub async fn run_lookup(args: &LookupArgs) -> anyhow::Result<i32> {
    let fetch = ReqwestFetch::new();
    let mut missing = 0usize;

    for name in &args.names {
        let slug = name.trim_start_matches('@').replace('/', "-").to_lowercase();
        match registry::lookup(&fetch, &slug).await {
            Some(record) => {
                let score = record.score();
                println!(
                    "{}  {} Risk {}  {}",
                    name.bold(),
                    RiskBadge::from_score(score).painted(),
                    score,
                    registry::skill_page(&slug).dimmed()
                );
                if let Some(url) = &record.source_url {
                    println!("   {}", url.dimmed());
                }
            }
            None => {
                missing += 1;
                println!("{}  {}", name.bold(), "not found in registry".yellow());
            }
        }
    }

    Ok(if missing == args.names.len() && !args.names.is_empty() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    })
}

/// `audit`: clone a repository and build the deep-audit payload.
pub async fn run_audit(args: &AuditArgs) -> anyhow::Result<i32> {
    if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
        eprintln!("Error: audit target must be an HTTP(S) repository URL");
        return Ok(EXIT_ERROR);
    }

    let slug = registry::slug_from_url(&args.url);
    let bar = spinner(format!("Cloning {}", slug));
    let files = match scan::collect_for_audit(&args.url).await {
        Ok(files) => files,
        Err(e) => {
            bar.finish_and_clear();
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    bar.finish_and_clear();

    let total_bytes: usize = files.iter().map(|f| f.content.len()).sum();
    println!(
        "{}  {}  {}",
        "◉".cyan(),
        format!("Auditing {}", slug).bold(),
        args.url.dimmed()
    );
    println!(
        "   {} files collected ({} KB)",
        files.len(),
        total_bytes / 1024
    );

    if args.export {
        let payload = audit::build_payload(&slug, &args.url, &files);
        let path = audit::export_path(&slug);
        std::fs::write(&path, payload)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!("   {} Exported to {}", "✔".green(), path.display().to_string().bold());
        println!(
            "   {}",
            "Paste the file into any LLM for analysis, then upload the JSON report.".dimmed()
        );
    } else {
        println!(
            "   {}",
            format!("Run: mcpscan audit {} --export", args.url).dimmed()
        );
        println!(
            "   {}",
            "Writes a markdown payload you can paste into any LLM for review.".dimmed()
        );
    }

    Ok(EXIT_SUCCESS)
}

/// `submit`: validate, normalize, and upload a report JSON.
pub async fn run_submit(args: &SubmitArgs) -> anyhow::Result<i32> {
    let raw = std::fs::read_to_string(&args.report)
        .with_context(|| format!("cannot read {}", args.report.display()))?;
    let mut report: serde_json::Value =
        serde_json::from_str(&raw).context("report is not valid JSON")?;

    if let Err(e) = report::normalize_report(&mut report) {
        eprintln!("Error: {}", e);
        return Ok(EXIT_ERROR);
    }

    let env = Environment::from_process();
    let client = reqwest::Client::new();
    match registry::upload(&client, &env, &report).await {
        Ok(receipt) => {
            let slug = report
                .get("skill_slug")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let id = receipt
                .report_id
                .map(|id| format!(" (id {})", id))
                .unwrap_or_default();
            println!("{} Report submitted{}", "✔".green(), id);
            println!("  {}", registry::skill_page(slug).dimmed());
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloneable_hosts() {
        assert!(is_cloneable("https://github.com/acme/mcp-server"));
        assert!(is_cloneable("https://gitlab.com/acme/mcp-server"));
        assert!(is_cloneable("https://bitbucket.org/acme/mcp-server"));
        assert!(is_cloneable("http://github.com/acme/mcp-server"));
    }

    #[test]
    fn test_non_checkout_urls_rejected() {
        assert!(!is_cloneable("https://www.npmjs.com/package/some-mcp"));
        assert!(!is_cloneable("https://pypi.org/project/some-mcp/"));
        assert!(!is_cloneable(
            "https://github.com.evil.example/acme/mcp-server"
        ));
        assert!(!is_cloneable("https://example.com/github.com/trick"));
    }
}
