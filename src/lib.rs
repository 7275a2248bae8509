//! mcpscan - security scanner for MCP servers and agent packages.
//!
//! mcpscan discovers the MCP servers configured in local editors, resolves
//! each one to a canonical source repository, consults a shared audit
//! registry, and can clone a repository to run heuristic security checks
//! over its source.
//!
//! # Architecture
//!
//! The scan pipeline is a straight line:
//!
//! - `discover`: locate editor config files on disk
//! - `descriptor`: normalize config entries into server descriptors
//! - `resolve`: map a descriptor to a source repository URL (network)
//! - `scan`: shallow-clone a repository and drive the per-target pipeline
//! - `collect`: bounded, deterministic file collection from a checkout
//! - `detect`: regex detector catalog and the finding engine
//! - `inspect`: package characterization (language, type, tools, prompts)
//! - `report`: risk badges and audit-report assembly/validation
//! - `registry`: audit registry client (lookup + upload)
//! - `audit`: deep-audit payload builder for LLM review
//!
//! Everything network-facing goes through the `HttpFetch` abstraction in
//! `resolve`, so strategies and registry lookups are testable offline.

pub mod audit;
pub mod cli;
pub mod collect;
pub mod credentials;
pub mod descriptor;
pub mod detect;
pub mod discover;
pub mod environment;
pub mod inspect;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod scan;

pub use collect::{collect_files, CollectMode, CollectedFile};
pub use descriptor::{extract_servers, ServerDescriptor};
pub use detect::{scan_files, Confidence, Detector, Finding, Severity};
pub use discover::{locate_configs, ConfigSource, ConfigStatus};
pub use environment::Environment;
pub use inspect::{inspect, PackageInfo, PackageType};
pub use registry::{RegistryRecord, UploadError};
pub use report::{max_severity, normalize_report, Report, ReportError, RiskBadge, Verdict};
pub use resolve::{normalize_repo_url, HttpFetch, ReqwestFetch, SourceResolver};
pub use scan::{scan_target, scan_targets, ScanError, ScanOutcome};
