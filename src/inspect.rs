//! Lightweight package characterization over collected files.
//!
//! Determines dominant language, package type, declared MCP tools and
//! prompts, and the entrypoint file. All of it is shape-matching over the
//! collected text; results are hints for display, not ground truth.

use std::collections::BTreeSet;
use std::collections::HashMap;

use lazy_static::lazy_static;
use phf::phf_set;
use regex::Regex;
use serde::Serialize;

use crate::collect::CollectedFile;
use crate::detect::Finding;

/// Broad classification of what the collected tree is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    McpServer,
    AgentSkill,
    CliTool,
    Library,
}

impl PackageType {
    pub fn label(&self) -> &'static str {
        match self {
            PackageType::McpServer => "mcp-server",
            PackageType::AgentSkill => "agent-skill",
            PackageType::CliTool => "cli-tool",
            PackageType::Library => "library",
        }
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Characterization of a collected package.
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub package_type: PackageType,
    pub language: String,
    pub tools: Vec<String>,
    pub prompts: Vec<String>,
    pub entrypoint: Option<String>,
}

lazy_static! {
    /// JS/TS tool declarations: `name: 'tool_name'` shapes.
    static ref TOOL_NAME_RE: Regex =
        Regex::new(r#"(?i)(?:name|tool_name)['":\s]+['"]([a-z_][a-z0-9_]*)['"]"#).unwrap();

    /// Python decorator form: `@mcp.tool()` followed by a `def`.
    static ref TOOL_DECORATOR_RE: Regex =
        Regex::new(r"(?is)@(?:mcp|server)\.tool\(\).*?def\s+([a-z_][a-z0-9_]*)").unwrap();

    /// Python constructor form: `Tool(name="...")`.
    static ref TOOL_CTOR_RE: Regex =
        Regex::new(r#"(?i)Tool\s*\(\s*name\s*=\s*['"]([a-z_][a-z0-9_]*)['"]"#).unwrap();

    /// ListTools handler entries: `"name": "tool_name"`.
    static ref TOOL_ENTRY_RE: Regex =
        Regex::new(r#"(?i)['"]name['"]\s*:\s*['"]([a-z_][a-z0-9_]*)['"]"#).unwrap();

    static ref PROMPT_NAME_RE: Regex =
        Regex::new(r#"(?i)prompt['":\s]+['"]([a-z_][a-z0-9_]*)['"]"#).unwrap();

    static ref PROMPT_DECORATOR_RE: Regex =
        Regex::new(r"(?is)@(?:mcp|server)\.prompt\(\).*?def\s+([a-z_][a-z0-9_]*)").unwrap();
}

/// JSON-schema keywords and literals the tool patterns keep matching.
static NAME_STOP_WORDS: phf::Set<&'static str> = phf_set! {
    "type", "name", "string", "object", "number", "boolean", "array",
    "required", "description", "default", "null", "true", "false", "none",
};

const ENTRYPOINT_CANDIDATES: &[&str] = &[
    "index.js",
    "index.ts",
    "index.mjs",
    "main.py",
    "server.py",
    "app.py",
    "src/index.ts",
    "src/main.ts",
    "src/index.js",
];

/// Characterize a collected file set.
pub fn inspect(files: &[CollectedFile]) -> PackageInfo {
    PackageInfo {
        package_type: package_type(files),
        language: dominant_language(files),
        tools: extract_names(
            files,
            &[&TOOL_NAME_RE, &TOOL_DECORATOR_RE, &TOOL_CTOR_RE, &TOOL_ENTRY_RE],
        ),
        prompts: extract_names(files, &[&PROMPT_NAME_RE, &PROMPT_DECORATOR_RE]),
        entrypoint: ENTRYPOINT_CANDIDATES
            .iter()
            .find(|candidate| files.iter().any(|f| f.path == **candidate))
            .map(|s| s.to_string()),
    }
}

fn dominant_language(files: &[CollectedFile]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for file in files {
        if let Some((_, ext)) = file.path.rsplit_once('.') {
            *counts.entry(ext).or_default() += 1;
        }
    }
    let top = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)));
    match top {
        Some((ext, _)) => match ext {
            "py" => "Python".to_string(),
            "js" | "mjs" => "JavaScript".to_string(),
            "ts" => "TypeScript".to_string(),
            "rs" => "Rust".to_string(),
            "go" => "Go".to_string(),
            "java" => "Java".to_string(),
            "rb" => "Ruby".to_string(),
            other => other.to_string(),
        },
        None => "unknown".to_string(),
    }
}

fn package_type(files: &[CollectedFile]) -> PackageType {
    let mentions = |needle: &str| files.iter().any(|f| f.content.contains(needle));

    if mentions("@modelcontextprotocol")
        || mentions("FastMCP")
        || mentions("mcp.server")
        || mentions("mcp_server")
    {
        return PackageType::McpServer;
    }
    if files.iter().any(|f| f.path.eq_ignore_ascii_case("skill.md")) {
        return PackageType::AgentSkill;
    }
    if mentions("#!/usr/bin/env") || mentions("argparse") || mentions("commander") {
        return PackageType::CliTool;
    }
    PackageType::Library
}

fn extract_names(files: &[CollectedFile], patterns: &[&Regex]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for file in files {
        for pattern in patterns {
            for captures in pattern.captures_iter(&file.content) {
                let name = &captures[1];
                if name.len() > 2 && name.len() < 50 && !NAME_STOP_WORDS.contains(name) {
                    names.insert(name.to_string());
                }
            }
        }
    }
    names.into_iter().collect()
}

/// First finding whose snippet mentions the tool or prompt name. Purely a
/// display hint: snippet substring overlap is not evidence the tool is the
/// vulnerable code path.
pub fn flagged_finding<'f>(name: &str, findings: &'f [Finding]) -> Option<&'f Finding> {
    let lower = name.to_lowercase();
    findings
        .iter()
        .find(|f| f.snippet.to_lowercase().contains(&lower))
}
