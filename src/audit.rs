//! Deep-audit payload builder.
//!
//! Bundles a collected source tree into a single markdown document an LLM
//! (or a human reviewer) can analyze offline: task instructions, the
//! expected report shape, the audit methodology, then every file fenced
//! under a `### FILE:` heading. No model is called here.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::collect::CollectedFile;

/// Three-pass review methodology included in every payload.
const METHODOLOGY: &str = "\
Perform three passes over the source code:

1. **UNDERSTAND** — establish what the package claims to do, its entrypoints,
   declared tools/prompts, and which external systems it touches.
2. **DETECT** — look for dangerous behavior: command or code injection,
   credential handling, data exfiltration, prompt-injection content aimed at
   the calling agent, unsafe deserialization, disabled transport security.
3. **CLASSIFY** — for each issue decide severity and whether the behavior is
   by design for the package's stated purpose. Score overall risk 0-100.";

/// Example report JSON embedded in the payload instructions.
fn report_schema(slug: &str, url: &str) -> String {
    format!(
        r#"{{
  "skill_slug": "{slug}",
  "source_url": "{url}",
  "package_type": "<mcp-server|agent-skill|library|cli-tool>",
  "risk_score": <0-100>,
  "result": "<safe|caution|unsafe>",
  "max_severity": "<none|low|medium|high|critical>",
  "findings_count": <number>,
  "findings": [
    {{
      "id": "FINDING_ID",
      "title": "Short title",
      "severity": "<low|medium|high|critical>",
      "category": "<category>",
      "description": "Detailed description",
      "file": "path/to/file.js",
      "line": <line_number>,
      "remediation": "How to fix",
      "confidence": "<low|medium|high>",
      "is_by_design": <true|false>
    }}
  ]
}}"#
    )
}

/// Render the full audit payload document.
pub fn build_payload(slug: &str, url: &str, files: &[CollectedFile]) -> String {
    let mut doc = String::new();
    let _ = writeln!(doc, "# Security Audit: {}", slug);
    doc.push('\n');
    let _ = writeln!(doc, "**Source:** {}", url);
    let _ = writeln!(doc, "**Files collected:** {}", files.len());
    doc.push('\n');
    doc.push_str("## Your Task\n\n");
    doc.push_str("Analyze the source code below using the audit methodology, then produce\n");
    doc.push_str("a JSON report in the format shown.\n\n");
    doc.push_str("## Report Format\n\n");
    doc.push_str("```json\n");
    doc.push_str(&report_schema(slug, url));
    doc.push_str("\n```\n\n");
    doc.push_str("## Audit Methodology\n\n");
    doc.push_str(METHODOLOGY);
    doc.push_str("\n\n## Source Code\n");
    for file in files {
        let _ = write!(doc, "\n### FILE: {}\n```\n{}\n```\n", file.path, file.content);
    }
    doc
}

/// Where `audit --export` writes its payload, relative to the working
/// directory.
pub fn export_path(slug: &str) -> PathBuf {
    PathBuf::from(format!("audit-{}.md", slug))
}
