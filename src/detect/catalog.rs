//! The fixed detector catalog.
//!
//! Twelve heuristic checks covering injection, secrets, transport security,
//! deserialization, privacy, and LLM prompt manipulation. Each is a shape
//! match over raw file content; adding or removing a detector never touches
//! the scanning loop in the parent module.

use lazy_static::lazy_static;

use super::{Detector, Severity};

lazy_static! {
    static ref CATALOG: Vec<Detector> = vec![
        Detector::new(
            "EXEC_INJECTION",
            "Command injection risk",
            Severity::High,
            "injection",
            r"(?i)(?:exec(?:Sync)?|spawn|child_process|subprocess|os\.system|os\.popen|Popen)\s*\([^)]*(?:\$\{|`|\+\s*(?:req|input|args|param|user|query))",
        ),
        Detector::new(
            "EVAL_USAGE",
            "Dynamic code evaluation",
            Severity::High,
            "injection",
            r"(?im)(?:^|[^a-z])eval\s*\([^)]*(?:input|req|user|param|arg|query)",
        ),
        Detector::new(
            "HARDCODED_SECRET",
            "Potential hardcoded secret",
            Severity::Medium,
            "secrets",
            r#"(?i)(?:api[_-]?key|password|secret|token)\s*[:=]\s*['"][A-Za-z0-9+/=_-]{16,}['"]"#,
        ),
        Detector::new(
            "SSL_DISABLED",
            "SSL/TLS verification disabled",
            Severity::Medium,
            "crypto",
            r"(?i)(?:rejectUnauthorized\s*:\s*false|verify\s*=\s*False|VERIFY_SSL\s*=\s*false|NODE_TLS_REJECT_UNAUTHORIZED|InsecureRequestWarning)",
        ),
        Detector::new(
            "PATH_TRAVERSAL",
            "Potential path traversal",
            Severity::Medium,
            "filesystem",
            r"(?i)(?:\.\./|\.\.\\|path\.join|os\.path\.join)\s*\([^)]*(?:input|req|user|param|arg|query)",
        ),
        Detector::new(
            "CORS_WILDCARD",
            "Wildcard CORS origin",
            Severity::Low,
            "network",
            r#"(?i)(?:Access-Control-Allow-Origin|cors)\s*[:({]\s*['"]\*"#,
        ),
        Detector::new(
            "TELEMETRY",
            "Undisclosed telemetry",
            Severity::Low,
            "privacy",
            r"(?i)(?:posthog|mixpanel|analytics|telemetry|tracking|sentry).*(?:init|setup|track|capture)",
        ),
        Detector::new(
            "SHELL_EXEC",
            "Shell command execution",
            Severity::High,
            "injection",
            r"(?i)(?:subprocess\.(?:run|call|Popen)|os\.system|os\.popen|execSync|child_process\.exec)\s*\(",
        ),
        Detector::new(
            "SQL_INJECTION",
            "Potential SQL injection",
            Severity::High,
            "injection",
            r#"(?i)(?:execute|query|raw)\s*\(\s*(?:f['"]|['"].*?%s|['"].*?\{|['"].*?\+)"#,
        ),
        Detector::new(
            "YAML_UNSAFE",
            "Unsafe YAML loading",
            Severity::Medium,
            "deserialization",
            r"(?i)yaml\.(?:load|unsafe_load)\s*\(",
        ),
        Detector::new(
            "PICKLE_LOAD",
            "Unsafe deserialization (pickle)",
            Severity::High,
            "deserialization",
            r"(?i)pickle\.loads?\s*\(",
        ),
        Detector::new(
            "PROMPT_INJECTION",
            "Prompt injection vector",
            Severity::High,
            "prompt-injection",
            r"(?i)(?:<IMPORTANT>|<SYSTEM>|ignore previous|you are now|new instructions)",
        ),
    ];
}

/// The fixed catalog applied during quick scans.
pub fn catalog() -> &'static [Detector] {
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_twelve_detectors() {
        assert_eq!(catalog().len(), 12);
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = catalog().iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn test_all_patterns_compile() {
        // Construction panics on a bad pattern; forcing the lazy static is
        // the whole assertion.
        assert!(catalog().iter().all(|d| !d.id.is_empty()));
    }
}
