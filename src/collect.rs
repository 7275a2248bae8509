//! Bounded collection of source files from a cloned tree.
//!
//! Traversal is depth-first with entries sorted per directory, so repeated
//! collection over an unchanged tree yields an identical ordered list.
//! Build-artifact and dependency directories are pruned, binary and lockfile
//! extensions skipped, and two byte budgets cap the result: 50 KB per file
//! and 300 KB total. The total budget is never exceeded.

use std::cmp::Ordering;
use std::path::Path;

use phf::phf_set;
use walkdir::WalkDir;

/// Largest individual file content included, in bytes.
pub const MAX_FILE_SIZE: u64 = 50_000;
/// Byte budget across all collected file contents.
pub const MAX_TOTAL_SIZE: usize = 300_000;

/// Directories never descended into. Hidden directories are also pruned.
static SKIP_DIRS: phf::Set<&'static str> = phf_set! {
    "node_modules", ".git", "__pycache__", ".venv", "venv", "dist", "build",
    ".next", ".nuxt", "coverage", ".pytest_cache", ".mypy_cache", "vendor",
    "test", "tests", "__tests__", "spec", "specs", "docs", "doc",
    "examples", "example", "fixtures", ".github", ".vscode", ".idea",
    "e2e", "benchmark", "benchmarks", ".tox", ".eggs", "htmlcov",
};

/// Extensions (without dot, lowercase) never collected.
static SKIP_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "lock", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff",
    "woff2", "ttf", "eot", "mp3", "mp4", "zip", "tar", "gz",
    "map", "pyc", "pyo", "so", "dylib", "dll", "exe", "bin",
    "dat", "db", "sqlite",
};

/// Compound suffixes for minified/generated artifacts that a plain
/// extension check misses.
const SKIP_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".d.ts"];

/// Manifests and entrypoints sorted ahead of everything else when building
/// an audit payload, so they survive budget truncation.
static PRIORITY_FILES: phf::Set<&'static str> = phf_set! {
    "index.js", "index.ts", "index.mjs", "main.js", "main.ts", "main.py",
    "app.js", "app.ts", "app.py", "server.js", "server.ts", "server.py",
    "cli.js", "cli.ts", "cli.py", "__init__.py", "__main__.py",
    "package.json", "pyproject.toml", "setup.py", "setup.cfg",
    "Cargo.toml", "go.mod", "SKILL.md", "skill.md",
    "Makefile", "Dockerfile", "docker-compose.yml",
};

/// Entry ordering within a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Plain lexicographic order; oversized and empty files excluded.
    Scan,
    /// Priority files first, then lexicographic; oversized files are kept
    /// as placeholder entries that do not consume the byte budget.
    AuditPayload,
}

/// One collected file, scoped to a single collection call.
#[derive(Debug, Clone)]
pub struct CollectedFile {
    /// POSIX-style path relative to the collection root.
    pub path: String,
    pub content: String,
    pub size: u64,
}

/// Recursively collect files under `root` subject to the budgets.
///
/// Unreadable directories and files are skipped silently; they never abort
/// the walk.
pub fn collect_files(root: &Path, mode: CollectMode) -> Vec<CollectedFile> {
    let mut collected = Vec::new();
    let mut total = 0usize;

    let walker = WalkDir::new(root)
        .sort_by(move |a, b| compare_entries(mode, a.file_name(), b.file_name()))
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || keep_entry(e));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if skip_by_extension(&name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let size = meta.len();

        if size == 0 {
            continue;
        }
        if size > MAX_FILE_SIZE {
            if mode == CollectMode::AuditPayload {
                collected.push(CollectedFile {
                    path: relative_path(root, entry.path()),
                    content: format!("[FILE TOO LARGE: {} bytes — skipped]", size),
                    size,
                });
            }
            continue;
        }

        let Ok(bytes) = std::fs::read(entry.path()) else { continue };
        let content = String::from_utf8_lossy(&bytes).into_owned();
        if total + content.len() > MAX_TOTAL_SIZE {
            // Budget reached: stop the walk rather than cherry-picking
            // smaller files further down the tree.
            break;
        }
        total += content.len();
        collected.push(CollectedFile {
            path: relative_path(root, entry.path()),
            content,
            size,
        });
    }

    collected
}

fn compare_entries(mode: CollectMode, a: &std::ffi::OsStr, b: &std::ffi::OsStr) -> Ordering {
    if mode == CollectMode::AuditPayload {
        let rank = |n: &std::ffi::OsStr| {
            let name = n.to_string_lossy();
            if PRIORITY_FILES.contains(name.as_ref()) {
                0
            } else {
                1
            }
        };
        return rank(a).cmp(&rank(b)).then_with(|| a.cmp(b));
    }
    a.cmp(b)
}

fn keep_entry(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    !SKIP_DIRS.contains(name.as_ref()) && !name.starts_with('.')
}

fn skip_by_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if SKIP_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return true;
    }
    match lower.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => SKIP_EXTENSIONS.contains(ext),
        _ => false,
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
