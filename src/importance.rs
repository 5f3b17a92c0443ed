// readmegen/src/importance.rs
//! Importance oracle. Pure predicates and pattern tables, no state beyond
//! the lazily compiled regexes.
//!
//! - `is_important_file` / `is_important_directory`
//! - `priority_patterns` / `main_file_patterns` (basename matchers per ecosystem)
//! - `source_extensions` (what counts as "this project's code")
//! - `is_readable` (text-like names the walker may open)

use regex::Regex;
use std::{
    path::Path,
    sync::OnceLock,
};
use crate::classify::ProjectType;

/* =============================== Name tables =============================== */

/// Root-significant basenames, lowercase.
const IMPORTANT_FILE_NAMES: &[&str] = &[
    // docs / governance
    "readme", "readme.md", "readme.rst", "readme.txt",
    "license", "license.md", "license.txt", "licence", "copying",
    "contributing.md", "code_of_conduct.md", "changelog.md", "security.md", "authors",
    // manifests
    "package.json", "tsconfig.json",
    "requirements.txt", "setup.py", "setup.cfg", "pyproject.toml", "pipfile",
    "pom.xml", "build.gradle", "build.gradle.kts", "settings.gradle",
    "cargo.toml", "go.mod", "gemfile", "composer.json",
    // build
    "makefile", "cmakelists.txt", "rakefile", "procfile",
    "dockerfile", "docker-compose.yml", "docker-compose.yaml",
    // ci
    ".travis.yml", ".gitlab-ci.yml", "jenkinsfile", "azure-pipelines.yml",
];

/// Documentation/config extensions that make any file important.
const IMPORTANT_EXTENSIONS: &[&str] = &["md", "mdx", "rst", "adoc", "txt", "yml", "yaml", "toml"];

/// Code extensions accepted on `main.*` / `index.*` entry files.
const ENTRY_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "html",
    "py", "java", "kt", "rs", "go", "rb", "php", "c", "cpp", "cs", "swift",
];

/// Directory names never descended into, lowercase.
const IGNORED_DIRECTORY_NAMES: &[&str] = &[
    // dependency caches
    "node_modules", "bower_components", "jspm_packages", "vendor",
    // vcs
    ".git", ".svn", ".hg",
    // build / output
    "dist", "build", "out", "target", "obj", ".next", ".nuxt", ".gradle",
    // virtual environments
    "venv", ".venv", "env", "virtualenv",
    // caches, coverage, logs, temp
    "__pycache__", ".pytest_cache", ".mypy_cache", ".tox", ".cache",
    "coverage", ".nyc_output", "logs", "log", "tmp", "temp",
    // editors
    ".idea", ".vscode",
];

/// Extensions the walker opens.
const READABLE_EXTENSIONS: &[&str] = &[
    "md", "mdx", "rst", "adoc", "txt", "yml", "yaml", "toml", "json", "ini", "cfg", "conf",
    "xml", "gradle", "kts", "properties", "html", "css", "scss", "sql", "graphql",
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte",
    "py", "java", "kt", "rs", "go", "rb", "php", "sh", "bash",
    "c", "h", "cpp", "hpp", "cs", "swift",
];

/// Extensionless names known to be text, lowercase.
const TEXT_FILE_NAMES: &[&str] = &[
    "readme", "license", "licence", "copying", "authors",
    "makefile", "dockerfile", "gemfile", "rakefile", "procfile", "jenkinsfile", "pipfile", "vagrantfile",
];

/// Never opened, whatever their name says.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg", "pdf",
    "zip", "gz", "tgz", "tar", "7z", "rar", "jar", "war", "class",
    "exe", "dll", "so", "dylib", "o", "a", "bin", "wasm", "pyc",
    "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "wav", "mov", "avi",
    "db", "sqlite",
];

/// Fallback source set when the ecosystem is unknown.
const BROAD_SOURCE_EXTENSIONS: &[&str] = &[
    "js", "ts", "py", "java", "kt", "rs", "go", "rb", "php", "c", "cpp", "h", "hpp", "cs", "swift",
];

/* ============================= Pattern tables ============================= */

/// Canonical entry points per ecosystem, matched against basenames.
const PRIORITY_TABLE: &[(ProjectType, &[&str])] = &[
    (ProjectType::Node,    &[r"^index\.(js|ts|mjs)$", r"^main\.(js|ts)$", r"^app\.(js|ts)$", r"^server\.(js|ts)$"]),
    (ProjectType::Python,  &[r"^main\.py$", r"^app\.py$", r"^__main__\.py$", r"^manage\.py$"]),
    (ProjectType::Java,    &[r"^Main\.java$", r"^\w*Application\.java$"]),
    (ProjectType::Rust,    &[r"^main\.rs$", r"^lib\.rs$"]),
    (ProjectType::Go,      &[r"^main\.go$"]),
    (ProjectType::Ruby,    &[r"^app\.rb$", r"^main\.rb$", r"^config\.ru$"]),
    (ProjectType::Php,     &[r"^index\.php$", r"^app\.php$"]),
    (ProjectType::Unknown, &[r"^main\.\w+$", r"^index\.\w+$"]),
];

/// Conventional entry file of a tagged UI framework.
const FRAMEWORK_ENTRY_TABLE: &[(&str, &str)] = &[
    ("react",   r"^App\.(jsx|tsx|js|ts)$"),
    ("vue",     r"^App\.vue$"),
    ("svelte",  r"^App\.svelte$"),
    ("angular", r"^app\.module\.ts$"),
    ("next",    r"^_app\.(js|jsx|ts|tsx)$"),
];

/// Generic entry files and documentation, appended after priority patterns.
const GENERIC_MAIN_PATTERNS: &[&str] = &[
    r"^main\.\w+$",
    r"^index\.\w+$",
    r"^app\.\w+$",
    r"^server\.\w+$",
    r"(?i)^readme(\.\w+)?$",
    r"(?i)^contributing(\.\w+)?$",
    r"(?i)^changelog(\.\w+)?$",
];

struct CompiledTables {
    priority: Vec<(ProjectType, Vec<Regex>)>,
    frameworks: Vec<(&'static str, Regex)>,
    generic: Vec<Regex>,
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

fn tables() -> &'static CompiledTables {
    static TABLES: OnceLock<CompiledTables> = OnceLock::new();
    TABLES.get_or_init(|| CompiledTables {
        priority: PRIORITY_TABLE.iter().map(|(t, ps)| (*t, compile_all(ps))).collect(),
        frameworks: FRAMEWORK_ENTRY_TABLE
            .iter()
            .filter_map(|(tag, p)| Regex::new(p).ok().map(|r| (*tag, r)))
            .collect(),
        generic: compile_all(GENERIC_MAIN_PATTERNS),
    })
}

/* ============================== Predicates ============================== */

/// Important by basename, documentation extension, or `main.`/`index.` entry name.
pub fn is_important_file(path: &str) -> bool {
    let name = basename(path).to_ascii_lowercase();
    if IMPORTANT_FILE_NAMES.contains(&name.as_str()) {
        return true;
    }
    let ext = extension(&name);
    if IMPORTANT_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    (name.starts_with("main.") || name.starts_with("index.")) && ENTRY_EXTENSIONS.contains(&ext.as_str())
}

/// Default-allow: only names in the ignore table are rejected.
pub fn is_important_directory(name: &str) -> bool {
    !IGNORED_DIRECTORY_NAMES.contains(&name.to_ascii_lowercase().as_str())
}

/// Whether the walker may open `name` as text.
pub fn is_readable(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let ext = extension(&lower);
    if BINARY_EXTENSIONS.contains(&ext.as_str()) {
        return false;
    }
    if READABLE_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    ext.is_empty() && TEXT_FILE_NAMES.contains(&lower.as_str())
}

/// Entry-point matchers for the ecosystem, framework entry files last.
pub fn priority_patterns<'a, I>(project_type: ProjectType, tags: I) -> Vec<&'static Regex>
where
    I: IntoIterator<Item = &'a String>,
{
    let t = tables();
    let mut out: Vec<&'static Regex> = t
        .priority
        .iter()
        .filter(|(ty, _)| *ty == project_type)
        .flat_map(|(_, rs)| rs.iter())
        .collect();
    let tags: Vec<&String> = tags.into_iter().collect();
    for (tag, re) in &t.frameworks {
        if tags.iter().any(|have| have.as_str() == *tag) {
            out.push(re);
        }
    }
    out
}

/// Priority patterns followed by generic entry and documentation names.
pub fn main_file_patterns<'a, I>(project_type: ProjectType, tags: I) -> Vec<&'static Regex>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out = priority_patterns(project_type, tags);
    out.extend(tables().generic.iter());
    out
}

/// Extensions (lowercase, no dot) considered this project's source code.
pub fn source_extensions<'a, I>(project_type: ProjectType, tags: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out: Vec<&'static str> = match project_type {
        ProjectType::Node => vec!["js", "jsx", "ts", "tsx", "mjs", "cjs"],
        ProjectType::Python => vec!["py"],
        ProjectType::Java => vec!["java", "kt"],
        ProjectType::Rust => vec!["rs"],
        ProjectType::Go => vec!["go"],
        ProjectType::Ruby => vec!["rb"],
        ProjectType::Php => vec!["php"],
        ProjectType::Unknown => BROAD_SOURCE_EXTENSIONS.to_vec(),
    };
    for tag in tags {
        let extra = match tag.as_str() {
            "vue" => "vue",
            "svelte" => "svelte",
            _ => continue,
        };
        if !out.contains(&extra) {
            out.push(extra);
        }
    }
    out
}

/// Lowercase extension of a path or name, empty when absent.
pub fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Last `/`-separated component.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_patterns_compile() {
        let t = tables();
        let declared: usize = PRIORITY_TABLE.iter().map(|(_, p)| p.len()).sum();
        let compiled: usize = t.priority.iter().map(|(_, r)| r.len()).sum();
        assert_eq!(declared, compiled);
        assert_eq!(t.frameworks.len(), FRAMEWORK_ENTRY_TABLE.len());
        assert_eq!(t.generic.len(), GENERIC_MAIN_PATTERNS.len());
    }

    #[test]
    fn important_files() {
        assert!(is_important_file("LICENSE"));
        assert!(is_important_file("sub/dir/Cargo.toml"));
        assert!(is_important_file("docs/guide.md"));
        assert!(is_important_file(".github/workflows/ci.yml"));
        assert!(is_important_file("src/index.ts"));
        assert!(is_important_file("main.py"));
        assert!(!is_important_file("src/utils.ts"));
        assert!(!is_important_file("main.png"));
        assert!(!is_important_file("logo.png"));
    }

    #[test]
    fn directories_default_allow() {
        assert!(!is_important_directory("node_modules"));
        assert!(!is_important_directory(".GIT"));
        assert!(!is_important_directory("__pycache__"));
        assert!(is_important_directory("src"));
        assert!(is_important_directory("some-unheard-of-name"));
    }

    #[test]
    fn readability() {
        assert!(is_readable("package.json"));
        assert!(is_readable("Dockerfile"));
        assert!(is_readable("LICENSE"));
        assert!(!is_readable("logo.png"));
        assert!(!is_readable("weird"));
    }

    #[test]
    fn node_priority_includes_framework_entry_when_tagged() {
        let plain = priority_patterns(ProjectType::Node, &tags(&[]));
        let react = priority_patterns(ProjectType::Node, &tags(&["react"]));
        assert_eq!(react.len(), plain.len() + 1);
        assert!(react.last().unwrap().is_match("App.tsx"));
        assert!(plain.iter().any(|r| r.is_match("index.js")));
    }

    #[test]
    fn main_patterns_extend_priority_patterns() {
        let prio = priority_patterns(ProjectType::Rust, &tags(&[]));
        let main = main_file_patterns(ProjectType::Rust, &tags(&[]));
        assert!(main.len() > prio.len());
        assert!(main.iter().any(|r| r.is_match("README.md")));
        assert!(main[..prio.len()].iter().zip(&prio).all(|(a, b)| a.as_str() == b.as_str()));
    }

    #[test]
    fn source_extensions_per_type() {
        assert_eq!(source_extensions(ProjectType::Rust, &tags(&[])), ["rs"]);
        assert!(source_extensions(ProjectType::Node, &tags(&["vue"])).contains(&"vue"));
        let broad = source_extensions(ProjectType::Unknown, &tags(&[]));
        assert!(broad.contains(&"py") && broad.contains(&"go") && broad.contains(&"rs"));
    }

    #[test]
    fn path_helpers() {
        assert_eq!(basename("a/b/c.rs"), "c.rs");
        assert_eq!(basename("c.rs"), "c.rs");
        assert_eq!(extension("a/B.TS"), "ts");
        assert_eq!(extension("Makefile"), "");
    }
}
