// readmegen/src/classify.rs
//! Project classification from the root's immediate files.
//!
//! - Marker table decides the project type (first table entry present wins)
//! - `package.json` is parsed for framework/tool tags
//! - Manifest, readme and license are captured under canonical keys
//!
//! Nothing here fails the scan: unreadable roots and broken manifests are
//! logged and the classification degrades.

use serde::{
    Deserialize,
    Serialize
};
use std::{
    collections::{
        BTreeMap,
        BTreeSet
    },
    fmt,
    fs,
    path::Path,
};
use tracing::{
    debug,
    warn
};
use crate::budget::{
    self,
    Ceiling,
    ReadOutcome
};

/// Closed set of ecosystems the scanner knows about.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Node,
    Python,
    Java,
    Rust,
    Go,
    Ruby,
    Php,
    #[default]
    Unknown,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Node => "node",
            ProjectType::Python => "python",
            ProjectType::Java => "java",
            ProjectType::Rust => "rust",
            ProjectType::Go => "go",
            ProjectType::Ruby => "ruby",
            ProjectType::Php => "php",
            ProjectType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker file → project type, scanned in order.
pub const MARKERS: &[(&str, ProjectType)] = &[
    ("package.json",     ProjectType::Node),
    ("requirements.txt", ProjectType::Python),
    ("setup.py",         ProjectType::Python),
    ("pyproject.toml",   ProjectType::Python),
    ("pom.xml",          ProjectType::Java),
    ("build.gradle",     ProjectType::Java),
    ("build.gradle.kts", ProjectType::Java),
    ("Cargo.toml",       ProjectType::Rust),
    ("go.mod",           ProjectType::Go),
    ("Gemfile",          ProjectType::Ruby),
    ("composer.json",    ProjectType::Php),
];

/// Canonical `contents` key for a top-level readme.
pub const README_KEY: &str = "README.md";
/// Canonical `contents` key for a top-level license.
pub const LICENSE_KEY: &str = "LICENSE";

/// Accepted readme names, most preferred first (compared ignoring ASCII case).
pub const README_NAMES: &[&str] = &["README.md", "README.markdown", "README", "README.rst", "README.txt"];
/// Accepted license names, most preferred first (compared ignoring ASCII case).
pub const LICENSE_NAMES: &[&str] = &[
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENCE",
    "LICENCE.md",
    "LICENCE.txt",
    "COPYING",
    "LICENSE-MIT",
    "LICENSE-APACHE",
];

/// `package.json` dependency name → tag.
const NODE_DEPENDENCY_TAGS: &[(&str, &str)] = &[
    ("react",         "react"),
    ("vue",           "vue"),
    ("@angular/core", "angular"),
    ("svelte",        "svelte"),
    ("next",          "next"),
    ("nuxt",          "nuxt"),
    ("express",       "express"),
    ("@nestjs/core",  "nestjs"),
    ("electron",      "electron"),
    ("jest",          "jest"),
    ("vite",          "vite"),
    ("webpack",       "webpack"),
    ("typescript",    "typescript"),
];

/// Root file captured before the walk, stored under `key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    pub key: String,
    /// Actual relative path (differs from `key` only in case or suffix).
    pub rel_path: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub project_type: ProjectType,
    pub language_tags: BTreeSet<String>,
    pub captures: Vec<Capture>,
}

#[derive(Deserialize, Default)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Classify `root` from its immediate file entries only.
pub fn classify(root: &Path) -> Classification {
    let names = match root_file_names(root) {
        Ok(n) => n,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "cannot list project root; type unknown");
            return Classification::default();
        }
    };

    let mut out = Classification::default();

    if let Some((marker, ty, actual)) = detect_marker(&names) {
        out.project_type = ty;
        debug!(marker, project_type = %ty, "project marker found");
        match fs::read(root.join(actual)) {
            Ok(bytes) => {
                if ty == ProjectType::Node {
                    match node_language_tags(&bytes) {
                        Ok(tags) => out.language_tags = tags,
                        Err(e) => warn!(manifest = actual, error = %e, "unparseable package manifest; no tags"),
                    }
                }
                if let Some(content) = budget::bounded_text(&bytes, Ceiling::Important.bytes()).into_content() {
                    out.captures.push(Capture {
                        key: marker.to_string(),
                        rel_path: actual.to_string(),
                        content,
                    });
                }
            }
            Err(e) => warn!(manifest = actual, error = %e, "cannot read manifest"),
        }
    }

    let readme = preferred_name(&names, README_NAMES);
    let license = preferred_name(&names, LICENSE_NAMES);
    for (key, found) in [(README_KEY, readme), (LICENSE_KEY, license)] {
        let Some(name) = found else { continue };
        match budget::read_bounded(&root.join(name), Ceiling::Important.bytes()) {
            ReadOutcome::Text { content, .. } => out.captures.push(Capture {
                key: key.to_string(),
                rel_path: name.to_string(),
                content,
            }),
            ReadOutcome::Binary => debug!(file = %name, "binary top-level document skipped"),
            ReadOutcome::Failed(e) => warn!(file = %name, error = %e, "cannot read top-level document"),
        }
    }

    out
}

/// Tags for recognized dependencies in either dependency group.
pub fn node_language_tags(manifest: &[u8]) -> Result<BTreeSet<String>, serde_json::Error> {
    let pkg: PackageManifest = serde_json::from_slice(manifest)?;
    let tags = NODE_DEPENDENCY_TAGS
        .iter()
        .filter(|(dep, _)| pkg.dependencies.contains_key(*dep) || pkg.dev_dependencies.contains_key(*dep))
        .map(|(_, tag)| tag.to_string())
        .collect();
    Ok(tags)
}

/* ----------------------------- helpers ----------------------------- */

/// First marker in table order present among `names` (case-insensitive).
fn detect_marker(names: &[String]) -> Option<(&'static str, ProjectType, &str)> {
    MARKERS
        .iter()
        .find_map(|(marker, ty)| matching_name(names, marker).map(|n| (*marker, *ty, n)))
}

/// First entry of `preferred` present among `names`. Prefixes never match, so
/// `README.md.<stamp>.bak` or `README-old.md` are not mistaken for the readme.
fn preferred_name<'a>(names: &'a [String], preferred: &[&str]) -> Option<&'a str> {
    preferred.iter().find_map(|want| matching_name(names, want))
}

/// `want` among `names`: the exact spelling if present, else any ASCII-case variant.
fn matching_name<'a>(names: &'a [String], want: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|n| n.as_str() == want)
        .or_else(|| names.iter().find(|n| n.eq_ignore_ascii_case(want)))
        .map(String::as_str)
}

/// Regular-file names directly under `root`, in listing order.
fn root_file_names(root: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for dent in fs::read_dir(root)? {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "skipping unreadable root entry");
                continue;
            }
        };
        if !dent.path().is_file() {
            continue;
        }
        if let Some(name) = dent.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
