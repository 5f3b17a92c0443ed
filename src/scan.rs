// readmegen/src/scan.rs
//! Tree walker: depth-first, depth-bounded traversal of a project producing a
//! [`ScanResult`] (files, directories, contents) under the budget policy.
//!
//! Siblings are visited in directory-listing order (no sorting), so the order
//! of `files`/`directories` is reproducible for a fixed filesystem layout.
//! Only a missing or unreadable root is fatal; every other failure is logged
//! and skips one entry or one subtree.

use ignore::gitignore::{
    Gitignore,
    GitignoreBuilder
};
use serde::Serialize;
use sha1::{
    Digest,
    Sha1
};
use std::{
    collections::{
        BTreeMap,
        BTreeSet,
        HashSet
    },
    fs,
    io,
    path::{
        Path,
        PathBuf
    },
};
use thiserror::Error;
use tracing::{
    debug,
    info,
    warn
};
use walkdir::{
    DirEntry,
    WalkDir
};
use crate::{
    budget::{
        self,
        Ceiling,
        ReadOutcome
    },
    classify::{
        self,
        Classification,
        ProjectType
    },
    config::ScanConfig,
    importance,
    util::normalize_rel,
};

/// Deepest directory level that is listed; the root is level 0.
pub const MAX_DEPTH: usize = 5;

/// Root-level preconditions; the only way `scan` fails.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("project root {0} does not exist")]
    Missing(PathBuf),
    #[error("project root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot read project root {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything the engine learned about one project.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Relative paths in discovery order.
    pub files: Vec<String>,
    /// Relative paths of directories descended into, in discovery order.
    pub directories: Vec<String>,
    /// Relative path (or canonical key) → text, possibly truncated.
    pub contents: BTreeMap<String, String>,
    pub project_type: ProjectType,
    pub language_tags: BTreeSet<String>,
}

impl ScanResult {
    /// SHA-1 over files, directories and contents, in order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha1::new();
        for f in &self.files {
            hasher.update(b"f\0");
            hasher.update(f.as_bytes());
        }
        for d in &self.directories {
            hasher.update(b"d\0");
            hasher.update(d.as_bytes());
        }
        for (k, v) in &self.contents {
            hasher.update(b"c\0");
            hasher.update(k.as_bytes());
            hasher.update(b"\0");
            hasher.update(v.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Scan `root` with the built-in ignore lists plus the given extras.
pub fn scan<S: AsRef<str>>(root: &Path, extra_dirs: &[S], extra_files: &[S]) -> Result<ScanResult, ScanError> {
    scan_with(root, &ScanConfig::new(extra_dirs, extra_files))
}

/// Scan `root` with a prepared configuration.
pub fn scan_with(root: &Path, config: &ScanConfig) -> Result<ScanResult, ScanError> {
    check_root(root)?;
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let classification = classify::classify(&root);
    info!(
        root = %root.display(),
        project_type = %classification.project_type,
        tags = ?classification.language_tags,
        "classified project"
    );

    let mut walker = Walker::new(&root, config, &classification);
    walker.run();
    let result = walker.finish();
    info!(
        files = result.files.len(),
        directories = result.directories.len(),
        contents = result.contents.len(),
        "scan complete"
    );
    Ok(result)
}

/* ------------------------------- walker ------------------------------- */

/// Why a file is listed, which picks its ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileKind {
    Important,
    Source,
}

/// Immutable per-scan filters shared by pruning and visiting.
struct Filters<'a> {
    root: &'a Path,
    config: &'a ScanConfig,
    gitignore: Option<Gitignore>,
}

impl Filters<'_> {
    fn gitignored(&self, path: &Path, is_dir: bool) -> bool {
        self.gitignore
            .as_ref()
            .map(|g| g.matched(path, is_dir).is_ignore())
            .unwrap_or(false)
    }

    /// Whether walkdir may descend into (and we may report) a directory entry.
    fn descend(&self, dent: &DirEntry) -> bool {
        if !dent.file_type().is_dir() {
            return true;
        }
        let name = dent.file_name().to_string_lossy();
        if dent.depth() > MAX_DEPTH {
            debug!(dir = %dent.path().display(), "depth bound reached");
            return false;
        }
        if self.config.ignores_directory(&name) {
            debug!(dir = %name, "ignored directory");
            return false;
        }
        if !importance::is_important_directory(&name) {
            debug!(dir = %name, "unimportant directory");
            return false;
        }
        if self.gitignored(dent.path(), true) {
            debug!(dir = %name, "gitignored directory");
            return false;
        }
        true
    }
}

struct Walker<'a> {
    filters: Filters<'a>,
    source_exts: Vec<&'static str>,
    quota: usize,
    /// Root files already captured by the classifier.
    captured: HashSet<String>,
    result: ScanResult,
}

impl<'a> Walker<'a> {
    fn new(root: &'a Path, config: &'a ScanConfig, c: &Classification) -> Self {
        let gitignore = if config.respect_gitignore { load_gitignore(root) } else { None };
        let mut result = ScanResult {
            project_type: c.project_type,
            language_tags: c.language_tags.clone(),
            ..Default::default()
        };
        let mut captured = HashSet::new();
        for cap in &c.captures {
            result.contents.insert(cap.key.clone(), cap.content.clone());
            captured.insert(cap.rel_path.clone());
        }
        Self {
            filters: Filters { root, config, gitignore },
            source_exts: importance::source_extensions(c.project_type, &c.language_tags),
            quota: budget::max_content_files(c.project_type),
            captured,
            result,
        }
    }

    fn run(&mut self) {
        let root = self.filters.root;
        let entries = WalkDir::new(root)
            .min_depth(1)
            .max_depth(MAX_DEPTH + 1)
            .follow_links(false)
            .into_iter();

        let filters = &self.filters;
        let mut visits: Vec<(DirEntry, bool)> = Vec::new();
        // Directories walkdir yielded but then failed to list.
        let mut unlisted: HashSet<PathBuf> = HashSet::new();
        for dent in entries.filter_entry(|d| filters.descend(d)) {
            match dent {
                Ok(d) => {
                    let is_dir = d.file_type().is_dir();
                    visits.push((d, is_dir));
                }
                Err(e) => {
                    let at = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    warn!(path = %at, error = %e, "skipping unreadable entry");
                    if let Some(p) = e.path() {
                        unlisted.insert(p.to_path_buf());
                    }
                }
            }
        }

        for (dent, is_dir) in visits {
            let rel = normalize_rel(root, dent.path());
            if is_dir {
                if unlisted.contains(dent.path()) {
                    continue;
                }
                self.result.directories.push(rel);
            } else if dent.path().is_file() {
                self.visit_file(&dent, rel);
            }
        }
    }

    fn visit_file(&mut self, dent: &DirEntry, rel: String) {
        let name = dent.file_name().to_string_lossy().into_owned();
        if self.filters.config.ignores_file(&name) || self.filters.gitignored(dent.path(), false) {
            debug!(file = %rel, "ignored file");
            return;
        }

        let kind = if importance::is_important_file(&rel) {
            FileKind::Important
        } else if self.source_exts.contains(&importance::extension(&name).as_str()) {
            FileKind::Source
        } else {
            return;
        };
        self.result.files.push(rel.clone());

        if self.captured.contains(&rel) {
            return;
        }
        if self.result.contents.len() >= self.quota {
            debug!(file = %rel, quota = self.quota, "content quota reached; listed only");
            return;
        }
        if kind == FileKind::Important && !importance::is_readable(&name) {
            debug!(file = %rel, "not a readable text type; listed only");
            return;
        }

        let ceiling = match kind {
            FileKind::Important => Ceiling::Important,
            FileKind::Source => Ceiling::Source,
        };
        match budget::read_bounded(dent.path(), ceiling.bytes()) {
            ReadOutcome::Text { content, truncated } => {
                if truncated {
                    debug!(file = %rel, ceiling = ceiling.bytes(), "content truncated");
                }
                self.result.contents.insert(rel, content);
            }
            ReadOutcome::Binary => debug!(file = %rel, "binary content skipped"),
            ReadOutcome::Failed(e) => warn!(file = %rel, error = %e, "cannot read file"),
        }
    }

    fn finish(self) -> ScanResult {
        self.result
    }
}

/* ----------------------------- helpers ----------------------------- */

fn check_root(root: &Path) -> Result<(), ScanError> {
    let meta = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScanError::Missing(root.to_path_buf()),
        _ => ScanError::Unreadable { path: root.to_path_buf(), source: e },
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|e| ScanError::Unreadable { path: root.to_path_buf(), source: e })?;
    Ok(())
}

fn load_gitignore(root: &Path) -> Option<Gitignore> {
    let file = root.join(".gitignore");
    if !file.is_file() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(root);
    if let Some(e) = builder.add(&file) {
        warn!(error = %e, "partially invalid .gitignore");
    }
    match builder.build() {
        Ok(g) => Some(g),
        Err(e) => {
            warn!(error = %e, "cannot build .gitignore matcher; ignoring it");
            None
        }
    }
}
