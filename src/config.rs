// readmegen/src/config.rs
//! Per-invocation configuration.
//!
//! `ScanConfig` is what the engine sees: built-in ignore lists merged with the
//! caller's extras, built once and passed down by reference.
//! `Settings` is what the shell sees: backend choice, models, output path.
//! Layering is file (`readmegen.toml`) < environment < command line.

use anyhow::{
    Context,
    Result
};
use serde::{
    Deserialize,
    Serialize
};
use std::{
    collections::BTreeSet,
    fmt,
    fs,
    path::Path,
    str::FromStr,
};

/// Settings file looked up in the project root.
pub const SETTINGS_FILE: &str = "readmegen.toml";

/// Directories ignored by every scan, before the importance oracle is asked.
pub const DEFAULT_IGNORED_DIRECTORIES: &[&str] = &[
    ".git", ".svn", ".hg",
    "node_modules", "bower_components",
    ".vscode", ".idea",
    "dist", "build", "out", "target",
];

/// Files ignored by every scan: OS metadata, VCS config, lockfiles.
pub const DEFAULT_IGNORED_FILES: &[&str] = &[
    ".ds_store", "thumbs.db", "desktop.ini",
    ".gitattributes", ".gitmodules",
    "package-lock.json", "yarn.lock", "pnpm-lock.yaml", "cargo.lock",
    "poetry.lock", "pipfile.lock", "gemfile.lock", "composer.lock", "go.sum",
];

/* ============================== ScanConfig ============================== */

/// Ignore sets (lowercased) plus traversal switches for one scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    pub ignored_directories: BTreeSet<String>,
    pub ignored_files: BTreeSet<String>,
    /// Also honor the root `.gitignore`.
    pub respect_gitignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new::<&str>(&[], &[])
    }
}

impl ScanConfig {
    /// Defaults unioned with caller-supplied names.
    pub fn new<S: AsRef<str>>(extra_directories: &[S], extra_files: &[S]) -> Self {
        let lower = |s: &str| s.trim().to_ascii_lowercase();
        let ignored_directories = DEFAULT_IGNORED_DIRECTORIES
            .iter()
            .map(|s| lower(s))
            .chain(extra_directories.iter().map(|s| lower(s.as_ref())))
            .filter(|s| !s.is_empty())
            .collect();
        let ignored_files = DEFAULT_IGNORED_FILES
            .iter()
            .map(|s| lower(s))
            .chain(extra_files.iter().map(|s| lower(s.as_ref())))
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            ignored_directories,
            ignored_files,
            respect_gitignore: false,
        }
    }

    pub fn with_gitignore(mut self, on: bool) -> Self {
        self.respect_gitignore = on;
        self
    }

    pub fn ignores_directory(&self, name: &str) -> bool {
        self.ignored_directories.contains(&name.to_ascii_lowercase())
    }

    pub fn ignores_file(&self, name: &str) -> bool {
        self.ignored_files.contains(&name.to_ascii_lowercase())
    }
}

/* =============================== Settings =============================== */

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Locally addressed HTTP endpoint (Ollama-compatible).
    #[default]
    Ollama,
    /// Cloud API keyed by an API key (Gemini).
    Gemini,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" => Ok(BackendKind::Ollama),
            "gemini" | "cloud" => Ok(BackendKind::Gemini),
            other => Err(format!("unknown backend '{other}' (expected ollama or gemini)")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Ollama => "ollama",
            BackendKind::Gemini => "gemini",
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendKind,
    pub ollama_url: String,
    pub ollama_model: String,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    /// Output document, relative to the project root.
    pub output: String,
    pub ignored_directories: Vec<String>,
    pub ignored_files: Vec<String>,
    pub respect_gitignore: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ollama,
            ollama_url: "http://localhost:11434".into(),
            ollama_model: "llama3".into(),
            gemini_model: "gemini-1.5-flash".into(),
            gemini_api_key: None,
            output: "README.md".into(),
            ignored_directories: Vec::new(),
            ignored_files: Vec::new(),
            respect_gitignore: false,
        }
    }
}

impl Settings {
    /// Load `explicit` if given, else `<root>/readmegen.toml` when present,
    /// else defaults; then apply environment overrides.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(p) => Self::from_file(p)?,
            None => {
                let p = root.join(SETTINGS_FILE);
                if p.is_file() { Self::from_file(&p)? } else { Self::default() }
            }
        };
        settings.apply_env(|k| std::env::var(k).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing settings {}", path.display()))
    }

    /// Environment overrides; `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = get("READMEGEN_BACKEND") {
            self.backend = v.parse::<BackendKind>().map_err(anyhow::Error::msg).context("READMEGEN_BACKEND")?;
        }
        if let Some(v) = get("OLLAMA_URL") { self.ollama_url = v; }
        if let Some(v) = get("OLLAMA_MODEL") { self.ollama_model = v; }
        if let Some(v) = get("GEMINI_MODEL") { self.gemini_model = v; }
        if let Some(v) = get("GEMINI_API_KEY") { self.gemini_api_key = Some(v); }
        Ok(())
    }

    /// Model name for the selected backend.
    pub fn model(&self) -> &str {
        match self.backend {
            BackendKind::Ollama => &self.ollama_model,
            BackendKind::Gemini => &self.gemini_model,
        }
    }

    pub fn set_model(&mut self, model: String) {
        match self.backend {
            BackendKind::Ollama => self.ollama_model = model,
            BackendKind::Gemini => self.gemini_model = model,
        }
    }

    /// Engine configuration with this settings' extra ignores.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(self.ignored_directories.as_slice(), self.ignored_files.as_slice())
            .with_gitignore(self.respect_gitignore)
    }
}
