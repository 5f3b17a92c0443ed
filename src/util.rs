// readmegen/src/util.rs

use std::path::{
    Path,
    PathBuf
};

/// Best-effort project name for `root`, canonicalized, safe for display.
/// Falls back to the parent's name or "project" instead of erroring.
pub fn project_name(root: &Path) -> String {
    // canonicalize when possible, but don’t fail the whole call if it errors
    let canon: PathBuf = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    canon
        .file_name()
        .or_else(|| canon.parent().and_then(|pp| pp.file_name()))
        .and_then(|s| s.to_str())
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "project".into())
}

/// Compact, filesystem-safe local timestamp, e.g. `20250810_140359`.
pub fn now_ts_compact() -> String {
    use chrono::{Local, Datelike, Timelike};
    let dt = Local::now();
    format!("{:04}{:02}{:02}_{:02}{:02}{:02}",
        dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second())
}

/// `path` relative to `root`, `/`-separated.
pub fn normalize_rel(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/* --------------------------- helpers --------------------------- */

fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' => out.push(ch),
            '-' | '_' | '.' => out.push(ch),
            ' ' => out.push('_'),
            _ => out.push('-'),
        }
    }
    out.trim_matches(['-', '_']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_filesystem_safe() {
        assert_eq!(slugify("my project"), "my_project");
        assert_eq!(slugify("-weird/name-"), "weird-name");
    }

    #[test]
    fn project_name_uses_last_component() {
        let dir = tempfile::Builder::new().prefix("demo app").tempdir().unwrap();
        assert!(project_name(dir.path()).starts_with("demo_app"));
    }

    #[test]
    fn rel_paths_use_forward_slashes() {
        let root = Path::new("/r");
        assert_eq!(normalize_rel(root, Path::new("/r/a/b.rs")), "a/b.rs");
    }

    #[test]
    fn compact_stamp_shape() {
        let s = now_ts_compact();
        assert_eq!(s.len(), 15);
        assert_eq!(&s[8..9], "_");
    }
}
