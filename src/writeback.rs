// readmegen/src/writeback.rs

use anyhow::{
    Context,
    Result
};
use std::{
    fs,
    path::{
        Path,
        PathBuf
    },
};
use tracing::info;
use crate::util;

/// Where the document went, and where the previous one was archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub path: PathBuf,
    pub archived: Option<PathBuf>,
}

/// Write `text` to `root/output`. An existing file is first renamed to
/// `<output>.<YYYYmmdd_HHMMSS>.bak` next to it.
pub fn write_readme(root: &Path, output: &str, text: &str) -> Result<Written> {
    let path = root.join(output);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let archived = if path.exists() {
        let backup = archive_path(&path, &util::now_ts_compact());
        fs::rename(&path, &backup)
            .with_context(|| format!("archiving {} to {}", path.display(), backup.display()))?;
        info!(from = %path.display(), to = %backup.display(), "archived previous document");
        Some(backup)
    } else {
        None
    };

    let mut body = text.trim_end().to_string();
    body.push('\n');
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = text.len(), "document written");
    Ok(Written { path, archived })
}

fn archive_path(path: &Path, stamp: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "README.md".into());
    let mut candidate = path.with_file_name(format!("{name}.{stamp}.bak"));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{name}.{stamp}-{n}.bak"));
        n += 1;
    }
    candidate
}
