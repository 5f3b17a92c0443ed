// readmegen/src/budget.rs
//! Budget policy: how many files keep their content, how many excerpts reach
//! the prompt, and how many bytes a single file may contribute.
//!
//! Reads are bounded: a file larger than its ceiling is read only up to the
//! ceiling and the kept text gets [`TRUNCATION_MARKER`] appended. Truncation is
//! a successful read, never an error.

use memchr::memchr;
use std::{
    fs::File,
    io::{
        self,
        Read
    },
    path::Path,
};
use crate::classify::ProjectType;

/// Content quota every project type starts from.
pub const BASE_QUOTA: usize = 20;
/// Excerpts embedded in a prompt, whatever the project type.
pub const MAX_EXCERPTS: usize = 5;
/// Byte ceiling for files the importance oracle accepts.
pub const IMPORTANT_FILE_CEILING: usize = 10_000;
/// Byte ceiling for files kept only for their source extension.
pub const SOURCE_FILE_CEILING: usize = 5_000;
/// Appended to content cut at its ceiling.
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

const BINARY_SNIFF_BYTES: usize = 4096;

/// Maximum number of files whose content is retained for `project_type`.
pub fn max_content_files(project_type: ProjectType) -> usize {
    let bonus = match project_type {
        ProjectType::Node => 15,
        ProjectType::Python | ProjectType::Java => 10,
        ProjectType::Go | ProjectType::Ruby | ProjectType::Php => 8,
        ProjectType::Rust => 5,
        ProjectType::Unknown => 0,
    };
    BASE_QUOTA + bonus
}

/// Which ceiling governs a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ceiling {
    Important,
    Source,
}

impl Ceiling {
    pub fn bytes(self) -> usize {
        match self {
            Ceiling::Important => IMPORTANT_FILE_CEILING,
            Ceiling::Source => SOURCE_FILE_CEILING,
        }
    }
}

/// Result of reading one file under a ceiling.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Decoded text; `truncated` is set when the marker was appended.
    Text { content: String, truncated: bool },
    /// A NUL byte showed up in the head of the file.
    Binary,
    Failed(io::Error),
}

impl ReadOutcome {
    pub fn into_content(self) -> Option<String> {
        match self {
            ReadOutcome::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// Read at most `ceiling` bytes of `path` (plus one byte to detect overflow).
pub fn read_bounded(path: &Path, ceiling: usize) -> ReadOutcome {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return ReadOutcome::Failed(e),
    };
    match file.metadata() {
        Ok(meta) if !meta.is_file() => {
            return ReadOutcome::Failed(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(_) => {}
        Err(e) => return ReadOutcome::Failed(e),
    }

    let mut buf = Vec::with_capacity(ceiling.min(64 * 1024) + 1);
    if let Err(e) = file.take(ceiling as u64 + 1).read_to_end(&mut buf) {
        return ReadOutcome::Failed(e);
    }
    bounded_text(&buf, ceiling)
}

/// Apply the ceiling to bytes already in memory. A truncated prefix is at
/// most `ceiling` bytes and ends on a character boundary.
pub fn bounded_text(bytes: &[u8], ceiling: usize) -> ReadOutcome {
    if looks_binary(bytes) {
        return ReadOutcome::Binary;
    }
    let truncated = bytes.len() > ceiling;
    let kept = if truncated { &bytes[..utf8_cut(bytes, ceiling)] } else { bytes };
    let mut content = String::from_utf8_lossy(kept).into_owned();
    if truncated {
        content.push_str(TRUNCATION_MARKER);
    }
    ReadOutcome::Text { content, truncated }
}

/// Largest cut `<= at` that does not split a UTF-8 sequence. Requires `at < bytes.len()`.
fn utf8_cut(bytes: &[u8], at: usize) -> usize {
    let mut cut = at;
    // A sequence is at most 4 bytes; past that the input is not UTF-8 anyway.
    while cut > 0 && at - cut < 3 && bytes[cut] & 0xC0 == 0x80 {
        cut -= 1;
    }
    if bytes[cut] & 0xC0 == 0x80 { at } else { cut }
}

fn looks_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    memchr(0, head).is_some()
}
