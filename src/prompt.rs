// readmegen/src/prompt.rs
//! Prompt assembly: one markdown block holding the scan, the excerpts and the
//! user's own notes, followed by the README instructions.
//!
//! Output is deterministic for a given scan (no timestamps, ordered maps).

use std::fmt;
use crate::{
    classify::{
        LICENSE_KEY,
        README_KEY
    },
    importance,
    sample::Excerpt,
    scan::ScanResult,
};

/// Listing cap for the file section; the rest is summarized in one line.
pub const FILE_LIST_CAP: usize = 200;

const INSTRUCTIONS: &str = "\
Write a complete README.md for this project in GitHub-flavored markdown.
Include: a title and one-paragraph description, key features, installation,
usage with examples, configuration (if any), project structure, contributing
and license sections. Base every statement on the context above; do not
invent commands, options or dependencies that the context does not show.
Return only the README content.";

/// Build the generation prompt for `project`.
pub fn build_prompt(project: &str, scan: &ScanResult, excerpts: &[Excerpt], user_context: &str) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(16 * 1024);
    write_prompt(&mut out, project, scan, excerpts, user_context)?;
    Ok(out)
}

fn write_prompt<W: fmt::Write>(out: &mut W, project: &str, scan: &ScanResult, excerpts: &[Excerpt], user_context: &str) -> fmt::Result {
    writeln!(out, "# Project: {project}\n")?;
    writeln!(out, "Project type: {}", scan.project_type)?;
    if scan.language_tags.is_empty() {
        writeln!(out, "Detected tags: (none)\n")?;
    } else {
        let tags: Vec<&str> = scan.language_tags.iter().map(String::as_str).collect();
        writeln!(out, "Detected tags: {}\n", tags.join(", "))?;
    }

    writeln!(out, "## Directories\n")?;
    if scan.directories.is_empty() {
        writeln!(out, "_(none)_")?;
    }
    for d in &scan.directories {
        writeln!(out, "- {d}/")?;
    }
    out.write_char('\n')?;

    writeln!(out, "## Files\n")?;
    if scan.files.is_empty() {
        writeln!(out, "_(none)_")?;
    }
    for f in scan.files.iter().take(FILE_LIST_CAP) {
        writeln!(out, "- {f}")?;
    }
    if scan.files.len() > FILE_LIST_CAP {
        writeln!(out, "- … {} more files", scan.files.len() - FILE_LIST_CAP)?;
    }
    out.write_char('\n')?;

    let excerpt_paths: Vec<&str> = excerpts.iter().map(|e| e.path.as_str()).collect();
    let key_files = key_file_order(scan, &excerpt_paths);
    if !key_files.is_empty() {
        writeln!(out, "## Key files\n")?;
        for key in key_files {
            push_fenced(out, key, &scan.contents[key])?;
        }
    }

    if !excerpts.is_empty() {
        writeln!(out, "## Source excerpts\n")?;
        for e in excerpts {
            push_fenced(out, &e.path, &e.content)?;
        }
    }

    let ctx = user_context.trim();
    if !ctx.is_empty() {
        writeln!(out, "## Notes from the author\n\n{ctx}\n")?;
    }

    writeln!(out, "## Task\n\n{INSTRUCTIONS}")
}

/* ----------------------------- helpers ----------------------------- */

/// Canonical keys first, then other non-excerpt contents in path order.
fn key_file_order<'a>(scan: &'a ScanResult, excerpt_paths: &[&str]) -> Vec<&'a str> {
    let is_canonical = |k: &str| k == README_KEY || k == LICENSE_KEY || !scan.files.iter().any(|f| f == k);
    let mut head: Vec<&str> = Vec::new();
    let mut tail: Vec<&str> = Vec::new();
    for key in scan.contents.keys().map(String::as_str) {
        if excerpt_paths.contains(&key) {
            continue;
        }
        if is_canonical(key) {
            head.push(key);
        } else {
            tail.push(key);
        }
    }
    head.extend(tail);
    head
}

fn push_fenced<W: fmt::Write>(out: &mut W, path: &str, content: &str) -> fmt::Result {
    let lang = fence_lang(path);
    let fence = if content.contains("```") { "````" } else { "```" };
    writeln!(out, "### {path}\n")?;
    writeln!(out, "{fence}{lang}")?;
    out.write_str(content)?;
    if !content.ends_with('\n') {
        out.write_char('\n')?;
    }
    writeln!(out, "{fence}\n")
}

fn fence_lang(path: &str) -> &'static str {
    match importance::extension(path).as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "json" => "json",
        "toml" => "toml",
        "yml" | "yaml" => "yaml",
        "md" => "markdown",
        "vue" => "vue",
        "svelte" => "svelte",
        "sh" | "bash" => "bash",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ProjectType;

    fn sample_scan() -> ScanResult {
        let mut s = ScanResult {
            files: vec!["package.json".into(), "src/index.ts".into(), "docs/guide.md".into()],
            directories: vec!["src".into(), "docs".into()],
            project_type: ProjectType::Node,
            ..Default::default()
        };
        s.language_tags.insert("typescript".into());
        s.contents.insert("package.json".into(), "{\"name\":\"demo\"}".into());
        s.contents.insert("src/index.ts".into(), "export const x = 1;".into());
        s.contents.insert("docs/guide.md".into(), "# Guide".into());
        s.contents.insert(README_KEY.into(), "# Old readme".into());
        s
    }

    #[test]
    fn prompt_carries_every_section() {
        let scan = sample_scan();
        let ex = vec![Excerpt { path: "src/index.ts".into(), content: "export const x = 1;".into() }];
        let p = build_prompt("demo", &scan, &ex, "  A tiny demo.  ").unwrap();
        assert!(p.starts_with("# Project: demo"));
        assert!(p.contains("Project type: node"));
        assert!(p.contains("Detected tags: typescript"));
        assert!(p.contains("- src/\n"));
        assert!(p.contains("- docs/guide.md\n"));
        assert!(p.contains("```typescript\nexport const x = 1;\n```"));
        assert!(p.contains("## Notes from the author\n\nA tiny demo.\n"));
        assert!(p.trim_end().ends_with("Return only the README content."));
    }

    #[test]
    fn excerpts_are_not_repeated_as_key_files() {
        let scan = sample_scan();
        let ex = vec![Excerpt { path: "src/index.ts".into(), content: "export const x = 1;".into() }];
        let p = build_prompt("demo", &scan, &ex, "").unwrap();
        assert_eq!(p.matches("### src/index.ts").count(), 1);
        assert!(!p.contains("Notes from the author"));
    }

    #[test]
    fn canonical_keys_lead_the_key_files() {
        let mut scan = sample_scan();
        scan.files.retain(|f| f != "package.json");
        let order = key_file_order(&scan, &[]);
        assert_eq!(order, ["README.md", "package.json", "docs/guide.md", "src/index.ts"]);
    }

    #[test]
    fn long_file_lists_are_elided() {
        let mut scan = ScanResult::default();
        scan.files = (0..FILE_LIST_CAP + 3).map(|i| format!("f{i}.md")).collect();
        let p = build_prompt("x", &scan, &[], "").unwrap();
        assert!(p.contains("- … 3 more files"));
    }

    #[test]
    fn nested_fences_get_a_longer_fence() {
        let mut out = String::new();
        push_fenced(&mut out, "README.md", "```sh\nmake\n```").unwrap();
        assert!(out.contains("````markdown\n"));
    }

    #[test]
    fn writer_errors_reach_the_caller() {
        struct Refuse;
        impl fmt::Write for Refuse {
            fn write_str(&mut self, _: &str) -> fmt::Result {
                Err(fmt::Error)
            }
        }
        let scan = sample_scan();
        assert_eq!(write_prompt(&mut Refuse, "demo", &scan, &[], ""), Err(fmt::Error));
        assert_eq!(push_fenced(&mut Refuse, "a.rs", "fn main() {}"), Err(fmt::Error));
    }
}
