// readmegen/src/sample.rs
//! Sample selector: picks the source excerpts that go into the prompt.
//!
//! Three passes over the same candidates (the `contents` keys, in path order):
//! priority patterns, then main-file patterns, then any key with a source
//! extension. A path chosen once is never chosen again, and selection stops
//! the moment `MAX_EXCERPTS` is reached.

use regex::Regex;
use serde::Serialize;
use std::collections::{
    BTreeMap,
    BTreeSet,
    HashSet
};
use crate::{
    budget::MAX_EXCERPTS,
    classify::ProjectType,
    importance::{
        self,
        basename
    },
};

/// One bounded source sample.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Excerpt {
    pub path: String,
    pub content: String,
}

/// Select at most [`MAX_EXCERPTS`] excerpts from a finished scan's contents.
pub fn select_samples(
    contents: &BTreeMap<String, String>,
    project_type: ProjectType,
    tags: &BTreeSet<String>,
) -> Vec<Excerpt> {
    select_samples_capped(contents, project_type, tags, MAX_EXCERPTS)
}

pub fn select_samples_capped(
    contents: &BTreeMap<String, String>,
    project_type: ProjectType,
    tags: &BTreeSet<String>,
    cap: usize,
) -> Vec<Excerpt> {
    let mut picker = Picker { contents, cap, chosen: HashSet::new(), out: Vec::new() };

    picker.by_patterns(&importance::priority_patterns(project_type, tags));
    picker.by_patterns(&importance::main_file_patterns(project_type, tags));

    let exts = importance::source_extensions(project_type, tags);
    picker.by(|path| exts.contains(&importance::extension(path).as_str()));

    picker.out
}

struct Picker<'a> {
    contents: &'a BTreeMap<String, String>,
    cap: usize,
    chosen: HashSet<&'a str>,
    out: Vec<Excerpt>,
}

impl<'a> Picker<'a> {
    fn full(&self) -> bool {
        self.out.len() >= self.cap
    }

    /// Pattern order first, path order within a pattern.
    fn by_patterns(&mut self, patterns: &[&Regex]) {
        for re in patterns {
            self.by(|path| re.is_match(basename(path)));
        }
    }

    fn by<F: Fn(&str) -> bool>(&mut self, accept: F) {
        let contents = self.contents;
        for (path, content) in contents {
            if self.full() {
                return;
            }
            if self.chosen.contains(path.as_str()) || !accept(path) {
                continue;
            }
            self.chosen.insert(path.as_str());
            self.out.push(Excerpt { path: path.clone(), content: content.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(paths: &[&str]) -> BTreeMap<String, String> {
        paths.iter().map(|p| (p.to_string(), format!("// {p}"))).collect()
    }

    fn paths(v: &[Excerpt]) -> Vec<&str> {
        v.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn priority_matches_come_first() {
        let c = contents(&["a.js", "lib/z.js", "src/index.js", "server.js"]);
        let got = select_samples(&c, ProjectType::Node, &BTreeSet::new());
        // index pattern, then server pattern, then remaining source in path order
        assert_eq!(paths(&got), ["src/index.js", "server.js", "a.js", "lib/z.js"]);
    }

    #[test]
    fn framework_entry_is_a_priority_match_when_tagged() {
        let c = contents(&["src/App.tsx", "src/a.ts", "src/index.ts"]);
        let tags: BTreeSet<String> = ["react".to_string()].into();
        let got = select_samples(&c, ProjectType::Node, &tags);
        assert_eq!(paths(&got), ["src/index.ts", "src/App.tsx", "src/a.ts"]);
    }

    #[test]
    fn main_patterns_pick_docs_before_plain_source() {
        let c = contents(&["README.md", "src/a.rs", "src/lib.rs", "notes.txt"]);
        let got = select_samples(&c, ProjectType::Rust, &BTreeSet::new());
        assert_eq!(paths(&got), ["src/lib.rs", "README.md", "src/a.rs"]);
    }

    #[test]
    fn cap_stops_mid_pass_and_never_duplicates() {
        let many: Vec<String> = (0..20).map(|i| format!("m{i:02}.py")).collect();
        let mut c: BTreeMap<String, String> = many.iter().map(|p| (p.clone(), String::new())).collect();
        c.insert("main.py".into(), String::new());
        let got = select_samples(&c, ProjectType::Python, &BTreeSet::new());
        assert_eq!(got.len(), MAX_EXCERPTS);
        assert_eq!(got[0].path, "main.py");
        let unique: HashSet<_> = got.iter().map(|e| &e.path).collect();
        assert_eq!(unique.len(), got.len());
    }

    #[test]
    fn explicit_cap_is_honored() {
        let c = contents(&["main.go", "a.go", "b.go"]);
        let got = select_samples_capped(&c, ProjectType::Go, &BTreeSet::new(), 2);
        assert_eq!(paths(&got), ["main.go", "a.go"]);
        assert!(select_samples_capped(&c, ProjectType::Go, &BTreeSet::new(), 0).is_empty());
    }

    #[test]
    fn unknown_type_uses_broad_extensions() {
        let c = contents(&["x.go", "y.py", "z.bin"]);
        let got = select_samples(&c, ProjectType::Unknown, &BTreeSet::new());
        assert_eq!(paths(&got), ["x.go", "y.py"]);
    }
}
