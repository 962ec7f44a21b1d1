//! Lexical import scanning.
//!
//! Pulls import-like references out of source text with per-language
//! patterns and resolves them against the paths in the file map.

use std::collections::BTreeSet;

use crate::models::RepoFileMap;
use crate::models::entry::{extension, file_name, parent_dir};
use crate::remote::references::is_package_root;

static PY_FROM_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"(?m)^\s*from\s+([\w.]+)\s+import\b").unwrap());

static PY_IMPORT_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"(?m)^\s*import\s+([\w., ]+)").unwrap());

static RS_USE_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([\w:]+)").unwrap()
});

static RS_MOD_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;").unwrap()
});

static JS_IMPORT_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r#"\bimport\s+(?:[^'";]*?\s+from\s+)?['"]([^'"]+)['"]"#).unwrap()
});

static JS_REQUIRE_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

static GO_IMPORT_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r#"(?m)^\s*import\s+(?:\w+\s+)?"([^"]+)""#).unwrap());

static GO_BLOCK_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"(?s)\bimport\s*\((.*?)\)").unwrap());

static QUOTED_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r#""([^"]+)""#).unwrap());

static C_INCLUDE_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r#"(?m)^\s*#\s*include\s*[<"]([^>"]+)[>"]"#).unwrap());

static JAVA_IMPORT_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+)(?:\.\*)?\s*;").unwrap()
});

/// Path prefixes that carry no location information.
const ANCHOR_SEGMENTS: &[&str] = &["crate", "self", "super"];

/// A reference found in one file.
///
/// `keys` are candidate module paths (`/`-separated, no extension),
/// tried in order; the first one that matches any file wins.
/// `directory` marks a package-level import that selects every file in
/// the matched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub keys: Vec<String>,
    pub directory: bool,
}

impl Reference {
    fn new(keys: Vec<String>) -> Option<Self> {
        (!keys.is_empty()).then_some(Self { keys, directory: false })
    }

    /// Keys from a dotted/qualified name, longest prefix first, so
    /// `a.b.Item` tries `a/b/Item`, then `a/b`, then `a`.
    fn qualified(raw: &str, separator: &str) -> Option<Self> {
        let segments: Vec<&str> = raw
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty() && !ANCHOR_SEGMENTS.contains(s))
            .collect();
        let keys = (1..=segments.len())
            .rev()
            .map(|n| segments[..n].join("/"))
            .collect();
        Self::new(keys)
    }

    /// Keys from trailing runs of a path, longest first, so
    /// `host/proj/pkg/store` tries down to `pkg/store` and `store`.
    fn trailing(raw: &str) -> Option<Self> {
        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        let keys = (0..segments.len()).map(|i| segments[i..].join("/")).collect();
        Self::new(keys)
    }
}

/// Extract references from `content`, picking patterns by the
/// extension of `path`.
pub fn extract_references(path: &str, content: &str) -> Vec<Reference> {
    let mut refs = Vec::new();
    match extension(path) {
        ".py" => {
            for cap in PY_FROM_RE.captures_iter(content) {
                refs.extend(Reference::qualified(&cap[1], "."));
            }
            for cap in PY_IMPORT_RE.captures_iter(content) {
                for item in cap[1].split(',') {
                    let module = item.split_whitespace().next().unwrap_or_default();
                    refs.extend(Reference::qualified(module, "."));
                }
            }
        }
        ".rs" => {
            for cap in RS_USE_RE.captures_iter(content) {
                refs.extend(Reference::qualified(&cap[1], "::"));
            }
            for cap in RS_MOD_RE.captures_iter(content) {
                refs.extend(rust_mod_reference(path, &cap[1]));
            }
        }
        ".js" | ".jsx" | ".ts" | ".tsx" | ".mjs" | ".cjs" => {
            let specifiers = JS_IMPORT_RE
                .captures_iter(content)
                .chain(JS_REQUIRE_RE.captures_iter(content));
            for cap in specifiers {
                refs.extend(Reference::new(vec![resolve_relative(path, strip_extension(&cap[1]))]));
            }
        }
        ".go" => {
            let mut specs: Vec<String> = GO_IMPORT_RE
                .captures_iter(content)
                .map(|cap| cap[1].to_string())
                .collect();
            for block in GO_BLOCK_RE.captures_iter(content) {
                specs.extend(QUOTED_RE.captures_iter(&block[1]).map(|cap| cap[1].to_string()));
            }
            for spec in specs {
                refs.extend(Reference::trailing(&spec).map(|r| Reference { directory: true, ..r }));
            }
        }
        ".c" | ".h" | ".cc" | ".cpp" | ".cxx" | ".hpp" | ".hh" => {
            for cap in C_INCLUDE_RE.captures_iter(content) {
                refs.extend(Reference::new(vec![strip_extension(&cap[1]).to_string()]));
            }
        }
        ".java" | ".kt" | ".scala" => {
            for cap in JAVA_IMPORT_RE.captures_iter(content) {
                refs.extend(Reference::qualified(&cap[1], "."));
            }
        }
        _ => {}
    }
    refs
}

/// `mod name;` resolves next to the declaring file: beside `lib.rs`,
/// `main.rs` and `mod.rs`, or under a directory named after any other
/// file.
fn rust_mod_reference(path: &str, name: &str) -> Option<Reference> {
    let dir = parent_dir(path);
    let stem = strip_extension(file_name(path));
    let base = if matches!(stem, "lib" | "main" | "mod") {
        dir.to_string()
    } else {
        join(dir, stem)
    };
    Reference::new(vec![join(&base, name), name.to_string()])
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn strip_extension(path: &str) -> &str {
    let ext = extension(path);
    &path[..path.len() - ext.len()]
}

/// Resolve `./` and `../` specifiers against the importing file.
fn resolve_relative(importer: &str, spec: &str) -> String {
    if !spec.starts_with('.') {
        return spec.to_string();
    }
    let mut segments: Vec<&str> = parent_dir(importer)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    for part in spec.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Lookup table from module keys to file paths.
pub struct ModuleIndex<'a> {
    /// (module key, path); package roots appear under their directory too.
    modules: Vec<(String, &'a str)>,
    paths: Vec<&'a str>,
}

impl<'a> ModuleIndex<'a> {
    pub fn new(files: &'a RepoFileMap) -> Self {
        let mut modules = Vec::new();
        for path in files.keys() {
            modules.push((strip_extension(path).to_string(), path.as_str()));
            if is_package_root(path) && !parent_dir(path).is_empty() {
                modules.push((parent_dir(path).to_string(), path.as_str()));
            }
        }
        Self {
            modules,
            paths: files.keys().map(String::as_str).collect(),
        }
    }

    /// Files a reference points at, in path order.
    pub fn resolve(&self, reference: &Reference) -> BTreeSet<&'a str> {
        for key in &reference.keys {
            let hits: BTreeSet<&'a str> = if reference.directory {
                self.paths
                    .iter()
                    .copied()
                    .filter(|p| suffix_matches(parent_dir(p), key))
                    .collect()
            } else {
                self.modules
                    .iter()
                    .filter(|(module, _)| suffix_matches(module, key))
                    .map(|(_, p)| *p)
                    .collect()
            };
            if !hits.is_empty() {
                return hits;
            }
        }
        BTreeSet::new()
    }
}

/// `key` equals `module` or is a trailing run of its segments.
fn suffix_matches(module: &str, key: &str) -> bool {
    module == key
        || (module.len() > key.len()
            && module.ends_with(key)
            && module.as_bytes()[module.len() - key.len() - 1] == b'/')
}
