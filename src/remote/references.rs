//! Backlink query construction for reference search.

use crate::models::entry::{extension, file_name, file_stem, parent_dir};

/// File names that stand for their parent directory as a module.
const PACKAGE_ROOTS: &[&str] = &[
    "__init__.py",
    "mod.rs",
    "index.js",
    "index.jsx",
    "index.ts",
    "index.tsx",
];

/// Whether the file is a package root (`__init__.py`, `mod.rs`, `index.ts`, ...).
pub fn is_package_root(path: &str) -> bool {
    PACKAGE_ROOTS.contains(&file_name(path))
}

/// The name other files use to import this one.
///
/// The file stem, except for package roots, which resolve to the parent
/// directory's name. Root-level package roots fall back to the stem.
pub fn module_name(path: &str) -> &str {
    if is_package_root(path) {
        let parent = file_name(parent_dir(path));
        if !parent.is_empty() {
            return parent;
        }
    }
    file_stem(path)
}

/// Search queries whose hits are files referencing `filepath`.
///
/// Always includes the exact quoted filename; adds the language's
/// import phrasing for the derived module name.
pub fn reference_queries(filepath: &str) -> Vec<String> {
    let mut queries = vec![format!("\"{}\"", file_name(filepath))];
    let module = module_name(filepath);
    if module.is_empty() {
        return queries;
    }

    match extension(filepath) {
        ".py" => {
            queries.push(format!("\"import {module}\""));
            queries.push(format!("\"from {module}\""));
        }
        ".rs" => {
            queries.push(format!("\"mod {module}\""));
            queries.push(format!("\"use {module}\""));
            queries.push(format!("\"{module}::\""));
        }
        ".js" | ".jsx" | ".ts" | ".tsx" | ".mjs" => {
            queries.push(format!("\"/{module}'\""));
        }
        _ => {}
    }
    queries
}
