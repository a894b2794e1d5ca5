//! Input discovery for a project object: `files`, `include`, `exclude`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use log::{debug, trace};
use serde_json::Value;
use walkdir::WalkDir;

use crate::compiler::ParsedConfig;
use crate::diagnostic::Diagnostic;
use crate::options::{CompilerOptions, convert_compiler_options, normalize};

const DEFAULT_INCLUDE: &str = "**/*";
const DEFAULT_EXCLUDES: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

const TS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];
const JS_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

/// Resolve a project object into its input files and validated options.
///
/// Relative paths in `raw` are taken relative to `base_dir`. All problems
/// are collected into `errors`; nothing here fails early.
pub fn parse_json_config(raw: &Value, base_dir: &Path) -> ParsedConfig {
    let mut errors = Vec::new();
    let options = match raw.get("compilerOptions") {
        Some(value) => convert_compiler_options(value, base_dir, &mut errors),
        None => CompilerOptions::new(),
    };

    let files = string_list(raw, "files", &mut errors);
    let include = string_list(raw, "include", &mut errors);
    let exclude = string_list(raw, "exclude", &mut errors);

    let include = match (&files, include) {
        (None, None) => Some(vec![DEFAULT_INCLUDE.to_string()]),
        (_, include) => include,
    };
    let exclude = exclude.unwrap_or_else(|| default_excludes(&options));

    let file_names = discover(
        base_dir,
        files.as_deref().unwrap_or_default(),
        include.as_deref().unwrap_or_default(),
        &exclude,
        &options,
        &mut errors,
    );
    debug!(
        "resolved {} input files under {}",
        file_names.len(),
        base_dir.display()
    );

    ParsedConfig {
        file_names,
        options,
        errors,
    }
}

fn string_list(raw: &Value, key: &str, errors: &mut Vec<Diagnostic>) -> Option<Vec<String>> {
    let value = raw.get(key)?;
    let list = value.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
    });
    if list.is_none() {
        errors.push(
            Diagnostic::error(format!("Compiler option '{key}' requires a value of type Array."))
                .with_code(5024),
        );
    }
    list
}

fn default_excludes(options: &CompilerOptions) -> Vec<String> {
    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    for dir in [options.out_dir(), options.declaration_dir()].into_iter().flatten() {
        excludes.push(dir.to_string_lossy().into_owned());
    }
    excludes
}

fn discover(
    base_dir: &Path,
    files: &[String],
    include: &[String],
    exclude: &[String],
    options: &CompilerOptions,
    errors: &mut Vec<Diagnostic>,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut file_names = Vec::new();

    for file in files {
        let path = normalize(&base_dir.join(file));
        if !path.is_file() {
            errors.push(
                Diagnostic::error(format!("File '{}' not found.", path.display())).with_code(6053),
            );
            continue;
        }
        if seen.insert(path.clone()) {
            file_names.push(path);
        }
    }

    if include.is_empty() {
        return file_names;
    }

    let Some(excluded) = exclude_set(base_dir, exclude, errors) else {
        return file_names;
    };

    for pattern in include {
        let absolute = absolute_pattern(base_dir, &expand_directory(pattern));
        let matcher = match compile_glob(&absolute) {
            Ok(matcher) => matcher.compile_matcher(),
            Err(err) => {
                errors.push(Diagnostic::error(format!("Invalid include pattern '{pattern}': {err}")));
                continue;
            }
        };
        let root = literal_root(&absolute);
        trace!("walking {} for include pattern {absolute}", root.display());
        for path in walk(&root, &matcher, &excluded, options.allow_js()) {
            if seen.insert(path.clone()) {
                file_names.push(path);
            }
        }
    }

    file_names
}

fn walk(root: &Path, matcher: &GlobMatcher, excluded: &GlobSet, allow_js: bool) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let text = slashed(path);
            is_supported(&text, allow_js) && matcher.is_match(&text) && !excluded.is_match(&text)
        })
        .collect()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

fn exclude_set(base_dir: &Path, exclude: &[String], errors: &mut Vec<Diagnostic>) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in exclude {
        let absolute = absolute_pattern(base_dir, pattern);
        for candidate in [absolute.clone(), format!("{absolute}/**")] {
            match compile_glob(&candidate) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    errors.push(Diagnostic::error(format!(
                        "Invalid exclude pattern '{pattern}': {err}"
                    )));
                    break;
                }
            }
        }
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(err) => {
            errors.push(Diagnostic::error(format!("Invalid exclude patterns: {err}")));
            None
        }
    }
}

fn compile_glob(pattern: &str) -> Result<globset::Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}

/// An include entry without wildcards or an extension names a directory.
fn expand_directory(pattern: &str) -> String {
    let trimmed = pattern.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if has_wildcard(last) || Path::new(last).extension().is_some() {
        pattern.to_string()
    } else {
        format!("{trimmed}/**/*")
    }
}

fn absolute_pattern(base_dir: &Path, pattern: &str) -> String {
    slashed(&normalize(&base_dir.join(pattern)))
}

/// The directory prefix of `pattern` before the first wildcard component.
fn literal_root(pattern: &str) -> PathBuf {
    let mut root = Vec::new();
    for component in pattern.split('/') {
        if has_wildcard(component) {
            break;
        }
        root.push(component);
    }
    // a pattern that is entirely literal names a file; walk its parent
    if root.len() == pattern.split('/').count() {
        root.pop();
    }
    let joined = root.join("/");
    if joined.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(joined)
    }
}

fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn is_supported(path: &str, allow_js: bool) -> bool {
    TS_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        || (allow_js && JS_EXTENSIONS.iter().any(|ext| path.ends_with(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(path, "export {};\n").expect("write source");
    }

    fn names(root: &Path, parsed: &ParsedConfig) -> Vec<String> {
        parsed
            .file_names
            .iter()
            .map(|path| slashed(path.strip_prefix(root).expect("under root")))
            .collect()
    }

    #[test]
    fn default_include_skips_output_and_dependencies() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        touch(root, "src/b.ts");
        touch(root, "src/a.ts");
        touch(root, "src/view.tsx");
        touch(root, "src/readme.md");
        touch(root, "dist/old.d.ts");
        touch(root, "node_modules/lib/index.d.ts");
        touch(root, ".cache/tmp.ts");

        let parsed = parse_json_config(&json!({ "compilerOptions": { "outDir": "dist" } }), root);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(names(root, &parsed), vec!["src/a.ts", "src/b.ts", "src/view.tsx"]);
    }

    #[test]
    fn explicit_files_come_first_and_are_not_duplicated() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        touch(root, "src/a.ts");
        touch(root, "src/z.ts");

        let raw = json!({ "files": ["src/z.ts"], "include": ["src"] });
        let parsed = parse_json_config(&raw, root);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(names(root, &parsed), vec!["src/z.ts", "src/a.ts"]);
    }

    #[test]
    fn files_without_include_disable_the_default_glob() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        touch(root, "main.ts");
        touch(root, "other.ts");

        let parsed = parse_json_config(&json!({ "files": ["main.ts"] }), root);
        assert_eq!(names(root, &parsed), vec!["main.ts"]);
    }

    #[test]
    fn empty_file_list_is_accepted() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "main.ts");
        let parsed = parse_json_config(&json!({ "files": [] }), dir.path());
        assert!(parsed.errors.is_empty());
        assert!(parsed.file_names.is_empty());
    }

    #[test]
    fn reports_missing_explicit_file() {
        let dir = tempdir().expect("tempdir");
        let parsed = parse_json_config(&json!({ "files": ["missing.ts"] }), dir.path());
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].code, Some(6053));
    }

    #[test]
    fn honours_exclude_and_allow_js() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        touch(root, "src/a.ts");
        touch(root, "src/legacy.js");
        touch(root, "src/gen/out.ts");

        let raw = json!({
            "compilerOptions": { "allowJs": true },
            "include": ["src/**/*"],
            "exclude": ["src/gen"]
        });
        let parsed = parse_json_config(&raw, root);
        assert_eq!(names(root, &parsed), vec!["src/a.ts", "src/legacy.js"]);
    }

    #[test]
    fn rejects_non_array_lists() {
        let dir = tempdir().expect("tempdir");
        let parsed = parse_json_config(&json!({ "include": "src" }), dir.path());
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(
            parsed.errors[0].message.flatten("\n"),
            "Compiler option 'include' requires a value of type Array."
        );
    }

    #[test]
    fn literal_root_stops_at_first_wildcard() {
        assert_eq!(literal_root("/p/src/**/*.ts"), PathBuf::from("/p/src"));
        assert_eq!(literal_root("/p/src/main.ts"), PathBuf::from("/p/src"));
        assert_eq!(expand_directory("src"), "src/**/*");
        assert_eq!(expand_directory("src/*.ts"), "src/*.ts");
    }
}
