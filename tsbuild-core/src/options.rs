//! Compiler options: the known option table, type validation, and path
//! rebasing.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::diagnostic::Diagnostic;

/// JSON shape an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Boolean,
    String,
    Number,
    /// A string resolved against the directory of the declaring file.
    Path,
    List,
    PathList,
    Object,
}

impl OptionKind {
    fn type_name(self) -> &'static str {
        match self {
            OptionKind::Boolean => "boolean",
            OptionKind::String | OptionKind::Path => "string",
            OptionKind::Number => "number",
            OptionKind::List | OptionKind::PathList => "Array",
            OptionKind::Object => "object",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            OptionKind::Boolean => value.is_boolean(),
            OptionKind::String | OptionKind::Path => value.is_string(),
            OptionKind::Number => value.is_number(),
            OptionKind::List | OptionKind::PathList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            OptionKind::Object => value.is_object(),
        }
    }
}

const KNOWN_OPTIONS: &[(&str, OptionKind)] = &[
    ("allowJs", OptionKind::Boolean),
    ("allowSyntheticDefaultImports", OptionKind::Boolean),
    ("allowUnreachableCode", OptionKind::Boolean),
    ("allowUnusedLabels", OptionKind::Boolean),
    ("alwaysStrict", OptionKind::Boolean),
    ("baseUrl", OptionKind::Path),
    ("charset", OptionKind::String),
    ("checkJs", OptionKind::Boolean),
    ("composite", OptionKind::Boolean),
    ("declaration", OptionKind::Boolean),
    ("declarationDir", OptionKind::Path),
    ("declarationMap", OptionKind::Boolean),
    ("downlevelIteration", OptionKind::Boolean),
    ("emitBOM", OptionKind::Boolean),
    ("emitDecoratorMetadata", OptionKind::Boolean),
    ("esModuleInterop", OptionKind::Boolean),
    ("exactOptionalPropertyTypes", OptionKind::Boolean),
    ("experimentalDecorators", OptionKind::Boolean),
    ("forceConsistentCasingInFileNames", OptionKind::Boolean),
    ("importHelpers", OptionKind::Boolean),
    ("incremental", OptionKind::Boolean),
    ("inlineSourceMap", OptionKind::Boolean),
    ("inlineSources", OptionKind::Boolean),
    ("isolatedModules", OptionKind::Boolean),
    ("jsx", OptionKind::String),
    ("jsxFactory", OptionKind::String),
    ("jsxFragmentFactory", OptionKind::String),
    ("lib", OptionKind::List),
    ("mapRoot", OptionKind::String),
    ("maxNodeModuleJsDepth", OptionKind::Number),
    ("module", OptionKind::String),
    ("moduleResolution", OptionKind::String),
    ("newLine", OptionKind::String),
    ("noEmit", OptionKind::Boolean),
    ("noEmitHelpers", OptionKind::Boolean),
    ("noEmitOnError", OptionKind::Boolean),
    ("noFallthroughCasesInSwitch", OptionKind::Boolean),
    ("noImplicitAny", OptionKind::Boolean),
    ("noImplicitOverride", OptionKind::Boolean),
    ("noImplicitReturns", OptionKind::Boolean),
    ("noImplicitThis", OptionKind::Boolean),
    ("noLib", OptionKind::Boolean),
    ("noUncheckedIndexedAccess", OptionKind::Boolean),
    ("noUnusedLocals", OptionKind::Boolean),
    ("noUnusedParameters", OptionKind::Boolean),
    ("outDir", OptionKind::Path),
    ("outFile", OptionKind::Path),
    ("paths", OptionKind::Object),
    ("preserveConstEnums", OptionKind::Boolean),
    ("removeComments", OptionKind::Boolean),
    ("resolveJsonModule", OptionKind::Boolean),
    ("rootDir", OptionKind::Path),
    ("rootDirs", OptionKind::PathList),
    ("skipLibCheck", OptionKind::Boolean),
    ("sourceMap", OptionKind::Boolean),
    ("sourceRoot", OptionKind::String),
    ("strict", OptionKind::Boolean),
    ("strictBindCallApply", OptionKind::Boolean),
    ("strictFunctionTypes", OptionKind::Boolean),
    ("strictNullChecks", OptionKind::Boolean),
    ("strictPropertyInitialization", OptionKind::Boolean),
    ("stripInternal", OptionKind::Boolean),
    ("target", OptionKind::String),
    ("tsBuildInfoFile", OptionKind::Path),
    ("typeRoots", OptionKind::PathList),
    ("types", OptionKind::List),
    ("useDefineForClassFields", OptionKind::Boolean),
    ("useUnknownInCatchVariables", OptionKind::Boolean),
];

pub fn option_kind(name: &str) -> Option<OptionKind> {
    KNOWN_OPTIONS
        .binary_search_by(|(known, _)| (*known).cmp(name))
        .ok()
        .map(|index| KNOWN_OPTIONS[index].1)
}

/// Validated compiler options, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    values: BTreeMap<String, Value>,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn flag(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn path(&self, name: &str) -> Option<PathBuf> {
        self.values.get(name).and_then(Value::as_str).map(PathBuf::from)
    }

    pub fn out_dir(&self) -> Option<PathBuf> {
        self.path("outDir")
    }

    pub fn declaration_dir(&self) -> Option<PathBuf> {
        self.path("declarationDir")
    }

    pub fn source_map(&self) -> bool {
        self.flag("sourceMap")
    }

    pub fn declaration_map(&self) -> bool {
        self.flag("declarationMap")
    }

    pub fn allow_js(&self) -> bool {
        self.flag("allowJs")
    }

    pub fn no_emit_on_error(&self) -> bool {
        self.flag("noEmitOnError")
    }
}

/// Validate a raw `compilerOptions` object, resolving path-valued options
/// against `base_dir`.
///
/// Invalid entries are dropped and reported; valid ones are kept, so the
/// caller always receives the usable subset.
pub fn convert_compiler_options(
    raw: &Value,
    base_dir: &Path,
    errors: &mut Vec<Diagnostic>,
) -> CompilerOptions {
    let mut options = CompilerOptions::new();
    let Some(entries) = raw.as_object() else {
        errors.push(Diagnostic::error(
            "Compiler option 'compilerOptions' requires a value of type object.",
        ));
        return options;
    };

    for (name, value) in entries {
        let Some(kind) = option_kind(name) else {
            errors.push(Diagnostic::error(format!("Unknown compiler option '{name}'.")).with_code(5023));
            continue;
        };
        if value.is_null() {
            continue;
        }
        if !kind.accepts(value) {
            errors.push(
                Diagnostic::error(format!(
                    "Compiler option '{name}' requires a value of type {}.",
                    kind.type_name()
                ))
                .with_code(5024),
            );
            continue;
        }
        options.set(name.clone(), rebase_value(kind, value, base_dir));
    }
    options
}

/// Make path-typed values absolute relative to `base_dir`; other kinds are
/// returned unchanged.
pub fn rebase_value(kind: OptionKind, value: &Value, base_dir: &Path) -> Value {
    match (kind, value) {
        (OptionKind::Path, Value::String(path)) => Value::String(rebase(path, base_dir)),
        (OptionKind::PathList, Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(path) => Value::String(rebase(path, base_dir)),
                    other => other.clone(),
                })
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn rebase(path: &str, base_dir: &Path) -> String {
    normalize(&base_dir.join(path)).to_string_lossy().into_owned()
}

/// Lexically resolve `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
