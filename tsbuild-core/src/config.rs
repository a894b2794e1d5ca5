//! Loading a project file from disk into a [`Configuration`].

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::compiler::Compiler;
use crate::diagnostic::{Diagnostic, Position};
use crate::jsonc;
use crate::options::{CompilerOptions, normalize, option_kind, rebase_value};

/// A resolved project: the inputs to compile and how to compile them.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub config_path: PathBuf,
    pub file_names: Vec<PathBuf>,
    pub options: CompilerOptions,
}

impl Configuration {
    pub fn out_dir(&self) -> Option<PathBuf> {
        self.options.out_dir()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or is not valid JSON.
    #[error("{0}")]
    Parse(Diagnostic),
    /// The file parsed but describes an unusable project.
    #[error("invalid project configuration ({} problems)", .0.len())]
    Resolution(Vec<Diagnostic>),
}

impl ConfigError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ConfigError::Parse(diagnostic) => std::slice::from_ref(diagnostic),
            ConfigError::Resolution(diagnostics) => diagnostics,
        }
    }
}

/// Read the project file at `path`, follow its `extends` chain, and let
/// `compiler` resolve the result.
pub fn load_configuration<C>(path: &Path, compiler: &C) -> Result<Configuration, ConfigError>
where
    C: Compiler + ?Sized,
{
    let config_path = normalize(&std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()));
    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut chain = vec![config_path.clone()];
    let raw = read_project_object(path, &config_path, &mut chain)?;
    debug!("loaded project object from {}", config_path.display());

    let parsed = compiler.parse_config(&raw, &base_dir);
    if !parsed.errors.is_empty() {
        return Err(ConfigError::Resolution(parsed.errors));
    }
    let Some(out_dir) = parsed.options.out_dir() else {
        return Err(ConfigError::Resolution(vec![Diagnostic::error(
            "Compiler option 'outDir' must be specified.",
        )]));
    };
    // the output directory is deleted before every build
    let out_dir = normalize(&std::path::absolute(&out_dir).unwrap_or(out_dir));
    if config_path.starts_with(&out_dir) {
        return Err(ConfigError::Resolution(vec![Diagnostic::error(format!(
            "Output directory '{}' must not contain the project file '{}'.",
            out_dir.display(),
            config_path.display()
        ))]));
    }

    Ok(Configuration {
        config_path,
        file_names: parsed.file_names,
        options: parsed.options,
    })
}

/// `display` is the path as the user wrote it, used in messages;
/// `path` is its absolute form.
fn read_project_object(
    display: &Path,
    path: &Path,
    chain: &mut Vec<PathBuf>,
) -> Result<Value, ConfigError> {
    let file_name = display.display().to_string();
    let text = fs::read_to_string(path).map_err(|err| {
        ConfigError::Parse(
            Diagnostic::error(format!("Cannot read file '{file_name}': {err}.")).with_code(5083),
        )
    })?;

    let value = jsonc::parse(&file_name, &text).map_err(ConfigError::Parse)?;
    let Value::Object(mut object) = value else {
        let name = display
            .file_name()
            .map_or_else(|| file_name.clone(), |name| name.to_string_lossy().into_owned());
        return Err(ConfigError::Parse(Diagnostic::at(
            file_name,
            Position::new(0, 0),
            format!("The root value of a '{name}' file must be an object."),
        )));
    };

    let Some(extends) = object.remove("extends") else {
        return Ok(Value::Object(object));
    };
    let Some(extends) = extends.as_str() else {
        return Err(ConfigError::Resolution(vec![Diagnostic::error(
            "Compiler option 'extends' requires a value of type string.",
        )]));
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base_path = resolve_extends(dir, extends).ok_or_else(|| {
        ConfigError::Resolution(vec![
            Diagnostic::error(format!("File '{extends}' not found.")).with_code(6053),
        ])
    })?;
    if chain.contains(&base_path) {
        let mut names: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
        names.push(base_path.display().to_string());
        return Err(ConfigError::Resolution(vec![Diagnostic::error(format!(
            "Circularity detected while resolving configuration: {}",
            names.join(" -> ")
        ))]));
    }

    trace!("{} extends {}", path.display(), base_path.display());
    chain.push(base_path.clone());
    let base = read_project_object(&base_path, &base_path, chain)?;
    chain.pop();

    let base_dir = base_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(Value::Object(merge(rebase_object(base, base_dir), object)))
}

/// Locate the file named by an `extends` entry.
///
/// Relative and absolute names are taken as paths; bare names are looked
/// up in `node_modules` directories from `dir` upwards.
fn resolve_extends(dir: &Path, extends: &str) -> Option<PathBuf> {
    let candidates = |path: PathBuf| {
        let mut with_json = path.clone().into_os_string();
        with_json.push(".json");
        [path, PathBuf::from(with_json)]
    };

    let is_path = extends.starts_with('.') || Path::new(extends).is_absolute();
    if is_path {
        return candidates(normalize(&dir.join(extends)))
            .into_iter()
            .find(|path| path.is_file());
    }

    dir.ancestors().find_map(|ancestor| {
        candidates(ancestor.join("node_modules").join(extends))
            .into_iter()
            .find(|path| path.is_file())
    })
}

/// Make the relative entries of an inherited project object absolute, so
/// they keep pointing at the same files once merged into the child.
fn rebase_object(value: Value, base_dir: &Path) -> Map<String, Value> {
    let Value::Object(mut object) = value else {
        return Map::new();
    };

    for key in ["files", "include", "exclude"] {
        if let Some(Value::Array(items)) = object.get_mut(key) {
            for item in items.iter_mut() {
                if let Value::String(entry) = item {
                    *entry = normalize(&base_dir.join(&*entry)).to_string_lossy().into_owned();
                }
            }
        }
    }

    if let Some(Value::Object(options)) = object.get_mut("compilerOptions") {
        for (name, value) in options.iter_mut() {
            if let Some(kind) = option_kind(name) {
                *value = rebase_value(kind, value, base_dir);
            }
        }
    }

    object
}

/// Overlay `child` onto `base`. Compiler options merge key by key, every
/// other top-level entry of the child replaces the base's.
fn merge(mut base: Map<String, Value>, child: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in child {
        let merged = match (key.as_str(), value) {
            ("compilerOptions", Value::Object(options)) => match base.remove(&key) {
                Some(Value::Object(mut base_options)) => {
                    base_options.extend(options);
                    Value::Object(base_options)
                }
                _ => Value::Object(options),
            },
            (_, value) => value,
        };
        base.insert(key, merged);
    }
    base
}
