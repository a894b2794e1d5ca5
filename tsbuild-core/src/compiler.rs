//! The compiler service seam.
//!
//! A [`Compiler`] validates a raw project object and builds a [`Program`];
//! the program emits output and reports what it found wrong with the
//! sources. The driver only ever talks to these traits.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Configuration;
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::options::CompilerOptions;
use crate::project;

/// A raw project object resolved into inputs and options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedConfig {
    pub file_names: Vec<PathBuf>,
    pub options: CompilerOptions,
    pub errors: Vec<Diagnostic>,
}

/// What an emission produced.
///
/// The record lists are optional because a compiler may not track them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitResult {
    pub emit_skipped: bool,
    pub files: Option<Vec<PathBuf>>,
    pub source_maps: Option<Vec<PathBuf>>,
}

impl EmitResult {
    pub fn skipped() -> Self {
        Self {
            emit_skipped: true,
            files: None,
            source_maps: None,
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.as_ref().map_or(0, Vec::len)
    }

    pub fn source_map_count(&self) -> usize {
        self.source_maps.as_ref().map_or(0, Vec::len)
    }
}

pub trait Program {
    fn compiler_options(&self) -> &CompilerOptions;

    fn root_file_names(&self) -> &[PathBuf];

    /// Write output artifacts to disk.
    fn emit(&mut self) -> Result<EmitResult, CoreError>;

    /// Syntactic and semantic diagnostics for the whole program.
    fn pre_emission_diagnostics(&mut self) -> Result<Vec<Diagnostic>, CoreError>;
}

pub trait Compiler {
    type Program: Program;

    /// Resolve a raw project object whose relative paths are anchored at
    /// `base_dir`.
    fn parse_config(&self, raw: &Value, base_dir: &Path) -> ParsedConfig {
        project::parse_json_config(raw, base_dir)
    }

    fn create_program(&self, configuration: &Configuration) -> Result<Self::Program, CoreError>;
}
