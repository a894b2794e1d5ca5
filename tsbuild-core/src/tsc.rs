//! Backend that drives the `tsc` executable.
//!
//! Options travel as command-line flags and input files as positional
//! arguments, so `tsc` never reads a project file of its own. Output is
//! requested with `--pretty false --listEmittedFiles`, which gives one
//! diagnostic per line (plus indented elaboration lines) and one
//! `TSFILE:` line per written file.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, trace, warn};
use serde_json::Value;

use crate::compiler::{Compiler, EmitResult, ParsedConfig, Program};
use crate::config::Configuration;
use crate::diagnostic::{Category, Diagnostic, MessageChain, MessageText, Position};
use crate::error::CoreError;
use crate::options::CompilerOptions;
use crate::project;

const DEFAULT_PROGRAM: &str = "tsc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TscCompiler {
    program: String,
    leading_args: Vec<String>,
}

impl Default for TscCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl TscCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before everything tsbuild passes, e.g. the script
    /// path when `program` is `node`.
    pub fn with_leading_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.leading_args.extend(args);
        self
    }

    /// Prefer a project-local `node_modules/.bin/tsc`, searching from
    /// `project_dir` upwards, and fall back to `tsc` on the `PATH`.
    pub fn locate(project_dir: &Path) -> Self {
        let binary = if cfg!(windows) { "tsc.cmd" } else { "tsc" };
        let start = std::path::absolute(project_dir).unwrap_or_else(|_| project_dir.to_path_buf());
        start
            .ancestors()
            .map(|dir| dir.join("node_modules").join(".bin").join(binary))
            .find(|candidate| candidate.is_file())
            .map(|path| Self::new(path.to_string_lossy().into_owned()))
            .unwrap_or_default()
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Compiler for TscCompiler {
    type Program = TscProgram;

    fn parse_config(&self, raw: &Value, base_dir: &Path) -> ParsedConfig {
        let mut parsed = project::parse_json_config(raw, base_dir);
        let unsupported: Vec<Diagnostic> = parsed
            .options
            .iter()
            .filter(|(_, value)| value.is_object())
            .map(|(name, _)| {
                Diagnostic::error(format!("Option '{name}' can only be specified in a config file."))
                    .with_code(6064)
            })
            .collect();
        parsed.errors.extend(unsupported);
        parsed
    }

    fn create_program(&self, configuration: &Configuration) -> Result<TscProgram, CoreError> {
        Ok(TscProgram {
            program: self.program.clone(),
            leading_args: self.leading_args.clone(),
            file_names: configuration.file_names.clone(),
            options: configuration.options.clone(),
            run: None,
        })
    }
}

/// The outcome of one `tsc` process.
#[derive(Debug, Clone, Default, PartialEq)]
struct TscRun {
    status: i32,
    output: TscOutput,
}

pub struct TscProgram {
    program: String,
    leading_args: Vec<String>,
    file_names: Vec<PathBuf>,
    options: CompilerOptions,
    run: Option<TscRun>,
}

impl TscProgram {
    /// Arguments after the leading ones, for an emitting run or a
    /// check-only (`--noEmit`) run.
    pub fn command_line(&self, no_emit: bool) -> Vec<String> {
        let mut args = vec!["--pretty".to_string(), "false".to_string()];
        if no_emit {
            args.push("--noEmit".to_string());
        } else {
            args.push("--listEmittedFiles".to_string());
        }
        for (name, value) in self.options.iter() {
            if no_emit && name == "noEmit" {
                continue;
            }
            push_option(&mut args, name, value);
        }
        args.extend(
            self.file_names
                .iter()
                .map(|path| path.to_string_lossy().into_owned()),
        );
        args
    }

    fn invoke(&self, no_emit: bool) -> Result<TscRun, CoreError> {
        // with no inputs tsc would go looking for a project file of its own
        if self.file_names.is_empty() {
            debug!("no input files; skipping {}", self.program);
            return Ok(TscRun::default());
        }

        let args = self.command_line(no_emit);
        debug!(
            "running {} {} {}",
            self.program,
            self.leading_args.join(" "),
            args.join(" ")
        );
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(&args)
            .output()
            .map_err(|source| CoreError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let status = output
            .status
            .code()
            .ok_or_else(|| CoreError::CompilerTerminated {
                program: self.program.clone(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("{} wrote to stderr: {}", self.program, stderr.trim_end());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let output = parse_output(&stdout);
        debug!(
            "{} exited with {status}: {} diagnostics, {} files",
            self.program,
            output.diagnostics.len(),
            output.emitted_files.len()
        );
        Ok(TscRun { status, output })
    }

    fn emit_result(&self, run: &TscRun) -> EmitResult {
        // 0: clean, 2: diagnostics present but outputs generated
        let emit_skipped = !matches!(run.status, 0 | 2);
        let (source_maps, files): (Vec<PathBuf>, Vec<PathBuf>) = run
            .output
            .emitted_files
            .iter()
            .cloned()
            .partition(|path| path.extension().is_some_and(|ext| ext == "map"));
        let tracks_maps = self.options.source_map() || self.options.declaration_map();
        EmitResult {
            emit_skipped,
            files: Some(files),
            source_maps: tracks_maps.then_some(source_maps),
        }
    }
}

impl Program for TscProgram {
    fn compiler_options(&self) -> &CompilerOptions {
        &self.options
    }

    fn root_file_names(&self) -> &[PathBuf] {
        &self.file_names
    }

    fn emit(&mut self) -> Result<EmitResult, CoreError> {
        let run = self.invoke(false)?;
        let result = self.emit_result(&run);
        self.run = Some(run);
        Ok(result)
    }

    fn pre_emission_diagnostics(&mut self) -> Result<Vec<Diagnostic>, CoreError> {
        if let Some(run) = &self.run {
            return Ok(run.output.diagnostics.clone());
        }
        let run = self.invoke(true)?;
        let diagnostics = run.output.diagnostics.clone();
        self.run = Some(run);
        Ok(diagnostics)
    }
}

fn push_option(args: &mut Vec<String>, name: &str, value: &Value) {
    let flag = format!("--{name}");
    match value {
        Value::Bool(true) => args.push(flag),
        Value::Bool(false) => args.extend([flag, "false".to_string()]),
        Value::String(text) => args.extend([flag, text.clone()]),
        Value::Number(number) => args.extend([flag, number.to_string()]),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(",");
            args.extend([flag, joined]);
        }
        Value::Null | Value::Object(_) => {}
    }
}

/// Everything recognised in the standard output of a `tsc` run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TscOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub emitted_files: Vec<PathBuf>,
}

/// Parse `--pretty false --listEmittedFiles` output.
pub fn parse_output(text: &str) -> TscOutput {
    let mut output = TscOutput::default();
    let mut pending: Option<PendingDiagnostic> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if let Some(path) = line.strip_prefix("TSFILE: ") {
            output.emitted_files.push(PathBuf::from(path.trim()));
            continue;
        }
        if line.starts_with(' ') {
            match pending.as_mut() {
                Some(current) => current.push_continuation(line),
                None => trace!("ignoring tsc output: {line}"),
            }
            continue;
        }
        match parse_diagnostic_head(line) {
            Some(diagnostic) => {
                if let Some(done) = pending.take() {
                    output.diagnostics.push(done.finish());
                }
                pending = Some(PendingDiagnostic::new(diagnostic));
            }
            None => trace!("ignoring tsc output: {line}"),
        }
    }
    if let Some(done) = pending.take() {
        output.diagnostics.push(done.finish());
    }
    output
}

/// A diagnostic whose elaboration lines may still follow.
struct PendingDiagnostic {
    diagnostic: Diagnostic,
    chain: MessageChain,
}

impl PendingDiagnostic {
    fn new(diagnostic: Diagnostic) -> Self {
        let chain = MessageChain::new(diagnostic.message.flatten("\n"));
        Self { diagnostic, chain }
    }

    /// Attach an indented line; two spaces per nesting level.
    fn push_continuation(&mut self, line: &str) {
        let text = line.trim_start_matches(' ');
        let level = ((line.len() - text.len()) / 2).max(1);
        let mut node = &mut self.chain;
        for _ in 1..level {
            if node.next.is_empty() {
                break;
            }
            let last = node.next.len() - 1;
            node = &mut node.next[last];
        }
        node.next.push(MessageChain::new(text));
    }

    fn finish(mut self) -> Diagnostic {
        if !self.chain.next.is_empty() {
            self.diagnostic.message = MessageText::Chain(self.chain);
        }
        self.diagnostic
    }
}

/// `path(line,col): error TS1234: text` or `error TS1234: text`.
fn parse_diagnostic_head(line: &str) -> Option<Diagnostic> {
    if let Some(diagnostic) = parse_category_and_code(line) {
        return Some(diagnostic);
    }
    line.match_indices("): ").find_map(|(index, _)| {
        let (file, position) = parse_location(&line[..=index])?;
        let mut diagnostic = parse_category_and_code(&line[index + 3..])?;
        diagnostic.file = Some(file);
        diagnostic.position = Some(position);
        Some(diagnostic)
    })
}

fn parse_category_and_code(text: &str) -> Option<Diagnostic> {
    let (keyword, rest) = text.split_once(' ')?;
    let category = Category::from_keyword(keyword)?;
    let (code, message) = rest.strip_prefix("TS")?.split_once(": ")?;
    let code = code.parse().ok()?;
    Some(
        Diagnostic::error(message)
            .with_category(category)
            .with_code(code),
    )
}

/// `path(line,col)` with one-based coordinates.
fn parse_location(text: &str) -> Option<(String, Position)> {
    let (file, coordinates) = text.strip_suffix(')')?.rsplit_once('(')?;
    let (line, character) = coordinates.split_once(',')?;
    let line: u32 = line.trim().parse().ok()?;
    let character: u32 = character.trim().parse().ok()?;
    Some((
        file.to_string(),
        Position::new(line.saturating_sub(1), character.saturating_sub(1)),
    ))
}
