//! The compile-and-report pipeline.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::compiler::{Compiler, Program};
use crate::config::load_configuration;
use crate::error::CoreError;
use crate::report::{Console, Style, skipped_message, summary_line};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The compiler refused to write output, usually because of errors.
    EmitSkipped,
    /// The project file could not be parsed or resolved; nothing was
    /// compiled.
    ConfigFailed,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::EmitSkipped | Outcome::ConfigFailed => 1,
        }
    }
}

/// Compile the project described by `config_path`.
///
/// The configured output directory is deleted before emission. All
/// diagnostics and status lines go to `console`; only I/O failures and
/// compiler-service failures are returned as errors.
pub fn compile<C, W>(config_path: &Path, compiler: &C, console: &mut Console<W>) -> Result<Outcome, CoreError>
where
    C: Compiler,
    W: Write,
{
    console.print(Style::Processing, "Compiling TypeScript...")?;

    let configuration = match load_configuration(config_path, compiler) {
        Ok(configuration) => configuration,
        Err(err) => {
            debug!("rejected {}: {err}", config_path.display());
            console.report_diagnostics(err.diagnostics())?;
            return Ok(Outcome::ConfigFailed);
        }
    };
    let mut program = compiler.create_program(&configuration)?;
    info!(
        "compiling {} files from {}",
        program.root_file_names().len(),
        configuration.config_path.display()
    );

    if let Some(out_dir) = program.compiler_options().out_dir() {
        let out_dir = output_directory(&out_dir)?;
        if out_dir.exists() {
            console.print(Style::Processing, &format!("Deleting {}...", out_dir.display()))?;
            let removed = if out_dir.is_dir() {
                fs::remove_dir_all(&out_dir)
            } else {
                fs::remove_file(&out_dir)
            };
            removed.map_err(|err| CoreError::io(&out_dir, err))?;
        }
    }

    let emit_result = program.emit()?;
    let diagnostics = program.pre_emission_diagnostics()?;
    console.report_diagnostics(&diagnostics)?;

    if emit_result.emit_skipped {
        console.print(Style::Warning, &skipped_message(diagnostics.len()))?;
        return Ok(Outcome::EmitSkipped);
    }

    let (style, message) = summary_line(&emit_result);
    console.print(style, &message)?;
    Ok(Outcome::Success)
}

/// Relative output directories are taken from the working directory.
fn output_directory(out_dir: &Path) -> Result<PathBuf, CoreError> {
    if out_dir.is_absolute() {
        return Ok(out_dir.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|err| CoreError::io(".", err))?;
    Ok(cwd.join(out_dir))
}
