use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Target};
use log::{LevelFilter, debug};
use tsbuild_core::{Console, Outcome, TscCompiler, compile};

const DEFAULT_PROJECT: &str = "tsconfig.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Compile a TypeScript project into a fresh output directory.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "TSBUILD_PROJECT",
        default_value = DEFAULT_PROJECT,
        help = "Project file, or a directory containing tsconfig.json"
    )]
    project: PathBuf,

    #[arg(
        long,
        value_name = "PROGRAM",
        env = "TSBUILD_TSC",
        help = "Compiler executable (defaults to node_modules/.bin/tsc, then tsc on PATH)"
    )]
    tsc: Option<String>,

    #[arg(
        long = "tsc-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Argument passed to the compiler before all others (repeatable)"
    )]
    tsc_args: Vec<String>,

    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Raise log verbosity (-v, -vv, -vvv)")]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match execute(cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(2)
        }
    }
}

fn execute(cli: Cli) -> Result<Outcome> {
    let project = project_file(&cli.project);
    let project_dir = project
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let compiler = match cli.tsc {
        Some(program) => TscCompiler::new(program),
        None => TscCompiler::locate(project_dir),
    }
    .with_leading_args(cli.tsc_args);
    debug!("using compiler {}", compiler.program());

    let stdout = io::stdout();
    let mut console = Console::new(stdout.lock(), use_color(cli.color));
    let outcome = compile(&project, &compiler, &mut console)
        .with_context(|| format!("failed to compile {}", project.display()))?;
    Ok(outcome)
}

fn project_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DEFAULT_PROJECT)
    } else {
        path.to_path_buf()
    }
}

fn use_color(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Logs go to stderr so they never interleave with compiler output on
/// stdout. `RUST_LOG` directives are applied after the `-v` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.target(Target::Stderr);
    if let Err(err) = builder.try_init() {
        eprintln!("logger already initialised: {err}");
    }
}
