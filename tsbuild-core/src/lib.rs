//! Core of the tsbuild toolchain driver.
//!
//! This crate turns a TypeScript project file into emitted output by
//! driving an external compiler. The pipeline is roughly:
//!
//!   tsconfig.json
//!     -> jsonc / config   (comment-tolerant parsing, `extends`)
//!     -> options / project (option validation, input discovery)
//!     -> compiler          (program creation, emission)
//!     -> report            (diagnostic lines, result summary)
//!
//! The compiler itself is a trait so that the driver can be exercised
//! against a fake; `tsc` provides the real backend.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Configuration loading and resolution
// ---------------------------------------------------------------------

pub mod jsonc;
pub mod options;
pub mod project;
pub mod config;

// ---------------------------------------------------------------------
// Compiler seam and backends
// ---------------------------------------------------------------------

pub mod compiler;
pub mod tsc;

// ---------------------------------------------------------------------
// Orchestration and console output
// ---------------------------------------------------------------------

pub mod report;
pub mod driver;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{Compiler, EmitResult, ParsedConfig, Program};
pub use config::{ConfigError, Configuration, load_configuration};
pub use diagnostic::{Category, Diagnostic, MessageChain, MessageText, Position};
pub use driver::{Outcome, compile};
pub use error::CoreError;
pub use report::{Console, Style};
pub use tsc::TscCompiler;
