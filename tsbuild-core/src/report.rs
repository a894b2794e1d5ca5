//! Console output: styled status lines, diagnostics, and the final summary.

use std::fmt;
use std::io::{self, Write};

use yansi::{Condition, Paint};

use crate::compiler::EmitResult;
use crate::diagnostic::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Processing,
    Success,
    Warning,
    Error,
}

/// Style `message` for the terminal. With `color` off the message is
/// returned unchanged.
pub fn paint(message: &str, style: Style, color: bool) -> String {
    if !color {
        return message.to_string();
    }
    let painted = match style {
        Style::Processing => message.blue(),
        Style::Success => message.green(),
        Style::Warning => message.yellow(),
        Style::Error => message.red().bold(),
    };
    painted.whenever(Condition::ALWAYS).to_string()
}

/// One line per diagnostic, see [`Diagnostic`]'s `Display`.
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    diagnostic.to_string()
}

pub fn skipped_message(diagnostic_count: usize) -> String {
    format!("Encountered {diagnostic_count} errors. No files were emitted!")
}

/// Write the closing summary into `out`: the done line, then the source
/// map and js file counts when nonzero.
pub fn write_summary<W: fmt::Write>(out: &mut W, result: &EmitResult) -> fmt::Result {
    out.write_str("Done compiling TypeScript")?;
    let source_maps = result.source_map_count();
    let files = result.file_count();
    if source_maps > 0 {
        write!(out, ":\nsource maps emitted: {source_maps}")?;
    }
    if files > 0 {
        write!(out, ":\njs files emitted: {files}")?;
    }
    Ok(())
}

pub fn compose_summary(result: &EmitResult) -> Result<String, fmt::Error> {
    let mut message = String::new();
    write_summary(&mut message, result)?;
    Ok(message)
}

/// The closing line for a completed emission.
pub fn summary_line(result: &EmitResult) -> (Style, String) {
    summary_line_with(String::new(), result)
}

/// Like [`summary_line`], composing into `sink`. A failure to compose the
/// summary is reported in its place.
pub fn summary_line_with<W>(mut sink: W, result: &EmitResult) -> (Style, String)
where
    W: fmt::Write + fmt::Display,
{
    match write_summary(&mut sink, result) {
        Ok(()) => (Style::Success, sink.to_string()),
        Err(err) => (Style::Error, format!("Error occurred: {err}")),
    }
}

/// Line-oriented sink for everything the driver prints.
pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn print(&mut self, style: Style, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", paint(message, style, self.color))
    }

    pub fn report_diagnostics(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        for diagnostic in diagnostics {
            self.print(Style::Error, &format_diagnostic(diagnostic))?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Position;
    use std::path::PathBuf;

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).expect("utf8")
    }

    #[test]
    fn plain_paint_is_identity() {
        assert_eq!(paint("Compiling TypeScript...", Style::Processing, false), "Compiling TypeScript...");
    }

    #[test]
    fn colored_paint_wraps_message_in_escapes() {
        let painted = paint("boom", Style::Error, true);
        assert!(painted.contains("boom"));
        assert!(painted.starts_with("\u{1b}["));
        assert_ne!(painted, paint("boom", Style::Success, true));
    }

    #[test]
    fn reports_diagnostics_in_input_order() {
        let mut console = Console::new(Vec::new(), false);
        let diagnostics = vec![
            Diagnostic::at("b.ts", Position::new(1, 0), "second file"),
            Diagnostic::error("global"),
            Diagnostic::at("a.ts", Position::new(4, 9), "first file"),
        ];
        console.report_diagnostics(&diagnostics).expect("write");
        assert_eq!(
            output(console),
            "Error b.ts 1, 1: second file\nError: global\nError a.ts 4, 10: first file\n"
        );
    }

    #[test]
    fn summary_omits_zero_counts() {
        let result = EmitResult {
            emit_skipped: false,
            files: Some(Vec::new()),
            source_maps: None,
        };
        assert_eq!(compose_summary(&result).expect("compose"), "Done compiling TypeScript");
    }

    #[test]
    fn summary_lists_source_maps_before_files() {
        let result = EmitResult {
            emit_skipped: false,
            files: Some(vec![PathBuf::from("out/a.js"), PathBuf::from("out/b.js")]),
            source_maps: Some(vec![PathBuf::from("out/a.js.map")]),
        };
        let (style, message) = summary_line(&result);
        assert_eq!(style, Style::Success);
        assert_eq!(
            message,
            "Done compiling TypeScript:\nsource maps emitted: 1:\njs files emitted: 2"
        );
    }

    /// Accepts the first `capacity` bytes, then refuses.
    struct Bounded {
        text: String,
        capacity: usize,
    }

    impl fmt::Write for Bounded {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if self.text.len() + s.len() > self.capacity {
                return Err(fmt::Error);
            }
            self.text.push_str(s);
            Ok(())
        }
    }

    impl fmt::Display for Bounded {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.text)
        }
    }

    #[test]
    fn failed_summary_becomes_error_line() {
        let result = EmitResult {
            emit_skipped: false,
            files: Some(vec![PathBuf::from("out/a.js")]),
            source_maps: None,
        };
        let sink = Bounded {
            text: String::new(),
            capacity: "Done compiling TypeScript".len(),
        };
        let (style, message) = summary_line_with(sink, &result);
        assert_eq!(style, Style::Error);
        assert_eq!(message, format!("Error occurred: {}", fmt::Error));
    }

    #[test]
    fn roomy_sink_gets_full_summary() {
        let result = EmitResult {
            emit_skipped: false,
            files: Some(vec![PathBuf::from("out/a.js")]),
            source_maps: None,
        };
        let sink = Bounded {
            text: String::new(),
            capacity: usize::MAX,
        };
        assert_eq!(
            summary_line_with(sink, &result),
            (Style::Success, "Done compiling TypeScript:\njs files emitted: 1".to_string())
        );
    }

    #[test]
    fn skipped_message_counts_diagnostics() {
        assert_eq!(skipped_message(3), "Encountered 3 errors. No files were emitted!");
    }
}
