//! JSON with comments, as accepted in TypeScript project files.
//!
//! Comments and trailing commas are blanked out with spaces rather than
//! removed, so line and column numbers reported by `serde_json` still
//! point into the original text.

use serde_json::Value;

use crate::diagnostic::{Diagnostic, Position};

/// Parse `text` as JSON after blanking comments and trailing commas.
///
/// `file_name` is only used to attach the diagnostic on failure. A leading
/// byte-order mark is skipped.
pub fn parse(file_name: &str, text: &str) -> Result<Value, Diagnostic> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let cleaned = strip_trailing_commas(&strip_comments(text));
    serde_json::from_str(&cleaned).map_err(|err| syntax_diagnostic(file_name, &err))
}

fn syntax_diagnostic(file_name: &str, err: &serde_json::Error) -> Diagnostic {
    let line = err.line();
    let column = err.column();
    let full = err.to_string();
    let suffix = format!(" at line {line} column {column}");
    let message = full.strip_suffix(&suffix).unwrap_or(&full).to_string();
    let position = Position::new(
        line.saturating_sub(1) as u32,
        column.saturating_sub(1) as u32,
    );
    Diagnostic::at(file_name, position, message)
}

/// Replace `//` and `/* */` comments outside string literals with spaces.
/// Newlines inside block comments are kept.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut index = 0;
    let mut in_string = false;

    while index < bytes.len() {
        let byte = bytes[index];
        if in_string {
            match byte {
                b'\\' => index += 1,
                b'"' => in_string = false,
                _ => {}
            }
            index += 1;
            continue;
        }
        match (byte, bytes.get(index + 1)) {
            (b'"', _) => {
                in_string = true;
                index += 1;
            }
            (b'/', Some(b'/')) => {
                while index < bytes.len() && bytes[index] != b'\n' {
                    out[index] = b' ';
                    index += 1;
                }
            }
            (b'/', Some(b'*')) => {
                out[index] = b' ';
                out[index + 1] = b' ';
                index += 2;
                while index < bytes.len() {
                    if bytes[index] == b'*' && bytes.get(index + 1) == Some(&b'/') {
                        out[index] = b' ';
                        out[index + 1] = b' ';
                        index += 2;
                        break;
                    }
                    if !matches!(bytes[index], b'\n' | b'\r') {
                        out[index] = b' ';
                    }
                    index += 1;
                }
            }
            _ => index += 1,
        }
    }

    // multi-byte sequences are blanked whole, so this stays valid UTF-8
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Replace commas that directly precede `}` or `]` (ignoring whitespace)
/// with spaces.
pub fn strip_trailing_commas(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut in_string = false;
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        if in_string {
            match byte {
                b'\\' => index += 1,
                b'"' => in_string = false,
                _ => {}
            }
            index += 1;
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b',' => {
                let next = bytes[index + 1..]
                    .iter()
                    .find(|b| !b.is_ascii_whitespace());
                if matches!(next, Some(b'}') | Some(b']')) {
                    out[index] = b' ';
                }
            }
            _ => {}
        }
        index += 1;
    }

    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_comments_and_trailing_commas() {
        let text = r#"{
            // output settings
            "compilerOptions": {
                "outDir": "dist", /* relative to this file */
                "sourceMap": true,
            },
            "include": ["src",],
        }"#;
        let value = parse("tsconfig.json", text).expect("parse");
        assert_eq!(value["compilerOptions"]["outDir"], "dist");
        assert_eq!(value["include"][0], "src");
    }

    #[test]
    fn keeps_comment_markers_inside_strings() {
        let value = parse("tsconfig.json", r#"{ "a": "http://x/*y*/", "b": "q\"//" }"#)
            .expect("parse");
        assert_eq!(value["a"], "http://x/*y*/");
        assert_eq!(value["b"], "q\"//");
    }

    #[test]
    fn blanking_preserves_line_structure() {
        let stripped = strip_comments("a /* one\ntwo */ b // three\nc");
        assert_eq!(stripped.lines().count(), 3);
        assert_eq!(stripped.len(), "a /* one\ntwo */ b // three\nc".len());
        assert!(stripped.ends_with("\nc"));
    }

    #[test]
    fn skips_leading_byte_order_mark() {
        let value = parse("tsconfig.json", "\u{feff}{ \"compilerOptions\": { \"outDir\": \"dist\" } }")
            .expect("parse");
        assert_eq!(value["compilerOptions"]["outDir"], "dist");
    }

    #[test]
    fn byte_order_mark_inside_text_is_still_an_error() {
        assert!(parse("tsconfig.json", "{ \"a\": \u{feff}1 }").is_err());
    }

    #[test]
    fn reports_syntax_error_position() {
        let text = "{\n  \"compilerOptions\": {\n    \"outDir\" \"dist\"\n  }\n}";
        let diagnostic = parse("tsconfig.json", text).unwrap_err();
        assert_eq!(diagnostic.file.as_deref(), Some("tsconfig.json"));
        let position = diagnostic.position.expect("position");
        assert_eq!(position.line, 2);
        let message = diagnostic.message.flatten("\n");
        assert!(message.contains("expected `:`"), "{message}");
        assert!(!message.contains("at line"), "{message}");
    }
}
