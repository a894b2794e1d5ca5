//! Diagnostics produced while loading a project or compiling it.

use std::fmt;

/// Severity reported by the compiler.
///
/// Carried for logging only; console output treats every category alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Error,
    Warning,
    Suggestion,
    Message,
}

impl Category {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "error" => Some(Category::Error),
            "warning" => Some(Category::Warning),
            "suggestion" => Some(Category::Suggestion),
            "message" => Some(Category::Message),
            _ => None,
        }
    }
}

/// Zero-based line and character offset inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Nested message text, as produced for elaborated errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChain {
    pub text: String,
    pub next: Vec<MessageChain>,
}

impl MessageChain {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next: Vec::new(),
        }
    }

    pub fn with_next(mut self, next: MessageChain) -> Self {
        self.next.push(next);
        self
    }

    fn flatten_into(&self, out: &mut String, newline: &str, depth: usize) {
        out.push_str(&self.text);
        for child in &self.next {
            out.push_str(newline);
            for _ in 0..=depth {
                out.push_str("  ");
            }
            child.flatten_into(out, newline, depth + 1);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageText {
    Plain(String),
    Chain(MessageChain),
}

impl MessageText {
    /// Collapse the message into one string, joining nested entries with
    /// `newline` and indenting each level by two spaces.
    pub fn flatten(&self, newline: &str) -> String {
        match self {
            MessageText::Plain(text) => text.clone(),
            MessageText::Chain(chain) => {
                let mut out = String::new();
                chain.flatten_into(&mut out, newline, 0);
                out
            }
        }
    }
}

impl From<String> for MessageText {
    fn from(text: String) -> Self {
        MessageText::Plain(text)
    }
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        MessageText::Plain(text.to_string())
    }
}

impl From<MessageChain> for MessageText {
    fn from(chain: MessageChain) -> Self {
        MessageText::Chain(chain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: Category,
    pub code: Option<u32>,
    pub file: Option<String>,
    pub position: Option<Position>,
    pub message: MessageText,
}

impl Diagnostic {
    /// An error not attached to any file.
    pub fn error(message: impl Into<MessageText>) -> Self {
        Self {
            category: Category::Error,
            code: None,
            file: None,
            position: None,
            message: message.into(),
        }
    }

    /// An error attached to `file` at `position`.
    pub fn at(file: impl Into<String>, position: Position, message: impl Into<MessageText>) -> Self {
        Self {
            category: Category::Error,
            code: None,
            file: Some(file.into()),
            position: Some(position),
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Error")?;
        match (&self.file, self.position) {
            (Some(file), Some(position)) => {
                write!(f, " {} {}, {}", file, position.line, position.character + 1)?
            }
            (Some(file), None) => write!(f, " {file}")?,
            (None, _) => {}
        }
        write!(f, ": {}", self.message.flatten("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_diagnostic_with_file_position() {
        let diagnostic = Diagnostic::at("a.ts", Position::new(4, 9), "Cannot find name 'x'.");
        assert_eq!(diagnostic.to_string(), "Error a.ts 4, 10: Cannot find name 'x'.");
    }

    #[test]
    fn formats_diagnostic_without_file() {
        let diagnostic = Diagnostic::error("Unknown compiler option 'foo'.");
        assert_eq!(diagnostic.to_string(), "Error: Unknown compiler option 'foo'.");
    }

    #[test]
    fn formats_file_diagnostic_without_position() {
        let mut diagnostic = Diagnostic::error("File is not a module.");
        diagnostic.file = Some("lib.d.ts".to_string());
        assert_eq!(diagnostic.to_string(), "Error lib.d.ts: File is not a module.");
    }

    #[test]
    fn flattens_nested_message_chain() {
        let chain = MessageChain::new("Type 'A' is not assignable to type 'B'.").with_next(
            MessageChain::new("Types of property 'x' are incompatible.")
                .with_next(MessageChain::new("Type 'string' is not assignable to type 'number'.")),
        );
        let text = MessageText::from(chain).flatten("\n");
        assert_eq!(
            text,
            "Type 'A' is not assignable to type 'B'.\n  Types of property 'x' are incompatible.\n    Type 'string' is not assignable to type 'number'."
        );
    }

    #[test]
    fn recognises_category_keywords() {
        assert_eq!(Category::from_keyword("warning"), Some(Category::Warning));
        assert_eq!(Category::from_keyword("fatal"), None);
    }
}
