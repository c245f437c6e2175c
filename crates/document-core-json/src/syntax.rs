//! Locating JSON errors in the payload.

use ropey::Rope;
use serde::Serialize;
use serde_json::error::Category;
use std::fmt;

/// Broad class of a JSON error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonErrorKind {
    /// Not syntactically valid JSON.
    Syntax,
    /// The input ended in the middle of a value.
    UnexpectedEof,
    /// Valid JSON that does not match the expected shape.
    Data,
}

impl From<Category> for JsonErrorKind {
    fn from(category: Category) -> Self {
        match category {
            Category::Eof => JsonErrorKind::UnexpectedEof,
            Category::Data => JsonErrorKind::Data,
            // `from_str` never does I/O.
            Category::Syntax | Category::Io => JsonErrorKind::Syntax,
        }
    }
}

/// Where and why a payload failed to parse.
///
/// `line` and `column` are 1-based as reported by `serde_json` (the column counts bytes).
/// `char_offset` is the 0-based character index of the offending position in the payload,
/// suitable for placing a caret in a text view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonSyntaxError {
    /// Error message without the position suffix.
    pub message: String,
    /// Error class.
    pub kind: JsonErrorKind,
    /// 1-based line.
    pub line: usize,
    /// 1-based byte column within `line`.
    pub column: usize,
    /// 0-based character offset into the payload.
    pub char_offset: usize,
}

impl JsonSyntaxError {
    /// Describe `error`, raised while parsing `payload`.
    pub fn locate(payload: &str, error: &serde_json::Error) -> Self {
        let line = error.line();
        let column = error.column();
        Self {
            message: strip_position(&error.to_string()),
            kind: error.classify().into(),
            line,
            column,
            char_offset: char_offset(&Rope::from_str(payload), line, column),
        }
    }
}

impl fmt::Display for JsonSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.line, self.column)
    }
}

fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(at) => message[..at].to_string(),
        None => message.to_string(),
    }
}

/// Convert a 1-based (line, byte column) pair to a character offset, clamped to the text.
pub fn char_offset(rope: &Rope, line: usize, column: usize) -> usize {
    if rope.len_bytes() == 0 || line == 0 {
        return 0;
    }

    let line_idx = (line - 1).min(rope.len_lines().saturating_sub(1));
    let byte = rope.line_to_byte(line_idx) + column.saturating_sub(1);
    rope.byte_to_char(byte.min(rope.len_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_for(payload: &str) -> JsonSyntaxError {
        let error = serde_json::from_str::<serde_json::Value>(payload).unwrap_err();
        JsonSyntaxError::locate(payload, &error)
    }

    #[test]
    fn test_locate_on_later_line() {
        let payload = "{\n  \"a\": 1,\n  \"b\": ?\n}";
        let error = error_for(payload);
        assert_eq!(error.kind, JsonErrorKind::Syntax);
        assert_eq!(error.line, 3);
        assert_eq!(error.char_offset, payload.find('?').unwrap());
        assert!(!error.message.contains("line"));
        assert!(error.to_string().ends_with(" at 3:8"));
    }

    #[test]
    fn test_locate_after_multibyte_text() {
        let payload = "[\"été\", ?]";
        let error = error_for(payload);
        let expected = payload.chars().position(|c| c == '?').unwrap();
        assert_eq!(error.line, 1);
        assert_eq!(error.char_offset, expected);
        assert!(error.column > expected);
    }

    #[test]
    fn test_eof_is_classified() {
        let error = error_for("{\"a\": [1, 2");
        assert_eq!(error.kind, JsonErrorKind::UnexpectedEof);
        assert!(error.char_offset <= "{\"a\": [1, 2".chars().count());
    }

    #[test]
    fn test_char_offset_clamps() {
        let rope = Rope::from_str("ab\ncd");
        assert_eq!(char_offset(&rope, 1, 1), 0);
        assert_eq!(char_offset(&rope, 2, 2), 4);
        assert_eq!(char_offset(&rope, 9, 99), 5);
        assert_eq!(char_offset(&Rope::new(), 1, 1), 0);
    }
}
