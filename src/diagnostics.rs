//! Human-readable error reports
//!
//! Errors carry a [`SourceLocation`]; [`render`] turns one into a short
//! report showing the offending line with a caret under the column:
//!
//! ```text
//! incompatible types when assigning to type 'int' from type 'char*'
//! 0003 |     x = "abc";
//!      |     ^
//! ```

use crate::parser::ast::SourceLocation;
use std::fmt::Write;

/// Report `message` at `location` within `source`
///
/// `location.offset` counts characters, as the lexer does, so the end-of-file
/// check compares it against the character count rather than the byte length.
pub fn render(source: &str, location: SourceLocation, message: &str) -> String {
    if !source.is_empty() && location.offset >= source.chars().count() {
        return format!("{}\nUnexpected end of file", message);
    }

    let line_number = location.line.max(1);
    let line = source.lines().nth(line_number - 1).unwrap_or("");

    let mut report = String::new();
    let _ = writeln!(report, "{}", message);
    let _ = writeln!(report, "{:04} | {}", line_number, line);
    let _ = write!(report, "     | {}^", " ".repeat(location.column.saturating_sub(1)));
    report
}
