//! Shared diagnostics model and rendering utilities.
//!
//! The data structures here are intentionally minimal and deterministic so
//! they can be reused across lexing, parsing, binding, and evaluation without
//! pulling in any heavy dependencies.
//!
//! ```
//! use diagnostics::render::{render_diagnostic, SourceProvider};
//! use diagnostics::{Diagnostic, FileId, Span, TextRange};
//!
//! struct SingleFile {
//!   name: String,
//!   text: String,
//! }
//!
//! impl SourceProvider for SingleFile {
//!   fn file_name(&self, _file: FileId) -> Option<&str> {
//!     Some(&self.name)
//!   }
//!
//!   fn file_text(&self, _file: FileId) -> Option<&str> {
//!     Some(&self.text)
//!   }
//! }
//!
//! let provider = SingleFile {
//!   name: "example.ds".into(),
//!   text: "let x = 1;".into(),
//! };
//! let diag = Diagnostic::error(
//!   "TEST0001",
//!   "an example error",
//!   Span::new(FileId(0), TextRange::new(4, 5)),
//! );
//!
//! let rendered = render_diagnostic(&provider, &diag);
//! assert!(rendered.contains("TEST0001"));
//! assert!(rendered.contains("--> example.ds:1:5"));
//! ```

pub mod render;

use std::fmt::Display;
use std::fmt::Formatter;

/// A stable identifier for a file in a program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A byte range in a file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextRange {
  pub start: u32,
  pub end: u32,
}

impl TextRange {
  pub const fn new(start: u32, end: u32) -> Self {
    Self { start, end }
  }

  pub fn len(&self) -> u32 {
    self.end.saturating_sub(self.start)
  }

  pub fn is_empty(&self) -> bool {
    self.start >= self.end
  }

  /// Convert a `(start, end)` byte pair into a `TextRange`, saturating to
  /// `u32` if necessary and returning a note describing any truncation.
  pub fn from_offsets_with_overflow_note(start: usize, end: usize) -> (Self, Option<String>) {
    let (start_u32, start_overflow) = saturating_to_u32(start);
    let (end_u32, end_overflow) = saturating_to_u32(end);
    let note = if start_overflow || end_overflow {
      Some(format!(
        "byte offsets truncated to fit u32 (start={}, end={})",
        start, end
      ))
    } else {
      None
    };

    (
      Self {
        start: start_u32,
        end: end_u32,
      },
      note,
    )
  }
}

/// A span across a specific file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Span {
  pub file: FileId,
  pub range: TextRange,
}

impl Span {
  pub const fn new(file: FileId, range: TextRange) -> Self {
    Self { file, range }
  }
}

/// Diagnostic severity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Severity {
  Error,
  Warning,
  Note,
  Help,
}

impl Severity {
  pub const fn as_str(&self) -> &'static str {
    match self {
      Severity::Error => "error",
      Severity::Warning => "warning",
      Severity::Note => "note",
      Severity::Help => "help",
    }
  }
}

impl Display for Severity {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A 1-based line and column position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LineCol {
  pub line: u32,
  pub col: u32,
}

/// Computes the 1-based line/column of a byte offset within `text`.
///
/// Columns count Unicode scalar values, not bytes. Offsets past the end of
/// the text clamp to the final position.
pub fn line_col(text: &str, offset: usize) -> LineCol {
  let offset = offset.min(text.len());
  let mut line = 1u32;
  let mut line_start = 0usize;
  for (i, b) in text.bytes().enumerate() {
    if i >= offset {
      break;
    }
    if b == b'\n' {
      line += 1;
      line_start = i + 1;
    }
  }
  let col = text[line_start..offset].chars().count() as u32 + 1;
  LineCol { line, col }
}

/// A label attached to a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
  pub span: Span,
  pub message: String,
  pub is_primary: bool,
}

impl Label {
  pub fn new(span: Span, message: impl Into<String>, is_primary: bool) -> Self {
    Self {
      span,
      message: message.into(),
      is_primary,
    }
  }

  pub fn primary(span: Span, message: impl Into<String>) -> Self {
    Self::new(span, message, true)
  }

  pub fn secondary(span: Span, message: impl Into<String>) -> Self {
    Self::new(span, message, false)
  }
}

/// A user-facing diagnostic with optional labels and notes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub code: &'static str,
  pub severity: Severity,
  pub message: String,
  pub primary: Span,
  pub labels: Vec<Label>,
  pub notes: Vec<String>,
}

impl Diagnostic {
  pub fn new(
    severity: Severity,
    code: &'static str,
    message: impl Into<String>,
    primary: Span,
  ) -> Self {
    Self {
      code,
      severity,
      message: message.into(),
      primary,
      labels: Vec::new(),
      notes: Vec::new(),
    }
  }

  pub fn error(code: &'static str, message: impl Into<String>, primary: Span) -> Self {
    Self::new(Severity::Error, code, message, primary)
  }

  pub fn warning(code: &'static str, message: impl Into<String>, primary: Span) -> Self {
    Self::new(Severity::Warning, code, message, primary)
  }

  pub fn note(code: &'static str, message: impl Into<String>, primary: Span) -> Self {
    Self::new(Severity::Note, code, message, primary)
  }

  pub fn help(code: &'static str, message: impl Into<String>, primary: Span) -> Self {
    Self::new(Severity::Help, code, message, primary)
  }

  pub fn with_label(mut self, label: Label) -> Self {
    self.labels.push(label);
    self
  }

  pub fn with_note(mut self, note: impl Into<String>) -> Self {
    self.notes.push(note.into());
    self
  }
}

/// A host-originated failure (I/O, invalid input encoding) expressed as a
/// diagnostic so every failure path renders uniformly.
pub fn host_error(span: Option<Span>, message: impl Into<String>) -> Diagnostic {
  let span = span.unwrap_or(Span::new(FileId(0), TextRange::new(0, 0)));
  Diagnostic::error("HOST0001", message, span)
}

/// Deterministically orders diagnostics by file, range, code, and message.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
  diagnostics.sort_by(|a, b| {
    a.primary
      .file
      .cmp(&b.primary.file)
      .then(a.primary.range.start.cmp(&b.primary.range.start))
      .then(a.primary.range.end.cmp(&b.primary.range.end))
      .then(a.code.cmp(&b.code))
      .then(a.message.cmp(&b.message))
  });
}

fn saturating_to_u32(value: usize) -> (u32, bool) {
  if value > u32::MAX as usize {
    (u32::MAX, true)
  } else {
    (value as u32, false)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_col_is_one_based() {
    let text = "let x = 1;\nlet y = 2;";
    assert_eq!(line_col(text, 0), LineCol { line: 1, col: 1 });
    assert_eq!(line_col(text, 4), LineCol { line: 1, col: 5 });
    assert_eq!(line_col(text, 11), LineCol { line: 2, col: 1 });
    assert_eq!(line_col(text, 15), LineCol { line: 2, col: 5 });
  }

  #[test]
  fn line_col_clamps_past_end() {
    let text = "ab";
    assert_eq!(line_col(text, 100), LineCol { line: 1, col: 3 });
  }

  #[test]
  fn line_col_counts_chars_not_bytes() {
    let text = "é = 1";
    // The identifier is 2 bytes; the `=` starts at byte 3 but column 3.
    assert_eq!(line_col(text, 3), LineCol { line: 1, col: 3 });
  }

  #[test]
  fn records_overflow_note() {
    let (range, note) = TextRange::from_offsets_with_overflow_note(usize::MAX - 1, usize::MAX);
    assert_eq!(range.start, u32::MAX);
    assert_eq!(range.end, u32::MAX);
    assert!(note.unwrap().contains("truncated"));
  }

  #[test]
  fn sorts_deterministically() {
    let span = |start| Span::new(FileId(0), TextRange::new(start, start + 1));
    let mut diagnostics = vec![
      Diagnostic::error("B0002", "second", span(4)),
      Diagnostic::error("A0001", "first", span(2)),
    ];
    sort_diagnostics(&mut diagnostics);
    assert_eq!(diagnostics[0].code, "A0001");
    assert_eq!(diagnostics[1].code, "B0002");
  }
}
