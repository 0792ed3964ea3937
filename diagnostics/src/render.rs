use crate::line_col;
use crate::Diagnostic;
use crate::FileId;
use crate::Label;
use crate::Severity;
use std::fmt::Write;

/// Source metadata used during rendering.
pub struct SourceFile<'a> {
  pub name: &'a str,
  pub text: &'a str,
}

/// Provides access to source text for rendering diagnostics.
pub trait SourceProvider {
  fn file_name(&self, file: FileId) -> Option<&str>;
  fn file_text(&self, file: FileId) -> Option<&str>;

  fn source(&self, file: FileId) -> Option<SourceFile<'_>> {
    Some(SourceFile {
      name: self.file_name(file)?,
      text: self.file_text(file)?,
    })
  }
}

/// Render a diagnostic into a human-readable string with caret highlighting.
///
/// The layout follows the conventional compiler shape:
///
/// ```text
/// error[CODE]: message
///  --> name:line:col
///   |
/// 1 | let x = 1;
///   |     ^ message
/// = note: ...
/// ```
pub fn render_diagnostic(provider: &dyn SourceProvider, diagnostic: &Diagnostic) -> String {
  let mut output = String::new();

  writeln!(
    output,
    "{}[{}]: {}",
    diagnostic.severity, diagnostic.code, diagnostic.message
  )
  .unwrap();

  let mut labels = Vec::with_capacity(diagnostic.labels.len() + 1);
  labels.push(Label {
    span: diagnostic.primary,
    message: diagnostic.message.clone(),
    is_primary: true,
  });
  labels.extend(diagnostic.labels.iter().cloned());
  labels.sort_by(|a, b| {
    b.is_primary
      .cmp(&a.is_primary)
      .then(a.span.file.cmp(&b.span.file))
      .then(a.span.range.start.cmp(&b.span.range.start))
      .then(a.span.range.end.cmp(&b.span.range.end))
      .then(a.message.cmp(&b.message))
  });

  for label in &labels {
    render_label(provider, &mut output, label);
  }

  for note in &diagnostic.notes {
    writeln!(output, "= note: {}", note).unwrap();
  }

  output
}

fn render_label(provider: &dyn SourceProvider, output: &mut String, label: &Label) {
  let Some(source) = provider.source(label.span.file) else {
    return;
  };
  let text = source.text;
  let start = (label.span.range.start as usize).min(text.len());
  let end = (label.span.range.end as usize).min(text.len()).max(start);
  let start_pos = line_col(text, start);
  let end_pos = line_col(text, end);

  writeln!(
    output,
    " --> {}:{}:{}",
    source.name, start_pos.line, start_pos.col
  )
  .unwrap();

  let gutter_width = digits(end_pos.line);
  writeln!(output, "{} |", " ".repeat(gutter_width)).unwrap();

  let marker = if label.is_primary { '^' } else { '-' };
  for (line_idx, line_text) in text.lines().enumerate() {
    let line_no = line_idx as u32 + 1;
    if line_no < start_pos.line || line_no > end_pos.line {
      continue;
    }
    writeln!(
      output,
      "{:>width$} | {}",
      line_no,
      line_text,
      width = gutter_width
    )
    .unwrap();

    let line_chars = line_text.chars().count();
    let underline_start = if line_no == start_pos.line {
      start_pos.col as usize - 1
    } else {
      0
    };
    let underline_end = if line_no == end_pos.line {
      // Zero-width spans still point at one character.
      (end_pos.col as usize - 1).max(underline_start + 1)
    } else {
      line_chars.max(underline_start + 1)
    };
    let mut underline = String::new();
    underline.push_str(&" ".repeat(underline_start));
    underline.push_str(&marker.to_string().repeat(underline_end - underline_start));
    if line_no == end_pos.line && !label.message.is_empty() {
      write!(underline, " {}", label.message).unwrap();
    }
    writeln!(
      output,
      "{} | {}",
      " ".repeat(gutter_width),
      underline.trim_end()
    )
    .unwrap();
  }
}

fn digits(mut n: u32) -> usize {
  let mut count = 1;
  while n >= 10 {
    n /= 10;
    count += 1;
  }
  count
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Span;
  use crate::TextRange;

  struct TestSource {
    name: String,
    text: String,
  }

  impl SourceProvider for TestSource {
    fn file_name(&self, _file: FileId) -> Option<&str> {
      Some(&self.name)
    }

    fn file_text(&self, _file: FileId) -> Option<&str> {
      Some(&self.text)
    }
  }

  #[test]
  fn render_single_line_span() {
    let source = TestSource {
      name: "test.ds".into(),
      text: "let x = 1;".into(),
    };
    let diagnostic = Diagnostic::error(
      "TEST0001",
      "unused variable",
      Span::new(FileId(0), TextRange::new(4, 5)),
    );

    let rendered = render_diagnostic(&source, &diagnostic);
    let expected = "error[TEST0001]: unused variable\n --> test.ds:1:5\n  |\n1 | let x = 1;\n  |     ^ unused variable\n";
    assert_eq!(rendered, expected);
  }

  #[test]
  fn render_multi_line_span() {
    let source = TestSource {
      name: "main.ds".into(),
      text: "function test() {\n  return 1;\n}\n".into(),
    };
    let diagnostic = Diagnostic::error(
      "TEST0002",
      "broken function",
      Span::new(FileId(0), TextRange::new(0, source.text.len() as u32)),
    );

    let rendered = render_diagnostic(&source, &diagnostic);
    assert!(rendered.contains(" --> main.ds:1:1"));
    assert!(rendered.contains("1 | function test() {"));
    assert!(rendered.contains("2 |   return 1;"));
    assert!(rendered.contains("3 | }"));
  }

  #[test]
  fn renders_notes() {
    let source = TestSource {
      name: "note.ds".into(),
      text: "x".into(),
    };
    let diagnostic = Diagnostic::warning(
      "TEST0003",
      "odd",
      Span::new(FileId(0), TextRange::new(0, 1)),
    )
    .with_note("context here");
    let rendered = render_diagnostic(&source, &diagnostic);
    assert!(rendered.starts_with("warning[TEST0003]: odd\n"));
    assert!(rendered.contains("= note: context here"));
  }

  #[test]
  fn stable_label_ordering() {
    let source = TestSource {
      name: "order.ds".into(),
      text: "abcdef".into(),
    };
    let primary = Span::new(FileId(0), TextRange::new(2, 3));
    let diagnostic = Diagnostic::warning("TEST0004", "ordering", primary)
      .with_label(Label::secondary(
        Span::new(FileId(0), TextRange::new(4, 5)),
        "second",
      ))
      .with_label(Label::secondary(
        Span::new(FileId(0), TextRange::new(0, 1)),
        "first",
      ));

    let rendered = render_diagnostic(&source, &diagnostic);
    let first_pos = rendered.find("first").unwrap();
    let second_pos = rendered.find("second").unwrap();
    assert!(first_pos < second_pos);
  }
}
