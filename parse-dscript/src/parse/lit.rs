use super::Parser;
use crate::ast::expr::LitNumExpr;
use crate::ast::expr::LitStrExpr;
use crate::ast::node::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::num::is_leading_zero_decimal_literal;
use crate::num::is_legacy_octal_literal;
use crate::num::JsNumber;
use crate::token::TT;

pub fn normalise_literal_number(raw: &str) -> Option<JsNumber> {
  JsNumber::from_literal(raw)
}

/// Decodes a raw string literal (including its quotes) into its value.
/// Returns `None` on a malformed escape sequence.
pub fn normalise_literal_string(raw: &str) -> Option<String> {
  if raw.len() < 2 {
    return None;
  }
  decode_literal(&raw[1..raw.len() - 1])
}

fn decode_literal(body: &str) -> Option<String> {
  let mut out = String::with_capacity(body.len());
  let mut rest = body;
  while let Some(backslash) = rest.find('\\') {
    out.push_str(&rest[..backslash]);
    rest = &rest[backslash + 1..];
    let first = rest.chars().next()?;
    match first {
      'b' => out.push('\x08'),
      'f' => out.push('\x0c'),
      'n' => out.push('\n'),
      'r' => out.push('\r'),
      't' => out.push('\t'),
      'v' => out.push('\x0b'),
      '0' => {
        // NUL escape, but not a legacy octal escape like `\01`.
        if rest[1..].chars().next().is_some_and(|c| c.is_ascii_digit()) {
          return None;
        }
        out.push('\0');
      }
      '1'..='9' => {
        // Legacy octal escapes are never accepted.
        return None;
      }
      'x' => {
        let digits = rest.get(1..3)?;
        let value = u32::from_str_radix(digits, 16).ok()?;
        out.push(char::from_u32(value)?);
        rest = &rest[3..];
        continue;
      }
      'u' => {
        if rest[1..].starts_with('{') {
          let close = rest.find('}')?;
          let digits = &rest[2..close];
          if digits.is_empty() {
            return None;
          }
          let value = u32::from_str_radix(digits, 16).ok()?;
          out.push(char::from_u32(value)?);
          rest = &rest[close + 1..];
          continue;
        }
        let digits = rest.get(1..5)?;
        let value = u32::from_str_radix(digits, 16).ok()?;
        out.push(char::from_u32(value)?);
        rest = &rest[5..];
        continue;
      }
      // Line continuations contribute nothing.
      '\r' => {
        rest = &rest[1..];
        if rest.starts_with('\n') {
          rest = &rest[1..];
        }
        continue;
      }
      '\n' | '\u{2028}' | '\u{2029}' => {}
      // Identity escape.
      c => out.push(c),
    }
    rest = &rest[first.len_utf8()..];
  }
  out.push_str(rest);
  Some(out)
}

impl<'a> Parser<'a> {
  pub fn lit_num(&mut self) -> SyntaxResult<Node<LitNumExpr>> {
    let t = self.require(TT::LiteralNumber)?;
    let raw = self.string(t.loc);
    if self.state().strict()
      && (is_legacy_octal_literal(&raw) || is_leading_zero_decimal_literal(&raw))
    {
      return Err(t.error(SyntaxErrorType::StrictModeLegacyOctal));
    }
    let value = self
      .cached_number(&raw)
      .ok_or_else(|| t.loc.error(SyntaxErrorType::MalformedLiteralNumber, None))?;
    Ok(Node::new(t.loc, LitNumExpr { value }))
  }

  pub fn lit_str(&mut self) -> SyntaxResult<Node<LitStrExpr>> {
    let t = self.require(TT::LiteralString)?;
    let raw = self.string(t.loc);
    let value = self
      .cached_string(&raw)
      .ok_or_else(|| t.loc.error(SyntaxErrorType::InvalidCharacterEscape, None))?;
    Ok(Node::new(t.loc, LitStrExpr { value }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_simple_escapes() {
    assert_eq!(
      normalise_literal_string(r#"'a\nb\tc'"#).unwrap(),
      "a\nb\tc"
    );
    assert_eq!(normalise_literal_string(r#"'it\'s'"#).unwrap(), "it's");
    assert_eq!(normalise_literal_string(r#""q\"q""#).unwrap(), "q\"q");
  }

  #[test]
  fn decodes_hex_and_unicode_escapes() {
    assert_eq!(normalise_literal_string(r#"'\x41'"#).unwrap(), "A");
    assert_eq!(normalise_literal_string(r#"'A'"#).unwrap(), "A");
    assert_eq!(normalise_literal_string(r#"'\u{1F600}'"#).unwrap(), "\u{1F600}");
  }

  #[test]
  fn rejects_malformed_escapes() {
    assert!(normalise_literal_string(r#"'\x4'"#).is_none());
    assert!(normalise_literal_string(r#"'\u00'"#).is_none());
    assert!(normalise_literal_string(r#"'\u{}'"#).is_none());
    assert!(normalise_literal_string(r#"'\7'"#).is_none());
    assert!(normalise_literal_string(r#"'\01'"#).is_none());
  }

  #[test]
  fn nul_escape_is_allowed_without_digits() {
    assert_eq!(normalise_literal_string(r#"'\0'"#).unwrap(), "\0");
  }

  #[test]
  fn line_continuation_contributes_nothing() {
    assert_eq!(normalise_literal_string("'a\\\nb'").unwrap(), "ab");
    assert_eq!(normalise_literal_string("'a\\\r\nb'").unwrap(), "ab");
  }
}
