use crate::loc::Loc;
use crate::token::TT;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use diagnostics::Diagnostic;
use diagnostics::FileId;
use std::error::Error;
use std::fmt::Display;

/// A stable classification of syntax errors produced by the parser.
///
/// Diagnostic codes (prefix `PS`) are assigned per variant and are stable.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  BreakToUndefinedLabel,
  ConstWithoutInitializer,
  ContinueLabelNotLoop,
  ContinueToUndefinedLabel,
  DuplicateDefaultCase,
  DuplicateLabel,
  ExpectedSyntax(&'static str),
  IllegalBreak,
  IllegalContinue,
  IllegalReturn,
  InvalidCharacterEscape,
  LineTerminatorAfterThrow,
  MalformedLiteralNumber,
  RequiredTokenNotFound(TT),
  StrictModeFunctionPosition,
  StrictModeLegacyOctal,
  StrictModeRestrictedName,
  StrictModeWith,
  SwitchStatementHasNoCases,
  TryStatementHasNoCatchOrFinally,
  UnexpectedEnd,
  UnrecognizedToken,
}

impl SyntaxErrorType {
  /// Stable diagnostic code for this syntax error variant.
  pub fn code(&self) -> &'static str {
    match self {
      SyntaxErrorType::BreakToUndefinedLabel => "PS0001",
      SyntaxErrorType::ConstWithoutInitializer => "PS0002",
      SyntaxErrorType::ContinueLabelNotLoop => "PS0003",
      SyntaxErrorType::ContinueToUndefinedLabel => "PS0004",
      SyntaxErrorType::DuplicateDefaultCase => "PS0005",
      SyntaxErrorType::DuplicateLabel => "PS0006",
      SyntaxErrorType::ExpectedSyntax(_) => "PS0007",
      SyntaxErrorType::IllegalBreak => "PS0008",
      SyntaxErrorType::IllegalContinue => "PS0009",
      SyntaxErrorType::IllegalReturn => "PS0010",
      SyntaxErrorType::InvalidCharacterEscape => "PS0011",
      SyntaxErrorType::LineTerminatorAfterThrow => "PS0012",
      SyntaxErrorType::MalformedLiteralNumber => "PS0013",
      SyntaxErrorType::RequiredTokenNotFound(_) => "PS0014",
      SyntaxErrorType::StrictModeFunctionPosition => "PS0015",
      SyntaxErrorType::StrictModeLegacyOctal => "PS0016",
      SyntaxErrorType::StrictModeRestrictedName => "PS0017",
      SyntaxErrorType::StrictModeWith => "PS0018",
      SyntaxErrorType::SwitchStatementHasNoCases => "PS0019",
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => "PS0020",
      SyntaxErrorType::UnexpectedEnd => "PS0021",
      SyntaxErrorType::UnrecognizedToken => "PS0022",
    }
  }

  /// Human-readable message describing this syntax error.
  pub fn message(&self, actual_token: Option<TT>) -> String {
    match self {
      SyntaxErrorType::BreakToUndefinedLabel => "break to undefined label".into(),
      SyntaxErrorType::ConstWithoutInitializer => {
        "const declaration requires an initializer".into()
      }
      SyntaxErrorType::ContinueLabelNotLoop => {
        "continue label does not target a loop statement".into()
      }
      SyntaxErrorType::ContinueToUndefinedLabel => "continue to undefined label".into(),
      SyntaxErrorType::DuplicateDefaultCase => {
        "switch statement already has a default case".into()
      }
      SyntaxErrorType::DuplicateLabel => "label has already been declared".into(),
      SyntaxErrorType::ExpectedSyntax(expected) => format!("expected {}", expected),
      SyntaxErrorType::IllegalBreak => "break statement outside loop or switch".into(),
      SyntaxErrorType::IllegalContinue => "continue statement outside loop".into(),
      SyntaxErrorType::IllegalReturn => "return statement outside function".into(),
      SyntaxErrorType::InvalidCharacterEscape => "invalid character escape".into(),
      SyntaxErrorType::LineTerminatorAfterThrow => {
        "line terminator not allowed after `throw`".into()
      }
      SyntaxErrorType::MalformedLiteralNumber => "malformed number literal".into(),
      SyntaxErrorType::RequiredTokenNotFound(token) => format!("expected token {:?}", token),
      SyntaxErrorType::StrictModeFunctionPosition => {
        "function declarations cannot be the body of a statement in strict mode".into()
      }
      SyntaxErrorType::StrictModeLegacyOctal => {
        "numeric literals with leading zeros are not allowed in strict mode".into()
      }
      SyntaxErrorType::StrictModeRestrictedName => {
        "cannot bind `eval` or `arguments` in strict mode".into()
      }
      SyntaxErrorType::StrictModeWith => {
        "with statements are not allowed in strict mode".into()
      }
      SyntaxErrorType::SwitchStatementHasNoCases => "switch statement must contain cases".into(),
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => {
        "try statement requires a catch or finally block".into()
      }
      SyntaxErrorType::UnexpectedEnd => actual_token
        .map(|tok| format!("unexpected end before {:?}", tok))
        .unwrap_or_else(|| "unexpected end of input".into()),
      SyntaxErrorType::UnrecognizedToken => "unrecognized or malformed token".into(),
    }
  }
}

#[derive(Clone)]
pub struct SyntaxError {
  pub typ: SyntaxErrorType,
  pub loc: Loc,
  pub actual_token: Option<TT>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, loc: Loc, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError {
      typ,
      loc,
      actual_token,
    }
  }

  /// Convert this syntax error into a shared [`diagnostics::Diagnostic`].
  pub fn to_diagnostic(&self, file: FileId) -> Diagnostic {
    let (range, overflow_note) = self.loc.to_diagnostics_range_with_note();
    let mut diagnostic = Diagnostic::error(
      self.typ.code(),
      self.typ.message(self.actual_token),
      diagnostics::Span::new(file, range),
    );
    if let Some(actual) = self.actual_token {
      diagnostic = diagnostic.with_note(format!("found token: {:?}", actual));
    }
    if let Some(note) = overflow_note {
      diagnostic = diagnostic.with_note(note);
    }
    diagnostic
  }
}

impl Debug for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} around loc [{}:{}]", self, self.loc.0, self.loc.1)
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{:?} [token={:?}]", self.typ, self.actual_token)
  }
}

impl Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// A non-fatal parse-time finding. Warnings are buffered by the parser and
/// surfaced through `parse_with_diagnostics` whether or not the parse
/// ultimately succeeds.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxWarningType {
  DuplicateCaseValue,
  UnreachableStatement,
  WithStatement,
}

impl SyntaxWarningType {
  pub fn code(&self) -> &'static str {
    match self {
      SyntaxWarningType::DuplicateCaseValue => "PW0001",
      SyntaxWarningType::UnreachableStatement => "PW0002",
      SyntaxWarningType::WithStatement => "PW0003",
    }
  }

  pub fn message(&self) -> &'static str {
    match self {
      SyntaxWarningType::DuplicateCaseValue => {
        "case value duplicates an earlier case and will never match"
      }
      SyntaxWarningType::UnreachableStatement => "unreachable statement",
      SyntaxWarningType::WithStatement => {
        "with statements disable binding resolution and optimization"
      }
    }
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SyntaxWarning {
  pub typ: SyntaxWarningType,
  pub loc: Loc,
}

impl SyntaxWarning {
  pub fn new(typ: SyntaxWarningType, loc: Loc) -> SyntaxWarning {
    SyntaxWarning { typ, loc }
  }

  pub fn to_diagnostic(&self, file: FileId) -> Diagnostic {
    let (range, overflow_note) = self.loc.to_diagnostics_range_with_note();
    let mut diagnostic = Diagnostic::warning(
      self.typ.code(),
      self.typ.message(),
      diagnostics::Span::new(file, range),
    );
    if let Some(note) = overflow_note {
      diagnostic = diagnostic.with_note(note);
    }
    diagnostic
  }
}
