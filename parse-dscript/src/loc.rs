use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::token::TT;
use diagnostics::Span;
use diagnostics::TextRange;
use std::cmp::max;
use std::cmp::min;
use std::ops::Add;
use std::ops::AddAssign;

/// A location within the current source file expressed as UTF-8 byte offsets.
///
/// A location is not tied to real source text: transformations can create
/// entirely new nodes that have no exact counterpart in the input, in which
/// case a best-effort range is used.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Loc(pub usize, pub usize);

impl Loc {
  pub fn error(self, typ: SyntaxErrorType, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError::new(typ, self, actual_token)
  }

  pub fn is_empty(&self) -> bool {
    self.0 >= self.1
  }

  pub fn len(&self) -> usize {
    self.1 - self.0
  }

  pub fn extend(&mut self, other: Loc) {
    self.0 = min(self.0, other.0);
    self.1 = max(self.1, other.1);
  }

  pub fn add_option(self, rhs: Option<Loc>) -> Loc {
    let mut new = self;
    if let Some(rhs) = rhs {
      new.extend(rhs);
    };
    new
  }

  /// Converts this location into a diagnostics range, clamping to `u32` and
  /// reporting truncation via a note when it occurs.
  pub fn to_diagnostics_range_with_note(&self) -> (TextRange, Option<String>) {
    TextRange::from_offsets_with_overflow_note(self.0, self.1)
  }

  pub fn to_diagnostics_span(&self, file: diagnostics::FileId) -> Span {
    let (range, _) = self.to_diagnostics_range_with_note();
    Span::new(file, range)
  }
}

impl Add for Loc {
  type Output = Loc;

  fn add(self, rhs: Self) -> Self::Output {
    let mut new = self;
    new.extend(rhs);
    new
  }
}

impl AddAssign for Loc {
  fn add_assign(&mut self, rhs: Self) {
    self.extend(rhs);
  }
}
