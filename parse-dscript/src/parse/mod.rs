use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::error::SyntaxWarning;
use crate::error::SyntaxWarningType;
use crate::lex::lex_next;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::num::JsNumber;
use crate::token::Token;
use crate::token::TT;
use ahash::HashMap;
use std::mem;

pub mod drive;
pub mod expr;
pub mod lit;
pub mod operator;
pub mod stmt;
#[cfg(test)]
mod tests;
pub mod toplevel;

/// An active label, pushed by a labeled statement before its target is parsed
/// and popped afterwards (on the error path too, so stack depth is identical
/// before a parse attempt and after its failure).
#[derive(Clone, Debug)]
pub struct LabelEntry {
  pub name: String,
  // Whether the label (possibly through a chain of further labels) names an
  // iteration statement, making it a legal `continue` target.
  pub is_iteration: bool,
}

/// Per-parse constant cache. Rewinding disambiguation can lex the same
/// literal token more than once; decode work is shared through this cache.
/// The cache lives and dies with one `ParseState`, so concurrent parses never
/// share mutable state.
#[derive(Default)]
pub struct ConstCache {
  numbers: HashMap<String, JsNumber>,
  strings: HashMap<String, String>,
}

/// Mutable parse-time context for one compilation unit, threaded by `&mut`
/// through every recursive parse call.
pub struct ParseState {
  break_allowed: Vec<bool>,
  continue_allowed: Vec<bool>,
  strict: Vec<bool>,
  labels: Vec<LabelEntry>,
  function_depth: u32,
  // Monotonic counters; loop parsing snapshots these around its body to learn
  // whether the body contains any break/continue at all.
  pub break_count: u64,
  pub continue_count: u64,
  consts: ConstCache,
}

impl ParseState {
  pub fn new() -> ParseState {
    ParseState {
      break_allowed: vec![false],
      continue_allowed: vec![false],
      strict: vec![false],
      labels: Vec::new(),
      function_depth: 0,
      break_count: 0,
      continue_count: 0,
      consts: ConstCache::default(),
    }
  }

  pub fn strict(&self) -> bool {
    *self.strict.last().unwrap()
  }

  pub fn break_legal(&self) -> bool {
    *self.break_allowed.last().unwrap()
  }

  pub fn continue_legal(&self) -> bool {
    *self.continue_allowed.last().unwrap()
  }

  pub fn in_function(&self) -> bool {
    self.function_depth > 0
  }

  pub fn labels(&self) -> &[LabelEntry] {
    &self.labels
  }

  /// Current depths of the break/continue/strict/label stacks. Used to assert
  /// the push/pop balance invariant in tests.
  pub fn stack_depths(&self) -> (usize, usize, usize, usize) {
    (
      self.break_allowed.len(),
      self.continue_allowed.len(),
      self.strict.len(),
      self.labels.len(),
    )
  }
}

impl Default for ParseState {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug)]
#[must_use]
pub struct MaybeToken {
  typ: TT,
  loc: Loc,
  matched: bool,
}

impl MaybeToken {
  pub fn is_match(&self) -> bool {
    self.matched
  }

  pub fn match_loc(&self) -> Option<Loc> {
    if self.matched {
      Some(self.loc)
    } else {
      None
    }
  }

  pub fn error(&self, err: SyntaxErrorType) -> SyntaxError {
    debug_assert!(!self.matched);
    self.loc.error(err, Some(self.typ))
  }

  pub fn and_then<R, F: FnOnce() -> SyntaxResult<R>>(self, f: F) -> SyntaxResult<Option<R>> {
    Ok(if self.matched { Some(f()?) } else { None })
  }
}

pub struct ParserCheckpoint {
  next_tok_i: usize,
}

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  buf: Vec<Token>,
  next_tok_i: usize,
  state: ParseState,
  warnings: Vec<SyntaxWarning>,
}

// We extend this struct with added methods in the various submodules instead
// of using free functions and passing `&mut Parser` around.
impl<'a> Parser<'a> {
  pub fn new(lexer: Lexer<'a>) -> Parser<'a> {
    Parser {
      lexer,
      buf: Vec::new(),
      next_tok_i: 0,
      state: ParseState::new(),
      warnings: Vec::new(),
    }
  }

  pub fn state(&self) -> &ParseState {
    &self.state
  }

  pub fn state_mut(&mut self) -> &mut ParseState {
    &mut self.state
  }

  pub fn source_range(&self) -> Loc {
    self.lexer.source_range()
  }

  pub fn str(&self, loc: Loc) -> &str {
    &self.lexer[loc]
  }

  pub fn string(&self, loc: Loc) -> String {
    self.str(loc).to_string()
  }

  pub fn warn(&mut self, typ: SyntaxWarningType, loc: Loc) {
    self.warnings.push(SyntaxWarning::new(typ, loc));
  }

  pub fn warnings(&self) -> &[SyntaxWarning] {
    &self.warnings
  }

  pub fn take_warnings(&mut self) -> Vec<SyntaxWarning> {
    mem::take(&mut self.warnings)
  }

  pub fn checkpoint(&self) -> ParserCheckpoint {
    ParserCheckpoint {
      next_tok_i: self.next_tok_i,
    }
  }

  /// The source range consumed since the checkpoint: from the start of the
  /// first token consumed after it to the end of the last consumed token.
  pub fn since_checkpoint(&self, checkpoint: &ParserCheckpoint) -> Loc {
    let start = self
      .buf
      .get(checkpoint.next_tok_i)
      .map(|t| t.loc.0)
      .unwrap_or_else(|| self.lexer.next());
    let end = if self.next_tok_i > checkpoint.next_tok_i {
      self.buf[self.next_tok_i - 1].loc.1
    } else {
      start
    };
    Loc(start, end)
  }

  pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
    self.next_tok_i = checkpoint.next_tok_i;
  }

  fn forward<K: FnOnce(&Token) -> bool>(&mut self, keep: K) -> (bool, Token) {
    debug_assert!(self.buf.len() >= self.next_tok_i);
    if self.buf.len() == self.next_tok_i {
      let token = lex_next(&mut self.lexer);
      self.buf.push(token);
    }
    let t = self.buf[self.next_tok_i].clone();
    let k = keep(&t);
    if k {
      self.next_tok_i += 1;
    };
    (k, t)
  }

  pub fn consume(&mut self) -> Token {
    self.forward(|_| true).1
  }

  /// Consumes the next token regardless of type, and returns its raw source
  /// code as a string.
  pub fn consume_as_string(&mut self) -> String {
    let loc = self.consume().loc;
    self.string(loc)
  }

  pub fn peek(&mut self) -> Token {
    self.forward(|_| false).1
  }

  pub fn peek_n<const N: usize>(&mut self) -> [Token; N] {
    let cp = self.checkpoint();
    let tokens = std::array::from_fn(|_| self.forward(|_| true).1);
    self.restore_checkpoint(cp);
    tokens
  }

  pub fn consume_if(&mut self, typ: TT) -> MaybeToken {
    let (matched, t) = self.forward(|t| t.typ == typ);
    MaybeToken {
      typ,
      matched,
      loc: t.loc,
    }
  }

  pub fn require(&mut self, typ: TT) -> SyntaxResult<Token> {
    let t = self.consume();
    if t.typ != typ {
      Err(t.error(SyntaxErrorType::RequiredTokenNotFound(typ)))
    } else {
      Ok(t)
    }
  }

  pub fn require_predicate<P: FnOnce(TT) -> bool>(
    &mut self,
    pred: P,
    expected: &'static str,
  ) -> SyntaxResult<Token> {
    let t = self.consume();
    if !pred(t.typ) {
      Err(t.error(SyntaxErrorType::ExpectedSyntax(expected)))
    } else {
      Ok(t)
    }
  }

  // Scoped parse-state helpers. These always restore the state they pushed,
  // including when the closure fails, so a failed parse attempt leaves every
  // stack at its prior depth.

  /// Runs `f` with `break` and `continue` both legal (a loop body).
  pub fn with_loop_scope<R, F: FnOnce(&mut Self) -> SyntaxResult<R>>(
    &mut self,
    f: F,
  ) -> SyntaxResult<R> {
    self.state.break_allowed.push(true);
    self.state.continue_allowed.push(true);
    let res = f(self);
    self.state.continue_allowed.pop();
    self.state.break_allowed.pop();
    res
  }

  /// Runs `f` with `break` legal and `continue` legality inherited (a switch
  /// body).
  pub fn with_switch_scope<R, F: FnOnce(&mut Self) -> SyntaxResult<R>>(
    &mut self,
    f: F,
  ) -> SyntaxResult<R> {
    self.state.break_allowed.push(true);
    self.state.continue_allowed.push(self.state.continue_legal());
    let res = f(self);
    self.state.continue_allowed.pop();
    self.state.break_allowed.pop();
    res
  }

  /// Runs `f` inside a function body: `break`/`continue` illegal, enclosing
  /// labels masked, strictness inherited (the directive prologue may upgrade
  /// it via [`Parser::set_strict`]).
  pub fn with_function_scope<R, F: FnOnce(&mut Self) -> SyntaxResult<R>>(
    &mut self,
    f: F,
  ) -> SyntaxResult<R> {
    let saved_labels = mem::take(&mut self.state.labels);
    self.state.break_allowed.push(false);
    self.state.continue_allowed.push(false);
    self.state.strict.push(self.state.strict());
    self.state.function_depth += 1;
    let res = f(self);
    self.state.function_depth -= 1;
    self.state.strict.pop();
    self.state.continue_allowed.pop();
    self.state.break_allowed.pop();
    self.state.labels = saved_labels;
    res
  }

  /// Runs `f` with an active label registered.
  pub fn with_label<R, F: FnOnce(&mut Self) -> SyntaxResult<R>>(
    &mut self,
    name: String,
    is_iteration: bool,
    f: F,
  ) -> SyntaxResult<R> {
    self.state.labels.push(LabelEntry { name, is_iteration });
    let res = f(self);
    self.state.labels.pop();
    res
  }

  /// Upgrades the current scope to strict mode (directive prologue).
  pub fn set_strict(&mut self) {
    *self.state.strict.last_mut().unwrap() = true;
  }

  // Per-parse constant cache.

  pub fn cached_number(&mut self, raw: &str) -> Option<JsNumber> {
    if let Some(v) = self.state.consts.numbers.get(raw) {
      return Some(*v);
    }
    let v = JsNumber::from_literal(raw)?;
    self.state.consts.numbers.insert(raw.to_string(), v);
    Some(v)
  }

  pub fn cached_string(&mut self, raw: &str) -> Option<String> {
    if let Some(v) = self.state.consts.strings.get(raw) {
      return Some(v.clone());
    }
    let v = lit::normalise_literal_string(raw)?;
    self.state.consts.strings.insert(raw.to_string(), v.clone());
    Some(v)
  }
}
