use ast::node::Node;
use ast::stx::TopLevel;
use diagnostics::Diagnostic;
use diagnostics::FileId;
use error::SyntaxResult;
use lex::Lexer;
use parse::Parser;

pub mod ast;
pub mod char;
pub mod error;
pub mod lex;
pub mod loc;
pub mod num;
pub mod operator;
pub mod parse;
pub mod token;

pub fn parse(source: &str) -> SyntaxResult<Node<TopLevel>> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer);
  parser.parse_top_level()
}

/// Parses `source`, delivering every buffered warning plus the fatal error
/// (if any) to `on_diagnostic`. The callback is invoked regardless of whether
/// parsing ultimately succeeds.
pub fn parse_with_diagnostics(
  source: &str,
  file: FileId,
  on_diagnostic: &mut dyn FnMut(&Diagnostic),
) -> SyntaxResult<Node<TopLevel>> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer);
  let result = parser.parse_top_level();
  for warning in parser.take_warnings() {
    on_diagnostic(&warning.to_diagnostic(file));
  }
  if let Err(err) = &result {
    on_diagnostic(&err.to_diagnostic(file));
  }
  result
}
