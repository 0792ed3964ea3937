use super::Parser;
use crate::ast::node::Node;
use crate::error::SyntaxResult;
use crate::token::TT;
use derive_visitor::Drive;
use derive_visitor::DriveMut;

impl<'a> Parser<'a> {
  pub fn with_loc<S: Drive + DriveMut, F>(&mut self, f: F) -> SyntaxResult<Node<S>>
  where
    F: FnOnce(&mut Self) -> SyntaxResult<S>,
  {
    let start = self.checkpoint();
    let stx = f(self)?;
    Ok(Node::new(self.since_checkpoint(&start), stx))
  }

  pub fn repeat_while<S, F, W>(&mut self, w: W, f: F) -> SyntaxResult<Vec<S>>
  where
    F: Fn(&mut Self) -> SyntaxResult<S>,
    W: Fn(&mut Self) -> bool,
  {
    let mut nodes = Vec::new();
    while w(self) {
      nodes.push(f(self)?);
    }
    Ok(nodes)
  }

  pub fn repeat_while_with_loc<S: Drive + DriveMut, F, W>(
    &mut self,
    w: W,
    f: F,
  ) -> SyntaxResult<Vec<Node<S>>>
  where
    F: Fn(&mut Self) -> SyntaxResult<S>,
    W: Fn(&mut Self) -> bool,
  {
    self.repeat_while(w, |p| p.with_loc(&f))
  }

  pub fn repeat_until_tt<S, F>(&mut self, tt: TT, f: F) -> SyntaxResult<Vec<S>>
  where
    F: Fn(&mut Self) -> SyntaxResult<S>,
  {
    self.repeat_while(|p| p.peek().typ != tt, f)
  }

  pub fn repeat_until_tt_with_loc<S: Drive + DriveMut, F>(
    &mut self,
    tt: TT,
    f: F,
  ) -> SyntaxResult<Vec<Node<S>>>
  where
    F: Fn(&mut Self) -> SyntaxResult<S>,
  {
    self.repeat_while_with_loc(|p| p.peek().typ != tt, f)
  }
}
