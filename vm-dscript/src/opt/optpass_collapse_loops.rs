//! Optional constant-loop collapsing, gated by
//! [`super::OptimizeOptions::collapse_constant_loops`].
//!
//! A loop is only touched when its parsed body recorded no `break` or
//! `continue` at all (the parse-state counter snapshot tagged on the node)
//! and its condition is a literal:
//! - `do { body } while (false)` runs its body exactly once and becomes it;
//! - `while (false) { body }` never runs and reduces to hoist residue;
//! - `do { body } while (true)` normalizes to the canonical infinite shape
//!   `while (true) { body }`.

use super::empty_stmt;
use super::hoist_residue;
use super::literal_value;
use super::PassResult;
use crate::value::to_boolean;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::BlockStmt;
use parse_dscript::ast::stmt::LoopExitUsage;
use parse_dscript::ast::stmt::Stmt;
use parse_dscript::ast::stmt::WhileStmt;
use parse_dscript::ast::stx::TopLevel;
use std::mem;

pub fn run(top: &mut Node<TopLevel>) -> PassResult {
  let mut result = PassResult::default();
  for stmt in &mut top.stx.body {
    visit_stmt(stmt, &mut result);
  }
  result
}

fn visit_stmt(stmt: &mut Node<Stmt>, r: &mut PassResult) {
  if transform_loop(stmt) {
    r.mark_changed();
  }
  match &mut *stmt.stx {
    Stmt::Block(s) => {
      for stmt in &mut s.stx.body {
        visit_stmt(stmt, r);
      }
    }
    Stmt::If(s) => {
      visit_stmt(&mut s.stx.consequent, r);
      if let Some(alternate) = &mut s.stx.alternate {
        visit_stmt(alternate, r);
      }
    }
    Stmt::While(s) => visit_stmt(&mut s.stx.body, r),
    Stmt::DoWhile(s) => visit_stmt(&mut s.stx.body, r),
    Stmt::ForTriple(s) => visit_stmt(&mut s.stx.body, r),
    Stmt::Switch(s) => {
      for branch in &mut s.stx.branches {
        for stmt in &mut branch.stx.body {
          visit_stmt(stmt, r);
        }
      }
    }
    Stmt::Try(s) => {
      for stmt in &mut s.stx.wrapped.stx.body {
        visit_stmt(stmt, r);
      }
      if let Some(catch) = &mut s.stx.catch {
        for stmt in &mut catch.stx.body {
          visit_stmt(stmt, r);
        }
      }
      if let Some(finally) = &mut s.stx.finally {
        for stmt in &mut finally.stx.body {
          visit_stmt(stmt, r);
        }
      }
    }
    Stmt::With(s) => visit_stmt(&mut s.stx.body, r),
    Stmt::Label(s) => visit_stmt(&mut s.stx.statement, r),
    Stmt::FunctionDecl(s) => {
      for stmt in &mut s.stx.func.stx.body {
        visit_stmt(stmt, r);
      }
    }
    _ => {}
  }
}

enum Shape {
  WhileFalse,
  DoWhileFalse,
  DoWhileTrue,
}

fn transform_loop(stmt: &mut Node<Stmt>) -> bool {
  let shape = match &*stmt.stx {
    Stmt::While(node) => {
      let exits_clean = node
        .assoc
        .get::<LoopExitUsage>()
        .is_some_and(|u| !u.has_break && !u.has_continue);
      match literal_value(&node.stx.condition) {
        Some(test) if exits_clean && !to_boolean(&test) => Shape::WhileFalse,
        _ => return false,
      }
    }
    Stmt::DoWhile(node) => {
      let exits_clean = node
        .assoc
        .get::<LoopExitUsage>()
        .is_some_and(|u| !u.has_break && !u.has_continue);
      if !exits_clean {
        return false;
      }
      match literal_value(&node.stx.condition) {
        Some(test) if to_boolean(&test) => Shape::DoWhileTrue,
        Some(_) => Shape::DoWhileFalse,
        None => return false,
      }
    }
    _ => return false,
  };

  let loc = stmt.loc;
  let old = mem::replace(stmt, empty_stmt(loc));
  match (shape, *old.stx) {
    (Shape::WhileFalse, Stmt::While(node)) => {
      let body = hoist_residue(vec![node.stx.body], loc);
      if !body.is_empty() {
        *stmt = Node::new(loc, BlockStmt { body }).into_wrapped();
      }
    }
    (Shape::DoWhileFalse, Stmt::DoWhile(node)) => {
      // The body runs exactly once.
      *stmt = node.stx.body;
    }
    (Shape::DoWhileTrue, Stmt::DoWhile(node)) => {
      let usage = node.assoc.get::<LoopExitUsage>().copied();
      let stx = *node.stx;
      let mut replacement = Node::new(loc, WhileStmt {
        condition: stx.condition,
        body: stx.body,
      });
      if let Some(usage) = usage {
        replacement.assoc.set(usage);
      }
      *stmt = replacement.into_wrapped();
    }
    _ => unreachable!(),
  }
  true
}
