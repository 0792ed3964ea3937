//! Dead-branch elimination: an `if` with a literal test keeps only the taken
//! arm. Hoisted declarations of the dropped arm are preserved so the binding
//! set is unchanged.

use super::empty_stmt;
use super::hoist_residue;
use super::literal_value;
use super::PassResult;
use crate::value::to_boolean;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::BlockStmt;
use parse_dscript::ast::stmt::Stmt;
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
  if transform_if(stmt) {
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

fn transform_if(stmt: &mut Node<Stmt>) -> bool {
  let taken_consequent = match &*stmt.stx {
    Stmt::If(s) => match literal_value(&s.stx.test) {
      Some(test) => to_boolean(&test),
      None => return false,
    },
    _ => return false,
  };

  let loc = stmt.loc;
  let old = mem::replace(stmt, empty_stmt(loc));
  let Stmt::If(if_node) = *old.stx else {
    unreachable!()
  };
  let if_stmt = *if_node.stx;
  let (taken, dropped) = if taken_consequent {
    (Some(if_stmt.consequent), if_stmt.alternate)
  } else {
    (if_stmt.alternate, Some(if_stmt.consequent))
  };

  let residue = dropped
    .map(|d| hoist_residue(vec![d], loc))
    .unwrap_or_default();
  match (residue.is_empty(), taken) {
    (true, Some(taken)) => {
      *stmt = taken;
    }
    (true, None) => {
      // Leave the empty statement swapped in above.
    }
    (false, taken) => {
      let mut body = residue;
      body.extend(taken);
      *stmt = Node::new(loc, BlockStmt { body }).into_wrapped();
    }
  }
  true
}
