//! Unreachable-code pruning: statements after an abrupt statement in the
//! same list are dropped, except for their hoist residue (function
//! declarations and `var` names), which stays behind.

use super::hoist_residue;
use super::is_hoist_residue;
use super::PassResult;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::Stmt;
use parse_dscript::ast::stx::TopLevel;

pub fn run(top: &mut Node<TopLevel>) -> PassResult {
  let mut result = PassResult::default();
  visit_list(&mut top.stx.body, &mut result);
  result
}

fn visit_list(list: &mut Vec<Node<Stmt>>, r: &mut PassResult) {
  if prune(list) {
    r.mark_changed();
  }
  for stmt in list.iter_mut() {
    visit_stmt(stmt, r);
  }
}

fn visit_stmt(stmt: &mut Node<Stmt>, r: &mut PassResult) {
  match &mut *stmt.stx {
    Stmt::Block(s) => visit_list(&mut s.stx.body, r),
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
        visit_list(&mut branch.stx.body, r);
      }
    }
    Stmt::Try(s) => {
      visit_list(&mut s.stx.wrapped.stx.body, r);
      if let Some(catch) = &mut s.stx.catch {
        visit_list(&mut catch.stx.body, r);
      }
      if let Some(finally) = &mut s.stx.finally {
        visit_list(&mut finally.stx.body, r);
      }
    }
    Stmt::With(s) => visit_stmt(&mut s.stx.body, r),
    Stmt::Label(s) => visit_stmt(&mut s.stx.statement, r),
    Stmt::FunctionDecl(s) => visit_list(&mut s.stx.func.stx.body, r),
    _ => {}
  }
}

fn is_abrupt(stmt: &Node<Stmt>) -> bool {
  matches!(
    &*stmt.stx,
    Stmt::Break(_) | Stmt::Continue(_) | Stmt::Return(_) | Stmt::Throw(_)
  )
}

fn prune(list: &mut Vec<Node<Stmt>>) -> bool {
  let Some(cut) = list.iter().position(is_abrupt) else {
    return false;
  };
  if cut + 1 >= list.len() {
    return false;
  }
  let loc = list[cut].loc;
  let tail = list.split_off(cut + 1);
  if is_hoist_residue(&tail) {
    // Already minimal; put it back untouched.
    list.extend(tail);
    return false;
  }
  list.extend(hoist_residue(tail, loc));
  true
}
