//! Constant folding: pure unary/binary/conditional expressions over literal
//! operands reduce to literal nodes. Shares its arithmetic with the
//! evaluator (`crate::ops`) so folding cannot diverge from evaluation.

use super::literal_value;
use super::null_expr;
use super::value_to_literal;
use super::PassResult;
use crate::ops::apply_binary;
use crate::ops::apply_unary;
use crate::ops::is_value_binary_operator;
use crate::ops::is_value_unary_operator;
use crate::value::to_boolean;
use parse_dscript::ast::expr::Expr;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::ForTripleStmtInit;
use parse_dscript::ast::stmt::Stmt;
use parse_dscript::ast::stx::TopLevel;
use parse_dscript::operator::OperatorName;
use std::mem;

pub fn run(top: &mut Node<TopLevel>) -> PassResult {
  let mut result = PassResult::default();
  for stmt in &mut top.stx.body {
    fold_stmt(stmt, &mut result);
  }
  result
}

fn fold_stmt(stmt: &mut Node<Stmt>, r: &mut PassResult) {
  match &mut *stmt.stx {
    Stmt::Empty(_) | Stmt::Debugger(_) | Stmt::Break(_) | Stmt::Continue(_) => {}
    Stmt::Expr(s) => fold_expr(&mut s.stx.expr, r),
    Stmt::Return(s) => {
      if let Some(value) = &mut s.stx.value {
        fold_expr(value, r);
      }
    }
    Stmt::Throw(s) => fold_expr(&mut s.stx.value, r),
    Stmt::Block(s) => {
      for stmt in &mut s.stx.body {
        fold_stmt(stmt, r);
      }
    }
    Stmt::VarDecl(s) => {
      for declarator in &mut s.stx.declarators {
        if let Some(init) = &mut declarator.stx.initializer {
          fold_expr(init, r);
        }
      }
    }
    Stmt::If(s) => {
      fold_expr(&mut s.stx.test, r);
      fold_stmt(&mut s.stx.consequent, r);
      if let Some(alternate) = &mut s.stx.alternate {
        fold_stmt(alternate, r);
      }
    }
    Stmt::While(s) => {
      fold_expr(&mut s.stx.condition, r);
      fold_stmt(&mut s.stx.body, r);
    }
    Stmt::DoWhile(s) => {
      fold_stmt(&mut s.stx.body, r);
      fold_expr(&mut s.stx.condition, r);
    }
    Stmt::ForTriple(s) => {
      match &mut s.stx.init {
        ForTripleStmtInit::None => {}
        ForTripleStmtInit::Expr(expr) => fold_expr(expr, r),
        ForTripleStmtInit::Decl(decl) => {
          for declarator in &mut decl.stx.declarators {
            if let Some(init) = &mut declarator.stx.initializer {
              fold_expr(init, r);
            }
          }
        }
      }
      if let Some(cond) = &mut s.stx.cond {
        fold_expr(cond, r);
      }
      if let Some(post) = &mut s.stx.post {
        fold_expr(post, r);
      }
      fold_stmt(&mut s.stx.body, r);
    }
    Stmt::Switch(s) => {
      fold_expr(&mut s.stx.test, r);
      for branch in &mut s.stx.branches {
        if let Some(case) = &mut branch.stx.case {
          fold_expr(case, r);
        }
        for stmt in &mut branch.stx.body {
          fold_stmt(stmt, r);
        }
      }
    }
    Stmt::Try(s) => {
      for stmt in &mut s.stx.wrapped.stx.body {
        fold_stmt(stmt, r);
      }
      if let Some(catch) = &mut s.stx.catch {
        for stmt in &mut catch.stx.body {
          fold_stmt(stmt, r);
        }
      }
      if let Some(finally) = &mut s.stx.finally {
        for stmt in &mut finally.stx.body {
          fold_stmt(stmt, r);
        }
      }
    }
    Stmt::With(s) => {
      fold_expr(&mut s.stx.object, r);
      fold_stmt(&mut s.stx.body, r);
    }
    Stmt::Label(s) => fold_stmt(&mut s.stx.statement, r),
    Stmt::FunctionDecl(s) => {
      for stmt in &mut s.stx.func.stx.body {
        fold_stmt(stmt, r);
      }
    }
  }
}

fn fold_expr(expr: &mut Node<Expr>, r: &mut PassResult) {
  // Children first; a node can only fold once its operands are literal.
  match &mut *expr.stx {
    Expr::Binary(b) => {
      fold_expr(&mut b.stx.left, r);
      fold_expr(&mut b.stx.right, r);
    }
    Expr::Unary(u) => fold_expr(&mut u.stx.argument, r),
    Expr::UnaryPostfix(u) => fold_expr(&mut u.stx.argument, r),
    Expr::Cond(c) => {
      fold_expr(&mut c.stx.test, r);
      fold_expr(&mut c.stx.consequent, r);
      fold_expr(&mut c.stx.alternate, r);
    }
    Expr::Call(c) => {
      fold_expr(&mut c.stx.callee, r);
      for arg in &mut c.stx.arguments {
        fold_expr(arg, r);
      }
    }
    Expr::Member(m) => fold_expr(&mut m.stx.left, r),
    Expr::ComputedMember(m) => {
      fold_expr(&mut m.stx.object, r);
      fold_expr(&mut m.stx.member, r);
    }
    Expr::LitArr(a) => {
      for element in &mut a.stx.elements {
        fold_expr(element, r);
      }
    }
    Expr::LitObj(o) => {
      for member in &mut o.stx.members {
        fold_expr(&mut member.stx.value, r);
      }
    }
    Expr::Func(f) => {
      for stmt in &mut f.stx.func.stx.body {
        fold_stmt(stmt, r);
      }
    }
    Expr::Id(_)
    | Expr::LitBool(_)
    | Expr::LitNull(_)
    | Expr::LitNum(_)
    | Expr::LitStr(_) => {}
  }

  if fold_at(expr) {
    r.mark_changed();
  }
}

enum Action {
  ReplaceLiteral(Node<Expr>),
  TakeLeft,
  TakeRight,
  TakeConsequent,
  TakeAlternate,
}

fn fold_at(expr: &mut Node<Expr>) -> bool {
  let loc = expr.loc;
  let action = match &*expr.stx {
    Expr::Binary(b) => {
      let op = b.stx.operator;
      match op {
        OperatorName::LogicalAnd => match literal_value(&b.stx.left) {
          Some(left) if to_boolean(&left) => Some(Action::TakeRight),
          Some(_) => Some(Action::TakeLeft),
          None => None,
        },
        OperatorName::LogicalOr => match literal_value(&b.stx.left) {
          Some(left) if to_boolean(&left) => Some(Action::TakeLeft),
          Some(_) => Some(Action::TakeRight),
          None => None,
        },
        OperatorName::Comma => literal_value(&b.stx.left).map(|_| Action::TakeRight),
        op if is_value_binary_operator(op) => {
          match (literal_value(&b.stx.left), literal_value(&b.stx.right)) {
            (Some(left), Some(right)) => {
              let value = apply_binary(op, &left, &right);
              value_to_literal(&value, loc).map(Action::ReplaceLiteral)
            }
            _ => None,
          }
        }
        _ => None,
      }
    }
    Expr::Unary(u) if is_value_unary_operator(u.stx.operator) => {
      literal_value(&u.stx.argument).and_then(|operand| {
        let value = apply_unary(u.stx.operator, &operand);
        // `void` has no literal result form and is left unfolded.
        value_to_literal(&value, loc).map(Action::ReplaceLiteral)
      })
    }
    Expr::Cond(c) => literal_value(&c.stx.test).map(|test| {
      if to_boolean(&test) {
        Action::TakeConsequent
      } else {
        Action::TakeAlternate
      }
    }),
    _ => None,
  };

  let Some(action) = action else {
    return false;
  };

  match action {
    Action::ReplaceLiteral(node) => {
      *expr = node;
    }
    Action::TakeLeft | Action::TakeRight => {
      let old = mem::replace(expr, null_expr(loc));
      let Expr::Binary(b) = *old.stx else {
        unreachable!()
      };
      let stx = *b.stx;
      *expr = match action {
        Action::TakeLeft => stx.left,
        _ => stx.right,
      };
    }
    Action::TakeConsequent | Action::TakeAlternate => {
      let old = mem::replace(expr, null_expr(loc));
      let Expr::Cond(c) = *old.stx else {
        unreachable!()
      };
      let stx = *c.stx;
      *expr = match action {
        Action::TakeConsequent => stx.consequent,
        _ => stx.alternate,
      };
    }
  }
  true
}
