//! Post-build optimization passes.
//!
//! `optimize_program` drives every pass repeatedly until a full round makes
//! no change. Passes must never alter externally observable behavior; the
//! constant-loop collapse is additionally gated behind
//! [`OptimizeOptions::collapse_constant_loops`] because it is an optimization
//! contract, not a correctness requirement.

pub mod optpass_collapse_loops;
pub mod optpass_const_fold;
pub mod optpass_impossible_branches;
pub mod optpass_unreachable;

use crate::hoist::collect_var_names;
use crate::value::Value;
use parse_dscript::ast::expr::Expr;
use parse_dscript::ast::expr::LitBoolExpr;
use parse_dscript::ast::expr::LitNullExpr;
use parse_dscript::ast::expr::LitNumExpr;
use parse_dscript::ast::expr::LitStrExpr;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::EmptyStmt;
use parse_dscript::ast::stmt::Stmt;
use parse_dscript::ast::stmt::VarDecl;
use parse_dscript::ast::stmt::VarDeclMode;
use parse_dscript::ast::stmt::VarDeclarator;
use parse_dscript::ast::stx::TopLevel;
use parse_dscript::loc::Loc;

#[derive(Default, Clone, Copy, Debug)]
pub struct PassResult {
  pub changed: bool,
}

impl PassResult {
  pub fn any_change(&self) -> bool {
    self.changed
  }

  pub fn mark_changed(&mut self) {
    self.changed = true;
  }

  pub fn merge(&mut self, other: PassResult) {
    self.changed |= other.changed;
  }
}

#[derive(Default, Clone, Copy, Debug)]
pub struct OptimizeOptions {
  /// Collapse loops with provably-constant conditions whose bodies parsed no
  /// `break`/`continue`: `do..while(false)` runs its body once,
  /// `while(false)` reduces to hoisted declarations, and constant-true loops
  /// normalize to the canonical infinite shape. Off by default.
  pub collapse_constant_loops: bool,
}

pub fn optimize_program(top: &mut Node<TopLevel>, options: &OptimizeOptions) -> PassResult {
  let mut total = PassResult::default();
  loop {
    let mut round = PassResult::default();
    round.merge(optpass_const_fold::run(top));
    round.merge(optpass_impossible_branches::run(top));
    round.merge(optpass_unreachable::run(top));
    if options.collapse_constant_loops {
      round.merge(optpass_collapse_loops::run(top));
    }
    if !round.any_change() {
      break;
    }
    total.merge(round);
  }
  total
}

/// The value of a literal expression, if the expression is a literal.
/// Array/object literals are reference values and never fold.
pub(crate) fn literal_value(expr: &Node<Expr>) -> Option<Value<'static>> {
  Some(match &*expr.stx {
    Expr::LitBool(n) => Value::Bool(n.stx.value),
    Expr::LitNull(_) => Value::Null,
    Expr::LitNum(n) => Value::Num(n.stx.value),
    Expr::LitStr(n) => Value::str(&n.stx.value),
    _ => return None,
  })
}

/// Builds a literal node for a primitive value, if it has a literal form.
pub(crate) fn value_to_literal(value: &Value, loc: Loc) -> Option<Node<Expr>> {
  Some(match value {
    Value::Bool(b) => Node::new(loc, LitBoolExpr { value: *b }).into_wrapped(),
    Value::Null => Node::new(loc, LitNullExpr {}).into_wrapped(),
    Value::Num(n) => Node::new(loc, LitNumExpr { value: *n }).into_wrapped(),
    Value::Str(s) => Node::new(loc, LitStrExpr {
      value: s.to_string(),
    })
    .into_wrapped(),
    _ => return None,
  })
}

pub(crate) fn empty_stmt(loc: Loc) -> Node<Stmt> {
  Node::new(loc, EmptyStmt {}).into_wrapped()
}

pub(crate) fn null_expr(loc: Loc) -> Node<Expr> {
  Node::new(loc, LitNullExpr {}).into_wrapped()
}

/// What survives of eliminated statements: function declarations are kept
/// whole (they hoist), and `var` names are preserved as bare declarations so
/// the set of hoisted bindings is unchanged.
pub(crate) fn hoist_residue(dropped: Vec<Node<Stmt>>, loc: Loc) -> Vec<Node<Stmt>> {
  let mut kept = Vec::new();
  let mut var_names: Vec<String> = Vec::new();
  for stmt in dropped {
    if matches!(&*stmt.stx, Stmt::FunctionDecl(_)) {
      kept.push(stmt);
      continue;
    }
    for name in collect_var_names(std::slice::from_ref(&stmt)) {
      if !var_names.contains(&name) {
        var_names.push(name);
      }
    }
  }
  if !var_names.is_empty() {
    let declarators = var_names
      .into_iter()
      .map(|name| {
        Node::new(loc, VarDeclarator {
          name,
          initializer: None,
        })
      })
      .collect();
    kept.push(
      Node::new(loc, VarDecl {
        mode: VarDeclMode::Var,
        declarators,
      })
      .into_wrapped(),
    );
  }
  kept
}

/// Whether a statement tail consists only of hoist residue (so pruning it
/// again would change nothing).
pub(crate) fn is_hoist_residue(stmts: &[Node<Stmt>]) -> bool {
  stmts.iter().all(|stmt| match &*stmt.stx {
    Stmt::FunctionDecl(_) => true,
    Stmt::VarDecl(decl) => {
      decl.stx.mode == VarDeclMode::Var
        && decl
          .stx
          .declarators
          .iter()
          .all(|d| d.stx.initializer.is_none())
    }
    _ => false,
  })
}
