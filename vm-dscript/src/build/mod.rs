//! The pre-evaluation build pass.
//!
//! Runs once per program, after parsing and before optimization. It resolves
//! identifier uses to variable descriptors, propagates strict/conditional/
//! loop/with/try state down the tree, accumulates per-function statistics,
//! and performs normalization rewrites through an ownership-safe
//! replace-and-rebuild protocol: `build_stmt_once` either finishes a node
//! (`Done`) or substitutes a replacement in place and asks the caller to run
//! again (`Rebuild`), which loops to a fixed point.

use crate::hoist::collect_var_names;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use diagnostics::Diagnostic;
use diagnostics::FileId;
use parse_dscript::ast::expr::Expr;
use parse_dscript::ast::func::Func;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::EmptyStmt;
use parse_dscript::ast::stmt::Stmt;
use parse_dscript::ast::stmt::VarDeclMode;
use parse_dscript::ast::stx::TopLevel;
use parse_dscript::loc::Loc;
use parse_dscript::operator::OperatorName;

/// One resolved binding: its name, the function depth at which it was
/// declared, and whether it must be treated as captured (referenced from
/// inside a `try` body or catch handler, forcing cell-backed rather than
/// slot-backed storage). Descriptors are immutable once the build pass
/// finishes.
#[derive(Clone, Debug)]
pub struct VarDescriptor {
  pub name: String,
  pub depth: u32,
  pub captured: bool,
}

/// Index of a [`VarDescriptor`] in [`BuildOutput::descriptors`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct VarId(pub usize);

/// Attached to a declaring node's assoc data.
#[derive(Copy, Clone, Debug)]
pub struct DeclaredVar(pub VarId);

/// Attached to an identifier-use node's assoc data.
#[derive(Copy, Clone, Debug)]
pub struct ResolvedVar(pub VarId);

/// Attached to a `Func` node's assoc data; indexes [`BuildOutput::fn_stats`].
#[derive(Copy, Clone, Debug)]
pub struct FnStatsRef(pub usize);

/// Per-function facts accumulated during the build pass. Entry 0 describes
/// the top level.
#[derive(Clone, Copy, Default, Debug)]
pub struct FnStats {
  pub uses_arguments: bool,
  pub has_try: bool,
  pub has_with: bool,
}

/// Build-state flags propagated down the tree.
#[derive(Clone, Copy, Default)]
pub struct BuildFlags {
  pub strict: bool,
  // Set under branches whose execution is not certain (if/switch/loop/cond
  // arms).
  pub conditional: bool,
  pub in_loop: bool,
  // Name resolution inside `with` is dynamic; resolution results are not
  // attached there and unresolved names are not reported.
  pub in_with: bool,
  pub in_try: bool,
}

#[derive(Clone, Copy)]
struct BuildCtx {
  depth: u32,
  flags: BuildFlags,
}

pub enum BuildOutcome {
  Done,
  Rebuild,
}

pub struct BuildOutput {
  pub descriptors: Vec<VarDescriptor>,
  pub fn_stats: Vec<FnStats>,
  pub warnings: Vec<Diagnostic>,
}

/// Builds a parsed program in place. `ambient` names host-provided globals
/// (e.g. registered natives) that should not produce unresolved-name
/// warnings.
pub fn build_program(
  top: &mut Node<TopLevel>,
  file: FileId,
  ambient: &[&str],
) -> BuildOutput {
  let mut builder = Builder {
    scopes: Vec::new(),
    descriptors: Vec::new(),
    fn_stats: vec![FnStats::default()],
    fn_stack: vec![0],
    warnings: Vec::new(),
    warned_names: HashSet::new(),
    ambient: ambient.iter().map(|s| s.to_string()).collect(),
    file,
  };
  let ctx = BuildCtx {
    depth: 0,
    flags: BuildFlags {
      strict: top.stx.strict,
      ..BuildFlags::default()
    },
  };
  builder.scopes.push(ScopeFrame::function());
  for name in collect_var_names(&top.stx.body) {
    builder.declare(&name, 0);
  }
  builder.declare_list_functions(&top.stx.body, 0);
  for stmt in &mut top.stx.body {
    builder.build_stmt(stmt, ctx);
  }
  builder.scopes.pop();
  diagnostics::sort_diagnostics(&mut builder.warnings);
  BuildOutput {
    descriptors: builder.descriptors,
    fn_stats: builder.fn_stats,
    warnings: builder.warnings,
  }
}

struct ScopeFrame {
  function_boundary: bool,
  bindings: HashMap<String, VarId>,
}

impl ScopeFrame {
  fn function() -> ScopeFrame {
    ScopeFrame {
      function_boundary: true,
      bindings: HashMap::new(),
    }
  }

  fn block() -> ScopeFrame {
    ScopeFrame {
      function_boundary: false,
      bindings: HashMap::new(),
    }
  }
}

struct Builder {
  scopes: Vec<ScopeFrame>,
  descriptors: Vec<VarDescriptor>,
  fn_stats: Vec<FnStats>,
  fn_stack: Vec<usize>,
  warnings: Vec<Diagnostic>,
  warned_names: HashSet<String>,
  ambient: HashSet<String>,
  file: FileId,
}

impl Builder {
  fn stats(&mut self) -> &mut FnStats {
    let i = *self.fn_stack.last().unwrap();
    &mut self.fn_stats[i]
  }

  fn declare(&mut self, name: &str, depth: u32) -> VarId {
    let id = VarId(self.descriptors.len());
    self.descriptors.push(VarDescriptor {
      name: name.to_string(),
      depth,
      captured: false,
    });
    self
      .scopes
      .last_mut()
      .unwrap()
      .bindings
      .insert(name.to_string(), id);
    id
  }

  /// Declares a `var`-mode name into the nearest function frame.
  fn declare_var(&mut self, name: &str, depth: u32) -> VarId {
    let id = VarId(self.descriptors.len());
    self.descriptors.push(VarDescriptor {
      name: name.to_string(),
      depth,
      captured: false,
    });
    let frame = self
      .scopes
      .iter_mut()
      .rev()
      .find(|f| f.function_boundary)
      .unwrap();
    frame.bindings.insert(name.to_string(), id);
    id
  }

  fn lookup(&self, name: &str) -> Option<VarId> {
    for frame in self.scopes.iter().rev() {
      if let Some(id) = frame.bindings.get(name) {
        return Some(*id);
      }
    }
    None
  }

  /// Function declarations bind at the start of their containing list.
  fn declare_list_functions(&mut self, stmts: &[Node<Stmt>], depth: u32) {
    for stmt in stmts {
      if let Stmt::FunctionDecl(decl) = &*stmt.stx {
        self.declare(&decl.stx.name, depth);
      }
    }
  }

  fn warn_unresolved(&mut self, name: &str, loc: Loc) {
    if self.ambient.contains(name) || !self.warned_names.insert(name.to_string()) {
      return;
    }
    let (range, _) = loc.to_diagnostics_range_with_note();
    self.warnings.push(
      Diagnostic::warning(
        "BD0001",
        format!("`{}` is not declared and will resolve dynamically", name),
        diagnostics::Span::new(self.file, range),
      ),
    );
  }

  /// Runs `build_stmt_once` to a fixed point: a node that replaced itself is
  /// rebuilt until it settles.
  fn build_stmt(&mut self, node: &mut Node<Stmt>, ctx: BuildCtx) {
    while let BuildOutcome::Rebuild = self.build_stmt_once(node, ctx) {}
  }

  fn build_stmt_once(&mut self, node: &mut Node<Stmt>, ctx: BuildCtx) -> BuildOutcome {
    match &mut *node.stx {
      Stmt::Empty(_) | Stmt::Debugger(_) | Stmt::Break(_) | Stmt::Continue(_) => {}
      Stmt::Expr(stmt) => self.build_expr(&mut stmt.stx.expr, ctx),
      Stmt::Return(stmt) => {
        if let Some(value) = &mut stmt.stx.value {
          self.build_expr(value, ctx);
        }
      }
      Stmt::Throw(stmt) => self.build_expr(&mut stmt.stx.value, ctx),
      Stmt::Block(stmt) => {
        self.scopes.push(ScopeFrame::block());
        self.declare_list_functions(&stmt.stx.body, ctx.depth);
        for s in &mut stmt.stx.body {
          self.build_stmt(s, ctx);
        }
        self.scopes.pop();
      }
      Stmt::VarDecl(stmt) => {
        let mode = stmt.stx.mode;
        for declarator in &mut stmt.stx.declarators {
          let id = match mode {
            // `var` names were hoisted at frame entry; rebind to record the
            // declaration site.
            VarDeclMode::Var => match self.lookup(&declarator.stx.name) {
              Some(id) => id,
              None => self.declare_var(&declarator.stx.name, ctx.depth),
            },
            VarDeclMode::Let | VarDeclMode::Const => {
              self.declare(&declarator.stx.name, ctx.depth)
            }
          };
          declarator.assoc.set(DeclaredVar(id));
          if let Some(init) = &mut declarator.stx.initializer {
            self.build_expr(init, ctx);
          }
        }
      }
      Stmt::If(stmt) => {
        self.build_expr(&mut stmt.stx.test, ctx);
        let branch_ctx = BuildCtx {
          flags: BuildFlags {
            conditional: true,
            ..ctx.flags
          },
          ..ctx
        };
        self.build_stmt(&mut stmt.stx.consequent, branch_ctx);
        if let Some(alternate) = &mut stmt.stx.alternate {
          self.build_stmt(alternate, branch_ctx);
        }
      }
      Stmt::While(stmt) => {
        self.build_expr(&mut stmt.stx.condition, ctx);
        self.build_stmt(&mut stmt.stx.body, loop_ctx(ctx));
      }
      Stmt::DoWhile(stmt) => {
        self.build_stmt(&mut stmt.stx.body, loop_ctx(ctx));
        self.build_expr(&mut stmt.stx.condition, ctx);
      }
      Stmt::ForTriple(stmt) => {
        self.scopes.push(ScopeFrame::block());
        match &mut stmt.stx.init {
          parse_dscript::ast::stmt::ForTripleStmtInit::None => {}
          parse_dscript::ast::stmt::ForTripleStmtInit::Expr(expr) => self.build_expr(expr, ctx),
          parse_dscript::ast::stmt::ForTripleStmtInit::Decl(decl) => {
            let mode = decl.stx.mode;
            for declarator in &mut decl.stx.declarators {
              let id = match mode {
                VarDeclMode::Var => match self.lookup(&declarator.stx.name) {
                  Some(id) => id,
                  None => self.declare_var(&declarator.stx.name, ctx.depth),
                },
                _ => self.declare(&declarator.stx.name, ctx.depth),
              };
              declarator.assoc.set(DeclaredVar(id));
              if let Some(init) = &mut declarator.stx.initializer {
                self.build_expr(init, ctx);
              }
            }
          }
        }
        let body_ctx = loop_ctx(ctx);
        if let Some(cond) = &mut stmt.stx.cond {
          self.build_expr(cond, body_ctx);
        }
        if let Some(post) = &mut stmt.stx.post {
          self.build_expr(post, body_ctx);
        }
        self.build_stmt(&mut stmt.stx.body, body_ctx);
        self.scopes.pop();
      }
      Stmt::Switch(stmt) => {
        self.build_expr(&mut stmt.stx.test, ctx);
        let branch_ctx = BuildCtx {
          flags: BuildFlags {
            conditional: true,
            ..ctx.flags
          },
          ..ctx
        };
        self.scopes.push(ScopeFrame::block());
        for branch in &mut stmt.stx.branches {
          self.declare_list_functions(&branch.stx.body, ctx.depth);
        }
        for branch in &mut stmt.stx.branches {
          if let Some(case) = &mut branch.stx.case {
            self.build_expr(case, branch_ctx);
          }
          for s in &mut branch.stx.body {
            self.build_stmt(s, branch_ctx);
          }
        }
        self.scopes.pop();
      }
      Stmt::Try(stmt) => {
        self.stats().has_try = true;
        let try_ctx = BuildCtx {
          flags: BuildFlags {
            in_try: true,
            ..ctx.flags
          },
          ..ctx
        };
        self.scopes.push(ScopeFrame::block());
        self.declare_list_functions(&stmt.stx.wrapped.stx.body, ctx.depth);
        for s in &mut stmt.stx.wrapped.stx.body {
          self.build_stmt(s, try_ctx);
        }
        self.scopes.pop();
        if let Some(catch) = &mut stmt.stx.catch {
          self.scopes.push(ScopeFrame::block());
          if let Some(param) = catch.stx.parameter.clone() {
            let id = self.declare(&param, ctx.depth);
            catch.assoc.set(DeclaredVar(id));
          }
          self.declare_list_functions(&catch.stx.body, ctx.depth);
          for s in &mut catch.stx.body {
            self.build_stmt(s, try_ctx);
          }
          self.scopes.pop();
        }
        if let Some(finally) = &mut stmt.stx.finally {
          self.scopes.push(ScopeFrame::block());
          self.declare_list_functions(&finally.stx.body, ctx.depth);
          for s in &mut finally.stx.body {
            self.build_stmt(s, ctx);
          }
          self.scopes.pop();
        }
      }
      Stmt::With(stmt) => {
        self.stats().has_with = true;
        self.build_expr(&mut stmt.stx.object, ctx);
        let with_ctx = BuildCtx {
          flags: BuildFlags {
            in_with: true,
            ..ctx.flags
          },
          ..ctx
        };
        self.build_stmt(&mut stmt.stx.body, with_ctx);
      }
      Stmt::Label(stmt) => {
        // A label wrapping nothing carries no behavior; replace the node and
        // rebuild the replacement.
        if matches!(&*stmt.stx.statement.stx, Stmt::Empty(_)) {
          let loc = node.loc;
          *node = Node::new(loc, EmptyStmt {}).into_wrapped();
          return BuildOutcome::Rebuild;
        }
        self.build_stmt(&mut stmt.stx.statement, ctx);
      }
      Stmt::FunctionDecl(decl) => {
        // The name was declared at list entry.
        let func = &mut decl.stx.func;
        self.build_func(func, ctx);
      }
    }
    BuildOutcome::Done
  }

  fn build_func(&mut self, func: &mut Node<Func>, ctx: BuildCtx) {
    let stats_index = self.fn_stats.len();
    self.fn_stats.push(FnStats::default());
    self.fn_stack.push(stats_index);
    func.assoc.set(FnStatsRef(stats_index));

    let depth = ctx.depth + 1;
    self.scopes.push(ScopeFrame::function());
    for param in &mut func.stx.parameters {
      let name = param.stx.name.clone();
      let id = self.declare(&name, depth);
      param.assoc.set(DeclaredVar(id));
    }
    for name in collect_var_names(&func.stx.body) {
      self.declare_var(&name, depth);
    }
    self.declare_list_functions(&func.stx.body, depth);
    let body_ctx = BuildCtx {
      depth,
      flags: BuildFlags {
        strict: func.stx.strict,
        ..BuildFlags::default()
      },
    };
    for stmt in &mut func.stx.body {
      self.build_stmt(stmt, body_ctx);
    }
    self.scopes.pop();
    self.fn_stack.pop();
  }

  fn build_expr(&mut self, node: &mut Node<Expr>, ctx: BuildCtx) {
    let loc = node.loc;
    match &mut *node.stx {
      Expr::Id(id) => self.build_id_use(id, loc, ctx, true),
      Expr::LitArr(arr) => {
        for element in &mut arr.stx.elements {
          self.build_expr(element, ctx);
        }
      }
      Expr::LitObj(obj) => {
        for member in &mut obj.stx.members {
          self.build_expr(&mut member.stx.value, ctx);
        }
      }
      Expr::LitBool(_) | Expr::LitNull(_) | Expr::LitNum(_) | Expr::LitStr(_) => {}
      Expr::Member(member) => self.build_expr(&mut member.stx.left, ctx),
      Expr::ComputedMember(member) => {
        self.build_expr(&mut member.stx.object, ctx);
        self.build_expr(&mut member.stx.member, ctx);
      }
      Expr::Call(call) => {
        self.build_expr(&mut call.stx.callee, ctx);
        for arg in &mut call.stx.arguments {
          self.build_expr(arg, ctx);
        }
      }
      Expr::Cond(cond) => {
        self.build_expr(&mut cond.stx.test, ctx);
        let branch_ctx = BuildCtx {
          flags: BuildFlags {
            conditional: true,
            ..ctx.flags
          },
          ..ctx
        };
        self.build_expr(&mut cond.stx.consequent, branch_ctx);
        self.build_expr(&mut cond.stx.alternate, branch_ctx);
      }
      Expr::Unary(unary) => {
        // `typeof missing` is a legal existence probe; don't warn.
        if unary.stx.operator == OperatorName::Typeof {
          let argument_loc = unary.stx.argument.loc;
          if let Expr::Id(id) = &mut *unary.stx.argument.stx {
            self.build_id_use(id, argument_loc, ctx, false);
            return;
          }
        }
        self.build_expr(&mut unary.stx.argument, ctx);
      }
      Expr::UnaryPostfix(unary) => self.build_expr(&mut unary.stx.argument, ctx),
      Expr::Binary(binary) => {
        let conditional_rhs = matches!(
          binary.stx.operator,
          OperatorName::LogicalAnd | OperatorName::LogicalOr
        );
        self.build_expr(&mut binary.stx.left, ctx);
        let rhs_ctx = if conditional_rhs {
          BuildCtx {
            flags: BuildFlags {
              conditional: true,
              ..ctx.flags
            },
            ..ctx
          }
        } else {
          ctx
        };
        self.build_expr(&mut binary.stx.right, rhs_ctx);
      }
      Expr::Func(func_expr) => {
        self.build_func(&mut func_expr.stx.func, ctx);
      }
    }
  }

  /// Records an identifier use: resolves it to a descriptor (attached to the
  /// node), marks the descriptor captured when referenced under a `try`, and
  /// reports unresolved names (unless suppressed). Inside `with` bodies
  /// resolution is dynamic and nothing is attached or reported.
  fn build_id_use(
    &mut self,
    id: &mut Node<parse_dscript::ast::expr::IdExpr>,
    loc: Loc,
    ctx: BuildCtx,
    warn: bool,
  ) {
    let name = id.stx.name.clone();
    if name == "arguments" {
      self.stats().uses_arguments = true;
    }
    if ctx.flags.in_with {
      return;
    }
    match self.lookup(&name) {
      Some(found) => {
        if ctx.flags.in_try {
          self.descriptors[found.0].captured = true;
        }
        id.assoc.set(ResolvedVar(found));
      }
      None => {
        if warn {
          self.warn_unresolved(&name, loc);
        }
      }
    }
  }
}

fn loop_ctx(ctx: BuildCtx) -> BuildCtx {
  BuildCtx {
    flags: BuildFlags {
      conditional: true,
      in_loop: true,
      ..ctx.flags
    },
    ..ctx
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn build(source: &str) -> (Node<TopLevel>, BuildOutput) {
    let mut top = parse_dscript::parse(source).unwrap();
    let output = build_program(&mut top, FileId(0), &["print"]);
    (top, output)
  }

  fn descriptor<'o>(output: &'o BuildOutput, name: &str) -> &'o VarDescriptor {
    output
      .descriptors
      .iter()
      .find(|d| d.name == name)
      .unwrap_or_else(|| panic!("no descriptor for {}", name))
  }

  #[test]
  fn declarations_record_function_depth() {
    let (_, output) = build("var a; function f(p) { var b; function g() { var c; } }");
    assert_eq!(descriptor(&output, "a").depth, 0);
    assert_eq!(descriptor(&output, "p").depth, 1);
    assert_eq!(descriptor(&output, "b").depth, 1);
    assert_eq!(descriptor(&output, "c").depth, 2);
  }

  #[test]
  fn names_referenced_under_try_are_captured() {
    let (_, output) = build("var a; var b; try { a; } catch (e) { b; }");
    assert!(descriptor(&output, "a").captured);
    assert!(descriptor(&output, "b").captured);
  }

  #[test]
  fn names_not_referenced_under_try_stay_uncaptured() {
    let (_, output) = build("var a; try { 1; } finally { 2; } a;");
    assert!(!descriptor(&output, "a").captured);
  }

  #[test]
  fn unresolved_names_warn_once_per_name() {
    let (_, output) = build("mystery; mystery; print;");
    let unresolved: Vec<_> = output
      .warnings
      .iter()
      .filter(|d| d.code == "BD0001")
      .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].message.contains("mystery"));
  }

  #[test]
  fn typeof_suppresses_unresolved_warning() {
    let (_, output) = build("typeof missing;");
    assert!(output.warnings.is_empty());
  }

  #[test]
  fn with_bodies_suppress_resolution() {
    let (_, output) = build("with (x) { anything; }");
    assert!(!output
      .warnings
      .iter()
      .any(|d| d.message.contains("anything")));
    assert!(output.fn_stats[0].has_with);
  }

  #[test]
  fn stats_track_try_and_arguments_per_function() {
    let (_, output) = build("try { 1; } finally { 2; } function f() { arguments; }");
    assert!(output.fn_stats[0].has_try);
    assert!(!output.fn_stats[0].uses_arguments);
    assert!(output.fn_stats[1].uses_arguments);
    assert!(!output.fn_stats[1].has_try);
  }

  #[test]
  fn label_of_empty_statement_collapses() {
    let (top, _) = build("lonely: ;");
    assert!(matches!(&*top.stx.body[0].stx, Stmt::Empty(_)));
  }

  #[test]
  fn resolved_uses_attach_descriptors() {
    let (top, output) = build("var a; a;");
    let Stmt::Expr(expr_stmt) = &*top.stx.body[1].stx else {
      panic!("expected expression statement");
    };
    let Expr::Id(id) = &*expr_stmt.stx.expr.stx else {
      panic!("expected identifier");
    };
    let resolved = id.assoc.get::<ResolvedVar>().unwrap();
    assert_eq!(output.descriptors[resolved.0 .0].name, "a");
  }
}
