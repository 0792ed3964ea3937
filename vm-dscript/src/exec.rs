//! The tree-walking evaluator.
//!
//! Statement evaluation returns an explicit completion record rather than
//! mutating a shared abort flag, which makes the label-matching and
//! finally-override rules compiler-checked: every consumer must match on the
//! completion. Script-level throws travel through expression evaluation as
//! `VmError::Throw` and are converted back into `Completion::Throw` at the
//! nearest statement, so `try` can intercept them; host terminations use a
//! distinct variant and never convert.

use crate::env::Scope;
use crate::env::ScopeKind;
use crate::env::ScopeRef;
use crate::env::SetError;
use crate::error::HostError;
use crate::error::VmError;
use crate::hoist::collect_var_names;
use crate::ops::apply_binary;
use crate::ops::apply_unary;
use crate::value::make_error;
use crate::value::strict_eq;
use crate::value::to_boolean;
use crate::value::to_js_string;
use crate::value::to_number;
use crate::value::NativeCall;
use crate::value::ScriptFn;
use crate::value::Value;
use crate::vm::Vm;
use crate::vm::VmOptions;
use parse_dscript::ast::expr::Expr;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::CatchBlock;
use parse_dscript::ast::stmt::DoWhileStmt;
use parse_dscript::ast::stmt::ForTripleStmt;
use parse_dscript::ast::stmt::ForTripleStmtInit;
use parse_dscript::ast::stmt::LabelStmt;
use parse_dscript::ast::stmt::Stmt;
use parse_dscript::ast::stmt::SwitchStmt;
use parse_dscript::ast::stmt::TryStmt;
use parse_dscript::ast::stmt::VarDecl;
use parse_dscript::ast::stmt::VarDeclMode;
use parse_dscript::ast::stmt::WhileStmt;
use parse_dscript::ast::stx::TopLevel;
use parse_dscript::operator::OperatorName;
use std::rc::Rc;

/// A completion record: the result of evaluating one statement.
///
/// The "empty" completion value is modelled explicitly as `None` so statement
/// lists can implement the implicit last-value semantics correctly (e.g.
/// `1; if (true) {}` evaluates to `1`).
#[derive(Debug)]
pub enum Completion<'p> {
  Normal(Option<Value<'p>>),
  Throw(Value<'p>),
  Return(Value<'p>),
  Break(Option<String>, Option<Value<'p>>),
  Continue(Option<String>, Option<Value<'p>>),
}

impl<'p> Completion<'p> {
  pub fn empty() -> Self {
    Completion::Normal(None)
  }

  pub fn normal(value: Value<'p>) -> Self {
    Completion::Normal(Some(value))
  }

  pub fn is_abrupt(&self) -> bool {
    !matches!(self, Completion::Normal(_))
  }

  /// Fills an empty completion value with `value`.
  pub fn update_empty(self, value: Option<Value<'p>>) -> Self {
    match self {
      Completion::Normal(None) => Completion::Normal(value),
      Completion::Break(target, None) => Completion::Break(target, value),
      Completion::Continue(target, None) => Completion::Continue(target, value),
      other => other,
    }
  }
}

/// Whether an abrupt break/continue targeting `target` is consumed by a
/// construct carrying `labels`. An unlabeled exit matches the nearest
/// construct; a labeled exit only matches a construct carrying that label.
fn target_matches(target: &Option<String>, labels: &[String]) -> bool {
  match target {
    None => true,
    Some(label) => labels.iter().any(|l| l == label),
  }
}

/// An embeddable script interpreter: owns the execution options and the
/// host-registered native functions; each [`Interpreter::exec`] call runs one
/// built program against a fresh environment.
pub struct Interpreter {
  options: VmOptions,
  natives: Vec<(String, Rc<dyn NativeCall>)>,
}

impl Interpreter {
  pub fn new(options: VmOptions) -> Interpreter {
    Interpreter {
      options,
      natives: Vec::new(),
    }
  }

  /// Installs a host function, visible to scripts as a constant global
  /// binding.
  pub fn register_native(&mut self, name: impl Into<String>, native: Rc<dyn NativeCall>) {
    self.natives.push((name.into(), native));
  }

  /// The registered native names; callers pass these to the build pass as
  /// ambient globals.
  pub fn native_names(&self) -> Vec<&str> {
    self.natives.iter().map(|(name, _)| name.as_str()).collect()
  }

  /// Evaluates a built program and returns its final value, or the uncaught
  /// thrown value / host termination.
  pub fn exec<'p>(&self, program: &'p Node<TopLevel>) -> Result<Value<'p>, VmError<'p>> {
    let mut vm = Vm::new(self.options.clone());
    let scope = Scope::root();
    for (name, native) in &self.natives {
      Scope::declare_lexical(&scope, name, false, Value::Native(native.clone()));
    }
    let mut evaluator = Evaluator {
      vm: &mut vm,
      strict: program.stx.strict,
    };
    evaluator.hoist_vars(&scope, &program.stx.body);
    let completion = evaluator.eval_stmt_list(&scope, &program.stx.body)?;
    match completion {
      Completion::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
      Completion::Throw(value) => Err(VmError::Throw(value)),
      Completion::Return(..) | Completion::Break(..) | Completion::Continue(..) => {
        // The parser rejects top-level return/break/continue.
        unreachable!("non-local exit escaped the top level")
      }
    }
  }
}

// Converts an expression-level throw back into a completion at the nearest
// statement; terminations keep unwinding.
macro_rules! tryc {
  ($e:expr) => {
    match $e {
      Ok(value) => value,
      Err(VmError::Throw(thrown)) => return Ok(Completion::Throw(thrown)),
      Err(err) => return Err(err),
    }
  };
}

struct Evaluator<'v> {
  vm: &'v mut Vm,
  // Strictness of the function being evaluated; affects assignment to
  // unresolved names.
  strict: bool,
}

impl<'v> Evaluator<'v> {
  fn hoist_vars<'p>(&mut self, scope: &ScopeRef<'p>, stmts: &'p [Node<Stmt>]) {
    for name in collect_var_names(stmts) {
      Scope::declare_var(scope, &name);
    }
  }

  /// Function declarations bind at the start of their containing statement
  /// list, before any statement runs.
  fn hoist_functions<'p>(&mut self, scope: &ScopeRef<'p>, stmts: &'p [Node<Stmt>]) {
    for stmt in stmts {
      if let Stmt::FunctionDecl(decl) = &*stmt.stx {
        let function = Value::Func(Rc::new(ScriptFn {
          name: Some(decl.stx.name.clone()),
          func: &*decl.stx.func.stx,
          closure: scope.clone(),
        }));
        Scope::declare_lexical(scope, &decl.stx.name, true, function);
      }
    }
  }

  fn eval_stmt_list<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmts: &'p [Node<Stmt>],
  ) -> Result<Completion<'p>, VmError<'p>> {
    self.hoist_functions(scope, stmts);
    let mut last: Option<Value<'p>> = None;
    for stmt in stmts {
      let completion = self.eval_stmt(scope, stmt)?;
      let completion = completion.update_empty(last.clone());
      match completion {
        Completion::Normal(value) => last = value,
        abrupt => return Ok(abrupt),
      }
    }
    Ok(Completion::Normal(last))
  }

  fn eval_block<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmts: &'p [Node<Stmt>],
  ) -> Result<Completion<'p>, VmError<'p>> {
    let block_scope = Scope::child(scope.clone(), ScopeKind::Block);
    self.eval_stmt_list(&block_scope, stmts)
  }

  fn eval_stmt<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmt: &'p Node<Stmt>,
  ) -> Result<Completion<'p>, VmError<'p>> {
    // One tick per statement.
    self.vm.tick()?;

    match &*stmt.stx {
      Stmt::Empty(_) | Stmt::Debugger(_) => Ok(Completion::empty()),
      // Bound when the containing list was entered.
      Stmt::FunctionDecl(_) => Ok(Completion::empty()),
      Stmt::Expr(node) => {
        let value = tryc!(self.eval_expr(scope, &node.stx.expr));
        Ok(Completion::normal(value))
      }
      Stmt::VarDecl(node) => self.eval_var_decl(scope, &node.stx),
      Stmt::Block(node) => self.eval_block(scope, &node.stx.body),
      Stmt::If(node) => {
        let test = tryc!(self.eval_expr(scope, &node.stx.test));
        if to_boolean(&test) {
          self.eval_stmt(scope, &node.stx.consequent)
        } else if let Some(alternate) = &node.stx.alternate {
          self.eval_stmt(scope, alternate)
        } else {
          Ok(Completion::empty())
        }
      }
      Stmt::Throw(node) => {
        let value = tryc!(self.eval_expr(scope, &node.stx.value));
        Ok(Completion::Throw(value))
      }
      Stmt::Return(node) => {
        let value = match &node.stx.value {
          Some(expr) => tryc!(self.eval_expr(scope, expr)),
          None => Value::Undefined,
        };
        Ok(Completion::Return(value))
      }
      Stmt::Break(node) => Ok(Completion::Break(node.stx.label.clone(), None)),
      Stmt::Continue(node) => Ok(Completion::Continue(node.stx.label.clone(), None)),
      Stmt::Try(node) => self.eval_try(scope, &node.stx),
      Stmt::While(node) => self.eval_while(scope, &node.stx, &[]),
      Stmt::DoWhile(node) => self.eval_do_while(scope, &node.stx, &[]),
      Stmt::ForTriple(node) => self.eval_for_triple(scope, &node.stx, &[]),
      Stmt::Switch(node) => self.eval_switch(scope, &node.stx, &[]),
      Stmt::Label(node) => self.eval_labelled(scope, &node.stx),
      Stmt::With(node) => {
        let object = tryc!(self.eval_expr(scope, &node.stx.object));
        if !object.is_reference() {
          return Ok(Completion::Throw(make_error(
            "TypeError",
            "with target is not an object",
          )));
        }
        let with_scope = Scope::child(scope.clone(), ScopeKind::With(object));
        self.eval_stmt(&with_scope, &node.stx.body)
      }
    }
  }

  fn eval_var_decl<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    decl: &'p VarDecl,
  ) -> Result<Completion<'p>, VmError<'p>> {
    for declarator in &decl.declarators {
      let name = &declarator.stx.name;
      match decl.mode {
        VarDeclMode::Var => {
          // The binding itself was hoisted at frame entry; the initializer
          // assigns the function-frame binding even through lexical shadows
          // such as a same-named catch parameter.
          if let Some(init) = &declarator.stx.initializer {
            let value = tryc!(self.eval_expr(scope, init));
            Scope::set_var(scope, name, value);
          }
        }
        VarDeclMode::Let => {
          let value = match &declarator.stx.initializer {
            Some(init) => tryc!(self.eval_expr(scope, init)),
            None => Value::Undefined,
          };
          Scope::declare_lexical(scope, name, true, value);
        }
        VarDeclMode::Const => {
          let init = declarator
            .stx
            .initializer
            .as_ref()
            .expect("parser enforces const initializers");
          let value = tryc!(self.eval_expr(scope, init));
          Scope::declare_lexical(scope, name, false, value);
        }
      }
    }
    Ok(Completion::empty())
  }

  fn eval_try<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmt: &'p TryStmt,
  ) -> Result<Completion<'p>, VmError<'p>> {
    let mut result = self.eval_block(scope, &stmt.wrapped.stx.body)?;

    result = match result {
      Completion::Throw(thrown) => match &stmt.catch {
        Some(catch) => self.eval_catch(scope, &catch.stx, thrown)?,
        None => Completion::Throw(thrown),
      },
      other => other,
    };

    if let Some(finally) = &stmt.finally {
      // The pending completion is saved and the finally body runs under a
      // clean context; an abrupt finally completion overrides the saved one
      // entirely, otherwise the saved completion is restored.
      let saved = result;
      let finally_result = self.eval_block(scope, &finally.stx.body)?;
      result = if finally_result.is_abrupt() {
        finally_result
      } else {
        saved
      };
    }

    Ok(result.update_empty(Some(Value::Undefined)))
  }

  fn eval_catch<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    catch: &'p CatchBlock,
    thrown: Value<'p>,
  ) -> Result<Completion<'p>, VmError<'p>> {
    let catch_scope = Scope::child(scope.clone(), ScopeKind::Block);
    if let Some(parameter) = &catch.parameter {
      Scope::declare_lexical(&catch_scope, parameter, true, thrown);
    }
    self.eval_stmt_list(&catch_scope, &catch.body)
  }

  fn eval_labelled<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmt: &'p LabelStmt,
  ) -> Result<Completion<'p>, VmError<'p>> {
    // Collect the contiguous label chain; every name targets the same
    // statement.
    let mut labels = vec![stmt.name.clone()];
    let mut target = &stmt.statement;
    loop {
      match &*target.stx {
        Stmt::Label(inner) => {
          labels.push(inner.stx.name.clone());
          target = &inner.stx.statement;
        }
        _ => break,
      }
    }

    let completion = match &*target.stx {
      Stmt::While(node) => self.eval_while(scope, &node.stx, &labels)?,
      Stmt::DoWhile(node) => self.eval_do_while(scope, &node.stx, &labels)?,
      Stmt::ForTriple(node) => self.eval_for_triple(scope, &node.stx, &labels)?,
      Stmt::Switch(node) => self.eval_switch(scope, &node.stx, &labels)?,
      _ => self.eval_stmt(scope, target)?,
    };

    match completion {
      Completion::Break(Some(label), value) if labels.iter().any(|l| *l == label) => {
        Ok(Completion::Normal(value))
      }
      other => Ok(other),
    }
  }

  fn eval_while<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmt: &'p WhileStmt,
    labels: &[String],
  ) -> Result<Completion<'p>, VmError<'p>> {
    let mut last: Option<Value<'p>> = None;
    loop {
      let test = tryc!(self.eval_expr(scope, &stmt.condition));
      if !to_boolean(&test) {
        break;
      }
      match self.eval_stmt(scope, &stmt.body)? {
        Completion::Normal(value) => {
          if value.is_some() {
            last = value;
          }
        }
        Completion::Continue(target, value) if target_matches(&target, labels) => {
          if value.is_some() {
            last = value;
          }
        }
        Completion::Break(target, value) if target_matches(&target, labels) => {
          return Ok(Completion::Normal(value.or(last)));
        }
        other => return Ok(other.update_empty(last)),
      }
    }
    Ok(Completion::Normal(last))
  }

  fn eval_do_while<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmt: &'p DoWhileStmt,
    labels: &[String],
  ) -> Result<Completion<'p>, VmError<'p>> {
    let mut last: Option<Value<'p>> = None;
    loop {
      // The body runs before the first condition check.
      match self.eval_stmt(scope, &stmt.body)? {
        Completion::Normal(value) => {
          if value.is_some() {
            last = value;
          }
        }
        Completion::Continue(target, value) if target_matches(&target, labels) => {
          if value.is_some() {
            last = value;
          }
        }
        Completion::Break(target, value) if target_matches(&target, labels) => {
          return Ok(Completion::Normal(value.or(last)));
        }
        // Return, throw, and foreign-labeled exits propagate without
        // re-evaluating the condition.
        other => return Ok(other.update_empty(last)),
      }
      let test = tryc!(self.eval_expr(scope, &stmt.condition));
      if !to_boolean(&test) {
        break;
      }
    }
    Ok(Completion::Normal(last))
  }

  fn eval_for_triple<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmt: &'p ForTripleStmt,
    labels: &[String],
  ) -> Result<Completion<'p>, VmError<'p>> {
    // One scope for the whole loop; per-iteration environments for `let` are
    // intentionally not modelled.
    let scope = Scope::child(scope.clone(), ScopeKind::Block);
    match &stmt.init {
      ForTripleStmtInit::None => {}
      ForTripleStmtInit::Expr(expr) => {
        tryc!(self.eval_expr(&scope, expr));
      }
      ForTripleStmtInit::Decl(decl) => {
        let completion = self.eval_var_decl(&scope, &decl.stx)?;
        if completion.is_abrupt() {
          return Ok(completion);
        }
      }
    }

    // `for(;;){}` evaluates no statements or expressions per iteration;
    // tick explicitly so budgets and interrupts are still observed.
    let needs_explicit_iter_tick = stmt.cond.is_none()
      && stmt.post.is_none()
      && matches!(&*stmt.body.stx, Stmt::Empty(_));

    let mut last: Option<Value<'p>> = None;
    loop {
      if needs_explicit_iter_tick {
        self.vm.tick()?;
      }
      if let Some(cond) = &stmt.cond {
        let test = tryc!(self.eval_expr(&scope, cond));
        if !to_boolean(&test) {
          break;
        }
      }
      match self.eval_stmt(&scope, &stmt.body)? {
        Completion::Normal(value) => {
          if value.is_some() {
            last = value;
          }
        }
        Completion::Continue(target, value) if target_matches(&target, labels) => {
          if value.is_some() {
            last = value;
          }
        }
        Completion::Break(target, value) if target_matches(&target, labels) => {
          return Ok(Completion::Normal(value.or(last)));
        }
        other => return Ok(other.update_empty(last)),
      }
      if let Some(post) = &stmt.post {
        tryc!(self.eval_expr(&scope, post));
      }
    }
    Ok(Completion::Normal(last))
  }

  fn eval_switch<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    stmt: &'p SwitchStmt,
    labels: &[String],
  ) -> Result<Completion<'p>, VmError<'p>> {
    let subject = tryc!(self.eval_expr(scope, &stmt.test));
    let scope = Scope::child(scope.clone(), ScopeKind::Block);

    // Scan cases in declaration order; the first strict-equal case wins.
    // Case expressions are only evaluated up to the match point.
    let mut matched = None;
    for (i, branch) in stmt.branches.iter().enumerate() {
      let Some(case) = &branch.stx.case else {
        continue;
      };
      let case_value = tryc!(self.eval_expr(&scope, case));
      if strict_eq(&case_value, &subject) {
        matched = Some(i);
        break;
      }
    }
    let matched = matched.or_else(|| {
      stmt
        .branches
        .iter()
        .position(|branch| branch.stx.case.is_none())
    });
    let Some(start) = matched else {
      return Ok(Completion::empty());
    };

    // Execute bodies by index from the match point, falling through case
    // boundaries until a matching break or the end of the body.
    let mut last: Option<Value<'p>> = None;
    for branch in &stmt.branches[start..] {
      self.hoist_functions(&scope, &branch.stx.body);
    }
    for branch in &stmt.branches[start..] {
      for stmt in &branch.stx.body {
        let completion = self.eval_stmt(&scope, stmt)?.update_empty(last.clone());
        match completion {
          Completion::Normal(value) => last = value,
          Completion::Break(target, value) if target_matches(&target, labels) => {
            return Ok(Completion::Normal(value));
          }
          abrupt => return Ok(abrupt),
        }
      }
    }
    Ok(Completion::Normal(last))
  }

  // Expressions.

  fn eval_expr<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    expr: &'p Node<Expr>,
  ) -> Result<Value<'p>, VmError<'p>> {
    // One tick per expression.
    self.vm.tick()?;

    match &*expr.stx {
      Expr::LitBool(node) => Ok(Value::Bool(node.stx.value)),
      Expr::LitNull(_) => Ok(Value::Null),
      Expr::LitNum(node) => Ok(Value::Num(node.stx.value)),
      Expr::LitStr(node) => Ok(Value::str(&node.stx.value)),
      Expr::LitArr(node) => {
        let mut elements = Vec::with_capacity(node.stx.elements.len());
        for element in &node.stx.elements {
          elements.push(self.eval_expr(scope, element)?);
        }
        Ok(Value::new_arr(elements))
      }
      Expr::LitObj(node) => {
        let object = Value::new_obj();
        if let Value::Obj(map) = &object {
          for member in &node.stx.members {
            let value = self.eval_expr(scope, &member.stx.value)?;
            map.borrow_mut().insert(member.stx.key.clone(), value);
          }
        }
        Ok(object)
      }
      Expr::Id(node) => self.read_binding(scope, &node.stx.name),
      Expr::Func(node) => Ok(Value::Func(Rc::new(ScriptFn {
        name: node.stx.name.clone(),
        func: &*node.stx.func.stx,
        closure: scope.clone(),
      }))),
      Expr::Member(node) => {
        let base = self.eval_expr(scope, &node.stx.left)?;
        self.get_property(&base, &node.stx.right)
      }
      Expr::ComputedMember(node) => {
        let base = self.eval_expr(scope, &node.stx.object)?;
        let key = self.eval_expr(scope, &node.stx.member)?;
        self.get_property(&base, &to_js_string(&key))
      }
      Expr::Call(node) => {
        let callee = self.eval_expr(scope, &node.stx.callee)?;
        let mut args = Vec::with_capacity(node.stx.arguments.len());
        for arg in &node.stx.arguments {
          args.push(self.eval_expr(scope, arg)?);
        }
        self.call_value(callee, args)
      }
      Expr::Cond(node) => {
        let test = self.eval_expr(scope, &node.stx.test)?;
        if to_boolean(&test) {
          self.eval_expr(scope, &node.stx.consequent)
        } else {
          self.eval_expr(scope, &node.stx.alternate)
        }
      }
      Expr::Unary(node) => self.eval_unary(scope, node.stx.operator, &node.stx.argument),
      Expr::UnaryPostfix(node) => {
        let delta = match node.stx.operator {
          OperatorName::PostfixIncrement => 1.0,
          OperatorName::PostfixDecrement => -1.0,
          other => unreachable!("{:?} is not a postfix operator", other),
        };
        let old = to_number(&self.read_target(scope, &node.stx.argument)?);
        self.write_target(scope, &node.stx.argument, Value::num(old + delta))?;
        Ok(Value::num(old))
      }
      Expr::Binary(node) => self.eval_binary(scope, node),
    }
  }

  fn eval_unary<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    operator: OperatorName,
    argument: &'p Node<Expr>,
  ) -> Result<Value<'p>, VmError<'p>> {
    match operator {
      // `typeof` tolerates unresolved names.
      OperatorName::Typeof => {
        if let Expr::Id(id) = &*argument.stx {
          let value = Scope::get(scope, &id.stx.name);
          return Ok(match value {
            Some(value) => Value::str(value.type_of()),
            None => Value::str("undefined"),
          });
        }
        let value = self.eval_expr(scope, argument)?;
        Ok(Value::str(value.type_of()))
      }
      OperatorName::PrefixIncrement | OperatorName::PrefixDecrement => {
        let delta = if operator == OperatorName::PrefixIncrement {
          1.0
        } else {
          -1.0
        };
        let old = to_number(&self.read_target(scope, argument)?);
        let new = Value::num(old + delta);
        self.write_target(scope, argument, new.clone())?;
        Ok(new)
      }
      _ => {
        let value = self.eval_expr(scope, argument)?;
        Ok(apply_unary(operator, &value))
      }
    }
  }

  fn eval_binary<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    node: &'p Node<parse_dscript::ast::expr::BinaryExpr>,
  ) -> Result<Value<'p>, VmError<'p>> {
    let op = node.stx.operator;
    match op {
      OperatorName::Assignment => {
        let value = self.eval_expr(scope, &node.stx.right)?;
        self.write_target(scope, &node.stx.left, value.clone())?;
        Ok(value)
      }
      op if op.is_assignment() => {
        let base = op.compound_base().unwrap();
        let current = self.read_target(scope, &node.stx.left)?;
        let rhs = self.eval_expr(scope, &node.stx.right)?;
        let value = apply_binary(base, &current, &rhs);
        self.write_target(scope, &node.stx.left, value.clone())?;
        Ok(value)
      }
      OperatorName::LogicalAnd => {
        let left = self.eval_expr(scope, &node.stx.left)?;
        if !to_boolean(&left) {
          return Ok(left);
        }
        self.eval_expr(scope, &node.stx.right)
      }
      OperatorName::LogicalOr => {
        let left = self.eval_expr(scope, &node.stx.left)?;
        if to_boolean(&left) {
          return Ok(left);
        }
        self.eval_expr(scope, &node.stx.right)
      }
      OperatorName::Comma => {
        self.eval_expr(scope, &node.stx.left)?;
        self.eval_expr(scope, &node.stx.right)
      }
      _ => {
        let left = self.eval_expr(scope, &node.stx.left)?;
        let right = self.eval_expr(scope, &node.stx.right)?;
        Ok(apply_binary(op, &left, &right))
      }
    }
  }

  // References: identifier, member, and index targets.

  fn read_binding<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    name: &str,
  ) -> Result<Value<'p>, VmError<'p>> {
    Scope::get(scope, name).ok_or_else(|| {
      VmError::Throw(make_error(
        "ReferenceError",
        format!("{} is not defined", name),
      ))
    })
  }

  fn write_binding<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    name: &str,
    value: Value<'p>,
  ) -> Result<(), VmError<'p>> {
    Scope::set(scope, name, value, self.strict).map_err(|err| match err {
      SetError::AssignToConst => VmError::Throw(make_error(
        "TypeError",
        format!("assignment to constant variable {}", name),
      )),
      SetError::Unresolved => VmError::Throw(make_error(
        "ReferenceError",
        format!("{} is not defined", name),
      )),
    })
  }

  fn read_target<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    target: &'p Node<Expr>,
  ) -> Result<Value<'p>, VmError<'p>> {
    match &*target.stx {
      Expr::Id(id) => self.read_binding(scope, &id.stx.name),
      Expr::Member(_) | Expr::ComputedMember(_) => self.eval_expr(scope, target),
      _ => Err(VmError::Throw(make_error(
        "ReferenceError",
        "invalid assignment target",
      ))),
    }
  }

  fn write_target<'p>(
    &mut self,
    scope: &ScopeRef<'p>,
    target: &'p Node<Expr>,
    value: Value<'p>,
  ) -> Result<(), VmError<'p>> {
    match &*target.stx {
      Expr::Id(id) => self.write_binding(scope, &id.stx.name, value),
      Expr::Member(member) => {
        let base = self.eval_expr(scope, &member.stx.left)?;
        self.set_property(&base, &member.stx.right, value)
      }
      Expr::ComputedMember(member) => {
        let base = self.eval_expr(scope, &member.stx.object)?;
        let key = self.eval_expr(scope, &member.stx.member)?;
        self.set_property(&base, &to_js_string(&key), value)
      }
      _ => Err(VmError::Throw(make_error(
        "ReferenceError",
        "invalid assignment target",
      ))),
    }
  }

  fn get_property<'p>(
    &mut self,
    base: &Value<'p>,
    key: &str,
  ) -> Result<Value<'p>, VmError<'p>> {
    match base {
      Value::Undefined | Value::Null => Err(VmError::Throw(make_error(
        "TypeError",
        format!(
          "cannot read properties of {} (reading '{}')",
          to_js_string(base),
          key
        ),
      ))),
      Value::Obj(map) => Ok(map.borrow().get(key).cloned().unwrap_or(Value::Undefined)),
      Value::Arr(elements) => match key {
        "length" => Ok(Value::num(elements.borrow().len() as f64)),
        _ => Ok(
          key
            .parse::<usize>()
            .ok()
            .and_then(|i| elements.borrow().get(i).cloned())
            .unwrap_or(Value::Undefined),
        ),
      },
      Value::Str(s) => match key {
        "length" => Ok(Value::num(s.chars().count() as f64)),
        _ => Ok(
          key
            .parse::<usize>()
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::str(c.to_string()))
            .unwrap_or(Value::Undefined),
        ),
      },
      _ => Ok(Value::Undefined),
    }
  }

  fn set_property<'p>(
    &mut self,
    base: &Value<'p>,
    key: &str,
    value: Value<'p>,
  ) -> Result<(), VmError<'p>> {
    match base {
      Value::Undefined | Value::Null => Err(VmError::Throw(make_error(
        "TypeError",
        format!(
          "cannot set properties of {} (setting '{}')",
          to_js_string(base),
          key
        ),
      ))),
      Value::Obj(map) => {
        map.borrow_mut().insert(key.to_string(), value);
        Ok(())
      }
      Value::Arr(elements) => {
        let mut elements = elements.borrow_mut();
        if key == "length" {
          let new_len = to_number(&value);
          if new_len < 0.0 || new_len.fract() != 0.0 {
            return Err(VmError::Throw(make_error(
              "RangeError",
              "invalid array length",
            )));
          }
          elements.resize(new_len as usize, Value::Undefined);
          return Ok(());
        }
        if let Ok(i) = key.parse::<usize>() {
          if i >= elements.len() {
            elements.resize(i + 1, Value::Undefined);
          }
          elements[i] = value;
        }
        Ok(())
      }
      // Assigning properties on other primitives is silently ignored.
      _ => Ok(()),
    }
  }

  // Calls.

  fn call_value<'p>(
    &mut self,
    callee: Value<'p>,
    args: Vec<Value<'p>>,
  ) -> Result<Value<'p>, VmError<'p>> {
    match callee {
      Value::Native(native) => native.call(&args).map_err(|err| self.wrap_host_error(err)),
      Value::Func(function) => {
        self.vm.enter_frame()?;
        let result = self.call_script_fn(&function, args);
        self.vm.exit_frame();
        result
      }
      other => Err(VmError::Throw(make_error(
        "TypeError",
        format!("{} is not a function", to_js_string(&other)),
      ))),
    }
  }

  // Host faults become ordinary thrown values exactly once, here.
  fn wrap_host_error<'p>(&self, err: HostError) -> VmError<'p> {
    VmError::Throw(make_error(&err.name, err.message))
  }

  fn call_script_fn<'p>(
    &mut self,
    function: &Rc<ScriptFn<'p>>,
    args: Vec<Value<'p>>,
  ) -> Result<Value<'p>, VmError<'p>> {
    let scope = Scope::child(function.closure.clone(), ScopeKind::Function);
    // A named function expression can refer to itself.
    if let Some(name) = &function.name {
      Scope::declare_lexical(&scope, name, false, Value::Func(function.clone()));
    }
    Scope::declare_lexical(&scope, "arguments", false, Value::new_arr(args.clone()));
    for (i, param) in function.func.parameters.iter().enumerate() {
      let value = args.get(i).cloned().unwrap_or(Value::Undefined);
      Scope::declare_lexical(&scope, &param.stx.name, true, value);
    }
    self.hoist_vars(&scope, &function.func.body);

    let saved_strict = self.strict;
    self.strict = function.func.strict;
    let completion = self.eval_stmt_list(&scope, &function.func.body);
    self.strict = saved_strict;

    match completion? {
      Completion::Return(value) => Ok(value),
      Completion::Normal(_) => Ok(Value::Undefined),
      Completion::Throw(value) => Err(VmError::Throw(value)),
      Completion::Break(..) | Completion::Continue(..) => {
        // The parser rejects function-crossing break/continue.
        unreachable!("non-local exit escaped a function body")
      }
    }
  }
}
