use super::expr::Asi;
use super::Parser;
use crate::ast::expr::Expr;
use crate::ast::func::Func;
use crate::ast::func::ParamDecl;
use crate::ast::node::Node;
use crate::ast::stmt::BlockStmt;
use crate::ast::stmt::BreakStmt;
use crate::ast::stmt::CatchBlock;
use crate::ast::stmt::ContinueStmt;
use crate::ast::stmt::DebuggerStmt;
use crate::ast::stmt::DoWhileStmt;
use crate::ast::stmt::EmptyStmt;
use crate::ast::stmt::ExprStmt;
use crate::ast::stmt::ForTripleStmt;
use crate::ast::stmt::ForTripleStmtInit;
use crate::ast::stmt::FuncDecl;
use crate::ast::stmt::IfStmt;
use crate::ast::stmt::LabelStmt;
use crate::ast::stmt::LoopExitUsage;
use crate::ast::stmt::ReturnStmt;
use crate::ast::stmt::Stmt;
use crate::ast::stmt::SwitchBranch;
use crate::ast::stmt::SwitchStmt;
use crate::ast::stmt::ThrowStmt;
use crate::ast::stmt::TryStmt;
use crate::ast::stmt::VarDecl;
use crate::ast::stmt::VarDeclMode;
use crate::ast::stmt::VarDeclarator;
use crate::ast::stmt::WhileStmt;
use crate::ast::stmt::WithStmt;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::error::SyntaxWarningType;
use crate::num::JsNumber;
use crate::token::TT;

#[derive(Copy, Clone, Eq, PartialEq)]
pub enum VarDeclParseMode {
  // Standalone statement: requires a semicolon or ASI afterwards.
  Asi,
  // A `for` head: stops at the statement's own boundary.
  Leftmost,
}

// Structural comparison of literal case values, used to warn on a case that
// can never match.
#[derive(PartialEq)]
enum CaseConst {
  Bool(bool),
  Null,
  Num(JsNumber),
  Str(String),
}

fn case_const(expr: &Node<Expr>) -> Option<CaseConst> {
  Some(match &*expr.stx {
    Expr::LitBool(n) => CaseConst::Bool(n.stx.value),
    Expr::LitNull(_) => CaseConst::Null,
    Expr::LitNum(n) => CaseConst::Num(n.stx.value),
    Expr::LitStr(n) => CaseConst::Str(n.stx.value.clone()),
    _ => return None,
  })
}

fn stmt_is_abrupt(stmt: &Stmt) -> bool {
  matches!(
    stmt,
    Stmt::Break(_) | Stmt::Continue(_) | Stmt::Return(_) | Stmt::Throw(_)
  )
}

impl<'a> Parser<'a> {
  pub fn stmts(&mut self, end: TT) -> SyntaxResult<Vec<Node<Stmt>>> {
    let mut body = Vec::<Node<Stmt>>::new();
    let mut unreachable_warned = false;
    while self.peek().typ != end {
      let stmt = self.stmt()?;
      if let Some(prev) = body.last() {
        // Function and var declarations are hoisted, so they remain
        // meaningful after an abrupt statement.
        if stmt_is_abrupt(&prev.stx)
          && !unreachable_warned
          && !matches!(&*stmt.stx, Stmt::FunctionDecl(_) | Stmt::VarDecl(_))
        {
          self.warn(SyntaxWarningType::UnreachableStatement, stmt.loc);
          unreachable_warned = true;
        }
      }
      body.push(stmt);
    }
    Ok(body)
  }

  pub fn stmt(&mut self) -> SyntaxResult<Node<Stmt>> {
    let [t0, t1] = self.peek_n();
    #[rustfmt::skip]
    let stmt: Node<Stmt> = match t0.typ {
      TT::BraceOpen => self.block_stmt()?.into_wrapped(),
      TT::KeywordBreak => self.break_stmt()?.into_wrapped(),
      TT::KeywordConst | TT::KeywordLet | TT::KeywordVar => self.var_decl(VarDeclParseMode::Asi)?.into_wrapped(),
      TT::KeywordContinue => self.continue_stmt()?.into_wrapped(),
      TT::KeywordDebugger => self.debugger_stmt()?.into_wrapped(),
      TT::KeywordDo => self.do_while_stmt()?.into_wrapped(),
      TT::KeywordFor => self.for_stmt()?.into_wrapped(),
      TT::KeywordFunction => self.func_decl()?.into_wrapped(),
      TT::KeywordIf => self.if_stmt()?.into_wrapped(),
      TT::KeywordReturn => self.return_stmt()?.into_wrapped(),
      TT::KeywordSwitch => self.switch_stmt()?.into_wrapped(),
      TT::KeywordThrow => self.throw_stmt()?.into_wrapped(),
      TT::KeywordTry => self.try_stmt()?.into_wrapped(),
      TT::KeywordWhile => self.while_stmt()?.into_wrapped(),
      TT::KeywordWith => self.with_stmt()?.into_wrapped(),
      TT::Semicolon => self.empty_stmt()?.into_wrapped(),
      TT::Identifier if t1.typ == TT::Colon => self.label_stmt()?.into_wrapped(),
      _ => self.expr_stmt()?.into_wrapped(),
    };
    Ok(stmt)
  }

  /// Parses the body of a statement position that takes a single statement
  /// (loop bodies, `if` arms, `with`). A naked function declaration here is
  /// rejected in strict mode and wrapped in an implicit block otherwise (a
  /// normalization rule, not an optimization).
  fn single_stmt_body(&mut self) -> SyntaxResult<Node<Stmt>> {
    if self.peek().typ == TT::KeywordFunction {
      if self.state().strict() {
        return Err(
          self
            .peek()
            .error(SyntaxErrorType::StrictModeFunctionPosition),
        );
      }
      let func = self.func_decl()?;
      let loc = func.loc;
      let block = Node::new(loc, BlockStmt {
        body: vec![func.into_wrapped()],
      });
      return Ok(block.into_wrapped());
    }
    self.stmt()
  }

  /// Parses a loop body under a pushed break/continue scope, and reports
  /// whether the body parsed any `break`/`continue` at all (snapshotting the
  /// monotonic parse-state counters).
  fn loop_body(&mut self) -> SyntaxResult<(Node<Stmt>, LoopExitUsage)> {
    let breaks_before = self.state().break_count;
    let continues_before = self.state().continue_count;
    let body = self.with_loop_scope(|p| p.single_stmt_body())?;
    let usage = LoopExitUsage {
      has_break: self.state().break_count > breaks_before,
      has_continue: self.state().continue_count > continues_before,
    };
    Ok((body, usage))
  }

  fn require_semicolon_or_asi(&mut self, asi: &Asi) -> SyntaxResult<()> {
    if asi.did_end_with_asi {
      return Ok(());
    }
    if self.consume_if(TT::Semicolon).is_match() {
      return Ok(());
    }
    let t = self.peek();
    if t.preceded_by_line_terminator || t.typ == TT::BraceClose || t.typ == TT::EOF {
      // Automatic Semicolon Insertion.
      return Ok(());
    }
    Err(t.error(SyntaxErrorType::ExpectedSyntax("semicolon")))
  }

  /// Parses a binding identifier, rejecting names that cannot be bound in
  /// strict mode.
  pub fn binding_name(&mut self) -> SyntaxResult<String> {
    let t = self.require_predicate(|typ| typ == TT::Identifier, "identifier")?;
    let name = self.string(t.loc);
    if self.state().strict() && matches!(name.as_str(), "eval" | "arguments") {
      return Err(t.error(SyntaxErrorType::StrictModeRestrictedName));
    }
    Ok(name)
  }

  pub fn empty_stmt(&mut self) -> SyntaxResult<Node<EmptyStmt>> {
    self.with_loc(|p| p.require(TT::Semicolon).map(|_| EmptyStmt {}))
  }

  pub fn block_stmt(&mut self) -> SyntaxResult<Node<BlockStmt>> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let body = p.stmts(TT::BraceClose)?;
      p.require(TT::BraceClose)?;
      Ok(BlockStmt { body })
    })
  }

  pub fn expr_stmt(&mut self) -> SyntaxResult<Node<ExprStmt>> {
    self.with_loc(|p| {
      let mut asi = Asi::can();
      let expr = p.expr_with_asi([TT::Semicolon], &mut asi)?;
      if !asi.did_end_with_asi {
        p.require_semicolon_or_asi(&asi)?;
      };
      Ok(ExprStmt { expr })
    })
  }

  pub fn var_decl(&mut self, parse_mode: VarDeclParseMode) -> SyntaxResult<Node<VarDecl>> {
    self.with_loc(|p| {
      let mode = match p.consume().typ {
        TT::KeywordConst => VarDeclMode::Const,
        TT::KeywordLet => VarDeclMode::Let,
        TT::KeywordVar => VarDeclMode::Var,
        _ => unreachable!(),
      };
      let mut declarators = Vec::new();
      let mut asi;
      loop {
        asi = match parse_mode {
          VarDeclParseMode::Asi => Asi::can(),
          VarDeclParseMode::Leftmost => Asi::no(),
        };
        let declarator = p.with_loc(|p| {
          let name_start = p.peek();
          let name = p.binding_name()?;
          let initializer = match p.consume_if(TT::Equals).is_match() {
            true => Some(p.expr_with_asi([TT::Semicolon, TT::Comma], &mut asi)?),
            false => None,
          };
          if mode == VarDeclMode::Const && initializer.is_none() {
            return Err(name_start.error(SyntaxErrorType::ConstWithoutInitializer));
          }
          Ok(VarDeclarator { name, initializer })
        })?;
        declarators.push(declarator);
        if asi.did_end_with_asi || !p.consume_if(TT::Comma).is_match() {
          break;
        }
      }
      if parse_mode == VarDeclParseMode::Asi {
        p.require_semicolon_or_asi(&asi)?;
      }
      Ok(VarDecl { mode, declarators })
    })
  }

  pub fn if_stmt(&mut self) -> SyntaxResult<Node<IfStmt>> {
    self.with_loc(|p| {
      p.require(TT::KeywordIf)?;
      p.require(TT::ParenthesisOpen)?;
      let test = p.expr([TT::ParenthesisClose])?;
      p.require(TT::ParenthesisClose)?;
      let consequent = p.single_stmt_body()?;
      let alternate = p
        .consume_if(TT::KeywordElse)
        .and_then(|| p.single_stmt_body())?;
      Ok(IfStmt {
        test,
        consequent,
        alternate,
      })
    })
  }

  pub fn return_stmt(&mut self) -> SyntaxResult<Node<ReturnStmt>> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordReturn)?;
      if !p.state().in_function() {
        return Err(start.error(SyntaxErrorType::IllegalReturn));
      }
      let value = if p.peek().preceded_by_line_terminator || p.peek().typ == TT::BraceClose {
        // Automatic Semicolon Insertion.
        None
      } else if p.consume_if(TT::Semicolon).is_match() {
        None
      } else {
        let mut asi = Asi::can();
        let value = p.expr_with_asi([TT::Semicolon], &mut asi)?;
        p.require_semicolon_or_asi(&asi)?;
        Some(value)
      };
      Ok(ReturnStmt { value })
    })
  }

  pub fn throw_stmt(&mut self) -> SyntaxResult<Node<ThrowStmt>> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordThrow)?;
      if p.peek().preceded_by_line_terminator {
        // Illegal under Automatic Semicolon Insertion rules.
        return Err(start.error(SyntaxErrorType::LineTerminatorAfterThrow));
      }
      let mut asi = Asi::can();
      let value = p.expr_with_asi([TT::Semicolon], &mut asi)?;
      p.require_semicolon_or_asi(&asi)?;
      Ok(ThrowStmt { value })
    })
  }

  fn break_or_continue_label(&mut self) -> SyntaxResult<Option<String>> {
    let t = self.peek();
    let label = if t.typ == TT::Identifier && !t.preceded_by_line_terminator {
      Some(self.consume_as_string())
    } else if t.typ == TT::Semicolon {
      self.consume();
      None
    } else if t.preceded_by_line_terminator || t.typ == TT::BraceClose || t.typ == TT::EOF {
      // Automatic Semicolon Insertion.
      None
    } else {
      return Err(t.error(SyntaxErrorType::ExpectedSyntax("label")));
    };
    Ok(label)
  }

  pub fn break_stmt(&mut self) -> SyntaxResult<Node<BreakStmt>> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordBreak)?;
      let label = p.break_or_continue_label()?;
      match &label {
        Some(name) => {
          if !p.state().labels().iter().any(|l| l.name == *name) {
            return Err(start.error(SyntaxErrorType::BreakToUndefinedLabel));
          }
        }
        None => {
          if !p.state().break_legal() {
            return Err(start.error(SyntaxErrorType::IllegalBreak));
          }
        }
      }
      p.state_mut().break_count += 1;
      Ok(BreakStmt { label })
    })
  }

  pub fn continue_stmt(&mut self) -> SyntaxResult<Node<ContinueStmt>> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordContinue)?;
      let label = p.break_or_continue_label()?;
      match &label {
        Some(name) => {
          let entry = p.state().labels().iter().find(|l| l.name == *name);
          match entry {
            None => return Err(start.error(SyntaxErrorType::ContinueToUndefinedLabel)),
            Some(entry) if !entry.is_iteration => {
              return Err(start.error(SyntaxErrorType::ContinueLabelNotLoop))
            }
            Some(_) => {}
          }
        }
        None => {
          if !p.state().continue_legal() {
            return Err(start.error(SyntaxErrorType::IllegalContinue));
          }
        }
      }
      p.state_mut().continue_count += 1;
      Ok(ContinueStmt { label })
    })
  }

  pub fn debugger_stmt(&mut self) -> SyntaxResult<Node<DebuggerStmt>> {
    self.with_loc(|p| {
      p.require(TT::KeywordDebugger)?;
      let _ = p.consume_if(TT::Semicolon);
      Ok(DebuggerStmt {})
    })
  }

  /// Whether the statement following the current label chain is an iteration
  /// statement, making every label in the chain a legal `continue` target.
  /// Pure lookahead.
  fn label_targets_iteration(&mut self) -> bool {
    let cp = self.checkpoint();
    loop {
      let [t0, t1] = self.peek_n();
      match t0.typ {
        TT::KeywordDo | TT::KeywordFor | TT::KeywordWhile => {
          self.restore_checkpoint(cp);
          return true;
        }
        TT::Identifier if t1.typ == TT::Colon => {
          self.consume();
          self.consume();
        }
        _ => {
          self.restore_checkpoint(cp);
          return false;
        }
      }
    }
  }

  pub fn label_stmt(&mut self) -> SyntaxResult<Node<LabelStmt>> {
    self.with_loc(|p| {
      let start = p.peek();
      let name = p.consume_as_string();
      p.require(TT::Colon)?;
      if p.state().labels().iter().any(|l| l.name == name) {
        return Err(start.error(SyntaxErrorType::DuplicateLabel));
      }
      let is_iteration = p.label_targets_iteration();
      let statement = p.with_label(name.clone(), is_iteration, |p| p.stmt())?;
      Ok(LabelStmt { name, statement })
    })
  }

  pub fn while_stmt(&mut self) -> SyntaxResult<Node<WhileStmt>> {
    let start = self.checkpoint();
    self.require(TT::KeywordWhile)?;
    self.require(TT::ParenthesisOpen)?;
    let condition = self.expr([TT::ParenthesisClose])?;
    self.require(TT::ParenthesisClose)?;
    let (body, usage) = self.loop_body()?;
    let mut node = Node::new(self.since_checkpoint(&start), WhileStmt { condition, body });
    node.assoc.set(usage);
    Ok(node)
  }

  pub fn do_while_stmt(&mut self) -> SyntaxResult<Node<DoWhileStmt>> {
    let start = self.checkpoint();
    self.require(TT::KeywordDo)?;
    let (body, usage) = self.loop_body()?;
    // Consume optional semicolon after the body statement.
    let _ = self.consume_if(TT::Semicolon);
    self.require(TT::KeywordWhile)?;
    self.require(TT::ParenthesisOpen)?;
    let condition = self.expr([TT::ParenthesisClose])?;
    self.require(TT::ParenthesisClose)?;
    let _ = self.consume_if(TT::Semicolon);
    let mut node = Node::new(self.since_checkpoint(&start), DoWhileStmt { condition, body });
    node.assoc.set(usage);
    Ok(node)
  }

  pub fn for_stmt(&mut self) -> SyntaxResult<Node<ForTripleStmt>> {
    let start = self.checkpoint();
    self.require(TT::KeywordFor)?;
    self.require(TT::ParenthesisOpen)?;
    let init = match self.peek().typ {
      TT::KeywordConst | TT::KeywordLet | TT::KeywordVar => {
        ForTripleStmtInit::Decl(self.var_decl(VarDeclParseMode::Leftmost)?)
      }
      TT::Semicolon => ForTripleStmtInit::None,
      _ => ForTripleStmtInit::Expr(self.expr([TT::Semicolon])?),
    };
    self.require(TT::Semicolon)?;
    let cond = (self.peek().typ != TT::Semicolon)
      .then(|| self.expr([TT::Semicolon]))
      .transpose()?;
    self.require(TT::Semicolon)?;
    let post = (self.peek().typ != TT::ParenthesisClose)
      .then(|| self.expr([TT::ParenthesisClose]))
      .transpose()?;
    self.require(TT::ParenthesisClose)?;
    let (body, usage) = self.loop_body()?;
    let mut node = Node::new(self.since_checkpoint(&start), ForTripleStmt {
      init,
      cond,
      post,
      body,
    });
    node.assoc.set(usage);
    Ok(node)
  }

  pub fn switch_stmt(&mut self) -> SyntaxResult<Node<SwitchStmt>> {
    let cp = self.checkpoint();
    let start = self.require(TT::KeywordSwitch)?;
    self.require(TT::ParenthesisOpen)?;
    let test = self.expr([TT::ParenthesisClose])?;
    self.require(TT::ParenthesisClose)?;
    self.require(TT::BraceOpen)?;
    let branches = self.with_switch_scope(|p| {
      p.repeat_until_tt_with_loc(TT::BraceClose, |p| {
        let case = if p.consume_if(TT::KeywordCase).is_match() {
          Some(p.expr([TT::Colon])?)
        } else {
          p.require(TT::KeywordDefault)?;
          None
        };
        p.require(TT::Colon)?;
        let body = p.repeat_while(
          |p| {
            !matches!(
              p.peek().typ,
              TT::KeywordCase | TT::KeywordDefault | TT::BraceClose
            )
          },
          |p| p.stmt(),
        )?;
        Ok(SwitchBranch { case, body })
      })
    })?;
    self.require(TT::BraceClose)?;
    let node = Node::new(self.since_checkpoint(&cp), SwitchStmt { test, branches });

    // Structural rules: at least one case/default branch, at most one
    // default. These run after the switch scope is popped, so a failure
    // leaves the parse-state stacks balanced.
    if node.stx.branches.is_empty() {
      return Err(start.error(SyntaxErrorType::SwitchStatementHasNoCases));
    }
    let mut seen_default = false;
    let mut seen_consts = Vec::<CaseConst>::new();
    let mut duplicate_case_locs = Vec::new();
    for branch in &node.stx.branches {
      match &branch.stx.case {
        None => {
          if seen_default {
            return Err(branch.error(SyntaxErrorType::DuplicateDefaultCase));
          }
          seen_default = true;
        }
        Some(case) => {
          if let Some(value) = case_const(case) {
            if seen_consts.contains(&value) {
              duplicate_case_locs.push(case.loc);
            } else {
              seen_consts.push(value);
            }
          }
        }
      }
    }
    for loc in duplicate_case_locs {
      self.warn(SyntaxWarningType::DuplicateCaseValue, loc);
    }
    Ok(node)
  }

  pub fn try_stmt(&mut self) -> SyntaxResult<Node<TryStmt>> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordTry)?;
      let wrapped = p.block_stmt()?;
      let catch = p.consume_if(TT::KeywordCatch).and_then(|| {
        p.with_loc(|p| {
          let parameter = p
            .consume_if(TT::ParenthesisOpen)
            .and_then(|| {
              let name = p.binding_name()?;
              p.require(TT::ParenthesisClose)?;
              Ok(name)
            })?;
          p.require(TT::BraceOpen)?;
          let body = p.stmts(TT::BraceClose)?;
          p.require(TT::BraceClose)?;
          Ok(CatchBlock { parameter, body })
        })
      })?;
      let finally = p.consume_if(TT::KeywordFinally).and_then(|| p.block_stmt())?;
      if catch.is_none() && finally.is_none() {
        return Err(start.error(SyntaxErrorType::TryStatementHasNoCatchOrFinally));
      }
      Ok(TryStmt {
        wrapped,
        catch,
        finally,
      })
    })
  }

  pub fn with_stmt(&mut self) -> SyntaxResult<Node<WithStmt>> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordWith)?;
      if p.state().strict() {
        return Err(start.error(SyntaxErrorType::StrictModeWith));
      }
      p.warn(SyntaxWarningType::WithStatement, start.loc);
      p.require(TT::ParenthesisOpen)?;
      let object = p.expr([TT::ParenthesisClose])?;
      p.require(TT::ParenthesisClose)?;
      let body = p.single_stmt_body()?;
      Ok(WithStmt { object, body })
    })
  }

  pub fn func_decl(&mut self) -> SyntaxResult<Node<FuncDecl>> {
    self.with_loc(|p| {
      p.require(TT::KeywordFunction)?;
      let name = p.binding_name()?;
      let func = p.func_common()?;
      Ok(FuncDecl { name, func })
    })
  }

  pub fn func_params(&mut self) -> SyntaxResult<Vec<Node<ParamDecl>>> {
    self.require(TT::ParenthesisOpen)?;
    let mut parameters = Vec::new();
    while self.peek().typ != TT::ParenthesisClose {
      let param = self.with_loc(|p| {
        let t = p.require_predicate(|typ| typ == TT::Identifier, "parameter name")?;
        Ok(ParamDecl {
          name: p.string(t.loc),
        })
      })?;
      parameters.push(param);
      if !self.consume_if(TT::Comma).is_match() {
        break;
      }
    }
    self.require(TT::ParenthesisClose)?;
    Ok(parameters)
  }

  /// Parses a function's parameter list and body (shared by declarations and
  /// expressions). The body runs under a function scope: enclosing labels are
  /// masked, `break`/`continue` are illegal, and a `"use strict"` directive
  /// prologue upgrades strictness.
  pub fn func_common(&mut self) -> SyntaxResult<Node<Func>> {
    self.with_loc(|p| {
      let parameters = p.func_params()?;
      p.with_function_scope(|p| {
        p.require(TT::BraceOpen)?;
        let mut body = Vec::new();
        if p.directive_prologue(&mut body)? {
          p.set_strict();
        }
        let strict = p.state().strict();
        if strict {
          for param in &parameters {
            if matches!(param.stx.name.as_str(), "eval" | "arguments") {
              return Err(param.error(SyntaxErrorType::StrictModeRestrictedName));
            }
          }
        }
        body.extend(p.stmts(TT::BraceClose)?);
        p.require(TT::BraceClose)?;
        Ok(Func {
          parameters,
          body,
          strict,
        })
      })
    })
  }

  /// Consumes leading string-literal expression statements, appending them to
  /// `body`, and reports whether one of them was the `"use strict"`
  /// directive.
  pub fn directive_prologue(&mut self, body: &mut Vec<Node<Stmt>>) -> SyntaxResult<bool> {
    let mut strict = false;
    loop {
      let [t0, t1] = self.peek_n();
      if t0.typ != TT::LiteralString {
        break;
      }
      // A directive is a complete statement: the string must be followed by
      // a statement boundary.
      let is_directive = matches!(t1.typ, TT::Semicolon | TT::BraceClose | TT::EOF)
        || t1.preceded_by_line_terminator;
      if !is_directive {
        break;
      }
      let raw = self.string(t0.loc);
      let stmt = self.expr_stmt()?;
      // Escape sequences disqualify a directive, so compare raw source text.
      if raw == "\"use strict\"" || raw == "'use strict'" {
        strict = true;
      }
      body.push(stmt.into_wrapped());
    }
    Ok(strict)
  }
}
