use derive_visitor::Drive;
use derive_visitor::Visitor;
use parse_dscript::ast::func::Func;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stmt::Stmt;
use parse_dscript::ast::stmt::VarDecl;
use parse_dscript::ast::stmt::VarDeclMode;

/// Collects the `var`-declared names of one function body (or the top level)
/// without descending into nested functions, whose `var` bindings hoist to
/// their own frame.
#[derive(Default, Visitor)]
#[visitor(Func(enter, exit), VarDecl(enter))]
struct VarHoistCollector {
  nested_function_depth: usize,
  names: Vec<String>,
}

impl VarHoistCollector {
  fn enter_func(&mut self, _func: &Func) {
    self.nested_function_depth += 1;
  }

  fn exit_func(&mut self, _func: &Func) {
    self.nested_function_depth -= 1;
  }

  fn enter_var_decl(&mut self, decl: &VarDecl) {
    if self.nested_function_depth > 0 || decl.mode != VarDeclMode::Var {
      return;
    }
    for declarator in &decl.declarators {
      let name = &declarator.stx.name;
      if !self.names.iter().any(|n| n == name) {
        self.names.push(name.clone());
      }
    }
  }
}

/// The `var` names hoisted to the frame that directly contains `stmts`.
pub fn collect_var_names(stmts: &[Node<Stmt>]) -> Vec<String> {
  let mut collector = VarHoistCollector::default();
  for stmt in stmts {
    stmt.drive(&mut collector);
  }
  collector.names
}
