use super::node::Node;
use super::stmt::Stmt;
use derive_visitor::Drive;
use derive_visitor::DriveMut;
use serde::Serialize;

#[derive(Debug, Drive, DriveMut, Serialize)]
pub struct ParamDecl {
  #[drive(skip)]
  pub name: String,
}

#[derive(Debug, Drive, DriveMut, Serialize)]
pub struct Func {
  pub parameters: Vec<Node<ParamDecl>>,
  pub body: Vec<Node<Stmt>>,
  // Whether the function body begins with a `"use strict"` directive or
  // inherits strictness from its enclosing scope.
  #[drive(skip)]
  pub strict: bool,
}
