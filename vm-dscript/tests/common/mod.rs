// Not every test binary uses every helper.
#![allow(dead_code)]

use diagnostics::FileId;
use vm_dscript::build_program;
use vm_dscript::optimize_program;
use vm_dscript::value::to_js_string;
use vm_dscript::Interpreter;
use vm_dscript::OptimizeOptions;
use vm_dscript::TerminationReason;
use vm_dscript::Value;
use vm_dscript::VmError;
use vm_dscript::VmOptions;

/// An owned snapshot of a script result, detached from the program tree so
/// tests can assert on it after execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
  Undefined,
  Null,
  Bool(bool),
  Num(f64),
  Str(String),
  Arr(String),
  Obj(String),
  /// A thrown error-shaped object: `(name, message)`.
  Err(String, String),
  Fn,
}

pub fn lit(value: &Value) -> Lit {
  match value {
    Value::Undefined => Lit::Undefined,
    Value::Null => Lit::Null,
    Value::Bool(b) => Lit::Bool(*b),
    Value::Num(n) => Lit::Num(n.0),
    Value::Str(s) => Lit::Str(s.to_string()),
    Value::Arr(_) => Lit::Arr(to_js_string(value)),
    Value::Obj(map) => {
      let map = map.borrow();
      match (map.get("name"), map.get("message")) {
        (Some(Value::Str(name)), Some(Value::Str(message))) => {
          Lit::Err(name.to_string(), message.to_string())
        }
        _ => Lit::Obj(to_js_string(value)),
      }
    }
    Value::Func(_) | Value::Native(_) => Lit::Fn,
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
  Uncaught(Lit),
  Terminated(TerminationReason),
}

pub struct RunConfig {
  pub options: VmOptions,
  pub optimize: Option<OptimizeOptions>,
}

impl Default for RunConfig {
  fn default() -> Self {
    RunConfig {
      options: VmOptions::default(),
      optimize: None,
    }
  }
}

pub fn run_with(source: &str, config: RunConfig) -> Result<Lit, RunError> {
  let mut program = parse_dscript::parse(source).expect("script should parse");
  build_program(&mut program, FileId(0), &[]);
  if let Some(optimize) = &config.optimize {
    optimize_program(&mut program, optimize);
  }
  let interpreter = Interpreter::new(config.options);
  let result = match interpreter.exec(&program) {
    Ok(value) => Ok(lit(&value)),
    Err(VmError::Throw(value)) => Err(RunError::Uncaught(lit(&value))),
    Err(VmError::Termination(termination)) => Err(RunError::Terminated(termination.reason)),
  };
  result
}

pub fn run(source: &str) -> Result<Lit, RunError> {
  run_with(source, RunConfig::default())
}

pub fn run_ok(source: &str) -> Lit {
  run(source).expect("script should complete normally")
}

pub fn run_uncaught(source: &str) -> Lit {
  match run(source) {
    Err(RunError::Uncaught(value)) => value,
    other => panic!("expected an uncaught exception, got {:?}", other),
  }
}
